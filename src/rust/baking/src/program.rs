// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

//! Minimal program representation for playing baked operations.
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Align {
        elements: Vec<String>,
    },
    Play {
        operation: String,
        element: String,
        amplitude: Option<f64>,
    },
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Statement::Align { elements } => {
                let elements = elements
                    .iter()
                    .map(|e| format!("\"{e}\""))
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "align({elements})")
            }
            Statement::Play {
                operation,
                element,
                amplitude: None,
            } => write!(f, "play(\"{operation}\", \"{element}\")"),
            Statement::Play {
                operation,
                element,
                amplitude: Some(amplitude),
            } => write!(f, "play(\"{operation}\" * amp({amplitude}), \"{element}\")"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Program {
    statements: Vec<Statement>,
}

impl Program {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, statement: Statement) {
        self.statements.push(statement);
    }

    pub fn statements(&self) -> &[Statement] {
        &self.statements
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for statement in &self.statements {
            writeln!(f, "{statement}")?;
        }
        Ok(())
    }
}
