// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

use indexmap::IndexMap;

use crate::{Error, Result};

/// Samples of a single-input element or of an I/Q pair.
///
/// Used both for operation templates and for element tracks.
/// The two sequences of a `Paired` value always have the same length.
#[derive(Debug, Clone, PartialEq)]
pub enum SampleShape {
    Single(Vec<f64>),
    Paired(Vec<f64>, Vec<f64>),
}

impl SampleShape {
    pub(crate) fn zeros(paired: bool, length: usize) -> Self {
        if paired {
            SampleShape::Paired(vec![0.0; length], vec![0.0; length])
        } else {
            SampleShape::Single(vec![0.0; length])
        }
    }

    pub fn len(&self) -> usize {
        match self {
            SampleShape::Single(samples) => samples.len(),
            SampleShape::Paired(i, _) => i.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_paired(&self) -> bool {
        matches!(self, SampleShape::Paired(..))
    }

    /// Check that the shape fits an element with the given cardinality.
    pub(crate) fn validate(&self, name: &str, element: &str, paired: bool) -> Result<()> {
        match self {
            SampleShape::Single(_) if paired => Err(Error::shape_mismatch(
                name,
                element,
                "element has I/Q inputs, expected a pair of sample sequences",
            )),
            SampleShape::Paired(..) if !paired => Err(Error::shape_mismatch(
                name,
                element,
                "element has a single input, expected one sample sequence",
            )),
            SampleShape::Paired(i, q) if i.len() != q.len() => Err(Error::shape_mismatch(
                name,
                element,
                format!(
                    "I and Q have different lengths ({} and {})",
                    i.len(),
                    q.len()
                ),
            )),
            _ => Ok(()),
        }
    }

    /// Apply an amplitude scaling, returning the scaled samples.
    pub(crate) fn scaled(&self, amplitude: Amplitude, name: &str, element: &str) -> Result<Self> {
        let scaled = match (self, amplitude) {
            (_, Amplitude::Scalar(a)) if a == 1.0 => self.clone(),
            (SampleShape::Single(samples), Amplitude::Scalar(a)) => {
                SampleShape::Single(samples.iter().map(|s| s * a).collect())
            }
            (SampleShape::Paired(i, q), Amplitude::Scalar(a)) => SampleShape::Paired(
                i.iter().map(|s| s * a).collect(),
                q.iter().map(|s| s * a).collect(),
            ),
            (SampleShape::Paired(i, q), Amplitude::Matrix([v00, v01, v10, v11])) => {
                let (i, q) = i
                    .iter()
                    .zip(q)
                    .map(|(i, q)| (v00 * i + v01 * q, v10 * i + v11 * q))
                    .unzip();
                SampleShape::Paired(i, q)
            }
            (SampleShape::Single(_), Amplitude::Matrix(_)) => {
                return Err(Error::shape_mismatch(
                    name,
                    element,
                    "an amplitude matrix requires an element with I/Q inputs",
                ));
            }
        };
        Ok(scaled)
    }

    /// Rotate I/Q samples by `phase` radians. Single samples are returned as is.
    pub(crate) fn rotated(self, phase: f64) -> Self {
        match self {
            SampleShape::Paired(i, q) if phase != 0.0 => {
                let (sin, cos) = phase.sin_cos();
                let (i, q) = i
                    .iter()
                    .zip(&q)
                    .map(|(i, q)| (cos * i - sin * q, sin * i + cos * q))
                    .unzip();
                SampleShape::Paired(i, q)
            }
            other => other,
        }
    }
}

/// Amplitude applied to an operation when it is played.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Amplitude {
    /// Scales all samples.
    Scalar(f64),
    /// Mixes an I/Q pair: `I' = v00 * I + v01 * Q`, `Q' = v10 * I + v11 * Q`.
    Matrix([f64; 4]),
}

impl Default for Amplitude {
    fn default() -> Self {
        Amplitude::Scalar(1.0)
    }
}

/// A named sample template declared inside a baking session.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationDef {
    pub name: String,
    pub element: String,
    pub samples: SampleShape,
    pub digital_marker: Option<String>,
}

#[derive(Debug, Default)]
pub struct OperationRegistry {
    operations: IndexMap<String, OperationDef>,
}

impl OperationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an operation for an element with the given cardinality.
    ///
    /// Registering the same content twice is a no-op.
    pub fn register(&mut self, operation: OperationDef, paired: bool) -> Result<()> {
        operation
            .samples
            .validate(&operation.name, &operation.element, paired)?;
        if let Some(existing) = self.operations.get(&operation.name) {
            if *existing == operation {
                return Ok(());
            }
            return Err(Error::NameCollision(operation.name));
        }
        self.operations.insert(operation.name.clone(), operation);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&OperationDef> {
        self.operations.get(name)
    }

    /// Look up an operation registered for `element`.
    pub fn get_for_element(&self, name: &str, element: &str) -> Option<&OperationDef> {
        self.get(name).filter(|op| op.element == element)
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}
