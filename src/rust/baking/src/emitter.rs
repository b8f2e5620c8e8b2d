// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

use indexmap::IndexMap;

use crate::config_writer::SessionId;
use crate::padding::FinalizedWaveform;
use crate::program::{Program, Statement};
use crate::{Error, Result};

/// Frozen result of a finished baking session.
///
/// The handle is passed to the program construction phase, where
/// [`BakedHandle::emit`] plays the baked operation on every element
/// touched by the session.
#[derive(Debug, Clone, PartialEq)]
pub struct BakedHandle {
    session_id: SessionId,
    waveforms: IndexMap<String, FinalizedWaveform>,
}

impl BakedHandle {
    pub(crate) fn new(
        session_id: SessionId,
        waveforms: IndexMap<String, FinalizedWaveform>,
    ) -> Self {
        BakedHandle {
            session_id,
            waveforms,
        }
    }

    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    /// Label of the baked operation on each element.
    pub fn operation_name(&self) -> String {
        self.session_id.operation_label()
    }

    /// Elements in the order they were first touched during baking.
    pub fn channels(&self) -> impl Iterator<Item = &str> {
        self.waveforms.keys().map(String::as_str)
    }

    pub fn waveform(&self, element: &str) -> Option<&FinalizedWaveform> {
        self.waveforms.get(element)
    }

    /// Length in samples of the baked operation on `element`, including padding.
    pub fn op_length(&self, element: &str) -> Result<usize> {
        self.waveform(element)
            .map(FinalizedWaveform::len)
            .ok_or_else(|| Error::UnknownChannel(element.to_string()))
    }

    /// Align all baked elements and play the baked operation on each of them.
    pub fn emit(&self, program: &mut Program) {
        self.emit_with_amplitude(None, program);
    }

    /// Like [`BakedHandle::emit`], scaling every baked operation by `amplitude`.
    pub fn emit_scaled(&self, amplitude: f64, program: &mut Program) {
        self.emit_with_amplitude(Some(amplitude), program);
    }

    fn emit_with_amplitude(&self, amplitude: Option<f64>, program: &mut Program) {
        if self.waveforms.is_empty() {
            return;
        }
        program.push(Statement::Align {
            elements: self.waveforms.keys().cloned().collect(),
        });
        let operation = self.operation_name();
        for element in self.waveforms.keys() {
            program.push(Statement::Play {
                operation: operation.clone(),
                element: element.clone(),
                amplitude,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device_traits::OPX_TRAITS;
    use crate::operation::SampleShape;
    use crate::padding::{PaddingMethod, finalize};

    fn handle() -> BakedHandle {
        let mut waveforms = IndexMap::new();
        for (element, length) in [("q1", 3), ("q0", 21)] {
            waveforms.insert(
                element.to_string(),
                finalize(
                    &SampleShape::Single(vec![0.5; length]),
                    None,
                    PaddingMethod::Right,
                    &OPX_TRAITS,
                ),
            );
        }
        BakedHandle::new(SessionId::new(4), waveforms)
    }

    #[test]
    fn test_emit() {
        let mut program = Program::new();
        handle().emit(&mut program);
        assert_eq!(
            program.statements(),
            &[
                Statement::Align {
                    elements: vec!["q1".to_string(), "q0".to_string()]
                },
                Statement::Play {
                    operation: "baked_Op_4".to_string(),
                    element: "q1".to_string(),
                    amplitude: None
                },
                Statement::Play {
                    operation: "baked_Op_4".to_string(),
                    element: "q0".to_string(),
                    amplitude: None
                },
            ]
        );
    }

    #[test]
    fn test_emit_scaled() {
        let mut program = Program::new();
        handle().emit_scaled(0.25, &mut program);
        assert_eq!(program.statements().len(), 3);
        assert!(program.statements()[1..].iter().all(|s| matches!(
            s,
            Statement::Play {
                amplitude: Some(a),
                ..
            } if *a == 0.25
        )));
    }

    #[test]
    fn test_empty_handle_emits_nothing() {
        let mut program = Program::new();
        BakedHandle::new(SessionId::new(0), IndexMap::new()).emit(&mut program);
        assert!(program.is_empty());
    }

    #[test]
    fn test_op_length() {
        let handle = handle();
        assert_eq!(handle.op_length("q1").unwrap(), 16);
        assert_eq!(handle.op_length("q0").unwrap(), 24);
        assert!(matches!(
            handle.op_length("q2"),
            Err(Error::UnknownChannel(_))
        ));
        assert_eq!(handle.channels().collect::<Vec<_>>(), vec!["q1", "q0"]);
    }
}
