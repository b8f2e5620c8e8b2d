// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

//! Configuration entries of a finished baking session.
//!
//! Entry names are derived from the session index and the element name, so
//! independent sessions writing into one configuration do not collide:
//!
//! | entry     | name                                               |
//! |-----------|----------------------------------------------------|
//! | operation | `baked_Op_{n}`                                     |
//! | pulse     | `{element}_baked_pulse_{n}`                        |
//! | waveform  | `{element}_baked_wf_{n}` or `{element}_baked_wf_I_{n}`, `{element}_baked_wf_Q_{n}` |
use std::fmt;

use indexmap::IndexMap;
use qm_config::{
    Config, ConfigPatch, DigitalWaveform, Pulse, PulseOperation, PulseWaveforms, Waveform,
};

use crate::Result;
use crate::operation::SampleShape;
use crate::padding::FinalizedWaveform;

/// Index that makes the names written by one baking session unique.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(u32);

impl SessionId {
    pub fn new(index: u32) -> Self {
        SessionId(index)
    }

    /// Smallest index whose operation label is not used by any element yet.
    pub fn allocate(config: &Config) -> Self {
        (0..)
            .map(SessionId)
            .find(|id| {
                let label = id.operation_label();
                !config
                    .elements
                    .values()
                    .any(|element| element.operations.contains_key(&label))
            })
            .unwrap_or_default()
    }

    pub fn index(&self) -> u32 {
        self.0
    }

    pub fn operation_label(&self) -> String {
        format!("baked_Op_{}", self.0)
    }

    pub fn pulse_name(&self, element: &str) -> String {
        format!("{element}_baked_pulse_{}", self.0)
    }

    /// Waveform name for an element; `component` is `None`, `Some("I")` or `Some("Q")`.
    pub fn waveform_name(&self, element: &str, component: Option<&str>) -> String {
        match component {
            Some(component) => format!("{element}_baked_wf_{component}_{}", self.0),
            None => format!("{element}_baked_wf_{}", self.0),
        }
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Build the patch that adds the baked operation of every element.
///
/// Digital waveforms staged during the session are added only if the
/// configuration does not define them already.
pub(crate) fn build_patch(
    session_id: SessionId,
    waveforms: &IndexMap<String, FinalizedWaveform>,
    digital_waveforms: &IndexMap<String, DigitalWaveform>,
    config: &Config,
) -> Result<ConfigPatch> {
    let mut patch = ConfigPatch::new();
    for (name, waveform) in digital_waveforms {
        if !config.digital_waveforms.contains_key(name) {
            patch.add_digital_waveform(name.clone(), waveform.clone())?;
        }
    }
    for (element, waveform) in waveforms {
        let pulse_waveforms = match waveform.samples() {
            SampleShape::Single(samples) => {
                let name = session_id.waveform_name(element, None);
                patch.add_waveform(
                    name.clone(),
                    Waveform::Arbitrary {
                        samples: samples.clone(),
                    },
                )?;
                PulseWaveforms::Single { single: name }
            }
            SampleShape::Paired(i, q) => {
                let i_name = session_id.waveform_name(element, Some("I"));
                let q_name = session_id.waveform_name(element, Some("Q"));
                patch.add_waveform(i_name.clone(), Waveform::Arbitrary { samples: i.clone() })?;
                patch.add_waveform(q_name.clone(), Waveform::Arbitrary { samples: q.clone() })?;
                PulseWaveforms::Iq {
                    i: i_name,
                    q: q_name,
                }
            }
        };
        let pulse_name = session_id.pulse_name(element);
        patch.add_pulse(
            pulse_name.clone(),
            Pulse {
                operation: PulseOperation::Control,
                length: waveform.len(),
                waveforms: pulse_waveforms,
                digital_marker: waveform.digital_marker().map(str::to_string),
                extra: Default::default(),
            },
        )?;
        patch.add_operation(element.clone(), session_id.operation_label(), pulse_name)?;
    }
    Ok(patch)
}
