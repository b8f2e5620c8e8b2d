// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

use indexmap::IndexMap;

use crate::types::{Config, DigitalWaveform, Pulse, PulseWaveforms, Waveform};
use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq)]
struct OperationEntry {
    element: String,
    label: String,
    pulse: String,
}

/// A set of new configuration entries that is applied all-or-nothing.
///
/// Entries are staged in the patch and checked against the target
/// configuration in [`ConfigPatch::apply`] before anything is written.
/// A patch never replaces existing entries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigPatch {
    waveforms: IndexMap<String, Waveform>,
    digital_waveforms: IndexMap<String, DigitalWaveform>,
    pulses: IndexMap<String, Pulse>,
    operations: Vec<OperationEntry>,
}

fn stage<T>(
    table: &mut IndexMap<String, T>,
    kind: &'static str,
    name: String,
    value: T,
) -> Result<()> {
    if table.contains_key(&name) {
        return Err(Error::DuplicateEntry { table: kind, name });
    }
    table.insert(name, value);
    Ok(())
}

impl ConfigPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.waveforms.is_empty()
            && self.digital_waveforms.is_empty()
            && self.pulses.is_empty()
            && self.operations.is_empty()
    }

    pub fn add_waveform(&mut self, name: impl Into<String>, waveform: Waveform) -> Result<()> {
        stage(&mut self.waveforms, "waveforms", name.into(), waveform)
    }

    pub fn add_digital_waveform(
        &mut self,
        name: impl Into<String>,
        waveform: DigitalWaveform,
    ) -> Result<()> {
        stage(
            &mut self.digital_waveforms,
            "digital_waveforms",
            name.into(),
            waveform,
        )
    }

    pub fn add_pulse(&mut self, name: impl Into<String>, pulse: Pulse) -> Result<()> {
        stage(&mut self.pulses, "pulses", name.into(), pulse)
    }

    pub fn add_operation(
        &mut self,
        element: impl Into<String>,
        label: impl Into<String>,
        pulse: impl Into<String>,
    ) -> Result<()> {
        let entry = OperationEntry {
            element: element.into(),
            label: label.into(),
            pulse: pulse.into(),
        };
        if self
            .operations
            .iter()
            .any(|op| op.element == entry.element && op.label == entry.label)
        {
            return Err(Error::DuplicateEntry {
                table: "operations",
                name: format!("{}.{}", entry.element, entry.label),
            });
        }
        self.operations.push(entry);
        Ok(())
    }

    pub fn waveforms(&self) -> &IndexMap<String, Waveform> {
        &self.waveforms
    }

    pub fn pulses(&self) -> &IndexMap<String, Pulse> {
        &self.pulses
    }

    /// Check that the patch can be applied to `config` without overwriting
    /// anything and without leaving dangling references.
    pub fn validate(&self, config: &Config) -> Result<()> {
        for name in self.waveforms.keys() {
            if config.waveforms.contains_key(name) {
                return Err(Error::DuplicateEntry {
                    table: "waveforms",
                    name: name.clone(),
                });
            }
        }
        for name in self.digital_waveforms.keys() {
            if config.digital_waveforms.contains_key(name) {
                return Err(Error::DuplicateEntry {
                    table: "digital_waveforms",
                    name: name.clone(),
                });
            }
        }
        for (name, pulse) in &self.pulses {
            if config.pulses.contains_key(name) {
                return Err(Error::DuplicateEntry {
                    table: "pulses",
                    name: name.clone(),
                });
            }
            let referenced = match &pulse.waveforms {
                PulseWaveforms::Single { single } => vec![single],
                PulseWaveforms::Iq { i, q } => vec![i, q],
            };
            for waveform in referenced {
                if !self.waveforms.contains_key(waveform)
                    && !config.waveforms.contains_key(waveform)
                {
                    return Err(Error::MissingReference {
                        table: "waveforms",
                        name: waveform.clone(),
                        from: name.clone(),
                    });
                }
            }
            let missing_marker = pulse.digital_marker.as_ref().filter(|marker| {
                !self.digital_waveforms.contains_key(*marker)
                    && !config.digital_waveforms.contains_key(*marker)
            });
            if let Some(marker) = missing_marker {
                return Err(Error::MissingReference {
                    table: "digital_waveforms",
                    name: marker.clone(),
                    from: name.clone(),
                });
            }
        }
        for op in &self.operations {
            let element = config.element(&op.element)?;
            if element.operations.contains_key(&op.label) {
                return Err(Error::DuplicateEntry {
                    table: "operations",
                    name: format!("{}.{}", op.element, op.label),
                });
            }
            if !self.pulses.contains_key(&op.pulse) && !config.pulses.contains_key(&op.pulse) {
                return Err(Error::MissingReference {
                    table: "pulses",
                    name: op.pulse.clone(),
                    from: format!("{}.{}", op.element, op.label),
                });
            }
        }
        Ok(())
    }

    /// Validate and write all staged entries into `config`.
    ///
    /// On error the configuration is left untouched.
    pub fn apply(self, config: &mut Config) -> Result<()> {
        self.validate(config)?;
        config.waveforms.extend(self.waveforms);
        config.digital_waveforms.extend(self.digital_waveforms);
        config.pulses.extend(self.pulses);
        for op in self.operations {
            // Existence checked in `validate`.
            if let Some(element) = config.elements.get_mut(&op.element) {
                element.operations.insert(op.label, op.pulse);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Element, Port, PulseOperation};
    use serde_json::Map;

    fn config() -> Config {
        let mut config = Config::default();
        config.elements.insert(
            "flux".to_string(),
            Element::single(Port::Analog("con1".to_string(), 1)),
        );
        config
    }

    fn pulse(waveform: &str, marker: Option<&str>) -> Pulse {
        Pulse {
            operation: PulseOperation::Control,
            length: 16,
            waveforms: PulseWaveforms::Single {
                single: waveform.to_string(),
            },
            digital_marker: marker.map(str::to_string),
            extra: Map::new(),
        }
    }

    fn patch() -> ConfigPatch {
        let mut patch = ConfigPatch::new();
        patch
            .add_waveform(
                "wf",
                Waveform::Arbitrary {
                    samples: vec![0.0; 16],
                },
            )
            .unwrap();
        patch.add_pulse("p", pulse("wf", None)).unwrap();
        patch.add_operation("flux", "op", "p").unwrap();
        patch
    }

    #[test]
    fn test_apply() {
        assert!(ConfigPatch::new().is_empty());
        let patch = patch();
        assert!(!patch.is_empty());
        assert_eq!(patch.waveforms().len(), 1);
        assert!(patch.pulses().contains_key("p"));

        let mut config = config();
        patch.apply(&mut config).unwrap();
        assert_eq!(config.elements["flux"].operations["op"], "p");
        assert_eq!(config.pulses["p"].length, 16);
        assert!(config.waveforms.contains_key("wf"));
    }

    #[test]
    fn test_apply_is_all_or_nothing() {
        let mut config = config();
        config
            .waveforms
            .insert("wf".to_string(), Waveform::Constant { sample: 0.0 });
        let before = config.clone();
        let result = patch().apply(&mut config);
        assert!(matches!(
            result,
            Err(Error::DuplicateEntry {
                table: "waveforms",
                ..
            })
        ));
        assert_eq!(config, before);
    }

    #[test]
    fn test_unknown_element() {
        let mut patch = patch();
        patch.add_operation("missing", "op", "p").unwrap();
        let mut config = config();
        let before = config.clone();
        assert!(matches!(
            patch.apply(&mut config),
            Err(Error::UnknownElement(name)) if name == "missing"
        ));
        assert_eq!(config, before);
    }

    #[test]
    fn test_dangling_references() {
        let mut patch = ConfigPatch::new();
        patch.add_pulse("p", pulse("nowhere", None)).unwrap();
        assert!(matches!(
            patch.validate(&config()),
            Err(Error::MissingReference {
                table: "waveforms",
                ..
            })
        ));

        let mut patch = ConfigPatch::new();
        patch
            .add_waveform("wf", Waveform::Constant { sample: 0.0 })
            .unwrap();
        patch.add_pulse("p", pulse("wf", Some("ON"))).unwrap();
        assert!(matches!(
            patch.validate(&config()),
            Err(Error::MissingReference {
                table: "digital_waveforms",
                ..
            })
        ));
        patch
            .add_digital_waveform(
                "ON",
                DigitalWaveform {
                    samples: vec![(1, 0)],
                },
            )
            .unwrap();
        assert!(patch.validate(&config()).is_ok());
    }

    #[test]
    fn test_duplicate_in_patch() {
        let mut patch = patch();
        assert!(
            patch
                .add_waveform("wf", Waveform::Constant { sample: 1.0 })
                .is_err()
        );
        assert!(patch.add_operation("flux", "op", "p").is_err());
    }
}
