// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{Error, Result};

/// Controller output port, either `(controller, port)` or `(controller, fem, port)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Port {
    Analog(String, u16),
    Fem(String, u16, u16),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SingleInput {
    pub port: Port,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MixInputs {
    #[serde(rename = "I")]
    pub i: Port,
    #[serde(rename = "Q")]
    pub q: Port,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lo_frequency: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mixer: Option<String>,
}

/// A quantum element: an addressable output with one or two (I/Q) inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    #[serde(
        rename = "singleInput",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub single_input: Option<SingleInput>,
    #[serde(rename = "mixInputs", default, skip_serializing_if = "Option::is_none")]
    pub mix_inputs: Option<MixInputs>,
    /// Operation label to pulse name.
    #[serde(default)]
    pub operations: IndexMap<String, String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Element {
    pub fn single(port: Port) -> Self {
        Element {
            single_input: Some(SingleInput { port }),
            mix_inputs: None,
            operations: IndexMap::new(),
            extra: Map::new(),
        }
    }

    pub fn mixed(i: Port, q: Port) -> Self {
        Element {
            single_input: None,
            mix_inputs: Some(MixInputs {
                i,
                q,
                lo_frequency: None,
                mixer: None,
            }),
            operations: IndexMap::new(),
            extra: Map::new(),
        }
    }

    /// Whether the element is driven by an I/Q pair.
    ///
    /// Fails when the element declares neither or both input kinds.
    pub fn is_mixed(&self, name: &str) -> Result<bool> {
        match (&self.single_input, &self.mix_inputs) {
            (Some(_), None) => Ok(false),
            (None, Some(_)) => Ok(true),
            _ => Err(Error::new(format!(
                "Element '{name}' must declare exactly one of 'singleInput' and 'mixInputs'"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PulseOperation {
    Control,
    Measurement,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PulseWaveforms {
    Single {
        single: String,
    },
    Iq {
        #[serde(rename = "I")]
        i: String,
        #[serde(rename = "Q")]
        q: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pulse {
    pub operation: PulseOperation,
    pub length: usize,
    pub waveforms: PulseWaveforms,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digital_marker: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Waveform {
    Constant { sample: f64 },
    Arbitrary { samples: Vec<f64> },
}

impl Waveform {
    /// Sample values of the waveform when played by a pulse of `length` samples.
    pub fn expand(&self, length: usize) -> Vec<f64> {
        match self {
            Waveform::Constant { sample } => vec![*sample; length],
            Waveform::Arbitrary { samples } => samples.clone(),
        }
    }
}

/// Digital waveform as `(value, duration)` pairs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DigitalWaveform {
    pub samples: Vec<(u8, u32)>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u32>,
    #[serde(default)]
    pub elements: IndexMap<String, Element>,
    #[serde(default)]
    pub pulses: IndexMap<String, Pulse>,
    #[serde(default)]
    pub waveforms: IndexMap<String, Waveform>,
    #[serde(default)]
    pub digital_waveforms: IndexMap<String, DigitalWaveform>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Config {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn element(&self, name: &str) -> Result<&Element> {
        self.elements
            .get(name)
            .ok_or_else(|| Error::UnknownElement(name.to_string()))
    }

    /// Look up the pulse bound to `operation` on `element`.
    ///
    /// Returns `Ok(None)` if the element has no such operation.
    pub fn operation_pulse(&self, element: &str, operation: &str) -> Result<Option<&Pulse>> {
        let Some(pulse_name) = self.element(element)?.operations.get(operation) else {
            return Ok(None);
        };
        self.pulses
            .get(pulse_name)
            .map(Some)
            .ok_or_else(|| Error::MissingReference {
                table: "pulses",
                name: pulse_name.clone(),
                from: format!("{element}.{operation}"),
            })
    }

    pub fn waveform(&self, name: &str, referenced_by: &str) -> Result<&Waveform> {
        self.waveforms
            .get(name)
            .ok_or_else(|| Error::MissingReference {
                table: "waveforms",
                name: name.to_string(),
                from: referenced_by.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = r#"{
        "version": 1,
        "controllers": {"con1": {"analog_outputs": {"1": {"offset": 0.0}}}},
        "elements": {
            "flux": {
                "singleInput": {"port": ["con1", 1]},
                "intermediate_frequency": 0,
                "operations": {"const": "const_pulse"}
            },
            "qubit": {
                "mixInputs": {"I": ["con1", 1, 2], "Q": ["con1", 1, 3], "lo_frequency": 5e9},
                "operations": {}
            }
        },
        "pulses": {
            "const_pulse": {
                "operation": "control",
                "length": 20,
                "waveforms": {"single": "const_wf"}
            }
        },
        "waveforms": {
            "const_wf": {"type": "constant", "sample": 0.2},
            "arb_wf": {"type": "arbitrary", "samples": [0.1, 0.2]}
        },
        "digital_waveforms": {"ON": {"samples": [[1, 0]]}}
    }"#;

    #[test]
    fn test_load_config() {
        let config = Config::from_json_str(CONFIG).unwrap();
        assert_eq!(config.version, Some(1));
        assert!(!config.element("flux").unwrap().is_mixed("flux").unwrap());
        assert!(config.element("qubit").unwrap().is_mixed("qubit").unwrap());
        assert_eq!(
            config.element("qubit").unwrap().mix_inputs.as_ref().unwrap().i,
            Port::Fem("con1".to_string(), 1, 2)
        );
        assert!(config.extra.contains_key("controllers"));
        assert!(
            config
                .element("flux")
                .unwrap()
                .extra
                .contains_key("intermediate_frequency")
        );
        assert_eq!(
            config.digital_waveforms["ON"],
            DigitalWaveform {
                samples: vec![(1, 0)]
            }
        );
    }

    #[test]
    fn test_round_trip_keeps_unknown_fields() {
        let config = Config::from_json_str(CONFIG).unwrap();
        let reloaded = Config::from_json_str(&config.to_json_string().unwrap()).unwrap();
        assert_eq!(config, reloaded);
    }

    #[test]
    fn test_operation_pulse() {
        let config = Config::from_json_str(CONFIG).unwrap();
        let pulse = config.operation_pulse("flux", "const").unwrap().unwrap();
        assert_eq!(pulse.length, 20);
        assert_eq!(
            pulse.waveforms,
            PulseWaveforms::Single {
                single: "const_wf".to_string()
            }
        );
        assert!(config.operation_pulse("flux", "missing").unwrap().is_none());
        assert!(matches!(
            config.operation_pulse("nope", "const"),
            Err(Error::UnknownElement(_))
        ));
    }

    #[test]
    fn test_waveform_expand() {
        assert_eq!(Waveform::Constant { sample: 0.5 }.expand(3), vec![0.5; 3]);
        let arbitrary = Waveform::Arbitrary {
            samples: vec![0.1, 0.2],
        };
        assert_eq!(arbitrary.expand(16), vec![0.1, 0.2]);
    }

    #[test]
    fn test_element_needs_one_input_kind() {
        let mut element = Element::single(Port::Analog("con1".to_string(), 1));
        element.mix_inputs = Element::mixed(
            Port::Analog("con1".to_string(), 1),
            Port::Analog("con1".to_string(), 2),
        )
        .mix_inputs;
        assert!(element.is_mixed("broken").is_err());
    }
}
