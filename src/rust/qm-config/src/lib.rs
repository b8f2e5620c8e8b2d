// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

//! Typed view of the device configuration.
//!
//! Only the tables touched by waveform baking are modelled in detail:
//! elements, pulses, waveforms and digital waveforms. Everything else is
//! kept verbatim so that a load/store round-trip does not lose information.

mod patch;
mod types;

pub use patch::ConfigPatch;
pub use types::{
    Config, DigitalWaveform, Element, MixInputs, Port, Pulse, PulseOperation, PulseWaveforms,
    SingleInput, Waveform,
};

use std::fmt::Display;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Element '{0}' is not defined in the configuration")]
    UnknownElement(String),
    #[error("Entry '{name}' already exists in table '{table}'")]
    DuplicateEntry { table: &'static str, name: String },
    #[error("'{from}' references '{name}', which is missing from table '{table}'")]
    MissingReference {
        table: &'static str,
        name: String,
        from: String,
    },
    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl Error {
    pub fn new<T>(msg: T) -> Self
    where
        T: Display,
    {
        Error::Anyhow(anyhow::anyhow!(msg.to_string()))
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
