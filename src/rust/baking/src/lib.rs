// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

//! Waveform baking.
//!
//! A [`Baking`] session composes arbitrary sample sequences per element,
//! sample by sample, and on [`Baking::finish`] pads every element track to a
//! hardware-legal length and writes it into the device configuration as a
//! single operation. The returned [`BakedHandle`] later emits the plays of the
//! baked operations into a [`Program`].

pub mod compositor;
pub mod config_writer;
pub mod device_traits;
pub mod emitter;
pub mod operation;
pub mod padding;
pub mod program;
pub mod session;
pub mod settings;
pub mod track;


pub use config_writer::SessionId;
pub use emitter::BakedHandle;
pub use operation::{Amplitude, OperationDef, OperationRegistry, SampleShape};
pub use padding::{FinalizedWaveform, PadSplit, PaddingMethod};
pub use program::{Program, Statement};
pub use session::{Baking, SessionState};
pub use settings::BakingOptions;
pub use track::ElementTrack;

use std::fmt::Display;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Shape mismatch for '{name}' on element '{element}': {reason}")]
    ShapeMismatch {
        name: String,
        element: String,
        reason: String,
    },
    #[error("Name '{0}' is already bound to different content")]
    NameCollision(String),
    #[error("Operation '{operation}' is not defined for element '{element}'")]
    UnknownOperation { operation: String, element: String },
    #[error("Element '{0}' is not available")]
    UnknownChannel(String),
    #[error("Index {index} is out of range for a track of {length} samples")]
    IndexOutOfRange { index: i64, length: usize },
    #[error(
        "Invalid padding method '{0}', expected one of 'right', 'left', 'symmetric_l', 'symmetric_r'"
    )]
    InvalidPaddingMethod(String),
    #[error("The baking session was aborted by an earlier error")]
    SessionAborted,
    #[error(transparent)]
    Config(qm_config::Error),
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

    pub(crate) fn shape_mismatch(name: &str, element: &str, reason: impl Into<String>) -> Self {
        Error::ShapeMismatch {
            name: name.to_string(),
            element: element.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<qm_config::Error> for Error {
    fn from(error: qm_config::Error) -> Self {
        match error {
            qm_config::Error::UnknownElement(name) => Error::UnknownChannel(name),
            qm_config::Error::DuplicateEntry { table, name } => {
                Error::NameCollision(format!("{table}.{name}"))
            }
            other => Error::Config(other),
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
