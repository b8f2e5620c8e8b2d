// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

//! Padding of baked tracks to a hardware-legal waveform length.
use std::fmt;
use std::str::FromStr;

use crate::device_traits::DeviceTraits;
use crate::operation::SampleShape;
use crate::{Error, Result};

/// Where the zeros needed to reach a legal waveform length are placed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum PaddingMethod {
    /// All padding after the samples.
    #[default]
    Right,
    /// All padding before the samples.
    Left,
    /// Split evenly, the odd sample goes before.
    SymmetricL,
    /// Split evenly, the odd sample goes after.
    SymmetricR,
}

impl PaddingMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaddingMethod::Right => "right",
            PaddingMethod::Left => "left",
            PaddingMethod::SymmetricL => "symmetric_l",
            PaddingMethod::SymmetricR => "symmetric_r",
        }
    }

    /// Distribute `pad` zero samples before and after the track.
    pub fn split(&self, pad: usize) -> PadSplit {
        let half = pad / 2;
        let extra = pad % 2;
        let (before, after) = match self {
            PaddingMethod::Right => (0, pad),
            PaddingMethod::Left => (pad, 0),
            PaddingMethod::SymmetricL => (half + extra, half),
            PaddingMethod::SymmetricR => (half, half + extra),
        };
        PadSplit { before, after }
    }
}

impl FromStr for PaddingMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "right" => Ok(PaddingMethod::Right),
            "left" => Ok(PaddingMethod::Left),
            "symmetric_l" => Ok(PaddingMethod::SymmetricL),
            "symmetric_r" => Ok(PaddingMethod::SymmetricR),
            other => Err(Error::InvalidPaddingMethod(other.to_string())),
        }
    }
}

impl fmt::Display for PaddingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PadSplit {
    pub before: usize,
    pub after: usize,
}

pub fn ceil_to_grid(value: usize, grid: usize) -> usize {
    value + (grid - (value % grid)) % grid
}

/// Smallest legal waveform length that holds `length` samples.
pub fn target_length(length: usize, traits: &DeviceTraits) -> usize {
    ceil_to_grid(
        length.max(traits.min_play_wave.into()),
        traits.sample_multiple.into(),
    )
}

/// Samples of one element after padding, as written to the configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct FinalizedWaveform {
    samples: SampleShape,
    padding: PaddingMethod,
    split: PadSplit,
    digital_marker: Option<String>,
}

impl FinalizedWaveform {
    pub fn samples(&self) -> &SampleShape {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn padding(&self) -> PaddingMethod {
        self.padding
    }

    pub fn split(&self) -> PadSplit {
        self.split
    }

    pub fn digital_marker(&self) -> Option<&str> {
        self.digital_marker.as_deref()
    }
}

fn pad(samples: &[f64], split: PadSplit) -> Vec<f64> {
    let mut out = Vec::with_capacity(split.before + samples.len() + split.after);
    out.resize(split.before, 0.0);
    out.extend_from_slice(samples);
    out.resize(out.len() + split.after, 0.0);
    out
}

/// Pad `samples` to the target length of the device.
pub fn finalize(
    samples: &SampleShape,
    digital_marker: Option<&str>,
    padding: PaddingMethod,
    traits: &DeviceTraits,
) -> FinalizedWaveform {
    let split = padding.split(target_length(samples.len(), traits) - samples.len());
    let samples = match samples {
        SampleShape::Single(s) => SampleShape::Single(pad(s, split)),
        SampleShape::Paired(i, q) => SampleShape::Paired(pad(i, split), pad(q, split)),
    };
    FinalizedWaveform {
        samples,
        padding,
        split,
        digital_marker: digital_marker.map(str::to_string),
    }
}
