// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

//! Sample composition on element tracks.
//!
//! All placement goes through [`insert`]: new samples are *added* onto the
//! track starting at an index, so overlapping operations superpose. A track
//! is zero-extended when the new samples reach past its end, which also
//! covers plain appends and gaps left by placing samples beyond the end.

use crate::operation::SampleShape;
use crate::{Error, Result};

/// Resolve a possibly negative index against a track of `length` samples.
///
/// Negative indices count back from the end of the track.
pub fn resolve_index(length: usize, index: i64) -> Result<usize> {
    let resolved = if index < 0 {
        length as i64 + index
    } else {
        index
    };
    usize::try_from(resolved).map_err(|_| Error::IndexOutOfRange { index, length })
}

fn overlay(buffer: &mut Vec<f64>, samples: &[f64], start: usize) {
    let required = start + samples.len();
    if required > buffer.len() {
        buffer.resize(required, 0.0);
    }
    for (target, value) in buffer[start..required].iter_mut().zip(samples) {
        *target += value;
    }
}

/// Add `samples` onto `track` starting at `index` and return the resolved start index.
///
/// The index is resolved against the length of the track at the time of the call.
pub fn insert(track: &mut SampleShape, samples: &SampleShape, index: i64) -> Result<usize> {
    let start = resolve_index(track.len(), index)?;
    match (track, samples) {
        (SampleShape::Single(buffer), SampleShape::Single(new)) => overlay(buffer, new, start),
        (SampleShape::Paired(i, q), SampleShape::Paired(new_i, new_q)) => {
            overlay(i, new_i, start);
            overlay(q, new_q, start);
        }
        _ => {
            return Err(Error::new(format!(
                "Cannot insert {} samples into a {} track",
                if samples.is_paired() { "I/Q" } else { "single" },
                if samples.is_paired() { "single" } else { "I/Q" },
            )));
        }
    }
    Ok(start)
}

/// Add `samples` at the end of `track`.
pub fn append(track: &mut SampleShape, samples: &SampleShape) -> Result<usize> {
    let end = track.len() as i64;
    insert(track, samples, end)
}

/// Zero-extend `track` to `length` samples. Longer tracks are left untouched.
pub fn extend_to(track: &mut SampleShape, length: usize) {
    match track {
        SampleShape::Single(samples) if samples.len() < length => samples.resize(length, 0.0),
        SampleShape::Paired(i, q) if i.len() < length => {
            i.resize(length, 0.0);
            q.resize(length, 0.0);
        }
        _ => {}
    }
}

/// Remove the samples in `start..end`, clamped to the track.
pub fn delete(track: &mut SampleShape, start: usize, end: usize) -> Result<()> {
    if start > end {
        return Err(Error::IndexOutOfRange {
            index: start as i64,
            length: track.len(),
        });
    }
    let length = track.len();
    let range = start.min(length)..end.min(length);
    match track {
        SampleShape::Single(samples) => {
            samples.drain(range);
        }
        SampleShape::Paired(i, q) => {
            i.drain(range.clone());
            q.drain(range);
        }
    }
    Ok(())
}

/// Linear ramp of `duration` samples from 0 to `amplitude`.
pub fn ramp(amplitude: f64, duration: usize) -> Vec<f64> {
    match duration {
        0 => vec![],
        1 => vec![0.0],
        _ => {
            let last = (duration - 1) as f64;
            (0..duration)
                .map(|t| amplitude * t as f64 / last)
                .collect()
        }
    }
}
