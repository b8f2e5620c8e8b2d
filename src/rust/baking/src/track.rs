// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

use baking_log::warn;

use crate::Result;
use crate::compositor;
use crate::operation::SampleShape;

/// Mutable sample buffer of one element during a baking session.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementTrack {
    samples: SampleShape,
    /// Insertion index for the next play, set by a negative wait.
    pending_offset: Option<i64>,
    /// End of the most recently placed operation.
    cursor: usize,
    /// Accumulated frame rotation in radians, applied to subsequent I/Q plays.
    frame_phase: f64,
    digital_marker: Option<String>,
}

impl ElementTrack {
    pub fn new(paired: bool) -> Self {
        ElementTrack {
            samples: SampleShape::zeros(paired, 0),
            pending_offset: None,
            cursor: 0,
            frame_phase: 0.0,
            digital_marker: None,
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn is_paired(&self) -> bool {
        self.samples.is_paired()
    }

    pub fn samples(&self) -> &SampleShape {
        &self.samples
    }

    pub fn pending_offset(&self) -> Option<i64> {
        self.pending_offset
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn frame_phase(&self) -> f64 {
        self.frame_phase
    }

    pub fn digital_marker(&self) -> Option<&str> {
        self.digital_marker.as_deref()
    }

    /// Place `samples` on the track and return the resolved start index.
    ///
    /// With `index` set the samples go exactly there and any pending offset is
    /// dropped. Otherwise a pending offset is consumed if present, else the
    /// samples are appended.
    pub(crate) fn play(&mut self, samples: &SampleShape, index: Option<i64>) -> Result<usize> {
        let pending = self.pending_offset.take();
        let index = index.or(pending).unwrap_or(self.len() as i64);
        let start = compositor::insert(&mut self.samples, samples, index)?;
        self.cursor = start + samples.len();
        Ok(start)
    }

    /// Append `length` zero samples.
    pub(crate) fn wait(&mut self, length: usize) {
        let target = self.len() + length;
        compositor::extend_to(&mut self.samples, target);
        self.cursor = target;
    }

    /// Insert the next play at `offset` samples from the current end.
    ///
    /// A pending offset that was not consumed yet is replaced.
    pub(crate) fn set_pending_offset(&mut self, offset: i64) {
        self.pending_offset = Some(offset);
    }

    pub(crate) fn extend_to(&mut self, length: usize) {
        compositor::extend_to(&mut self.samples, length);
    }

    pub(crate) fn delete(&mut self, start: usize, end: usize) -> Result<()> {
        compositor::delete(&mut self.samples, start, end)?;
        self.cursor = self.cursor.min(self.len());
        Ok(())
    }

    pub(crate) fn rotate_frame(&mut self, angle: f64) {
        self.frame_phase += angle;
    }

    pub(crate) fn reset_frame(&mut self) {
        self.frame_phase = 0.0;
    }

    /// Keep the first digital marker played on this track.
    pub(crate) fn record_digital_marker(&mut self, element: &str, marker: Option<&str>) {
        let Some(marker) = marker else {
            return;
        };
        match &self.digital_marker {
            None => self.digital_marker = Some(marker.to_string()),
            Some(current) if current != marker => {
                warn!(
                    "Element '{}' already plays digital marker '{}', ignoring '{}'",
                    element, current, marker
                );
            }
            Some(_) => {}
        }
    }
}
