// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

/// Waveform length constraints of the target controller.
pub struct DeviceTraits {
    /// Waveform lengths must be a multiple of this many samples.
    pub sample_multiple: u16,
    /// Shortest waveform the controller can play, in samples.
    pub min_play_wave: u16,
}

pub const OPX_TRAITS: DeviceTraits = DeviceTraits {
    sample_multiple: 4,
    min_play_wave: 16,
};
