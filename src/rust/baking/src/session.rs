// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

use std::f64::consts::TAU;

use baking_log::{diagnostic, info, warn};
use indexmap::IndexMap;
use qm_config::{Config, DigitalWaveform, PulseWaveforms};

use crate::compositor;
use crate::config_writer::{SessionId, build_patch};
use crate::device_traits::OPX_TRAITS;
use crate::emitter::BakedHandle;
use crate::operation::{Amplitude, OperationDef, OperationRegistry, SampleShape};
use crate::padding;
use crate::settings::BakingOptions;
use crate::track::ElementTrack;
use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Accepting registrations and commands.
    Open,
    /// A command failed. The session can only be dropped.
    Aborted,
}

/// A baking session.
///
/// The session borrows the configuration mutably for its whole lifetime, but
/// only writes to it at the end of a successful [`Baking::finish`]. Any
/// failing command aborts the session; dropping a session without finishing
/// it discards everything that was composed.
pub struct Baking<'a> {
    config: &'a mut Config,
    options: BakingOptions,
    session_id: SessionId,
    state: SessionState,
    registry: OperationRegistry,
    tracks: IndexMap<String, ElementTrack>,
    digital_waveforms: IndexMap<String, DigitalWaveform>,
}

fn is_paired(config: &Config, element: &str) -> Result<bool> {
    Ok(config.element(element)?.is_mixed(element)?)
}

impl<'a> Baking<'a> {
    pub fn new(config: &'a mut Config, options: BakingOptions) -> Self {
        let session_id = options
            .get_session_id()
            .map(SessionId::new)
            .unwrap_or_else(|| SessionId::allocate(config));
        info!(
            "Opening baking session {} with '{}' padding",
            session_id,
            options.get_padding_method()
        );
        Baking {
            config,
            options,
            session_id,
            state: SessionState::Open,
            registry: OperationRegistry::new(),
            tracks: IndexMap::new(),
            digital_waveforms: IndexMap::new(),
        }
    }

    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn options(&self) -> &BakingOptions {
        &self.options
    }

    /// Run a command, aborting the session if it fails.
    fn run<T>(&mut self, command: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        if self.state == SessionState::Aborted {
            return Err(Error::SessionAborted);
        }
        let result = command(&mut *self);
        if let Err(error) = &result {
            warn!("Aborting baking session {}: {}", self.session_id, error);
            self.state = SessionState::Aborted;
        }
        result
    }

    fn track_mut(&mut self, element: &str) -> Result<&mut ElementTrack> {
        if !self.tracks.contains_key(element) {
            let paired = is_paired(self.config, element)?;
            self.tracks
                .insert(element.to_string(), ElementTrack::new(paired));
        }
        self.tracks
            .get_mut(element)
            .ok_or_else(|| Error::UnknownChannel(element.to_string()))
    }

    fn track(&self, element: &str) -> Result<&ElementTrack> {
        self.tracks
            .get(element)
            .ok_or_else(|| Error::UnknownChannel(element.to_string()))
    }

    /// Samples and digital marker of `operation` on `element`.
    ///
    /// Operations registered in this session take precedence over the
    /// operations of the element in the configuration.
    fn template(&self, operation: &str, element: &str) -> Result<(SampleShape, Option<String>)> {
        if let Some(def) = self.registry.get_for_element(operation, element) {
            return Ok((def.samples.clone(), def.digital_marker.clone()));
        }
        let Some(pulse) = self.config.operation_pulse(element, operation)? else {
            return Err(Error::UnknownOperation {
                operation: operation.to_string(),
                element: element.to_string(),
            });
        };
        let samples = match &pulse.waveforms {
            PulseWaveforms::Single { single } => SampleShape::Single(
                self.config
                    .waveform(single, operation)?
                    .expand(pulse.length),
            ),
            PulseWaveforms::Iq { i, q } => SampleShape::Paired(
                self.config.waveform(i, operation)?.expand(pulse.length),
                self.config.waveform(q, operation)?.expand(pulse.length),
            ),
        };
        samples.validate(operation, element, is_paired(self.config, element)?)?;
        Ok((samples, pulse.digital_marker.clone()))
    }

    /// Fail unless `marker` is defined in the configuration or staged in this session.
    fn check_digital_marker(&self, marker: &str, referenced_by: &str) -> Result<()> {
        if self.config.digital_waveforms.contains_key(marker)
            || self.digital_waveforms.contains_key(marker)
        {
            return Ok(());
        }
        Err(qm_config::Error::MissingReference {
            table: "digital_waveforms",
            name: marker.to_string(),
            from: referenced_by.to_string(),
        }
        .into())
    }

    /// Declare a named sample template for `element`.
    ///
    /// A digital marker must be defined in the configuration or registered
    /// with [`Baking::register_digital_waveform`] beforehand.
    pub fn register(
        &mut self,
        name: &str,
        element: &str,
        samples: SampleShape,
        digital_marker: Option<&str>,
    ) -> Result<()> {
        self.run(|session| {
            let paired = is_paired(session.config, element)?;
            if let Some(marker) = digital_marker {
                session.check_digital_marker(marker, name)?;
            }
            session.registry.register(
                OperationDef {
                    name: name.to_string(),
                    element: element.to_string(),
                    samples,
                    digital_marker: digital_marker.map(str::to_string),
                },
                paired,
            )
        })
    }

    /// Stage a digital waveform that is written together with the baked entries.
    pub fn register_digital_waveform(&mut self, name: &str, samples: Vec<(u8, u32)>) -> Result<()> {
        self.run(|session| {
            let waveform = DigitalWaveform { samples };
            let existing = session
                .config
                .digital_waveforms
                .get(name)
                .or_else(|| session.digital_waveforms.get(name));
            match existing {
                Some(existing) if *existing == waveform => Ok(()),
                Some(_) => Err(Error::NameCollision(name.to_string())),
                None => {
                    session.digital_waveforms.insert(name.to_string(), waveform);
                    Ok(())
                }
            }
        })
    }

    fn place(
        &mut self,
        operation: &str,
        element: &str,
        index: Option<i64>,
        amplitude: Amplitude,
    ) -> Result<()> {
        let (samples, marker) = self.template(operation, element)?;
        let samples = samples.scaled(amplitude, operation, element)?;
        let track = self.track_mut(element)?;
        let samples = samples.rotated(track.frame_phase());
        let start = track.play(&samples, index)?;
        track.record_digital_marker(element, marker.as_deref());
        diagnostic!(
            "Placed '{}' on '{}' at sample {}, track length {}",
            operation,
            element,
            start,
            track.len()
        );
        Ok(())
    }

    /// Play `operation` at the end of the track of `element`, or at the offset
    /// left by a preceding negative [`Baking::wait`].
    pub fn play(&mut self, operation: &str, element: &str) -> Result<()> {
        self.play_scaled(operation, element, Amplitude::default())
    }

    pub fn play_scaled(
        &mut self,
        operation: &str,
        element: &str,
        amplitude: Amplitude,
    ) -> Result<()> {
        self.run(|session| session.place(operation, element, None, amplitude))
    }

    /// Add `operation` onto the track of `element` starting at sample `t`.
    ///
    /// A negative `t` counts back from the current end of the track.
    pub fn play_at(&mut self, operation: &str, element: &str, t: i64) -> Result<()> {
        self.play_at_scaled(operation, element, t, Amplitude::default())
    }

    pub fn play_at_scaled(
        &mut self,
        operation: &str,
        element: &str,
        t: i64,
        amplitude: Amplitude,
    ) -> Result<()> {
        self.run(|session| session.place(operation, element, Some(t), amplitude))
    }

    /// Append `duration` zero samples to `element`.
    ///
    /// A negative duration does not add samples; the next play on `element`
    /// starts `-duration` samples before the current end of the track instead.
    pub fn wait(&mut self, duration: i64, element: &str) -> Result<()> {
        self.run(|session| {
            let track = session.track_mut(element)?;
            match usize::try_from(duration) {
                Ok(length) => track.wait(length),
                Err(_) => track.set_pending_offset(duration),
            }
            Ok(())
        })
    }

    /// Pad the listed elements with zeros up to the longest of them.
    ///
    /// An empty list aligns every element touched so far.
    pub fn align(&mut self, elements: &[&str]) -> Result<()> {
        self.run(|session| {
            let elements: Vec<String> = if elements.is_empty() {
                session.tracks.keys().cloned().collect()
            } else {
                elements.iter().map(|e| e.to_string()).collect()
            };
            let mut length = 0;
            for element in &elements {
                length = length.max(session.track_mut(element)?.len());
            }
            for element in &elements {
                session.track_mut(element)?.extend_to(length);
            }
            Ok(())
        })
    }

    /// Rotate the frame of the I/Q samples played after this call by `angle` radians.
    pub fn frame_rotation(&mut self, angle: f64, element: &str) -> Result<()> {
        self.run(|session| {
            let track = session.track_mut(element)?;
            if track.is_paired() {
                track.rotate_frame(angle);
            } else {
                warn!(
                    "Frame rotation has no effect on element '{}' with a single input",
                    element
                );
            }
            Ok(())
        })
    }

    /// Like [`Baking::frame_rotation`], with the angle in units of 2π.
    pub fn frame_rotation_2pi(&mut self, turns: f64, element: &str) -> Result<()> {
        self.frame_rotation(turns * TAU, element)
    }

    /// Undo all frame rotations on `element`.
    pub fn reset_frame(&mut self, element: &str) -> Result<()> {
        self.run(|session| {
            session.track_mut(element)?.reset_frame();
            Ok(())
        })
    }

    /// Phase reset is executed by the controller, it does not change any samples.
    pub fn reset_phase(&mut self, element: &str) -> Result<()> {
        self.run(|session| {
            session.track_mut(element)?;
            diagnostic!("Reset phase on '{}'", element);
            Ok(())
        })
    }

    /// Play a linear ramp from 0 to `amplitude` over `duration` samples.
    ///
    /// On an I/Q element the ramp is played on I.
    pub fn ramp(&mut self, amplitude: f64, duration: usize, element: &str) -> Result<()> {
        self.run(|session| {
            let samples = compositor::ramp(amplitude, duration);
            let track = session.track_mut(element)?;
            let samples = if track.is_paired() {
                SampleShape::Paired(samples, vec![0.0; duration])
            } else {
                SampleShape::Single(samples)
            };
            let samples = samples.rotated(track.frame_phase());
            track.play(&samples, None)?;
            Ok(())
        })
    }

    /// Remove the samples in `start..end` from the track of `element`.
    pub fn delete_samples(&mut self, start: usize, end: usize, element: &str) -> Result<()> {
        self.run(|session| {
            session
                .tracks
                .get_mut(element)
                .ok_or_else(|| Error::UnknownChannel(element.to_string()))?
                .delete(start, end)
        })
    }

    /// Current length in samples of the track of `element`, without padding.
    ///
    /// A query for an untouched element fails without aborting the session.
    pub fn current_length(&self, element: &str) -> Result<usize> {
        Ok(self.track(element)?.len())
    }

    pub fn element_track(&self, element: &str) -> Option<&ElementTrack> {
        self.tracks.get(element)
    }

    /// Elements in the order they were first touched.
    pub fn touched_channels(&self) -> impl Iterator<Item = &str> {
        self.tracks.keys().map(String::as_str)
    }

    /// Pad every track and write the baked entries into the configuration.
    ///
    /// The configuration is only modified if every entry can be written.
    pub fn finish(self) -> Result<BakedHandle> {
        if self.state == SessionState::Aborted {
            return Err(Error::SessionAborted);
        }
        let padding_method = self.options.get_padding_method();
        let mut waveforms = IndexMap::new();
        for (element, track) in &self.tracks {
            let waveform = padding::finalize(
                track.samples(),
                track.digital_marker(),
                padding_method,
                &OPX_TRAITS,
            );
            diagnostic!(
                "Padded '{}' from {} to {} samples ({} before, {} after)",
                element,
                track.len(),
                waveform.len(),
                waveform.split().before,
                waveform.split().after
            );
            waveforms.insert(element.clone(), waveform);
        }
        if self.options.get_update_config() {
            build_patch(
                self.session_id,
                &waveforms,
                &self.digital_waveforms,
                self.config,
            )?
            .apply(self.config)?;
        }
        info!(
            "Finished baking session {} on {} element(s)",
            self.session_id,
            waveforms.len()
        );
        Ok(BakedHandle::new(self.session_id, waveforms))
    }
}
