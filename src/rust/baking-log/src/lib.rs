// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

//! Logging for the baking crates.
//!
//! Messages go through the `log` facade with the target
//! `baking.rust::<module path>`. Per-command details of a baking session are
//! logged with [`diagnostic!`] and are only emitted after
//! `init_logging(true)`.

use std::sync::atomic::{AtomicBool, Ordering};

#[doc(hidden)]
pub use log as _log;

/// Log target of the calling module.
#[doc(hidden)]
#[macro_export]
macro_rules! target {
    () => {
        concat!("baking.rust::", module_path!())
    };
}

#[macro_export]
macro_rules! info {
    ($($arg:tt)+) => {
        $crate::_log::info!(target: $crate::target!(), $($arg)+)
    };
}

#[macro_export]
macro_rules! warn {
    ($($arg:tt)+) => {
        $crate::_log::warn!(target: $crate::target!(), $($arg)+)
    };
}

/// Info message that is dropped unless diagnostics are enabled.
#[macro_export]
macro_rules! diagnostic {
    ($($arg:tt)+) => {
        if $crate::is_diagnostics_enabled() {
            $crate::_log::info!(target: $crate::target!(), $($arg)+);
        }
    };
}

static DIAGNOSTICS: AtomicBool = AtomicBool::new(false);

#[inline]
pub fn is_diagnostics_enabled() -> bool {
    DIAGNOSTICS.load(Ordering::Relaxed)
}

/// Switch diagnostics on or off.
///
/// No logger is installed here, the embedding application picks the `log`
/// backend.
pub fn init_logging(with_diagnostics: bool) {
    DIAGNOSTICS.store(with_diagnostics, Ordering::Relaxed);
}
