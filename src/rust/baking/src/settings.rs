// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

//! Options of a baking session.
use crate::Result;
use crate::padding::PaddingMethod;

#[derive(Debug, Clone, PartialEq)]
pub struct BakingOptions {
    padding_method: PaddingMethod,
    session_id: Option<u32>,
    update_config: bool,
}

impl Default for BakingOptions {
    fn default() -> Self {
        BakingOptions {
            padding_method: PaddingMethod::default(),
            session_id: None,
            update_config: true,
        }
    }
}

impl BakingOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn padding_method(mut self, method: PaddingMethod) -> Self {
        self.padding_method = method;
        self
    }

    /// Set the padding method from its name, e.g. `"symmetric_r"`.
    pub fn padding_method_str(self, method: &str) -> Result<Self> {
        Ok(self.padding_method(method.parse()?))
    }

    /// Use a fixed session index instead of allocating the next free one
    /// from the configuration.
    pub fn session_id(mut self, index: u32) -> Self {
        self.session_id = Some(index);
        self
    }

    /// Whether [`crate::Baking::finish`] writes the baked entries into the configuration.
    pub fn update_config(mut self, update: bool) -> Self {
        self.update_config = update;
        self
    }

    pub fn get_padding_method(&self) -> PaddingMethod {
        self.padding_method
    }

    pub fn get_session_id(&self) -> Option<u32> {
        self.session_id
    }

    pub fn get_update_config(&self) -> bool {
        self.update_config
    }
}
