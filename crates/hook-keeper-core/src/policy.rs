//! # Field Policy Module
//!
//! Decides, per field, whether the selected preset leaves a field under user
//! control or ignores it.
//!
//! With a preset selected a field is ignored exactly when the preset lists
//! it. Without a preset, the preset-gated fields (url, http method, trigger
//! type) are ignored: a webhook without a preset has no known wiring to
//! control. Every other field is active without a preset.
//!
//! Whether a gated field the caller explicitly filled in should still be
//! ignored when no preset is selected is a deployment choice, expressed by
//! [`UnsetPresetPolicy`].

use crate::{
    fields::WebhookField,
    presets::{PresetError, PresetTable},
};
use serde::{Deserialize, Serialize};

/// Treatment of gated fields when no preset is selected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnsetPresetPolicy {
    /// A gated field is active if the caller supplied a value for it
    #[default]
    HonorSupplied,
    /// Gated fields are always ignored
    IgnoreGated,
}

/// Resolves field activity against a preset table
#[derive(Debug, Clone, Copy)]
pub struct FieldPolicyResolver<'a> {
    presets: &'a PresetTable,
    unset_policy: UnsetPresetPolicy,
}

impl<'a> FieldPolicyResolver<'a> {
    pub fn new(presets: &'a PresetTable, unset_policy: UnsetPresetPolicy) -> Self {
        Self {
            presets,
            unset_policy,
        }
    }

    /// Whether `field` is ignored under `preset`
    ///
    /// An empty preset string counts as no preset.
    ///
    /// # Errors
    /// - `PresetError::UnknownPreset` - `preset` is not in the table
    pub fn is_ignored(&self, field: WebhookField, preset: Option<&str>) -> Result<bool, PresetError> {
        match preset.filter(|p| !p.is_empty()) {
            Some(id) => Ok(self.presets.ignored_fields(Some(id))?.contains(&field)),
            None => Ok(field.is_preset_gated()),
        }
    }

    /// Whether `field` should be validated and stored
    ///
    /// `supplied` tells whether the caller sent a non-empty value for the
    /// field; it only matters for gated fields when no preset is selected.
    pub fn is_active(
        &self,
        field: WebhookField,
        preset: Option<&str>,
        supplied: bool,
    ) -> Result<bool, PresetError> {
        let no_preset = preset.map_or(true, str::is_empty);
        if no_preset
            && field.is_preset_gated()
            && supplied
            && self.unset_policy == UnsetPresetPolicy::HonorSupplied
        {
            return Ok(true);
        }

        Ok(!self.is_ignored(field, preset)?)
    }
}

#[cfg(test)]
#[path = "policy_tests.rs"]
mod tests;
