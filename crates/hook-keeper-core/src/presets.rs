//! # Presets Module
//!
//! Static table mapping preset identifiers to the fields the preset locks
//! away from the user. A preset describes a known integration whose wiring is
//! fixed; fields it lists as ignored are always stored as null.
//!
//! The table is read-only once built. It ships with built-in presets and can
//! be loaded from a YAML or JSON file:
//!
//! ```yaml
//! presets:
//!   - id: chat_notifier
//!     name: Chat notifier
//!     ignored_fields: [http_method, headers]
//! ```

use crate::fields::WebhookField;
use serde::{Deserialize, Serialize};
use std::{
    borrow::Borrow,
    collections::{BTreeMap, BTreeSet},
    fmt,
    path::Path,
    str::FromStr,
};

static NO_IGNORED_FIELDS: BTreeSet<WebhookField> = BTreeSet::new();

// ============================================================================
// Core Types
// ============================================================================

/// Identifier of an integration preset
///
/// # Validation Rules
/// - Must be 1-64 characters
/// - Must contain only lowercase ASCII letters, digits, `_` and `-`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PresetId(String);

impl PresetId {
    /// Create preset ID with validation
    pub fn new(id: impl Into<String>) -> Result<Self, PresetError> {
        let id = id.into();

        if id.is_empty() || id.len() > 64 {
            return Err(PresetError::InvalidPresetId {
                id,
                reason: "must be 1-64 characters".to_string(),
            });
        }

        if !id
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-')
        {
            return Err(PresetError::InvalidPresetId {
                id,
                reason: "must contain only [a-z0-9_-]".to_string(),
            });
        }

        Ok(Self(id))
    }

    /// Get string representation
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PresetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for PresetId {
    type Err = PresetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for PresetId {
    type Error = PresetError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PresetId> for String {
    fn from(id: PresetId) -> Self {
        id.0
    }
}

impl Borrow<str> for PresetId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Field policy of a single preset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresetPolicy {
    pub id: PresetId,

    /// Display name
    pub name: String,

    #[serde(default)]
    pub description: Option<String>,

    /// Fields forced to null whenever this preset is selected
    #[serde(default)]
    pub ignored_fields: BTreeSet<WebhookField>,
}

#[derive(Debug, Deserialize)]
struct PresetTableFile {
    presets: Vec<PresetPolicy>,
}

/// Read-only lookup table of presets
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PresetTable {
    presets: BTreeMap<PresetId, PresetPolicy>,
}

impl PresetTable {
    /// Presets available without any configuration
    ///
    /// - `advanced_webhook`: every field is user controlled
    /// - `simple_webhook`: only url and trigger type are user controlled; the
    ///   full event is forwarded as is
    pub fn builtin() -> Self {
        let advanced = PresetPolicy {
            id: PresetId("advanced_webhook".to_string()),
            name: "Advanced webhook".to_string(),
            description: Some(
                "Full control over method, headers, payload and credentials".to_string(),
            ),
            ignored_fields: BTreeSet::new(),
        };

        let simple = PresetPolicy {
            id: PresetId("simple_webhook".to_string()),
            name: "Simple webhook".to_string(),
            description: Some("POST the complete event to a URL".to_string()),
            ignored_fields: [
                WebhookField::TriggerTemplate,
                WebhookField::Headers,
                WebhookField::Data,
                WebhookField::HttpMethod,
                WebhookField::Username,
                WebhookField::Password,
                WebhookField::AuthorizationHeader,
            ]
            .into_iter()
            .collect(),
        };

        Self {
            presets: [advanced, simple]
                .into_iter()
                .map(|p| (p.id.clone(), p))
                .collect(),
        }
    }

    /// Build a table from preset policies
    ///
    /// # Errors
    /// - `PresetError::ValidationError` - Duplicate ids or non-presettable fields
    pub fn from_policies(policies: Vec<PresetPolicy>) -> Result<Self, PresetError> {
        let mut errors = Vec::new();
        let mut presets = BTreeMap::new();

        for policy in policies {
            for field in &policy.ignored_fields {
                if !field.is_preset_controllable() {
                    errors.push(format!(
                        "Preset '{}': field '{}' cannot be ignored by a preset",
                        policy.id, field
                    ));
                }
            }

            if presets.contains_key(&policy.id) {
                errors.push(format!("Duplicate preset id: {}", policy.id));
                continue;
            }

            presets.insert(policy.id.clone(), policy);
        }

        if !errors.is_empty() {
            return Err(PresetError::ValidationError { errors });
        }

        Ok(Self { presets })
    }

    /// Load presets from a YAML or JSON file
    ///
    /// # Errors
    /// - `PresetError::FileNotFound` - File missing
    /// - `PresetError::ParseError` - Invalid YAML/JSON syntax
    /// - `PresetError::ValidationError` - Invalid table contents
    pub fn load_from_file(path: &Path) -> Result<Self, PresetError> {
        if !path.exists() {
            return Err(PresetError::FileNotFound {
                path: path.display().to_string(),
            });
        }

        let contents = std::fs::read_to_string(path).map_err(|e| PresetError::ParseError {
            message: format!("Failed to read file: {}", e),
        })?;

        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");

        let file: PresetTableFile = match extension.to_lowercase().as_str() {
            "yaml" | "yml" => {
                serde_yaml::from_str(&contents).map_err(|e| PresetError::ParseError {
                    message: format!("Invalid YAML: {}", e),
                })?
            }
            "json" => serde_json::from_str(&contents).map_err(|e| PresetError::ParseError {
                message: format!("Invalid JSON: {}", e),
            })?,
            _ => serde_json::from_str(&contents)
                .or_else(|_| serde_yaml::from_str(&contents))
                .map_err(|e| PresetError::ParseError {
                    message: format!("Failed to parse as JSON or YAML: {}", e),
                })?,
        };

        Self::from_policies(file.presets)
    }

    /// Look up a preset by id
    pub fn lookup(&self, id: &str) -> Result<&PresetPolicy, PresetError> {
        self.presets
            .get(id)
            .ok_or_else(|| PresetError::UnknownPreset {
                preset: id.to_string(),
            })
    }

    /// Fields ignored by `preset`; nothing is ignored when no preset is given
    pub fn ignored_fields(
        &self,
        preset: Option<&str>,
    ) -> Result<&BTreeSet<WebhookField>, PresetError> {
        match preset {
            Some(id) => self.lookup(id).map(|p| &p.ignored_fields),
            None => Ok(&NO_IGNORED_FIELDS),
        }
    }

    /// Iterate presets ordered by id
    pub fn policies(&self) -> impl Iterator<Item = &PresetPolicy> {
        self.presets.values()
    }

    pub fn len(&self) -> usize {
        self.presets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }
}

/// Errors for preset table operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PresetError {
    #[error("Unknown preset: {preset}")]
    UnknownPreset { preset: String },

    #[error("Invalid preset id '{id}': {reason}")]
    InvalidPresetId { id: String, reason: String },

    #[error("Preset file not found: {path}")]
    FileNotFound { path: String },

    #[error("Failed to parse preset file: {message}")]
    ParseError { message: String },

    #[error("Preset table validation failed: {errors:?}")]
    ValidationError { errors: Vec<String> },
}

#[cfg(test)]
#[path = "presets_tests.rs"]
mod tests;
