//! # Webhook Fields
//!
//! Closed enumeration of every field a webhook configuration payload carries.
//!
//! Presets, field errors and the validator all refer to fields through
//! [`WebhookField`], so a preset table can never name a field the validator
//! does not know about.

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// A field of a webhook configuration payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WebhookField {
    Id,
    Name,
    IsWebhookEnabled,
    IsLegacy,
    Team,
    Username,
    Password,
    AuthorizationHeader,
    TriggerTemplate,
    Headers,
    Url,
    Data,
    ForwardAll,
    HttpMethod,
    TriggerType,
    IntegrationFilter,
    Preset,
}

impl WebhookField {
    /// Every field, in payload order
    pub const ALL: [WebhookField; 17] = [
        Self::Id,
        Self::Name,
        Self::IsWebhookEnabled,
        Self::IsLegacy,
        Self::Team,
        Self::Username,
        Self::Password,
        Self::AuthorizationHeader,
        Self::TriggerTemplate,
        Self::Headers,
        Self::Url,
        Self::Data,
        Self::ForwardAll,
        Self::HttpMethod,
        Self::TriggerType,
        Self::IntegrationFilter,
        Self::Preset,
    ];

    /// Get wire name of the field
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Name => "name",
            Self::IsWebhookEnabled => "is_webhook_enabled",
            Self::IsLegacy => "is_legacy",
            Self::Team => "team",
            Self::Username => "username",
            Self::Password => "password",
            Self::AuthorizationHeader => "authorization_header",
            Self::TriggerTemplate => "trigger_template",
            Self::Headers => "headers",
            Self::Url => "url",
            Self::Data => "data",
            Self::ForwardAll => "forward_all",
            Self::HttpMethod => "http_method",
            Self::TriggerType => "trigger_type",
            Self::IntegrationFilter => "integration_filter",
            Self::Preset => "preset",
        }
    }

    /// Whether a preset may list this field as ignored
    ///
    /// Identity, scope and the preset selection itself are never presettable.
    pub fn is_preset_controllable(&self) -> bool {
        !matches!(self, Self::Id | Self::Name | Self::Team | Self::Preset)
    }

    /// Whether the field is suppressed when no preset is selected
    pub fn is_preset_gated(&self) -> bool {
        matches!(self, Self::Url | Self::HttpMethod | Self::TriggerType)
    }

    /// Whether the field holds a template rendered at delivery time
    pub fn is_templated(&self) -> bool {
        matches!(
            self,
            Self::TriggerTemplate | Self::Headers | Self::Url | Self::Data
        )
    }
}

impl fmt::Display for WebhookField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WebhookField {
    type Err = FieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|field| field.as_str() == s)
            .ok_or_else(|| FieldError::UnknownField {
                name: s.to_string(),
            })
    }
}

/// Secret fields that are masked on output and restorable on input
///
/// Username is deliberately absent: it is not a secret.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecretField {
    Password,
    AuthorizationHeader,
}

impl SecretField {
    /// Every secret field
    pub const ALL: [SecretField; 2] = [Self::Password, Self::AuthorizationHeader];

    /// Get the payload field this secret lives in
    pub fn field(&self) -> WebhookField {
        match self {
            Self::Password => WebhookField::Password,
            Self::AuthorizationHeader => WebhookField::AuthorizationHeader,
        }
    }
}

impl fmt::Display for SecretField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.field().as_str())
    }
}

/// Errors for field name parsing
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FieldError {
    #[error("Unknown webhook field: {name}")]
    UnknownField { name: String },
}

#[cfg(test)]
#[path = "fields_tests.rs"]
mod tests;
