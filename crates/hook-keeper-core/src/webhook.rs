//! # Webhook Module
//!
//! Types describing an outbound webhook configuration in its three shapes:
//! - [`WebhookPayload`]: what a client submits on create, update or copy,
//! - [`WebhookConfig`]: what storage holds after validation,
//! - [`WebhookView`]: what a client gets back, with secrets masked.
//!
//! [`WebhookResponseLog`] is a read-only projection of a delivery attempt,
//! owned by the delivery subsystem.

use crate::{
    presets::PresetId,
    secrets::{SecretInput, SecretRedactor, SecretValue},
    validator::NormalizedWebhook,
    OrganizationId, ParseError, TeamId, Timestamp, UserId, WebhookId,
};
use serde::{Deserialize, Deserializer, Serialize};
use std::{fmt, str::FromStr};

// ============================================================================
// Enumerated Fields
// ============================================================================

/// HTTP method used when a webhook fires
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Options,
    Patch,
}

/// Methods a client may select for a webhook
pub const PUBLIC_HTTP_METHODS: [HttpMethod; 5] = [
    HttpMethod::Get,
    HttpMethod::Post,
    HttpMethod::Put,
    HttpMethod::Delete,
    HttpMethod::Options,
];

impl HttpMethod {
    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
            Self::Options => "OPTIONS",
            Self::Patch => "PATCH",
        }
    }

    /// Whether clients may select this method
    pub fn is_public(&self) -> bool {
        PUBLIC_HTTP_METHODS.contains(self)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GET" => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "DELETE" => Ok(Self::Delete),
            "OPTIONS" => Ok(Self::Options),
            "PATCH" => Ok(Self::Patch),
            _ => Err(ParseError::InvalidFormat {
                expected: "GET, POST, PUT, DELETE, OPTIONS or PATCH".to_string(),
                actual: s.to_string(),
            }),
        }
    }
}

/// Event that causes a webhook to fire
///
/// Serialized as its stable integer code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum TriggerType {
    EscalationStep,
    AlertGroupCreated,
    Acknowledged,
    Resolved,
    Silenced,
    Unsilenced,
    Unresolved,
    Unacknowledged,
}

impl TriggerType {
    /// Every trigger type, ordered by code
    pub const ALL: [TriggerType; 8] = [
        Self::EscalationStep,
        Self::AlertGroupCreated,
        Self::Acknowledged,
        Self::Resolved,
        Self::Silenced,
        Self::Unsilenced,
        Self::Unresolved,
        Self::Unacknowledged,
    ];

    /// Get stable integer code
    pub fn code(&self) -> u8 {
        match self {
            Self::EscalationStep => 0,
            Self::AlertGroupCreated => 1,
            Self::Acknowledged => 2,
            Self::Resolved => 3,
            Self::Silenced => 4,
            Self::Unsilenced => 5,
            Self::Unresolved => 6,
            Self::Unacknowledged => 7,
        }
    }

    /// Get human readable name
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::EscalationStep => "Escalation step",
            Self::AlertGroupCreated => "Alert Group Created",
            Self::Acknowledged => "Acknowledged",
            Self::Resolved => "Resolved",
            Self::Silenced => "Silenced",
            Self::Unsilenced => "Unsilenced",
            Self::Unresolved => "Unresolved",
            Self::Unacknowledged => "Unacknowledged",
        }
    }

    /// Look up trigger type by code
    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.iter().copied().find(|t| t.code() == code)
    }

    /// Interpret a submitted JSON value as a trigger type
    ///
    /// Accepts the integer code or its decimal string form.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Number(n) => n
                .as_u64()
                .and_then(|code| u8::try_from(code).ok())
                .and_then(Self::from_code),
            serde_json::Value::String(s) => s.trim().parse::<u8>().ok().and_then(Self::from_code),
            _ => None,
        }
    }
}

impl TryFrom<u8> for TriggerType {
    type Error = ParseError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Self::from_code(code).ok_or_else(|| ParseError::InvalidFormat {
            expected: "trigger type code 0-7".to_string(),
            actual: code.to_string(),
        })
    }
}

impl From<TriggerType> for u8 {
    fn from(trigger: TriggerType) -> Self {
        trigger.code()
    }
}

// ============================================================================
// Stored Entity
// ============================================================================

/// Validated webhook configuration as held by storage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookConfig {
    pub id: WebhookId,
    pub organization: OrganizationId,
    pub team: Option<TeamId>,
    pub user: UserId,
    pub name: String,
    pub is_webhook_enabled: bool,
    pub is_legacy: bool,
    pub username: Option<String>,
    pub password: Option<SecretValue>,
    pub authorization_header: Option<SecretValue>,
    pub trigger_template: Option<String>,
    pub headers: Option<String>,
    pub url: Option<String>,
    pub data: Option<String>,
    pub forward_all: bool,
    pub http_method: Option<HttpMethod>,
    pub trigger_type: Option<TriggerType>,
    pub integration_filter: Option<Vec<String>>,
    pub preset: Option<PresetId>,
}

impl WebhookConfig {
    /// Build the stored entity from validated fields and a storage assigned id
    pub fn from_normalized(id: WebhookId, normalized: NormalizedWebhook) -> Self {
        Self {
            id,
            organization: normalized.organization,
            team: normalized.team,
            user: normalized.user,
            name: normalized.name,
            is_webhook_enabled: normalized.is_webhook_enabled,
            is_legacy: normalized.is_legacy,
            username: normalized.username,
            password: normalized.password,
            authorization_header: normalized.authorization_header,
            trigger_template: normalized.trigger_template,
            headers: normalized.headers,
            url: normalized.url,
            data: normalized.data,
            forward_all: normalized.forward_all,
            http_method: normalized.http_method,
            trigger_type: normalized.trigger_type,
            integration_filter: normalized.integration_filter,
            preset: normalized.preset,
        }
    }
}

// ============================================================================
// Inbound Payload
// ============================================================================

/// Webhook configuration as submitted by a client
///
/// Organization and user are never read from the payload; unknown keys such
/// as `organization`, `user` or `last_response_log` are ignored. A payload is
/// a full representation: absent fields mean unset.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WebhookPayload {
    /// Source webhook when copying; ignored when a webhook is already bound
    ///
    /// Kept raw so that an id that could never exist resolves as not found.
    pub id: Option<String>,
    pub name: Option<String>,
    pub is_webhook_enabled: Option<bool>,
    pub is_legacy: Option<bool>,
    /// `None` when absent, `Some(None)` when explicitly null
    #[serde(deserialize_with = "deserialize_present")]
    pub team: Option<Option<TeamId>>,
    pub username: Option<String>,
    pub password: Option<SecretInput>,
    pub authorization_header: Option<SecretInput>,
    pub trigger_template: Option<String>,
    pub headers: Option<String>,
    pub url: Option<String>,
    pub data: Option<String>,
    pub forward_all: Option<bool>,
    pub http_method: Option<String>,
    /// Kept raw so that values outside the enumeration reach the validator
    pub trigger_type: Option<serde_json::Value>,
    pub integration_filter: Option<Vec<String>>,
    pub preset: Option<String>,
}

impl WebhookPayload {
    /// Get secret input for a secret field
    pub fn secret(&self, field: crate::SecretField) -> Option<&SecretInput> {
        match field {
            crate::SecretField::Password => self.password.as_ref(),
            crate::SecretField::AuthorizationHeader => self.authorization_header.as_ref(),
        }
    }

    /// Replace the secret input of a secret field
    pub fn set_secret(&mut self, field: crate::SecretField, input: Option<SecretInput>) {
        match field {
            crate::SecretField::Password => self.password = input,
            crate::SecretField::AuthorizationHeader => self.authorization_header = input,
        }
    }
}

fn deserialize_present<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}

// ============================================================================
// Response Logs
// ============================================================================

/// Snapshot of one delivery attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookResponseLog {
    pub timestamp: Timestamp,
    pub url: Option<String>,
    pub request_trigger: Option<String>,
    pub request_headers: Option<String>,
    pub request_data: Option<String>,
    pub status_code: Option<u16>,
    pub content: Option<String>,
    pub event_data: Option<String>,
}

/// Read access to response logs written by the delivery subsystem
pub trait ResponseLogSource: Send + Sync {
    /// Most recent response log for a webhook, if any delivery happened
    fn latest_response(&self, webhook: &WebhookId) -> Option<WebhookResponseLog>;
}

// ============================================================================
// Outbound View
// ============================================================================

/// Client facing representation of a stored webhook
///
/// Secret fields hold either nothing or [`crate::FIELD_PLACEHOLDER`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WebhookView {
    pub id: WebhookId,
    pub name: String,
    pub is_webhook_enabled: bool,
    pub is_legacy: bool,
    pub team: Option<TeamId>,
    pub user: UserId,
    pub username: Option<String>,
    pub password: Option<String>,
    pub authorization_header: Option<String>,
    pub organization: OrganizationId,
    pub trigger_template: Option<String>,
    pub headers: Option<String>,
    pub url: Option<String>,
    pub data: Option<String>,
    pub forward_all: bool,
    pub http_method: Option<HttpMethod>,
    pub trigger_type: Option<TriggerType>,
    pub trigger_type_name: String,
    pub last_response_log: Option<WebhookResponseLog>,
    pub integration_filter: Option<Vec<String>>,
    pub preset: Option<PresetId>,
}

impl WebhookView {
    /// Build the view of a webhook, masking its secrets
    pub fn new(config: &WebhookConfig, last_response_log: Option<WebhookResponseLog>) -> Self {
        let masked = SecretRedactor::mask(config);

        Self {
            id: config.id.clone(),
            name: config.name.clone(),
            is_webhook_enabled: config.is_webhook_enabled,
            is_legacy: config.is_legacy,
            team: config.team.clone(),
            user: config.user.clone(),
            username: masked.username,
            password: masked.password,
            authorization_header: masked.authorization_header,
            organization: config.organization.clone(),
            trigger_template: config.trigger_template.clone(),
            headers: config.headers.clone(),
            url: config.url.clone(),
            data: config.data.clone(),
            forward_all: config.forward_all,
            http_method: config.http_method,
            trigger_type: config.trigger_type,
            trigger_type_name: config
                .trigger_type
                .map(|t| t.display_name().to_string())
                .unwrap_or_default(),
            last_response_log,
            integration_filter: config.integration_filter.clone(),
            preset: config.preset.clone(),
        }
    }

    /// Build the view, pulling the most recent response log from `logs`
    pub fn render(config: &WebhookConfig, logs: &dyn ResponseLogSource) -> Self {
        Self::new(config, logs.latest_response(&config.id))
    }
}

#[cfg(test)]
#[path = "webhook_tests.rs"]
mod tests;
