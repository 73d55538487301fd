//! # Hook-Keeper Core
//!
//! Validation and normalization core for outbound webhook configurations.
//!
//! Every create, update or copy of a webhook configuration runs through this
//! crate before it reaches storage. The core:
//! - evaluates user supplied templates against a synthetic payload,
//! - masks secret fields on the way out and restores them on the way in,
//! - applies preset driven field policies that make fields required,
//!   optional or ignored.
//!
//! ## Architecture
//!
//! Storage and the template engine sit behind traits
//! ([`EntityLookup`], [`ResponseLogSource`], [`TemplateEvaluator`]) so the
//! validator can be driven by any backend. All operations are synchronous and
//! hold no state between requests.
//!
//! ## Usage
//!
//! ```rust
//! use hook_keeper_core::{
//!     adapters::InMemoryWebhookStore, ConfigurationValidator, JinjaTemplateEvaluator,
//!     OrganizationId, PresetTable, RequestContext, UserId, WebhookPayload,
//! };
//!
//! let presets = PresetTable::builtin();
//! let store = InMemoryWebhookStore::new();
//! let validator = ConfigurationValidator::new(&presets, JinjaTemplateEvaluator::new(), &store);
//!
//! let ctx = RequestContext::new(
//!     OrganizationId::new("O1").unwrap(),
//!     UserId::new("U1").unwrap(),
//!     None,
//! );
//! let payload: WebhookPayload = serde_json::from_value(serde_json::json!({
//!     "name": "notify",
//!     "url": "https://example.com/{{ alert_payload.id }}",
//!     "http_method": "POST",
//!     "trigger_type": 1,
//! }))
//! .unwrap();
//!
//! let normalized = validator.validate(payload, &ctx, None).unwrap();
//! assert_eq!(normalized.url.as_deref(), Some("https://example.com/{{ alert_payload.id }}"));
//! assert!(!normalized.forward_all);
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub use ulid::Ulid;

/// Standard result type for hook-keeper operations
pub type HookKeeperResult<T> = Result<T, HookKeeperError>;

// ============================================================================
// Domain Identifier Types
// ============================================================================

const MAX_IDENTIFIER_LENGTH: usize = 64;

fn validate_identifier(field: &str, value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.len() > MAX_IDENTIFIER_LENGTH {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max_length: MAX_IDENTIFIER_LENGTH,
        });
    }

    if !value.chars().all(|c| c.is_ascii_graphic()) {
        return Err(ValidationError::InvalidCharacters {
            field: field.to_string(),
            invalid_chars: "non-ASCII or whitespace".to_string(),
        });
    }

    Ok(())
}

/// Public identifier of a webhook configuration
///
/// Stable for the lifetime of the webhook and distinct from any internal
/// storage key. Assigned by storage when a configuration is first created.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WebhookId(String);

impl WebhookId {
    /// Prefix carried by every generated webhook identifier
    pub const PREFIX: &'static str = "WH";

    /// Create webhook ID with validation
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        validate_identifier("id", &value)?;
        Ok(Self(value))
    }

    /// Generate a fresh identifier (`WH` followed by a ULID)
    pub fn generate() -> Self {
        Self(format!("{}{}", Self::PREFIX, Ulid::new()))
    }

    /// Get string representation
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WebhookId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for WebhookId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for WebhookId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<WebhookId> for String {
    fn from(id: WebhookId) -> Self {
        id.0
    }
}

macro_rules! scope_identifier {
    ($(#[$meta:meta])* $name:ident, $field:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Create identifier with validation
            pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
                let value = value.into();
                validate_identifier($field, &value)?;
                Ok(Self(value))
            }

            /// Get string representation
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }

        impl TryFrom<String> for $name {
            type Error = ValidationError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

scope_identifier!(
    /// Organization that owns a webhook. Every webhook belongs to exactly one.
    OrganizationId,
    "organization"
);

scope_identifier!(
    /// Team a webhook is shared with inside its organization
    TeamId,
    "team"
);

scope_identifier!(
    /// User a webhook belongs to
    UserId,
    "user"
);

// ============================================================================
// Time Types
// ============================================================================

/// UTC timestamp used by response logs
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Create timestamp for current moment
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Parse timestamp from RFC3339 string
    pub fn from_rfc3339(s: &str) -> Result<Self, ParseError> {
        let dt = DateTime::parse_from_rfc3339(s)
            .map_err(|_| ParseError::InvalidFormat {
                expected: "RFC3339 datetime".to_string(),
                actual: s.to_string(),
            })?
            .with_timezone(&Utc);
        Ok(Self(dt))
    }

    /// Convert to RFC3339 string
    pub fn to_rfc3339(&self) -> String {
        self.0.to_rfc3339()
    }

    /// Get underlying DateTime
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

// ============================================================================
// Error Types
// ============================================================================

/// High-level error categorization for reporting decisions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCategory {
    /// Temporary failures that may succeed on retry
    Transient,
    /// Failures the caller has to fix before resubmitting
    Permanent,
    /// Configuration errors preventing startup
    Configuration,
}

/// Error type for input validation failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
pub enum ValidationError {
    #[error("Field '{field}' is required")]
    Required { field: String },

    #[error("Field '{field}' has invalid format: {message}")]
    InvalidFormat { field: String, message: String },

    #[error("Field '{field}' exceeds maximum length of {max_length}")]
    TooLong { field: String, max_length: usize },

    #[error("Field '{field}' contains invalid characters: {invalid_chars}")]
    InvalidCharacters {
        field: String,
        invalid_chars: String,
    },
}

/// Error type for string parsing failures
#[derive(Debug, Clone, thiserror::Error)]
pub enum ParseError {
    #[error("Invalid format: expected {expected}, got '{actual}'")]
    InvalidFormat { expected: String, actual: String },
}

/// Top-level error type for hook-keeper operations
#[derive(Debug, thiserror::Error)]
pub enum HookKeeperError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Preset error: {0}")]
    Preset(#[from] PresetError),

    #[error("Webhook configuration error: {0}")]
    WebhookConfig(#[from] WebhookConfigError),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}

impl HookKeeperError {
    /// Check if error is transient and the request may be retried unchanged
    pub fn is_transient(&self) -> bool {
        match self {
            Self::WebhookConfig(WebhookConfigError::Lookup { .. }) => true,
            Self::Store(StoreError::Io { .. }) => true,
            _ => false,
        }
    }

    /// Get error category for reporting
    pub fn error_category(&self) -> ErrorCategory {
        if self.is_transient() {
            return ErrorCategory::Transient;
        }

        match self {
            Self::Preset(_) => ErrorCategory::Configuration,
            _ => ErrorCategory::Permanent,
        }
    }
}

// ============================================================================
// Module declarations
// ============================================================================

/// Closed enumeration of webhook configuration fields
pub mod fields;

/// Webhook entity, inbound payload and outbound view types
pub mod webhook;

/// Preset policy table
pub mod presets;

/// Preset driven field policy resolution
pub mod policy;

/// Secret field masking and restoration
pub mod secrets;

/// Template evaluator contract and minijinja implementation
pub mod template;

/// Configuration validator orchestrating every field rule
pub mod validator;

/// Storage adapters module for infrastructure implementations
pub mod adapters;

// Re-export key types for convenience
pub use adapters::{InMemoryWebhookStore, StoreError, StoreSnapshot};
pub use fields::{FieldError, SecretField, WebhookField};
pub use policy::{FieldPolicyResolver, UnsetPresetPolicy};
pub use presets::{PresetError, PresetId, PresetPolicy, PresetTable};
pub use secrets::{
    EntityLookup, LookupError, MaskedSecrets, RedactionError, SecretInput, SecretRedactor,
    SecretValue, FIELD_PLACEHOLDER,
};
pub use template::{
    JinjaTemplateEvaluator, TemplateContext, TemplateEvaluator, TemplateFailure,
    SYNTHETIC_ALERT_GROUP_ID,
};
pub use validator::{
    ConfigurationValidator, FieldErrors, NormalizedWebhook, RequestContext, ValidatorSettings,
    WebhookConfigError,
};
pub use webhook::{
    HttpMethod, ResponseLogSource, TriggerType, WebhookConfig, WebhookPayload,
    WebhookResponseLog, WebhookView, PUBLIC_HTTP_METHODS,
};

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;

#[cfg(test)]
mod testing;
