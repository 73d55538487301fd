//! # Secrets Module
//!
//! Masking and restoration of the secret fields of a webhook
//! (password and authorization header).
//!
//! Secrets leave the system only as [`FIELD_PLACEHOLDER`]. When a client
//! sends the placeholder back, the stored value is kept. On a copy there is
//! no stored entity yet, so the stored value is looked up through the source
//! webhook named by the payload's `id`.

use crate::{
    fields::SecretField,
    webhook::{WebhookConfig, WebhookPayload},
    OrganizationId, WebhookId,
};
use serde::{Deserialize, Serialize};
use std::{borrow::Cow, fmt};
use tracing::debug;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Reserved token standing in for a stored secret
///
/// Returned in place of every non-empty secret and recognised on input as
/// "keep the stored value". A real secret can therefore never be this string.
pub const FIELD_PLACEHOLDER: &str = "****************";

// ============================================================================
// Secret Containers
// ============================================================================

/// Secure container for secret values
///
/// The value is zeroed on drop and never included in `Debug` output.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
#[serde(transparent)]
pub struct SecretValue(String);

impl SecretValue {
    /// Create secret value from string
    pub fn from_string(value: String) -> Self {
        Self(value)
    }

    /// Get secret as string (only for immediate use)
    pub fn expose_secret(&self) -> &str {
        &self.0
    }

    /// Check if secret is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Get secret length without exposing content
    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl fmt::Debug for SecretValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretValue")
            .field("length", &self.len())
            .field("value", &"[REDACTED]")
            .finish()
    }
}

/// Secret as submitted by a client
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum SecretInput {
    /// The placeholder token: keep whatever is stored
    Unchanged,
    /// An explicit new value
    Value(SecretValue),
}

impl From<String> for SecretInput {
    fn from(raw: String) -> Self {
        if raw == FIELD_PLACEHOLDER {
            Self::Unchanged
        } else {
            Self::Value(SecretValue::from_string(raw))
        }
    }
}

impl SecretInput {
    /// The explicit value, if one was submitted
    pub fn into_value(self) -> Option<SecretValue> {
        match self {
            Self::Unchanged => None,
            Self::Value(value) => Some(value),
        }
    }
}

impl From<&str> for SecretInput {
    fn from(raw: &str) -> Self {
        Self::from(raw.to_string())
    }
}

/// Outward facing values of the credential fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MaskedSecrets {
    /// Passed through: usernames are not secret
    pub username: Option<String>,
    pub password: Option<String>,
    pub authorization_header: Option<String>,
}

// ============================================================================
// Entity Lookup
// ============================================================================

/// Storage lookup of webhooks by public identifier within an organization
pub trait EntityLookup: Send + Sync {
    /// Find a webhook owned by `organization`
    ///
    /// # Errors
    /// - `LookupError::NotFound` - No such webhook in the organization
    /// - `LookupError::Backend` - Storage could not answer
    fn find(
        &self,
        id: &WebhookId,
        organization: &OrganizationId,
    ) -> Result<WebhookConfig, LookupError>;
}

/// Errors returned by an [`EntityLookup`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LookupError {
    #[error("Webhook not found: {id}")]
    NotFound { id: WebhookId },

    #[error("Webhook lookup failed: {message}")]
    Backend { message: String },
}

/// Errors for secret restoration
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RedactionError {
    #[error("Source webhook not found: {id}")]
    NotFound { id: String },

    #[error("Field '{field}' holds the placeholder but there is no webhook to keep it from")]
    PlaceholderWithoutSource { field: SecretField },

    #[error("Source webhook lookup failed: {message}")]
    Lookup { message: String },
}

impl From<LookupError> for RedactionError {
    fn from(err: LookupError) -> Self {
        match err {
            LookupError::NotFound { id } => Self::NotFound {
                id: id.as_str().to_string(),
            },
            LookupError::Backend { message } => Self::Lookup { message },
        }
    }
}

// ============================================================================
// Redactor
// ============================================================================

/// Masks secrets for output and restores them from placeholders on input
pub struct SecretRedactor;

impl SecretRedactor {
    /// Replace every non-empty stored secret with the placeholder
    pub fn mask(config: &WebhookConfig) -> MaskedSecrets {
        MaskedSecrets {
            username: config.username.clone(),
            password: Self::mask_value(config.password.as_ref()),
            authorization_header: Self::mask_value(config.authorization_header.as_ref()),
        }
    }

    fn mask_value(value: Option<&SecretValue>) -> Option<String> {
        value
            .filter(|v| !v.is_empty())
            .map(|_| FIELD_PLACEHOLDER.to_string())
    }

    /// Decide which stored webhook placeholders are restored from
    ///
    /// The bound webhook wins. Without one, the payload's source id (copy) is
    /// looked up inside `organization`. A blank source id counts as none.
    ///
    /// # Errors
    /// - `RedactionError::NotFound` - The source id is malformed or does not exist in scope
    /// - `RedactionError::Lookup` - Storage could not answer
    pub fn resolve_source<'a>(
        bound: Option<&'a WebhookConfig>,
        source_id: Option<&str>,
        organization: &OrganizationId,
        lookup: &dyn EntityLookup,
    ) -> Result<Option<Cow<'a, WebhookConfig>>, RedactionError> {
        if let Some(bound) = bound {
            return Ok(Some(Cow::Borrowed(bound)));
        }

        let Some(raw) = source_id.map(str::trim).filter(|id| !id.is_empty()) else {
            return Ok(None);
        };
        let id = WebhookId::new(raw).map_err(|e| {
            debug!(source = raw, error = %e, "Copy source id is not a webhook id");
            RedactionError::NotFound {
                id: raw.to_string(),
            }
        })?;

        let source = lookup.find(&id, organization)?;
        debug!(source = %id, "Resolved copy source for secret restoration");
        Ok(Some(Cow::Owned(source)))
    }

    /// Resolve the value a single secret field should be stored with
    ///
    /// Empty submissions normalize to `None`.
    ///
    /// # Errors
    /// - `RedactionError::PlaceholderWithoutSource` - Placeholder submitted with no source
    pub fn restore_secret(
        field: SecretField,
        submitted: Option<SecretInput>,
        source: Option<&WebhookConfig>,
    ) -> Result<Option<SecretValue>, RedactionError> {
        match submitted {
            None => Ok(None),
            Some(SecretInput::Value(value)) if value.is_empty() => Ok(None),
            Some(SecretInput::Value(value)) => Ok(Some(value)),
            Some(SecretInput::Unchanged) => {
                let source = source.ok_or(RedactionError::PlaceholderWithoutSource { field })?;
                debug!(field = %field, webhook = %source.id, "Keeping stored secret");
                Ok(stored_secret(source, field).cloned())
            }
        }
    }

    /// Replace placeholders in `payload` with stored values
    ///
    /// # Errors
    /// Returns the first failing field's error, or the source lookup error.
    pub fn restore(
        mut payload: WebhookPayload,
        bound: Option<&WebhookConfig>,
        organization: &OrganizationId,
        lookup: &dyn EntityLookup,
    ) -> Result<WebhookPayload, RedactionError> {
        let source = Self::resolve_source(bound, payload.id.as_deref(), organization, lookup)?;

        match Self::restore_active(&mut payload, source.as_deref(), |_| true)
            .into_iter()
            .next()
        {
            Some((_, err)) => Err(err),
            None => Ok(payload),
        }
    }

    /// Restore every secret field of `payload` for which `is_active` holds
    ///
    /// Inactive fields are cleared without looking at their input. A field
    /// that cannot be restored is cleared and reported, and the remaining
    /// fields are still processed.
    pub fn restore_active(
        payload: &mut WebhookPayload,
        source: Option<&WebhookConfig>,
        mut is_active: impl FnMut(SecretField) -> bool,
    ) -> Vec<(SecretField, RedactionError)> {
        let mut failures = Vec::new();

        for field in SecretField::ALL {
            let submitted = payload.secret(field).cloned();
            let restored = if is_active(field) {
                Self::restore_secret(field, submitted, source).unwrap_or_else(|e| {
                    failures.push((field, e));
                    None
                })
            } else {
                None
            };
            payload.set_secret(field, restored.map(SecretInput::Value));
        }

        failures
    }
}

fn stored_secret(config: &WebhookConfig, field: SecretField) -> Option<&SecretValue> {
    match field {
        SecretField::Password => config.password.as_ref(),
        SecretField::AuthorizationHeader => config.authorization_header.as_ref(),
    }
}

#[cfg(test)]
#[path = "secrets_tests.rs"]
mod tests;
