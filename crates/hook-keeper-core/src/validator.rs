//! # Validator Module
//!
//! Turns a submitted [`WebhookPayload`] into the normalized field set that
//! storage persists, or into per-field error messages.
//!
//! A submission goes through these steps:
//! 1. The preset is resolved against the [`PresetTable`].
//! 2. Secret placeholders are restored from the bound webhook, or from the
//!    copy source named by the payload's `id`.
//! 3. Every field rule runs. Fields the preset ignores are forced to null
//!    and skip their rule entirely.
//!
//! Rules run independently and all field errors are reported together.
//! Organization and user come from the [`RequestContext`], never from the
//! payload.

use crate::{
    fields::WebhookField,
    policy::{FieldPolicyResolver, UnsetPresetPolicy},
    presets::{PresetId, PresetTable},
    secrets::{EntityLookup, RedactionError, SecretInput, SecretRedactor, SecretValue},
    template::{TemplateContext, TemplateEvaluator, TemplateFailure},
    webhook::{HttpMethod, TriggerType, WebhookConfig, WebhookPayload, PUBLIC_HTTP_METHODS},
    OrganizationId, TeamId, UserId,
};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt};
use tracing::{debug, info, instrument, warn};

const REQUIRED: &str = "is required";
const BLANK: &str = "may not be blank";

// ============================================================================
// Inputs
// ============================================================================

/// Who is submitting, and on behalf of which organization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    pub organization: OrganizationId,
    pub user: UserId,
    /// Team a webhook lands in when the payload names none
    pub current_team: Option<TeamId>,
}

impl RequestContext {
    pub fn new(organization: OrganizationId, user: UserId, current_team: Option<TeamId>) -> Self {
        Self {
            organization,
            user,
            current_team,
        }
    }
}

/// Validator behaviour switches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidatorSettings {
    pub unset_preset_policy: UnsetPresetPolicy,
}

// ============================================================================
// Outputs
// ============================================================================

/// Error messages keyed by the field they belong to
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<WebhookField, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message against a field
    pub fn add(&mut self, field: WebhookField, message: impl Into<String>) {
        self.0.entry(field).or_default().push(message.into());
    }

    /// Messages recorded for a field
    pub fn get(&self, field: WebhookField) -> Option<&[String]> {
        self.0.get(&field).map(Vec::as_slice)
    }

    pub fn contains(&self, field: WebhookField) -> bool {
        self.0.contains_key(&field)
    }

    /// Fields with at least one message
    pub fn fields(&self) -> impl Iterator<Item = WebhookField> + '_ {
        self.0.keys().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|(field, messages)| format!("{}: {}", field, messages.join(", ")))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

/// Validated field set ready to be persisted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedWebhook {
    pub organization: OrganizationId,
    pub team: Option<TeamId>,
    pub user: UserId,
    pub name: String,
    pub is_webhook_enabled: bool,
    pub is_legacy: bool,
    pub username: Option<String>,
    pub password: Option<SecretValue>,
    pub authorization_header: Option<SecretValue>,
    /// Templates are stored raw; rendering happens at delivery time
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

/// Errors for webhook configuration validation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WebhookConfigError {
    #[error("Webhook configuration rejected: {errors}")]
    Rejected { errors: FieldErrors },

    #[error("Source webhook not found: {id}")]
    SourceNotFound { id: String },

    #[error("Webhook lookup failed: {message}")]
    Lookup { message: String },
}

impl WebhookConfigError {
    /// Check if the error is attributable to individual fields
    pub fn is_field_error(&self) -> bool {
        matches!(self, Self::Rejected { .. })
    }

    /// Get user-friendly error message
    pub fn get_user_message(&self) -> String {
        match self {
            Self::Rejected { errors } => format!("Invalid webhook configuration: {}", errors),
            Self::SourceNotFound { id } => format!("Webhook {} does not exist", id),
            Self::Lookup { .. } => {
                "Webhook storage is unavailable, please try again later".to_string()
            }
        }
    }
}

impl From<RedactionError> for WebhookConfigError {
    fn from(err: RedactionError) -> Self {
        match err {
            RedactionError::NotFound { id } => Self::SourceNotFound { id },
            RedactionError::Lookup { message } => Self::Lookup { message },
            RedactionError::PlaceholderWithoutSource { field } => {
                let mut errors = FieldErrors::new();
                errors.add(field.field(), placeholder_message());
                Self::Rejected { errors }
            }
        }
    }
}

fn placeholder_message() -> &'static str {
    "cannot keep an unchanged secret without a source webhook"
}

// ============================================================================
// Validator
// ============================================================================

/// How the submitted preset constrains fields
#[derive(Debug, Clone, Copy)]
enum PresetGate<'p> {
    Selected(&'p str),
    Unset,
    /// The preset is unknown; its error is already recorded
    Unresolved,
}

/// Validates and normalizes webhook configuration submissions
pub struct ConfigurationValidator<'a, E> {
    presets: &'a PresetTable,
    evaluator: E,
    lookup: &'a dyn EntityLookup,
    settings: ValidatorSettings,
}

impl<'a, E: TemplateEvaluator> ConfigurationValidator<'a, E> {
    pub fn new(presets: &'a PresetTable, evaluator: E, lookup: &'a dyn EntityLookup) -> Self {
        Self {
            presets,
            evaluator,
            lookup,
            settings: ValidatorSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: ValidatorSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn settings(&self) -> &ValidatorSettings {
        &self.settings
    }

    /// Validate a submission
    ///
    /// `bound` is the stored webhook being updated, or `None` on create and
    /// copy. On copy the payload's `id` names the source webhook.
    ///
    /// # Errors
    /// - `WebhookConfigError::Rejected` - One or more fields are invalid
    /// - `WebhookConfigError::SourceNotFound` - Copy source not in the organization
    /// - `WebhookConfigError::Lookup` - Storage could not resolve the copy source
    #[instrument(skip_all, fields(organization = %ctx.organization))]
    pub fn validate(
        &self,
        mut payload: WebhookPayload,
        ctx: &RequestContext,
        bound: Option<&WebhookConfig>,
    ) -> Result<NormalizedWebhook, WebhookConfigError> {
        let mut errors = FieldErrors::new();
        let resolver = FieldPolicyResolver::new(self.presets, self.settings.unset_preset_policy);

        let preset = payload
            .preset
            .take()
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty());
        let (gate, preset_id) = self.resolve_preset(preset.as_deref(), &mut errors);
        let is_active = |field: WebhookField, supplied: bool| -> bool {
            let active = match gate {
                PresetGate::Selected(p) => resolver.is_active(field, Some(p), supplied),
                PresetGate::Unset => resolver.is_active(field, None, supplied),
                PresetGate::Unresolved => Ok(true),
            };
            let active = active.unwrap_or(true);
            if !active {
                debug!(field = %field, "Field ignored by preset policy");
            }
            active
        };

        // Secrets are restored before any other rule looks at the payload.
        let source = SecretRedactor::resolve_source(
            bound,
            payload.id.as_deref(),
            &ctx.organization,
            self.lookup,
        )?;
        let failures = SecretRedactor::restore_active(&mut payload, source.as_deref(), |field| {
            is_active(field.field(), true)
        });
        for (field, e) in failures {
            warn!(field = %field, error = %e, "Secret could not be restored");
            errors.add(field.field(), placeholder_message());
        }

        let WebhookPayload {
            name,
            is_webhook_enabled,
            is_legacy,
            team,
            username,
            password,
            authorization_header,
            trigger_template,
            headers,
            url,
            data,
            forward_all,
            http_method,
            trigger_type,
            integration_filter,
            ..
        } = payload;
        let password = password.and_then(SecretInput::into_value);
        let authorization_header = authorization_header.and_then(SecretInput::into_value);

        let name = match name.as_deref().map(str::trim) {
            None => {
                errors.add(WebhookField::Name, REQUIRED);
                String::new()
            }
            Some("") => {
                errors.add(WebhookField::Name, BLANK);
                String::new()
            }
            Some(trimmed) => trimmed.to_string(),
        };

        let trigger_template = if is_active(WebhookField::TriggerTemplate, true) {
            self.check_template(WebhookField::TriggerTemplate, trigger_template, &mut errors)
        } else {
            None
        };
        let headers = if is_active(WebhookField::Headers, true) {
            self.check_template(WebhookField::Headers, headers, &mut errors)
        } else {
            None
        };
        let data = if is_active(WebhookField::Data, true) {
            self.check_template(WebhookField::Data, data, &mut errors)
        } else {
            None
        };

        let url = url.filter(|u| !u.trim().is_empty());
        let url = if !is_active(WebhookField::Url, url.is_some()) {
            None
        } else if url.is_none() {
            errors.add(WebhookField::Url, REQUIRED);
            None
        } else {
            self.check_template(WebhookField::Url, url, &mut errors)
        };

        let http_method = http_method.filter(|m| !m.trim().is_empty());
        let http_method = if is_active(WebhookField::HttpMethod, http_method.is_some()) {
            let parsed = http_method
                .as_deref()
                .and_then(|m| m.parse::<HttpMethod>().ok())
                .filter(HttpMethod::is_public);
            if parsed.is_none() {
                errors.add(WebhookField::HttpMethod, public_methods_message());
            }
            parsed
        } else {
            None
        };

        let trigger_type = trigger_type
            .filter(|t| !matches!(t, serde_json::Value::String(s) if s.trim().is_empty()));
        let trigger_type = if is_active(WebhookField::TriggerType, trigger_type.is_some()) {
            let parsed = trigger_type.as_ref().and_then(TriggerType::from_json);
            if parsed.is_none() {
                errors.add(WebhookField::TriggerType, REQUIRED);
            }
            parsed
        } else {
            None
        };

        let forward_all = is_active(WebhookField::ForwardAll, true) && forward_all.unwrap_or(false);
        let is_webhook_enabled = if is_active(WebhookField::IsWebhookEnabled, true) {
            is_webhook_enabled.unwrap_or(true)
        } else {
            true
        };
        let is_legacy = is_active(WebhookField::IsLegacy, true) && is_legacy.unwrap_or(false);
        let username = username
            .filter(|u| !u.is_empty())
            .filter(|_| is_active(WebhookField::Username, true));
        let integration_filter =
            integration_filter.filter(|_| is_active(WebhookField::IntegrationFilter, true));

        if !errors.is_empty() {
            info!(fields = errors.len(), "Webhook configuration rejected");
            return Err(WebhookConfigError::Rejected { errors });
        }

        Ok(NormalizedWebhook {
            organization: ctx.organization.clone(),
            team: team.unwrap_or_else(|| ctx.current_team.clone()),
            user: bound.map_or_else(|| ctx.user.clone(), |b| b.user.clone()),
            name,
            is_webhook_enabled,
            is_legacy,
            username,
            password,
            authorization_header,
            trigger_template,
            headers,
            url,
            data,
            forward_all,
            http_method,
            trigger_type,
            integration_filter,
            preset: preset_id,
        })
    }

    fn resolve_preset<'p>(
        &self,
        preset: Option<&'p str>,
        errors: &mut FieldErrors,
    ) -> (PresetGate<'p>, Option<PresetId>) {
        let Some(raw) = preset else {
            return (PresetGate::Unset, None);
        };

        match self.presets.lookup(raw) {
            Ok(policy) => (PresetGate::Selected(raw), Some(policy.id.clone())),
            Err(e) => {
                warn!(preset = %raw, error = %e, "Unknown preset submitted");
                errors.add(WebhookField::Preset, format!("unknown preset '{}'", raw));
                (PresetGate::Unresolved, None)
            }
        }
    }

    /// Evaluate a template against the synthetic context
    ///
    /// Returns the raw template on success or warning, `None` when empty or
    /// rejected.
    fn check_template(
        &self,
        field: WebhookField,
        template: Option<String>,
        errors: &mut FieldErrors,
    ) -> Option<String> {
        let template = template.filter(|t| !t.is_empty())?;

        match self
            .evaluator
            .evaluate(&template, &TemplateContext::synthetic())
        {
            Ok(_) => Some(template),
            Err(TemplateFailure::Warning { message }) => {
                debug!(field = %field, warning = %message, "Template accepted without proof of correctness");
                Some(template)
            }
            Err(TemplateFailure::Error { message }) => {
                errors.add(field, message);
                None
            }
        }
    }
}

fn public_methods_message() -> String {
    let methods: Vec<&str> = PUBLIC_HTTP_METHODS.iter().map(HttpMethod::as_str).collect();
    format!("must be one of {}", methods.join(", "))
}

#[cfg(test)]
#[path = "validator_tests.rs"]
mod tests;
