//! Shared fixtures for unit tests.

use crate::{
    secrets::{EntityLookup, LookupError, SecretValue},
    validator::NormalizedWebhook,
    webhook::{HttpMethod, TriggerType, WebhookConfig},
    OrganizationId, UserId, WebhookId,
};

pub(crate) fn org(id: &str) -> OrganizationId {
    OrganizationId::new(id).unwrap()
}

pub(crate) fn user(id: &str) -> UserId {
    UserId::new(id).unwrap()
}

pub(crate) fn stored_webhook(id: &str, organization: &str) -> WebhookConfig {
    WebhookConfig {
        id: WebhookId::new(id).unwrap(),
        organization: org(organization),
        team: None,
        user: user("U1"),
        name: format!("webhook-{}", id),
        is_webhook_enabled: true,
        is_legacy: false,
        username: Some("bot".to_string()),
        password: Some(SecretValue::from_string("secret1".to_string())),
        authorization_header: Some(SecretValue::from_string("Bearer abc".to_string())),
        trigger_template: None,
        headers: None,
        url: Some("https://example.com/hook".to_string()),
        data: None,
        forward_all: false,
        http_method: Some(HttpMethod::Post),
        trigger_type: Some(TriggerType::Resolved),
        integration_filter: None,
        preset: None,
    }
}

/// Lookup over a fixed list of webhooks
pub(crate) struct FixedLookup(pub(crate) Vec<WebhookConfig>);

impl EntityLookup for FixedLookup {
    fn find(
        &self,
        id: &WebhookId,
        organization: &OrganizationId,
    ) -> Result<WebhookConfig, LookupError> {
        self.0
            .iter()
            .find(|w| &w.id == id && &w.organization == organization)
            .cloned()
            .ok_or_else(|| LookupError::NotFound { id: id.clone() })
    }
}

/// Lookup whose backend is always down
pub(crate) struct FailingLookup;

impl EntityLookup for FailingLookup {
    fn find(&self, _id: &WebhookId, _org: &OrganizationId) -> Result<WebhookConfig, LookupError> {
        Err(LookupError::Backend {
            message: "storage offline".to_string(),
        })
    }
}

/// Validated field set for a plain webhook
pub(crate) fn normalized(name: &str, organization: &str) -> NormalizedWebhook {
    NormalizedWebhook {
        organization: org(organization),
        team: None,
        user: user("U1"),
        name: name.to_string(),
        is_webhook_enabled: true,
        is_legacy: false,
        username: None,
        password: Some(SecretValue::from_string("pw".to_string())),
        authorization_header: None,
        trigger_template: None,
        headers: None,
        url: Some("https://example.com/hook".to_string()),
        data: None,
        forward_all: false,
        http_method: Some(HttpMethod::Post),
        trigger_type: Some(TriggerType::AlertGroupCreated),
        integration_filter: None,
        preset: None,
    }
}
