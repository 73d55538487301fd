//! Common test utilities for hook-keeper integration tests
//!
//! Provides a harness wiring the validator to an in-memory store the way a
//! request handler would: validate, then persist, then render the masked
//! view.

use hook_keeper_core::{
    ConfigurationValidator, EntityLookup, InMemoryWebhookStore, JinjaTemplateEvaluator,
    OrganizationId, PresetTable, RequestContext, TeamId, UserId, ValidatorSettings,
    WebhookConfig, WebhookConfigError, WebhookId, WebhookPayload, WebhookView,
};
use serde_json::Value;

/// Errors surfaced by a harness request
#[derive(Debug)]
#[allow(dead_code)]
pub enum RequestError {
    Config(WebhookConfigError),
    Store(hook_keeper_core::StoreError),
}

/// Validator and store wired together
pub struct Harness {
    pub presets: PresetTable,
    pub store: InMemoryWebhookStore,
    pub settings: ValidatorSettings,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_presets(PresetTable::builtin())
    }

    pub fn with_presets(presets: PresetTable) -> Self {
        Self {
            presets,
            store: InMemoryWebhookStore::new(),
            settings: ValidatorSettings::default(),
        }
    }

    /// Create or copy a webhook from a JSON payload
    pub fn create(&self, ctx: &RequestContext, payload: Value) -> Result<WebhookConfig, RequestError> {
        let normalized = self
            .validator()
            .validate(parse(payload), ctx, None)
            .map_err(RequestError::Config)?;
        self.store.create(normalized).map_err(RequestError::Store)
    }

    /// Update a stored webhook from a JSON payload
    pub fn update(
        &self,
        ctx: &RequestContext,
        id: &WebhookId,
        payload: Value,
    ) -> Result<WebhookConfig, RequestError> {
        let bound = self
            .store
            .find(id, &ctx.organization)
            .expect("webhook to update exists");
        let normalized = self
            .validator()
            .validate(parse(payload), ctx, Some(&bound))
            .map_err(RequestError::Config)?;
        self.store.update(id, normalized).map_err(RequestError::Store)
    }

    /// Masked client view of a stored webhook, as JSON
    pub fn view(&self, webhook: &WebhookConfig) -> Value {
        serde_json::to_value(WebhookView::render(webhook, &self.store)).unwrap()
    }

    fn validator(&self) -> ConfigurationValidator<'_, JinjaTemplateEvaluator> {
        ConfigurationValidator::new(&self.presets, JinjaTemplateEvaluator::new(), &self.store)
            .with_settings(self.settings)
    }
}

pub fn parse(payload: Value) -> WebhookPayload {
    serde_json::from_value(payload).expect("payload should deserialize")
}

#[allow(dead_code)]
pub fn ctx(organization: &str, user: &str) -> RequestContext {
    RequestContext::new(
        OrganizationId::new(organization).unwrap(),
        UserId::new(user).unwrap(),
        None,
    )
}

#[allow(dead_code)]
pub fn ctx_with_team(organization: &str, user: &str, team: &str) -> RequestContext {
    RequestContext::new(
        OrganizationId::new(organization).unwrap(),
        UserId::new(user).unwrap(),
        Some(TeamId::new(team).unwrap()),
    )
}
