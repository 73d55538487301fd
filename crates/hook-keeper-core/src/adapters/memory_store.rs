//! # In-Memory Webhook Store
//!
//! Thread-safe in-memory webhook storage for testing, development and the
//! CLI. Implements [`EntityLookup`] and [`ResponseLogSource`] and owns the
//! (name, organization) unique constraint. The whole store can be saved to
//! and loaded from a JSON snapshot file.

use crate::{
    secrets::{EntityLookup, LookupError},
    validator::NormalizedWebhook,
    webhook::{ResponseLogSource, WebhookConfig, WebhookResponseLog},
    OrganizationId, WebhookId,
};
use serde::{Deserialize, Serialize};
use std::{
    collections::{BTreeMap, HashMap},
    path::Path,
    sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard},
};
use tracing::{debug, info, warn};

/// Errors raised by the webhook store
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("Webhook name '{name}' is already used in organization {organization}")]
    DuplicateName {
        name: String,
        organization: OrganizationId,
    },

    #[error("Webhook not found: {id}")]
    NotFound { id: WebhookId },

    #[error("Snapshot I/O failed for {path}: {message}")]
    Io { path: String, message: String },

    #[error("Snapshot could not be parsed: {message}")]
    Parse { message: String },

    #[error("Store lock poisoned")]
    Poisoned,
}

/// Serializable image of the whole store
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSnapshot {
    pub webhooks: Vec<WebhookConfig>,
    /// Most recent delivery attempt per webhook
    pub responses: BTreeMap<WebhookId, WebhookResponseLog>,
}

#[derive(Debug, Default)]
struct StoreState {
    webhooks: HashMap<WebhookId, WebhookConfig>,
    responses: HashMap<WebhookId, WebhookResponseLog>,
}

impl StoreState {
    /// Fail if another webhook in the organization already carries `name`
    fn check_unique_name(
        &self,
        name: &str,
        organization: &OrganizationId,
        except: Option<&WebhookId>,
    ) -> Result<(), StoreError> {
        let taken = self.webhooks.values().any(|w| {
            w.name == name && &w.organization == organization && Some(&w.id) != except
        });

        if taken {
            return Err(StoreError::DuplicateName {
                name: name.to_string(),
                organization: organization.clone(),
            });
        }
        Ok(())
    }
}

/// Thread-safe in-memory webhook store
///
/// Clones share the same underlying state.
#[derive(Debug, Clone, Default)]
pub struct InMemoryWebhookStore {
    state: Arc<RwLock<StoreState>>,
}

impl InMemoryWebhookStore {
    /// Create new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a store from a snapshot
    ///
    /// # Errors
    /// - `StoreError::DuplicateName` - The snapshot violates the unique name constraint
    pub fn from_snapshot(snapshot: StoreSnapshot) -> Result<Self, StoreError> {
        let mut state = StoreState::default();

        for webhook in snapshot.webhooks {
            state.check_unique_name(&webhook.name, &webhook.organization, None)?;
            state.webhooks.insert(webhook.id.clone(), webhook);
        }
        state.responses = snapshot.responses.into_iter().collect();

        Ok(Self {
            state: Arc::new(RwLock::new(state)),
        })
    }

    /// Capture the current contents
    pub fn snapshot(&self) -> Result<StoreSnapshot, StoreError> {
        let state = self.read()?;

        let mut webhooks: Vec<WebhookConfig> = state.webhooks.values().cloned().collect();
        webhooks.sort_by(|a, b| a.id.cmp(&b.id));

        Ok(StoreSnapshot {
            webhooks,
            responses: state
                .responses
                .iter()
                .map(|(id, log)| (id.clone(), log.clone()))
                .collect(),
        })
    }

    /// Load a store from a JSON snapshot file
    ///
    /// A missing file yields an empty store.
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        if !path.exists() {
            debug!(path = %path.display(), "No snapshot file, starting empty");
            return Ok(Self::new());
        }

        let content = std::fs::read_to_string(path).map_err(|e| io_error(path, e))?;
        let snapshot: StoreSnapshot =
            serde_json::from_str(&content).map_err(|e| StoreError::Parse {
                message: e.to_string(),
            })?;

        info!(
            path = %path.display(),
            webhooks = snapshot.webhooks.len(),
            "Loaded webhook store snapshot"
        );
        Self::from_snapshot(snapshot)
    }

    /// Save the store as a JSON snapshot file
    pub fn save(&self, path: &Path) -> Result<(), StoreError> {
        let snapshot = self.snapshot()?;
        let json = serde_json::to_string_pretty(&snapshot).map_err(|e| StoreError::Parse {
            message: e.to_string(),
        })?;

        std::fs::write(path, json).map_err(|e| io_error(path, e))?;
        debug!(path = %path.display(), "Saved webhook store snapshot");
        Ok(())
    }

    /// Persist a newly validated webhook under a fresh identifier
    ///
    /// # Errors
    /// - `StoreError::DuplicateName` - The name is taken in the organization
    pub fn create(&self, normalized: NormalizedWebhook) -> Result<WebhookConfig, StoreError> {
        let mut state = self.write()?;
        state.check_unique_name(&normalized.name, &normalized.organization, None)?;

        let webhook = WebhookConfig::from_normalized(WebhookId::generate(), normalized);
        state.webhooks.insert(webhook.id.clone(), webhook.clone());

        info!(
            webhook = %webhook.id,
            organization = %webhook.organization,
            "Webhook created"
        );
        Ok(webhook)
    }

    /// Replace a stored webhook with newly validated fields
    ///
    /// The webhook must exist inside the organization of `normalized`.
    ///
    /// # Errors
    /// - `StoreError::NotFound` - No such webhook in the organization
    /// - `StoreError::DuplicateName` - The name is taken by another webhook
    pub fn update(
        &self,
        id: &WebhookId,
        normalized: NormalizedWebhook,
    ) -> Result<WebhookConfig, StoreError> {
        let mut state = self.write()?;

        let exists = state
            .webhooks
            .get(id)
            .is_some_and(|w| w.organization == normalized.organization);
        if !exists {
            return Err(StoreError::NotFound { id: id.clone() });
        }
        state.check_unique_name(&normalized.name, &normalized.organization, Some(id))?;

        let webhook = WebhookConfig::from_normalized(id.clone(), normalized);
        state.webhooks.insert(id.clone(), webhook.clone());

        info!(webhook = %id, "Webhook updated");
        Ok(webhook)
    }

    /// Webhooks owned by an organization, ordered by identifier
    pub fn list(&self, organization: &OrganizationId) -> Result<Vec<WebhookConfig>, StoreError> {
        let state = self.read()?;

        let mut webhooks: Vec<WebhookConfig> = state
            .webhooks
            .values()
            .filter(|w| &w.organization == organization)
            .cloned()
            .collect();
        webhooks.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(webhooks)
    }

    /// Record the most recent delivery attempt of a webhook
    pub fn record_response(
        &self,
        id: &WebhookId,
        log: WebhookResponseLog,
    ) -> Result<(), StoreError> {
        let mut state = self.write()?;
        if !state.webhooks.contains_key(id) {
            return Err(StoreError::NotFound { id: id.clone() });
        }

        state.responses.insert(id.clone(), log);
        Ok(())
    }

    /// Number of stored webhooks across all organizations
    pub fn len(&self) -> Result<usize, StoreError> {
        Ok(self.read()?.webhooks.len())
    }

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, StoreState>, StoreError> {
        self.state.read().map_err(|_| StoreError::Poisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, StoreState>, StoreError> {
        self.state.write().map_err(|_| StoreError::Poisoned)
    }
}

impl EntityLookup for InMemoryWebhookStore {
    fn find(
        &self,
        id: &WebhookId,
        organization: &OrganizationId,
    ) -> Result<WebhookConfig, LookupError> {
        let state = self.read().map_err(|e| LookupError::Backend {
            message: e.to_string(),
        })?;

        state
            .webhooks
            .get(id)
            .filter(|w| &w.organization == organization)
            .cloned()
            .ok_or_else(|| LookupError::NotFound { id: id.clone() })
    }
}

impl ResponseLogSource for InMemoryWebhookStore {
    fn latest_response(&self, webhook: &WebhookId) -> Option<WebhookResponseLog> {
        match self.read() {
            Ok(state) => state.responses.get(webhook).cloned(),
            Err(e) => {
                warn!(webhook = %webhook, error = %e, "Response logs unavailable");
                None
            }
        }
    }
}

fn io_error(path: &Path, err: std::io::Error) -> StoreError {
    StoreError::Io {
        path: path.display().to_string(),
        message: err.to_string(),
    }
}

#[cfg(test)]
#[path = "memory_store_tests.rs"]
mod tests;
