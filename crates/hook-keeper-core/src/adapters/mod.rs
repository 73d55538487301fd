//! # Infrastructure Adapters
//!
//! Storage implementations of the lookup and response log interfaces.

pub mod memory_store;

pub use memory_store::{InMemoryWebhookStore, StoreError, StoreSnapshot};
