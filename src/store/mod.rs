//! Pluggable session storage.
//!
//! Two backends ship today:
//! - [`LocalStore`]: on-disk, origin-scoped, works without any service.
//! - [`HostedStore`]: the shared real-time backend, currently disabled and
//!   failing deterministically until the integration lands.

mod hosted;
mod local;

pub use hosted::HostedStore;
pub use local::LocalStore;

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::StoreBackend;
use crate::errors::RelayError;
use crate::session::Session;

/// Persistence contract shared by all session backends.
///
/// Absence is `Ok(None)`/`Ok(false)`, never an error; every failure crossing
/// this boundary is `RelayError::StoreUnavailable`.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Persist a brand-new record.
    async fn create(&self, session: &Session) -> Result<(), RelayError>;

    /// Load a record, `Ok(None)` when absent.
    async fn get(&self, session_id: &str) -> Result<Option<Session>, RelayError>;

    /// Replace a record wholesale. Last writer wins; concurrent
    /// read-modify-write cycles can lose updates (see crate docs).
    async fn save(&self, session: &Session) -> Result<(), RelayError>;

    /// Remove a record. Deleting an absent record succeeds.
    async fn delete(&self, session_id: &str) -> Result<(), RelayError>;

    async fn exists(&self, session_id: &str) -> Result<bool, RelayError>;

    /// Every readable record; input to garbage collection.
    async fn list_all(&self) -> Result<Vec<Session>, RelayError>;
}

/// Builds the store selected by configuration.
pub fn open_store(backend: &StoreBackend) -> Result<Arc<dyn SessionStore>, RelayError> {
    match backend {
        StoreBackend::Local { dir } => Ok(Arc::new(LocalStore::open(dir.clone())?)),
        StoreBackend::Hosted => Ok(Arc::new(HostedStore::new())),
    }
}
