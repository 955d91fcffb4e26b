//! Hosted session backend (integration disabled).
//!
//! The shared real-time backend this crate is designed to plug into is not
//! wired up yet. Until it is, every operation fails deterministically with
//! `StoreUnavailable` so callers exercise their degraded paths instead of
//! hanging or panicking. A future client implements [`SessionStore`] against
//! the remote API and replaces this type behind the same factory.

use async_trait::async_trait;

use crate::errors::RelayError;
use crate::session::Session;
use crate::store::SessionStore;

const DISABLED_MESSAGE: &str = "hosted session backend integration is disabled";

/// Placeholder for the not-yet-enabled hosted store.
#[derive(Debug, Clone, Default)]
pub struct HostedStore;

impl HostedStore {
    pub fn new() -> Self {
        Self
    }

    fn unavailable() -> RelayError {
        RelayError::store_unavailable(DISABLED_MESSAGE)
    }
}

#[async_trait]
impl SessionStore for HostedStore {
    async fn create(&self, _session: &Session) -> Result<(), RelayError> {
        Err(Self::unavailable())
    }

    async fn get(&self, _session_id: &str) -> Result<Option<Session>, RelayError> {
        Err(Self::unavailable())
    }

    async fn save(&self, _session: &Session) -> Result<(), RelayError> {
        Err(Self::unavailable())
    }

    async fn delete(&self, _session_id: &str) -> Result<(), RelayError> {
        Err(Self::unavailable())
    }

    async fn exists(&self, _session_id: &str) -> Result<bool, RelayError> {
        Err(Self::unavailable())
    }

    async fn list_all(&self) -> Result<Vec<Session>, RelayError> {
        Err(Self::unavailable())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_unavailable<T: std::fmt::Debug>(result: Result<T, RelayError>) {
        match result {
            Err(RelayError::StoreUnavailable { message }) => {
                assert_eq!(message, DISABLED_MESSAGE);
            }
            other => panic!("expected StoreUnavailable, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn every_operation_fails_deterministically() {
        let store = HostedStore::new();
        let session = Session::new("abc123", "host-1");

        assert_unavailable(store.create(&session).await);
        assert_unavailable(store.get("abc123").await);
        assert_unavailable(store.save(&session).await);
        assert_unavailable(store.delete("abc123").await);
        assert_unavailable(store.exists("abc123").await);
        assert_unavailable(store.list_all().await);
    }
}
