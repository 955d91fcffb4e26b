//! Relay configuration.

use std::path::PathBuf;
use std::time::Duration;

/// Default reconciliation cadence.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Default retention horizon for garbage collection.
pub const DEFAULT_RETENTION: Duration = Duration::from_secs(24 * 60 * 60);

const APP_DIR: &str = ".screenshare-relay";

/// Which session store a relay instance talks to.
#[derive(Debug, Clone)]
pub enum StoreBackend {
    /// On-disk store, one JSON document per session under `dir`.
    Local { dir: PathBuf },
    /// Shared real-time backend. The integration is currently disabled;
    /// every operation fails with `StoreUnavailable`.
    Hosted,
}

/// Per-instance settings for a `SignalingRelay`.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub backend: StoreBackend,
    /// How often the reconciliation loop observes subscribed sessions.
    pub poll_interval: Duration,
    /// Sessions older than this are reaped by `collect_garbage`.
    pub retention: Duration,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Local {
                dir: default_store_dir(),
            },
            poll_interval: DEFAULT_POLL_INTERVAL,
            retention: DEFAULT_RETENTION,
        }
    }
}

impl RelayConfig {
    /// Defaults with an on-disk store rooted at `dir`.
    pub fn local(dir: impl Into<PathBuf>) -> Self {
        Self {
            backend: StoreBackend::Local { dir: dir.into() },
            ..Self::default()
        }
    }

    /// Defaults with the hosted backend selected.
    pub fn hosted() -> Self {
        Self {
            backend: StoreBackend::Hosted,
            ..Self::default()
        }
    }
}

/// `~/.screenshare-relay/sessions`, falling back to the system temp
/// directory when no home directory can be determined.
pub fn default_store_dir() -> PathBuf {
    let base = dirs::home_dir().unwrap_or_else(std::env::temp_dir);
    base.join(APP_DIR).join("sessions")
}
