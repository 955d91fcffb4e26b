//! Signaling relay for peer-to-peer screen-share sessions.
//!
//! A host creates a short-lived session; viewers join it by identifier, and
//! everyone exchanges opaque connection-negotiation messages (offers,
//! answers, ICE candidates) through a shared session record. A single
//! polling loop per relay instance observes subscribed records and fans
//! newly appended messages out to per-participant callbacks, suppressing
//! each author's own messages.
//!
//! ## Architecture
//!
//! - **Relay (`relay.rs`)**: session lifecycle, message forwarding, and the
//!   subscription registry. Each instance owns all of its state.
//! - **Reconciliation (`reconcile.rs`)**: the shared background task that
//!   polls subscribed sessions and delivers new messages.
//! - **Stores (`store/`)**: pluggable persistence behind the
//!   [`SessionStore`] trait. The on-disk backend works standalone; the
//!   hosted backend is a deterministic stub until its integration lands.
//! - **Records (`session.rs`, `message.rs`)**: the persisted session
//!   document, with a capped message log and a tolerant timestamp format.
//!
//! Storage is last-writer-wins at the record level: two relays sharing one
//! store directory can lose a concurrent membership update. The store tests
//! pin that behavior down; see `DESIGN.md` for the planned fix.
//!
//! ```no_run
//! use screenshare_relay::{RelayConfig, SignalingRelay};
//!
//! # async fn demo() -> Result<(), screenshare_relay::RelayError> {
//! let relay = SignalingRelay::new(RelayConfig::default())?;
//! let session_id = relay.create_session("host-a").await?;
//! relay.join_session(&session_id, "viewer-b").await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod errors;
pub mod ids;
pub mod message;
mod reconcile;
pub mod relay;
pub mod session;
pub mod store;
pub mod timestamp;

pub use config::{RelayConfig, StoreBackend};
pub use errors::RelayError;
pub use message::{MessageKind, SignalingMessage};
pub use relay::{OnMessage, SignalingRelay};
pub use session::{Session, MESSAGE_LOG_CAP};
pub use store::{open_store, HostedStore, LocalStore, SessionStore};
pub use timestamp::Timestamp;
