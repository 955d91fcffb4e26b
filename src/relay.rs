//! The signaling relay: session lifecycle, message forwarding, and the
//! subscription registry.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::config::RelayConfig;
use crate::errors::RelayError;
use crate::ids::{self, MAX_ID_LEN};
use crate::message::SignalingMessage;
use crate::reconcile::{reconcile_once, Reconciler};
use crate::session::Session;
use crate::store::{open_store, SessionStore};
use crate::timestamp::Timestamp;

/// Callback invoked with each newly observed message. Runs on the
/// reconciliation task; hand off promptly.
pub type OnMessage = Arc<dyn Fn(SignalingMessage) + Send + Sync>;

/// session id -> participant id -> callback.
pub(crate) type SubscriptionMap = HashMap<String, HashMap<String, OnMessage>>;

/// An embeddable signaling relay.
///
/// Each instance owns its store handle, subscription registry and
/// reconciliation loop; nothing is process-global, so two relays in one
/// process stay independent. Cleanup is explicit: dropping a relay does not
/// stop a running loop, call [`SignalingRelay::shutdown`].
pub struct SignalingRelay {
    store: Arc<dyn SessionStore>,
    config: RelayConfig,
    subscriptions: Arc<Mutex<SubscriptionMap>>,
    watermark: Arc<Mutex<Timestamp>>,
    poller: Mutex<Option<Reconciler>>,
}

impl SignalingRelay {
    /// Builds a relay on the store selected by `config.backend`.
    pub fn new(config: RelayConfig) -> Result<Self, RelayError> {
        let store = open_store(&config.backend)?;
        Ok(Self::with_store(store, config))
    }

    /// Builds a relay on a caller-supplied store.
    pub fn with_store(store: Arc<dyn SessionStore>, config: RelayConfig) -> Self {
        Self {
            store,
            config,
            subscriptions: Arc::new(Mutex::new(HashMap::new())),
            watermark: Arc::new(Mutex::new(Timestamp::now())),
            poller: Mutex::new(None),
        }
    }

    /// Creates a session hosted by `host_id` and returns its id. Store
    /// failures propagate; the caller holds no session afterwards.
    pub async fn create_session(&self, host_id: &str) -> Result<String, RelayError> {
        validate_id("host id", host_id)?;

        let session = Session::new(ids::new_session_id(), host_id);
        self.store.create(&session).await?;
        tracing::info!("Created session {} for host {}", session.id, host_id);
        Ok(session.id)
    }

    /// Adds `participant_id` to the session. `Ok(false)` when no such
    /// session exists. Re-joining is a no-op that still reports `Ok(true)`.
    pub async fn join_session(
        &self,
        session_id: &str,
        participant_id: &str,
    ) -> Result<bool, RelayError> {
        validate_id("session id", session_id)?;
        validate_id("participant id", participant_id)?;

        let Some(mut session) = self.store.get(session_id).await? else {
            tracing::debug!("Join attempt on unknown session {}", session_id);
            return Ok(false);
        };
        if session.add_participant(participant_id) {
            self.store.save(&session).await?;
            tracing::info!("Participant {} joined session {}", participant_id, session_id);
        }
        Ok(true)
    }

    /// Removes the participant from the session and releases its
    /// subscription. The last participant out deletes the session. Store
    /// failures are logged and swallowed; leaving always succeeds locally.
    pub async fn leave_session(
        &self,
        session_id: &str,
        participant_id: &str,
    ) -> Result<(), RelayError> {
        validate_id("session id", session_id)?;
        validate_id("participant id", participant_id)?;

        // Subscription first, so the departing participant sees no
        // deliveries during its own teardown.
        self.stop_listening(session_id, participant_id).await;

        let mut session = match self.store.get(session_id).await {
            Ok(Some(session)) => session,
            Ok(None) => return Ok(()),
            Err(e) => {
                tracing::warn!("Leave could not load session {}: {}", session_id, e);
                return Ok(());
            }
        };
        if !session.remove_participant(participant_id) {
            return Ok(());
        }

        let result = if session.is_empty() {
            tracing::info!("Session {} is empty, deleting", session_id);
            self.store.delete(session_id).await
        } else {
            self.store.save(&session).await
        };
        if let Err(e) = result {
            tracing::warn!("Leave could not update session {}: {}", session_id, e);
        }
        Ok(())
    }

    /// Appends a message to its session's log, stamping the timestamp when
    /// the sender left it unset. Sending into a missing session is a logged
    /// no-op; nothing is created. Store failures propagate.
    pub async fn send_message(&self, mut message: SignalingMessage) -> Result<(), RelayError> {
        validate_id("session id", &message.session_id)?;
        validate_id("user id", &message.user_id)?;

        let Some(mut session) = self.store.get(&message.session_id).await? else {
            tracing::warn!(
                "Dropping {} message for missing session {}",
                message.kind,
                message.session_id
            );
            return Ok(());
        };

        if message.timestamp.is_none() {
            message.timestamp = Some(Timestamp::now());
        }
        session.push_message(message);
        self.store.save(&session).await?;
        Ok(())
    }

    /// Registers `on_message` under `(session_id, participant_id)`,
    /// replacing any previous callback for the pair, and starts the shared
    /// reconciliation loop if it is not already running. The callback
    /// receives every newly observed message in the session except those
    /// authored by `participant_id`.
    pub async fn listen(
        &self,
        session_id: &str,
        participant_id: &str,
        on_message: OnMessage,
    ) -> Result<(), RelayError> {
        validate_id("session id", session_id)?;
        validate_id("participant id", participant_id)?;

        {
            let mut subs = self.subscriptions.lock().await;
            let listeners = subs.entry(session_id.to_string()).or_default();
            if listeners
                .insert(participant_id.to_string(), on_message)
                .is_some()
            {
                tracing::debug!(
                    "Replaced subscription of {} on session {}",
                    participant_id,
                    session_id
                );
            }
        }

        let mut poller = self.poller.lock().await;
        if poller.is_none() {
            *poller = Some(
                Reconciler::spawn(
                    self.store.clone(),
                    self.subscriptions.clone(),
                    self.watermark.clone(),
                    self.config.poll_interval,
                )
                .await,
            );
        }
        Ok(())
    }

    /// Removes the pair's subscription if present; the last removal stops
    /// the loop. Effective for future ticks; a tick already in flight may
    /// deliver one last message.
    pub async fn stop_listening(&self, session_id: &str, participant_id: &str) {
        let mut subs = self.subscriptions.lock().await;
        if let Some(listeners) = subs.get_mut(session_id) {
            listeners.remove(participant_id);
            if listeners.is_empty() {
                subs.remove(session_id);
            }
        }
        let registry_empty = subs.is_empty();
        drop(subs);

        if registry_empty {
            let mut poller = self.poller.lock().await;
            if poller.take().is_some() {
                tracing::debug!("Last subscription removed, stopping reconciliation loop");
            }
        }
    }

    /// Read-through lookup. Store failures (and malformed ids) degrade to
    /// `None`.
    pub async fn get_session(&self, session_id: &str) -> Option<Session> {
        if validate_id("session id", session_id).is_err() {
            return None;
        }
        match self.store.get(session_id).await {
            Ok(found) => found,
            Err(e) => {
                tracing::warn!("Lookup failed for session {}: {}", session_id, e);
                None
            }
        }
    }

    /// Store failures (and malformed ids) degrade to `false`.
    pub async fn session_exists(&self, session_id: &str) -> bool {
        if validate_id("session id", session_id).is_err() {
            return false;
        }
        match self.store.exists(session_id).await {
            Ok(exists) => exists,
            Err(e) => {
                tracing::warn!("Existence check failed for session {}: {}", session_id, e);
                false
            }
        }
    }

    /// Deletes sessions older than the configured retention, returning how
    /// many were removed. Expiry is keyed on creation time; live
    /// participants do not keep a session alive. Listing failures
    /// propagate; individual delete failures are logged and skipped.
    pub async fn collect_garbage(&self) -> Result<usize, RelayError> {
        let sessions = self.store.list_all().await?;
        let now = Timestamp::now();
        let mut removed = 0;
        for session in sessions {
            if !session.is_expired(self.config.retention, now) {
                continue;
            }
            match self.store.delete(&session.id).await {
                Ok(()) => {
                    tracing::debug!("Garbage collected expired session {}", session.id);
                    removed += 1;
                }
                Err(e) => {
                    tracing::warn!("Could not garbage collect session {}: {}", session.id, e);
                }
            }
        }
        if removed > 0 {
            tracing::info!("Garbage collected {} expired sessions", removed);
        }
        Ok(removed)
    }

    /// Runs one reconciliation pass immediately, sharing the loop's
    /// watermark. Push-capable backends (and deterministic tests) use this
    /// instead of waiting out the cadence.
    pub async fn reconcile_now(&self) {
        reconcile_once(&self.store, &self.subscriptions, &self.watermark).await;
    }

    /// Clears every subscription and stops the reconciliation loop.
    pub async fn shutdown(&self) {
        self.subscriptions.lock().await.clear();
        if self.poller.lock().await.take().is_some() {
            tracing::debug!("Relay shut down, reconciliation loop stopped");
        }
    }

    #[cfg(test)]
    pub(crate) async fn subscription_count(&self) -> usize {
        let subs = self.subscriptions.lock().await;
        subs.values().map(|listeners| listeners.len()).sum()
    }

    #[cfg(test)]
    pub(crate) async fn is_reconciling(&self) -> bool {
        self.poller.lock().await.is_some()
    }
}

fn validate_id(label: &str, value: &str) -> Result<(), RelayError> {
    if value.is_empty() {
        return Err(RelayError::validation(format!("{} is empty", label)));
    }
    if value.len() > MAX_ID_LEN {
        return Err(RelayError::validation(format!(
            "{} exceeds {} characters",
            label, MAX_ID_LEN
        )));
    }
    if !value
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
    {
        return Err(RelayError::validation(format!(
            "{} contains characters outside [A-Za-z0-9_-]",
            label
        )));
    }
    Ok(())
}

#[cfg(test)]
#[path = "relay_tests.rs"]
mod tests;
