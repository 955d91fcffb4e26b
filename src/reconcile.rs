//! The shared reconciliation loop.
//!
//! One background task per relay instance observes every subscribed session
//! on a fixed cadence and fans newly appended messages out to the registered
//! callbacks, skipping each author's own subscription. All subscriptions of
//! an instance share this single task; there are no per-listener timers.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Mutex};

use crate::relay::{OnMessage, SubscriptionMap};
use crate::store::SessionStore;
use crate::timestamp::Timestamp;

/// Handle to the running loop. Dropping it closes the stop channel, which
/// ends the task at its next select point; a tick already in flight may
/// still deliver one last batch.
pub(crate) struct Reconciler {
    _stop_tx: mpsc::Sender<()>,
}

impl Reconciler {
    /// Spawns the loop. The watermark resets to the current instant, so
    /// only messages appended after the loop starts are observed. Stamps
    /// carry whole milliseconds: a message stamped within the reset's own
    /// millisecond counts as history.
    pub(crate) async fn spawn(
        store: Arc<dyn SessionStore>,
        subscriptions: Arc<Mutex<SubscriptionMap>>,
        watermark: Arc<Mutex<Timestamp>>,
        poll_interval: Duration,
    ) -> Self {
        *watermark.lock().await = Timestamp::now();
        let (stop_tx, stop_rx) = mpsc::channel::<()>(1);
        tokio::spawn(run_loop(store, subscriptions, watermark, poll_interval, stop_rx));
        tracing::debug!("Reconciliation loop started, cadence {:?}", poll_interval);
        Self { _stop_tx: stop_tx }
    }
}

async fn run_loop(
    store: Arc<dyn SessionStore>,
    subscriptions: Arc<Mutex<SubscriptionMap>>,
    watermark: Arc<Mutex<Timestamp>>,
    poll_interval: Duration,
    mut stop_rx: mpsc::Receiver<()>,
) {
    let mut interval = tokio::time::interval(poll_interval);
    loop {
        tokio::select! {
            _ = interval.tick() => {
                reconcile_once(&store, &subscriptions, &watermark).await;
            }
            _ = stop_rx.recv() => {
                tracing::debug!("Reconciliation loop stopped");
                break;
            }
        }
    }
}

/// One reconciliation pass over every subscribed session.
///
/// The registry is snapshotted first so callbacks run without the lock
/// held. Sessions are loaded concurrently; a session that fails to load (or
/// has vanished) is skipped this pass without affecting the others. The
/// watermark advances to the instant captured before the loads, so messages
/// appended mid-pass surface on the next one instead of being lost or
/// delivered twice.
pub(crate) async fn reconcile_once(
    store: &Arc<dyn SessionStore>,
    subscriptions: &Mutex<SubscriptionMap>,
    watermark: &Mutex<Timestamp>,
) {
    let now = Timestamp::now();

    let snapshot: Vec<(String, Vec<(String, OnMessage)>)> = {
        let subs = subscriptions.lock().await;
        subs.iter()
            .map(|(session_id, listeners)| {
                let listeners = listeners
                    .iter()
                    .map(|(participant_id, callback)| {
                        (participant_id.clone(), callback.clone())
                    })
                    .collect();
                (session_id.clone(), listeners)
            })
            .collect()
    };

    let after = {
        let mut mark = watermark.lock().await;
        let previous = *mark;
        *mark = now;
        previous
    };

    if snapshot.is_empty() {
        return;
    }

    let passes = snapshot.into_iter().map(|(session_id, listeners)| {
        let store = store.clone();
        async move {
            match store.get(&session_id).await {
                Ok(Some(session)) => {
                    for message in session.messages_between(after, now) {
                        for (participant_id, callback) in &listeners {
                            if *participant_id != message.user_id {
                                callback(message.clone());
                            }
                        }
                    }
                }
                Ok(None) => {
                    tracing::trace!("Subscribed session {} is gone", session_id);
                }
                Err(e) => {
                    tracing::warn!("Reconcile pass failed for session {}: {}", session_id, e);
                }
            }
        }
    });
    futures::future::join_all(passes).await;
}
