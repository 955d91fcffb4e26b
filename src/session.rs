//! Session records: the unit of persistence shared between participants.

use std::collections::BTreeSet;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::message::SignalingMessage;
use crate::timestamp::Timestamp;

/// Maximum number of log entries a session retains. Appends past the cap
/// discard the oldest entries first.
pub const MESSAGE_LOG_CAP: usize = 50;

/// A live signaling session shared by a host and its viewers.
///
/// The whole record is persisted as one JSON document; see the store module
/// for the write semantics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    pub host_id: String,
    #[serde(default)]
    pub participants: BTreeSet<String>,
    #[serde(default)]
    pub messages: Vec<SignalingMessage>,
    pub created_at: Timestamp,
}

impl Session {
    /// A fresh record: the host is the sole participant, the log is empty.
    pub fn new(id: impl Into<String>, host_id: impl Into<String>) -> Self {
        let host_id = host_id.into();
        let mut participants = BTreeSet::new();
        participants.insert(host_id.clone());
        Self {
            id: id.into(),
            host_id,
            participants,
            messages: Vec::new(),
            created_at: Timestamp::now(),
        }
    }

    /// Returns whether the set changed.
    pub fn add_participant(&mut self, participant_id: &str) -> bool {
        self.participants.insert(participant_id.to_string())
    }

    /// Returns whether the participant was present.
    pub fn remove_participant(&mut self, participant_id: &str) -> bool {
        self.participants.remove(participant_id)
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    pub fn push_message(&mut self, message: SignalingMessage) {
        self.messages.push(message);
        if self.messages.len() > MESSAGE_LOG_CAP {
            let excess = self.messages.len() - MESSAGE_LOG_CAP;
            self.messages.drain(..excess);
        }
    }

    /// Messages stamped inside `(after, until]`, in log order. Unstamped
    /// entries never match.
    pub fn messages_between(
        &self,
        after: Timestamp,
        until: Timestamp,
    ) -> impl Iterator<Item = &SignalingMessage> {
        self.messages.iter().filter(move |m| match m.timestamp {
            Some(ts) => ts > after && ts <= until,
            None => false,
        })
    }

    /// Age-based expiry, keyed on creation time only. Activity does not
    /// extend a session's life.
    pub fn is_expired(&self, retention: Duration, now: Timestamp) -> bool {
        let horizon = chrono::Duration::milliseconds(retention.as_millis() as i64);
        now.0 - self.created_at.0 > horizon
    }
}
