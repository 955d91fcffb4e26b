//! Wire types for signaling messages.

use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::timestamp::Timestamp;

/// The message kinds the relay carries.
///
/// The relay forwards these uninterpreted; the peer-connection layer on each
/// end assigns them meaning. They are typed so persisted records stay
/// well-formed and log lines stay readable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MessageKind {
    Join,
    Leave,
    Offer,
    Answer,
    IceCandidate,
    HostLeft,
}

impl Display for MessageKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Join => "join",
            Self::Leave => "leave",
            Self::Offer => "offer",
            Self::Answer => "answer",
            Self::IceCandidate => "ice-candidate",
            Self::HostLeft => "host-left",
        };
        write!(f, "{}", label)
    }
}

/// One entry in a session's message log.
///
/// `data` is carried verbatim (SDP blobs, ICE candidate descriptors, or
/// whatever else the peers exchange). `timestamp` is stamped by the relay at
/// append time when the sender left it unset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalingMessage {
    #[serde(rename = "type")]
    pub kind: MessageKind,
    pub session_id: String,
    pub user_id: String,
    #[serde(default)]
    pub data: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<Timestamp>,
}

impl SignalingMessage {
    pub fn new(
        kind: MessageKind,
        session_id: impl Into<String>,
        user_id: impl Into<String>,
        data: serde_json::Value,
    ) -> Self {
        Self {
            kind,
            session_id: session_id.into(),
            user_id: user_id.into(),
            data,
            timestamp: None,
        }
    }
}
