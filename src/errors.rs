//! Error types for the signaling relay.

use std::fmt::{Display, Formatter};

/// Errors surfaced by the relay and its session stores.
#[derive(Debug, Clone)]
pub enum RelayError {
    /// The configured store backend cannot serve the request.
    StoreUnavailable { message: String },
    /// Caller-supplied input was rejected before touching the store.
    Validation { message: String },
}

impl RelayError {
    pub fn store_unavailable(message: impl Into<String>) -> Self {
        Self::StoreUnavailable {
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}

impl Display for RelayError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::StoreUnavailable { message } => write!(f, "session store unavailable: {}", message),
            Self::Validation { message } => write!(f, "invalid input: {}", message),
        }
    }
}

impl std::error::Error for RelayError {}
