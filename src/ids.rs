//! Identifier generation for sessions and participants.

use rand::Rng;

/// Upper bound accepted for caller-supplied identifiers.
pub const MAX_ID_LEN: usize = 64;

const SESSION_ID_LEN: usize = 12;
const SESSION_ID_CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Short, URL-safe session code meant to be relayed between people.
pub fn new_session_id() -> String {
    let mut rng = rand::thread_rng();
    (0..SESSION_ID_LEN)
        .map(|_| {
            let idx = rng.gen_range(0..SESSION_ID_CHARSET.len());
            SESSION_ID_CHARSET[idx] as char
        })
        .collect()
}

/// Random participant identity (UUID v4).
pub fn new_participant_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
