//! Error taxonomy for the terminal engine.
//!
//! Only the caller-visible errors described by the specification exist
//! here: unknown/duplicate session ids and rejected resize requests.
//! Malformed escape sequences and bound violations are never surfaced as
//! errors — they are absorbed internally (see [`crate::parser`] and
//! [`crate::buffer`]) because a terminal emulator that panics or errors
//! on adversarial producer output is worse than useless.

use thiserror::Error;

/// Errors surfaced by [`crate::registry::SessionRegistry`] operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TerminalError {
    /// An operation referenced a session id that does not exist.
    #[error("session not found: {session_id}")]
    SessionNotFound {
        /// The session id that was looked up.
        session_id: String,
    },

    /// `create_session` was called with an id that already exists.
    #[error("session already exists: {session_id}")]
    SessionAlreadyExists {
        /// The session id that was already present.
        session_id: String,
    },

    /// A resize request had a non-positive dimension.
    #[error("invalid terminal size: {cols}x{rows}")]
    InvalidSize {
        /// The rejected column count.
        cols: i32,
        /// The rejected row count.
        rows: i32,
    },
}

/// Convenience alias for results returned by the public API.
pub type Result<T> = std::result::Result<T, TerminalError>;
