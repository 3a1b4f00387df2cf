//! The error taxonomy surfaced by engine actions.
//!
//! The gateway never retries: every failure is handed back to the caller
//! as one of these variants with a human-readable message, and the
//! canonical store is left untouched.

use crate::event::EventId;
use thiserror::Error;

/// Typed failure of an engine action.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// The data service does not know this identifier.
    #[error("event {id} not found")]
    NotFound {
        /// The unknown identifier
        id: EventId,
    },

    /// The action contradicts current server state, e.g. attending an
    /// event already attended. Not fatal: the caller should refresh the
    /// single affected event rather than reload everything.
    #[error("conflict: {0}")]
    Conflict(String),

    /// A malformed create or update payload.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Missing or invalid credential.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The data service or push channel is unreachable.
    #[error("transport failure: {0}")]
    Transport(String),
}

impl EngineError {
    /// Whether the caller can recover by refreshing a single event.
    #[must_use]
    pub const fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_are_human_readable() {
        let err = EngineError::NotFound {
            id: EventId::from("abc123"),
        };
        assert_eq!(err.to_string(), "event abc123 not found");

        let err = EngineError::Conflict("already attending".to_owned());
        assert!(err.is_conflict());
        assert_eq!(err.to_string(), "conflict: already attending");
    }
}
