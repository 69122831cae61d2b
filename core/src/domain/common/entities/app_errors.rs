use thiserror::Error;

use crate::domain::unit::value_objects::Unit;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Incompatible units: cannot convert {from} to {to}")]
    IncompatibleUnit { from: Unit, to: Unit },

    #[error("Not found")]
    NotFound,

    #[error("Price source fetch failed: {0}")]
    SourceFetch(String),

    #[error("Price source timed out")]
    SourceTimeout,

    #[error("Internal server error")]
    InternalServerError,
}

impl CoreError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Errors the scheduler recovers from by skipping the check until the next cycle.
    pub fn is_source_failure(&self) -> bool {
        matches!(self, Self::SourceFetch(_) | Self::SourceTimeout)
    }
}
