//! Identity error model.

use thiserror::Error;

use crate::id::UserId;

/// Result type used across the session domain.
pub type IdentityResult<T> = Result<T, IdentityError>;

/// Identity-level error.
///
/// Keep this focused on deterministic failures (validation, acting on an
/// identity that is not held). Infrastructure concerns belong elsewhere.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdentityError {
    /// A value failed validation (e.g. malformed input).
    #[error("validation failed: {0}")]
    Validation(String),

    /// An operation referenced an identity that is not in the collection.
    #[error("unknown user: {0}")]
    UnknownUser(UserId),
}

impl IdentityError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn unknown_user(user_id: UserId) -> Self {
        Self::UnknownUser(user_id)
    }
}
