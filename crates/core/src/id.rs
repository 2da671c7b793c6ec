//! Strongly-typed identifiers used across the session domain.

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::IdentityError;

/// Identifier of a user (server-assigned, always positive).
///
/// Zero is not a valid identity; it survives only as the anonymous sentinel
/// in derived contexts (cache namespaces, stale persisted snapshots) and is
/// scrubbed from collections at restore time. The transparent serde form
/// keeps snapshots with a zero id parseable so that scrubbing, not a parse
/// failure, handles them.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(u64);

impl UserId {
    /// Validating constructor; rejects zero.
    pub fn new(raw: u64) -> Result<Self, IdentityError> {
        if raw == 0 {
            return Err(IdentityError::validation("user id must be positive"));
        }
        Ok(Self(raw))
    }

    pub fn get(&self) -> u64 {
        self.0
    }
}

impl core::fmt::Display for UserId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl From<UserId> for u64 {
    fn from(value: UserId) -> Self {
        value.0
    }
}

impl FromStr for UserId {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw: u64 = s
            .parse()
            .map_err(|e| IdentityError::validation(format!("UserId: {e}")))?;
        Self::new(raw)
    }
}
