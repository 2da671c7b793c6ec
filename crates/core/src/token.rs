//! Opaque bearer credential.

use serde::{Deserialize, Serialize};

use crate::error::IdentityError;

/// Server-issued credential proving an identity's authentication.
///
/// The token is opaque to the client: never parsed, never verified locally,
/// only stored, checksummed for cache partitioning, and attached to outgoing
/// requests. `Debug` output is redacted so the raw secret cannot leak through
/// logs or panic messages.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Bearer(String);

impl Bearer {
    /// Validating constructor; rejects blank input.
    pub fn new(raw: impl Into<String>) -> Result<Self, IdentityError> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            return Err(IdentityError::validation("bearer must not be empty"));
        }
        Ok(Self(raw))
    }

    /// Raw credential, for checksum input and the HTTP collaborator.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Value for an outgoing `Authorization` header.
    pub fn authorization_value(&self) -> String {
        format!("Bearer {}", self.0)
    }

    /// True only for credentials smuggled in through a stale snapshot; the
    /// constructor never admits one.
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl core::fmt::Debug for Bearer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("Bearer(***)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_is_rejected() {
        assert!(Bearer::new("").is_err());
        assert!(Bearer::new("   ").is_err());
        assert!(Bearer::new("tok-1").is_ok());
    }

    #[test]
    fn debug_is_redacted() {
        let bearer = Bearer::new("super-secret-token").unwrap();
        let rendered = format!("{bearer:?}");
        assert!(!rendered.contains("super-secret-token"));
        assert_eq!(rendered, "Bearer(***)");
    }

    #[test]
    fn authorization_header_value() {
        let bearer = Bearer::new("abc123").unwrap();
        assert_eq!(bearer.authorization_value(), "Bearer abc123");
    }

    #[test]
    fn serializes_transparently() {
        let bearer = Bearer::new("abc123").unwrap();
        assert_eq!(serde_json::to_string(&bearer).unwrap(), "\"abc123\"");
        let back: Bearer = serde_json::from_str("\"abc123\"").unwrap();
        assert_eq!(back, bearer);
    }

    #[test]
    fn blank_survives_deserialization_for_scrubbing() {
        let bearer: Bearer = serde_json::from_str("\"\"").unwrap();
        assert!(bearer.is_blank());
    }
}
