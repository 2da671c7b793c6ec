//! The `result`-header envelope shared by every server endpoint.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EnvelopeError {
    #[error("malformed envelope: {0}")]
    Malformed(#[from] serde_json::Error),
}

// ─────────────────────────────────────────────────────────────────────────────
// Wire shape
// ─────────────────────────────────────────────────────────────────────────────

/// The `result` header present on every response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvelopeResult {
    pub code: String,
    pub state: String,
    pub message: String,
}

/// A parsed response body: the header plus whatever payload the endpoint
/// returned. The payload stays untyped here; endpoint clients deserialize it
/// into their own types.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiEnvelope {
    pub result: EnvelopeResult,
    #[serde(default)]
    pub response: Value,
}

// ─────────────────────────────────────────────────────────────────────────────
// Classification
// ─────────────────────────────────────────────────────────────────────────────

/// Credential-death states: the server says the bearer is no longer anyone.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum AuthRejection {
    /// No recognizable login behind the request.
    NotLogin,
    /// The bearer was recognized and refused (revoked, superseded).
    BadToken,
    /// The bearer could not be parsed at all.
    TokenParse,
}

impl AuthRejection {
    pub fn from_state(state: &str) -> Option<Self> {
        match state {
            "not_login" => Some(Self::NotLogin),
            "bad_token" => Some(Self::BadToken),
            "token_wrong" => Some(Self::TokenParse),
            _ => None,
        }
    }

    pub fn as_state(&self) -> &'static str {
        match self {
            Self::NotLogin => "not_login",
            Self::BadToken => "bad_token",
            Self::TokenParse => "token_wrong",
        }
    }
}

/// Second-factor challenge: the password round succeeded and the server
/// wants another factor before issuing a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MfaChallenge {
    /// Short-lived handoff token for the second-factor round.
    pub mfa_token: String,
}

impl ApiEnvelope {
    pub fn parse(body: &str) -> Result<Self, EnvelopeError> {
        Ok(serde_json::from_str(body)?)
    }

    /// Whether the request did what it asked.
    pub fn is_ok(&self) -> bool {
        self.result.code == "200" && self.result.state == "ok"
    }

    /// The credential-death classification, if this envelope carries one.
    ///
    /// Authorization denials (`check_fail`) are deliberately absent: being
    /// forbidden proves the server knows who the caller is, so the session
    /// must not be torn down over one.
    pub fn auth_rejection(&self) -> Option<AuthRejection> {
        AuthRejection::from_state(&self.result.state)
    }

    /// The second-factor challenge, when the state asks for one and the
    /// payload carries the handoff token.
    pub fn mfa_challenge(&self) -> Option<MfaChallenge> {
        if self.result.state != "mfa_need" {
            return None;
        }
        let mfa_token = self.response.get("mfa_token")?.as_str()?.to_string();
        Some(MfaChallenge { mfa_token })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
