//! Session records held by the client.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use opsdesk_core::{Bearer, UserId};

// ─────────────────────────────────────────────────────────────────────────────
// Login Kind
// ─────────────────────────────────────────────────────────────────────────────

/// How an identity authenticated.
///
/// Shown in the account-switch UI. Values a newer server may add deserialize
/// as `Unknown` instead of failing the whole snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LoginKind {
    /// Account-name + password sign-in.
    Name,
    /// E-mail code sign-in.
    Mail,
    /// SMS code sign-in.
    Sms,
    /// Delegated sign-in through an application (OAuth-style).
    App,
    #[serde(other)]
    #[default]
    Unknown,
}

impl core::fmt::Display for LoginKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            LoginKind::Name => write!(f, "name"),
            LoginKind::Mail => write!(f, "mail"),
            LoginKind::Sms => write!(f, "sms"),
            LoginKind::App => write!(f, "app"),
            LoginKind::Unknown => write!(f, "unknown"),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Invalidation
// ─────────────────────────────────────────────────────────────────────────────

/// Server-originated signal that a credential is dead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invalidation {
    /// When the signal was first observed client-side.
    #[serde(with = "chrono::serde::ts_seconds")]
    pub at: DateTime<Utc>,
    /// Free-text reason relayed from the server.
    pub reason: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// Session Record
// ─────────────────────────────────────────────────────────────────────────────

/// One authenticated identity held by the client.
///
/// # Invariants
/// - `user_id` is unique within a [`SessionCollection`](crate::SessionCollection).
/// - `bearer` is never cleared once admitted; a dead credential is expressed
///   through `invalidated`, so other surfaces can still attribute cached data
///   and show the record for remediation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub user_id: UserId,

    /// Human-readable label for the switch-account UI.
    pub display_name: String,

    pub bearer: Bearer,

    pub login_kind: LoginKind,

    #[serde(with = "chrono::serde::ts_seconds")]
    pub login_at: DateTime<Utc>,

    /// Absent means no fixed expiry known to the client.
    #[serde(default, with = "chrono::serde::ts_seconds_option")]
    pub expires_at: Option<DateTime<Utc>>,

    /// Set when the server signals the credential is no longer valid.
    #[serde(default)]
    pub invalidated: Option<Invalidation>,
}

impl SessionRecord {
    pub fn new(
        user_id: UserId,
        display_name: impl Into<String>,
        bearer: Bearer,
        login_kind: LoginKind,
        login_at: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id,
            display_name: display_name.into(),
            bearer,
            login_kind,
            login_at,
            expires_at: None,
            invalidated: None,
        }
    }

    pub fn with_expiry(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    /// Token refresh: a new credential for the same identity. The previous
    /// invalidation, if any, applied to the old credential and is cleared.
    pub fn refreshed(mut self, bearer: Bearer, expires_at: Option<DateTime<Utc>>) -> Self {
        self.bearer = bearer;
        self.expires_at = expires_at;
        self.invalidated = None;
        self
    }
}
