//! `opsdesk-session` — client-side multi-account session core.
//!
//! Tracks the authenticated identities a single client context holds, which
//! one is active, how healthy each credential is, and which cache namespace
//! the active identity's data belongs to. Presentation, HTTP transport, and
//! routing stay outside; they consume the read surface and call the mutation
//! surface defined here.

pub mod collection;
pub mod controller;
pub mod fingerprint;
pub mod record;
pub mod status;
pub mod store;
pub mod vault;

#[cfg(test)]
mod integration_tests;

pub use collection::SessionCollection;
pub use controller::{RemediationPlan, SessionLifecycleController};
pub use fingerprint::{
    ANON_NAMESPACE, FingerprintMemo, fingerprint, namespace_for, record_fingerprint,
};
pub use record::{Invalidation, LoginKind, SessionRecord};
pub use status::{SessionStatus, classify};
pub use store::{SessionEvent, SessionStore, SubscriberId};
pub use vault::{InMemoryVault, JsonFileVault, SessionVault, VaultError};
