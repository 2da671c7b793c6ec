//! Owned session state with a synchronous change-notification contract.

use std::sync::Arc;

use chrono::Utc;
use parking_lot::Mutex;
use tracing::{debug, warn};

use opsdesk_core::{IdentityError, IdentityResult, UserId};

use crate::collection::SessionCollection;
use crate::fingerprint::namespace_for;
use crate::record::{Invalidation, SessionRecord};
use crate::vault::SessionVault;

// ─────────────────────────────────────────────────────────────────────────────
// Events & Subscriptions
// ─────────────────────────────────────────────────────────────────────────────

/// Change notification delivered to subscribers after each mutation.
///
/// Events carry ids, not records: by the time a listener runs, the store
/// already reflects the mutation, so listeners read whatever state they need.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A record was inserted or replaced and made active.
    LoggedIn { user_id: UserId },
    /// The active pointer moved.
    Switched { from: Option<UserId>, to: UserId },
    /// A record was marked dead by a server signal.
    Invalidated { user_id: UserId },
    /// A record left the collection.
    LoggedOut { user_id: UserId, was_active: bool },
}

/// Handle returned by [`SessionStore::subscribe`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

type Listener = Arc<dyn Fn(&SessionEvent) + Send + Sync>;

#[derive(Default)]
struct SubscriberRegistry {
    next_id: u64,
    entries: Vec<(SubscriberId, Listener)>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Session Store
// ─────────────────────────────────────────────────────────────────────────────

/// Owns the session collection, the active pointer, and the subscriber list.
///
/// Mutations are synchronous and complete in full (state change, persistence,
/// notification fan-out) before returning, so `current()` reflects a mutation
/// immediately after the call, including inside a listener. No lock is held
/// while listeners run: a listener may subscribe, unsubscribe, or re-enter
/// any mutation; the nested mutation finishes (with its own full fan-out)
/// before the outer dispatch resumes over its original snapshot of the
/// subscriber list.
pub struct SessionStore {
    state: Mutex<SessionCollection>,
    subscribers: Mutex<SubscriberRegistry>,
    vault: Option<Arc<dyn SessionVault>>,
}

impl SessionStore {
    /// Empty store with no persistence collaborator.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(SessionCollection::new()),
            subscribers: Mutex::new(SubscriberRegistry::default()),
            vault: None,
        }
    }

    pub fn arc() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Store backed by a persistence collaborator.
    ///
    /// The previous snapshot, if any, is restored and sanitized; a missing or
    /// unreadable snapshot starts the store logged out. Every successful
    /// mutation is saved back; a failing save is logged and never fails the
    /// mutation.
    pub fn with_vault(vault: Arc<dyn SessionVault>) -> Self {
        let mut collection = match vault.load() {
            Ok(Some(collection)) => collection,
            Ok(None) => SessionCollection::new(),
            Err(err) => {
                warn!(error = %err, "failed to restore session snapshot, starting logged out");
                SessionCollection::new()
            }
        };
        collection.sanitize();
        Self {
            state: Mutex::new(collection),
            subscribers: Mutex::new(SubscriberRegistry::default()),
            vault: Some(vault),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Read surface
    // ─────────────────────────────────────────────────────────────────────────

    /// The active record, if any.
    pub fn current(&self) -> Option<SessionRecord> {
        self.state.lock().active_record().cloned()
    }

    pub fn is_logged_in(&self) -> bool {
        self.state.lock().active_record().is_some()
    }

    pub fn active_user_id(&self) -> Option<UserId> {
        self.state.lock().active
    }

    /// All held records in collection order.
    pub fn sessions(&self) -> Vec<SessionRecord> {
        self.state.lock().records.clone()
    }

    /// Cache namespace of the active identity (`"anon"` when logged out).
    pub fn cache_namespace(&self) -> String {
        namespace_for(self.state.lock().active_record())
    }

    /// Full copy of the collection.
    pub fn snapshot(&self) -> SessionCollection {
        self.state.lock().clone()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Mutation surface
    // ─────────────────────────────────────────────────────────────────────────

    /// Insert or replace the record by user id and make it active.
    ///
    /// A re-login or token refresh for a held identity replaces the record in
    /// place, keeping its position in the switch-account list.
    pub fn login(&self, record: SessionRecord) {
        let user_id = record.user_id;
        let snapshot = {
            let mut state = self.state.lock();
            state.upsert(record);
            state.active = Some(user_id);
            state.clone()
        };
        debug!(user_id = user_id.get(), "session login");
        self.persist(&snapshot);
        self.dispatch(&SessionEvent::LoggedIn { user_id });
    }

    /// Point the active identity at an already-held record.
    ///
    /// Reports [`IdentityError::UnknownUser`] when the id is not held; the
    /// caller decides what to show. Switching to the already-active id is a
    /// mutation like any other and still notifies once.
    pub fn switch_user(&self, user_id: UserId) -> IdentityResult<()> {
        let (from, snapshot) = {
            let mut state = self.state.lock();
            if !state.contains(user_id) {
                return Err(IdentityError::unknown_user(user_id));
            }
            let from = state.active;
            state.active = Some(user_id);
            (from, state.clone())
        };
        debug!(user_id = user_id.get(), "session switch");
        self.persist(&snapshot);
        self.dispatch(&SessionEvent::Switched { from, to: user_id });
        Ok(())
    }

    /// Record a server signal that the identity's credential is dead.
    ///
    /// Idempotent per reason: repeating the same signal (parallel in-flight
    /// requests all failing the same way) changes nothing and does not
    /// notify, so remediation UI is not re-triggered. A different reason
    /// refreshes the stored reason, keeps the first observation time, and
    /// notifies. An id that is not held is a no-op.
    ///
    /// Returns whether an observable transition happened.
    pub fn invalidate_user(&self, user_id: UserId, reason: impl Into<String>) -> bool {
        let reason = reason.into();
        let snapshot = {
            let mut state = self.state.lock();
            let Some(record) = state.get_mut(user_id) else {
                return false;
            };
            match &mut record.invalidated {
                Some(existing) if existing.reason == reason => return false,
                Some(existing) => existing.reason = reason.clone(),
                None => {
                    record.invalidated = Some(Invalidation {
                        at: Utc::now(),
                        reason: reason.clone(),
                    });
                }
            }
            state.clone()
        };
        warn!(user_id = user_id.get(), reason = %reason, "session invalidated by server signal");
        self.persist(&snapshot);
        self.dispatch(&SessionEvent::Invalidated { user_id });
        true
    }

    /// [`invalidate_user`](Self::invalidate_user) against the active
    /// identity, the form the HTTP collaborator uses when a response envelope
    /// carries a credential-death state code.
    pub fn invalidate_active(&self, reason: impl Into<String>) -> bool {
        match self.active_user_id() {
            Some(user_id) => self.invalidate_user(user_id, reason),
            None => false,
        }
    }

    /// Remove an identity from the collection (default: the active one).
    ///
    /// Removing the active record resets the pointer in the same step. An id
    /// that is not held, or a default logout while logged out, is a no-op
    /// returning `None` with no notification.
    pub fn logout(&self, user_id: Option<UserId>) -> Option<SessionRecord> {
        let (removed, was_active, snapshot) = {
            let mut state = self.state.lock();
            let target = user_id.or(state.active)?;
            let was_active = state.active == Some(target);
            let removed = state.remove(target)?;
            (removed, was_active, state.clone())
        };
        debug!(user_id = removed.user_id.get(), was_active, "session logout");
        self.persist(&snapshot);
        self.dispatch(&SessionEvent::LoggedOut {
            user_id: removed.user_id,
            was_active,
        });
        Some(removed)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Subscriptions
    // ─────────────────────────────────────────────────────────────────────────

    /// Register a listener invoked after every successful mutation.
    pub fn subscribe(&self, listener: impl Fn(&SessionEvent) + Send + Sync + 'static) -> SubscriberId {
        let mut subs = self.subscribers.lock();
        let id = SubscriberId(subs.next_id);
        subs.next_id += 1;
        subs.entries.push((id, Arc::new(listener)));
        id
    }

    /// Drop a listener. Returns whether it was registered.
    pub fn unsubscribe(&self, id: SubscriberId) -> bool {
        let mut subs = self.subscribers.lock();
        let before = subs.entries.len();
        subs.entries.retain(|(sid, _)| *sid != id);
        subs.entries.len() != before
    }

    fn dispatch(&self, event: &SessionEvent) {
        // Snapshot first and invoke with no lock held, so listeners can
        // subscribe, unsubscribe, or re-enter mutations; registry changes
        // apply to later dispatches only.
        let listeners: Vec<Listener> = {
            let subs = self.subscribers.lock();
            subs.entries.iter().map(|(_, l)| Arc::clone(l)).collect()
        };
        for listener in listeners {
            listener(event);
        }
    }

    fn persist(&self, snapshot: &SessionCollection) {
        if let Some(vault) = &self.vault {
            if let Err(err) = vault.save(snapshot) {
                warn!(error = %err, "failed to persist session snapshot");
            }
        }
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
