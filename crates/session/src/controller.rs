//! Remediation glue between the store and a presentation layer.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::record::SessionRecord;
use crate::status::{SessionStatus, classify};
use crate::store::{SessionStore, SubscriberId};

// ─────────────────────────────────────────────────────────────────────────────
// Remediation plan
// ─────────────────────────────────────────────────────────────────────────────

/// What the presentation layer can offer when the active identity is dead.
///
/// Re-authentication is always on the menu, so it carries no field here;
/// `switch_candidates` lists the held identities that are healthy right now,
/// in collection order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemediationPlan {
    /// The active record whose credential is no longer usable.
    pub afflicted: SessionRecord,
    /// Why it is unusable.
    pub status: SessionStatus,
    /// Other held identities worth switching to.
    pub switch_candidates: Vec<SessionRecord>,
}

/// Compute the remediation plan for the active identity, if one is needed.
///
/// `None` means nothing to remediate: either no identity is active, or the
/// active one classifies as healthy at `now`.
pub fn evaluate(store: &SessionStore, now: DateTime<Utc>) -> Option<RemediationPlan> {
    let snapshot = store.snapshot();
    let afflicted = snapshot.active_record()?.clone();
    let status = classify(&afflicted, now);
    if status.is_active() {
        return None;
    }
    let switch_candidates = snapshot
        .records
        .iter()
        .filter(|record| record.user_id != afflicted.user_id)
        .filter(|record| classify(record, now).is_active())
        .cloned()
        .collect();
    Some(RemediationPlan {
        afflicted,
        status,
        switch_candidates,
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Lifecycle controller
// ─────────────────────────────────────────────────────────────────────────────

/// Watches the store and pushes a [`RemediationPlan`] to a presentation sink
/// whenever a mutation leaves the active identity unhealthy.
///
/// The controller makes no UI decisions; it reduces "what is currently true"
/// to "what can be offered" and hands that over. A session that dies by wall
/// clock alone generates no store event, so hosts with long-lived views also
/// call [`evaluate_at`](Self::evaluate_at) on their own cadence.
pub struct SessionLifecycleController {
    store: Arc<SessionStore>,
    subscription: SubscriberId,
}

impl SessionLifecycleController {
    /// Subscribe to the store and feed plans to `sink`.
    ///
    /// The sink runs inside the store's dispatch pass and may itself mutate
    /// the store (an auto-switch, say); the nested mutation completes before
    /// the pass resumes.
    pub fn attach(
        store: Arc<SessionStore>,
        sink: impl Fn(RemediationPlan) + Send + Sync + 'static,
    ) -> Self {
        let weak = Arc::downgrade(&store);
        let subscription = store.subscribe(move |_event| {
            let Some(store) = weak.upgrade() else { return };
            if let Some(plan) = evaluate(&store, Utc::now()) {
                sink(plan);
            }
        });
        Self {
            store,
            subscription,
        }
    }

    /// Recompute the plan at an explicit clock, outside any store event.
    pub fn evaluate_at(&self, now: DateTime<Utc>) -> Option<RemediationPlan> {
        evaluate(&self.store, now)
    }

    /// Stop watching. Dropping the controller does the same; this form
    /// exists so call sites can show intent.
    pub fn detach(self) {}
}

impl Drop for SessionLifecycleController {
    fn drop(&mut self) {
        self.store.unsubscribe(self.subscription);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
