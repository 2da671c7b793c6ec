//! Ordered, user-unique session collection.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::warn;

use opsdesk_core::UserId;

use crate::record::SessionRecord;

/// The identities a client context holds, plus the active pointer.
///
/// This is also the persisted shape: a vault snapshot is exactly one
/// collection.
///
/// # Invariants
/// - `user_id` is unique across `records`; order is insertion order.
/// - If `active` is set it references a record in `records`. Mutations that
///   remove the active record reset the pointer in the same step, so a
///   dangling pointer is never observable through [`SessionStore`](crate::SessionStore).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionCollection {
    pub records: Vec<SessionRecord>,
    pub active: Option<UserId>,
}

impl SessionCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn contains(&self, user_id: UserId) -> bool {
        self.records.iter().any(|r| r.user_id == user_id)
    }

    pub fn get(&self, user_id: UserId) -> Option<&SessionRecord> {
        self.records.iter().find(|r| r.user_id == user_id)
    }

    pub(crate) fn get_mut(&mut self, user_id: UserId) -> Option<&mut SessionRecord> {
        self.records.iter_mut().find(|r| r.user_id == user_id)
    }

    pub fn active_record(&self) -> Option<&SessionRecord> {
        self.get(self.active?)
    }

    /// Insert, or replace in place when the id is already held (a re-login or
    /// token refresh keeps the record's position in the switch-account list).
    pub fn upsert(&mut self, record: SessionRecord) {
        match self.get_mut(record.user_id) {
            Some(existing) => *existing = record,
            None => self.records.push(record),
        }
    }

    /// Remove by id. A pointer at the removed record resets in the same step.
    pub fn remove(&mut self, user_id: UserId) -> Option<SessionRecord> {
        let idx = self.records.iter().position(|r| r.user_id == user_id)?;
        let removed = self.records.remove(idx);
        if self.active == Some(user_id) {
            self.active = None;
        }
        Some(removed)
    }

    /// Self-heal a collection restored from durable storage.
    ///
    /// Stale snapshots may carry records no constructor would admit (zero id,
    /// blank credential, duplicated id) or a pointer at a record that is no
    /// longer present. Each is dropped or reset rather than treated as fatal.
    pub fn sanitize(&mut self) {
        let mut seen = HashSet::new();
        self.records.retain(|record| {
            if record.user_id.get() == 0 || record.bearer.is_blank() {
                warn!(
                    user_id = record.user_id.get(),
                    "dropping unusable session from restored snapshot"
                );
                return false;
            }
            if !seen.insert(record.user_id) {
                warn!(
                    user_id = record.user_id.get(),
                    "dropping duplicate session from restored snapshot"
                );
                return false;
            }
            true
        });

        if let Some(active) = self.active {
            if !self.contains(active) {
                warn!(
                    user_id = active.get(),
                    "restored active pointer references no held session, resetting"
                );
                self.active = None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use opsdesk_core::Bearer;

    use crate::record::LoginKind;

    fn test_record(id: u64) -> SessionRecord {
        SessionRecord::new(
            UserId::new(id).unwrap(),
            format!("user-{id}"),
            Bearer::new(format!("tok-{id}")).unwrap(),
            LoginKind::Name,
            Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
        )
    }

    #[test]
    fn upsert_replaces_in_place() {
        let mut collection = SessionCollection::new();
        collection.upsert(test_record(1));
        collection.upsert(test_record(2));

        let mut refreshed = test_record(1);
        refreshed.display_name = "renamed".to_string();
        collection.upsert(refreshed);

        assert_eq!(collection.len(), 2);
        assert_eq!(collection.records[0].display_name, "renamed");
        assert_eq!(collection.records[1].user_id.get(), 2);
    }

    #[test]
    fn remove_resets_pointer_at_removed_record() {
        let mut collection = SessionCollection::new();
        collection.upsert(test_record(1));
        collection.upsert(test_record(2));
        collection.active = Some(UserId::new(2).unwrap());

        let removed = collection.remove(UserId::new(2).unwrap()).unwrap();
        assert_eq!(removed.user_id.get(), 2);
        assert_eq!(collection.active, None);

        // Removing a non-active record leaves the pointer alone.
        collection.active = Some(UserId::new(1).unwrap());
        assert!(collection.remove(UserId::new(3).unwrap()).is_none());
        assert_eq!(collection.active, Some(UserId::new(1).unwrap()));
    }

    #[test]
    fn sanitize_drops_unusable_records_and_dedups() {
        // A snapshot shaped like something an older build may have written:
        // zero id, blank bearer, duplicate id.
        let json = serde_json::json!({
            "records": [
                { "user_id": 1, "display_name": "ok", "bearer": "tok-1",
                  "login_kind": "name", "login_at": 1_700_000_000 },
                { "user_id": 0, "display_name": "anon", "bearer": "x",
                  "login_kind": "name", "login_at": 1_700_000_000 },
                { "user_id": 2, "display_name": "blank", "bearer": "",
                  "login_kind": "sms", "login_at": 1_700_000_000 },
                { "user_id": 1, "display_name": "dup", "bearer": "tok-1b",
                  "login_kind": "name", "login_at": 1_700_000_001 },
            ],
            "active": 1,
        });
        let mut collection: SessionCollection = serde_json::from_value(json).unwrap();
        collection.sanitize();

        assert_eq!(collection.len(), 1);
        assert_eq!(collection.records[0].display_name, "ok");
        assert_eq!(collection.active, Some(UserId::new(1).unwrap()));
    }

    #[test]
    fn sanitize_resets_dangling_pointer() {
        let mut collection = SessionCollection::new();
        collection.upsert(test_record(1));
        collection.active = Some(UserId::new(9).unwrap());

        collection.sanitize();
        assert_eq!(collection.active, None);
        assert_eq!(collection.len(), 1);
    }
}
