//! Credential-derived cache-namespace keys.
//!
//! Every cached query result is keyed under the active identity's namespace
//! so that switching accounts without a full reload can never serve one
//! identity's cached data to another, and an anonymous visitor's cache is
//! never attributed to a later login.

use crc32fast::Hasher as Crc32;
use parking_lot::Mutex;

use crate::record::SessionRecord;

/// Namespace for anonymous / logged-out cache entries.
pub const ANON_NAMESPACE: &str = "anon";

/// Compute the cache-partition key for an identity.
///
/// The key embeds the user id plus a checksum of the credential, never the
/// credential itself, so it may appear in cache inspectors and debug output.
/// It is a partition key, not a security boundary; server-side authorization
/// remains the real fence.
pub fn fingerprint(user_id: u64, bearer: &str) -> String {
    if user_id == 0 || bearer.is_empty() {
        return ANON_NAMESPACE.to_string();
    }
    let mut hasher = Crc32::new();
    hasher.update(bearer.as_bytes());
    format!("{}_{}", user_id, to_base36(hasher.finalize()))
}

/// Key for a held record.
pub fn record_fingerprint(record: &SessionRecord) -> String {
    fingerprint(record.user_id.get(), record.bearer.as_str())
}

/// Key for the possibly-absent active record.
pub fn namespace_for(record: Option<&SessionRecord>) -> String {
    match record {
        Some(record) => record_fingerprint(record),
        None => ANON_NAMESPACE.to_string(),
    }
}

fn to_base36(mut value: u32) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if value == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::with_capacity(7);
    while value > 0 {
        digits.push(DIGITS[(value % 36) as usize] as char);
        value /= 36;
    }
    digits.iter().rev().collect()
}

/// Last-value memo over [`fingerprint`].
///
/// Lookups repeat for the same identity far more often than the identity
/// changes (every cache read keys through the active record), so the memo
/// compares the input pair by value and skips the checksum when unchanged.
#[derive(Default)]
pub struct FingerprintMemo {
    inner: Mutex<MemoInner>,
}

#[derive(Default)]
struct MemoInner {
    last: Option<MemoEntry>,
    recomputes: u64,
}

struct MemoEntry {
    user_id: u64,
    bearer: String,
    key: String,
}

impl FingerprintMemo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Memoized [`fingerprint`].
    pub fn key(&self, user_id: u64, bearer: &str) -> String {
        let mut inner = self.inner.lock();
        if let Some(entry) = &inner.last {
            if entry.user_id == user_id && entry.bearer == bearer {
                return entry.key.clone();
            }
        }
        let key = fingerprint(user_id, bearer);
        inner.recomputes += 1;
        inner.last = Some(MemoEntry {
            user_id,
            bearer: bearer.to_string(),
            key: key.clone(),
        });
        key
    }

    /// Memoized [`namespace_for`].
    pub fn key_for(&self, record: Option<&SessionRecord>) -> String {
        match record {
            Some(record) => self.key(record.user_id.get(), record.bearer.as_str()),
            None => ANON_NAMESPACE.to_string(),
        }
    }

    /// Number of times the checksum actually ran.
    pub fn recompute_count(&self) -> u64 {
        self.inner.lock().recomputes
    }
}

// The memo caches a raw credential; keep it out of debug output the same way
// `Bearer` does.
impl core::fmt::Debug for FingerprintMemo {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FingerprintMemo")
            .field("recomputes", &self.inner.lock().recomputes)
            .finish_non_exhaustive()
    }
}
