//! Whole-lifecycle coverage: restore from a stale snapshot, authenticate,
//! take a server credential-death signal through the envelope layer, offer
//! remediation, switch, log out, and restart.

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use parking_lot::Mutex;
use serde_json::json;

use opsdesk_core::{Bearer, UserId};
use opsdesk_envelope::{ApiEnvelope, AuthRejection};

use crate::controller::SessionLifecycleController;
use crate::fingerprint::ANON_NAMESPACE;
use crate::record::{LoginKind, SessionRecord};
use crate::status::SessionStatus;
use crate::store::SessionStore;
use crate::vault::JsonFileVault;

fn id(raw: u64) -> UserId {
    UserId::new(raw).unwrap()
}

fn record(raw: u64, name: &str, token: &str) -> SessionRecord {
    SessionRecord::new(
        id(raw),
        name,
        Bearer::new(token).unwrap(),
        LoginKind::Name,
        Utc.timestamp_opt(1_700_000_100, 0).unwrap(),
    )
}

#[test]
fn lifecycle_across_restore_invalidation_switch_and_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sessions.json");

    // A previous run left a snapshot with junk in it: a zero id, a blank
    // bearer, and a pointer at a record that is gone.
    let stale = json!({
        "records": [
            { "user_id": 1, "display_name": "alice", "bearer": "tok-alice",
              "login_kind": "name", "login_at": 1_700_000_000 },
            { "user_id": 0, "display_name": "ghost", "bearer": "tok-ghost",
              "login_kind": "name", "login_at": 1_700_000_000 },
            { "user_id": 5, "display_name": "mute", "bearer": "",
              "login_kind": "mail", "login_at": 1_700_000_000 }
        ],
        "active": 9
    });
    std::fs::write(&path, serde_json::to_vec(&stale).unwrap()).unwrap();

    let store = Arc::new(SessionStore::with_vault(Arc::new(JsonFileVault::new(&path))));

    // Restore self-healed: only alice survives and nobody is active.
    assert!(!store.is_logged_in());
    assert_eq!(store.sessions().len(), 1);
    assert_eq!(store.cache_namespace(), ANON_NAMESPACE);

    // Bob signs in; cached data stops being keyed as anonymous.
    store.login(record(2, "bob", "tok-bob"));
    assert!(store.is_logged_in());
    let bob_namespace = store.cache_namespace();
    assert!(bob_namespace.starts_with("2_"));

    let plans = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&plans);
    let controller = SessionLifecycleController::attach(Arc::clone(&store), move |plan| {
        sink.lock().push(plan);
    });

    // The HTTP layer sees a credential-death envelope on some in-flight
    // request and reports it against the active identity.
    let body = r#"{"result":{"code":"200","state":"not_login","message":"login required"},"response":{}}"#;
    let envelope = ApiEnvelope::parse(body).unwrap();
    assert!(!envelope.is_ok());
    assert_eq!(envelope.auth_rejection(), Some(AuthRejection::NotLogin));
    assert!(store.invalidate_active(envelope.result.message.clone()));

    // The controller turned that into a remediation offer: alice is healthy.
    let pushed = plans.lock().clone();
    assert_eq!(pushed.len(), 1);
    assert_eq!(pushed[0].afflicted.user_id, id(2));
    let SessionStatus::Invalid { reason, .. } = &pushed[0].status else {
        panic!("expected invalid status, got {:?}", pushed[0].status);
    };
    assert_eq!(reason, "login required");
    let candidates: Vec<_> = pushed[0]
        .switch_candidates
        .iter()
        .map(|r| r.user_id)
        .collect();
    assert_eq!(candidates, vec![id(1)]);

    // The user takes the offer, then drops the dead identity.
    store.switch_user(id(1)).unwrap();
    assert_ne!(store.cache_namespace(), bob_namespace);
    store.logout(Some(id(2)));

    // Healthy mutations produced no further remediation pushes.
    assert_eq!(plans.lock().len(), 1);
    controller.detach();

    // A later process start sees what this run persisted.
    let restarted = SessionStore::with_vault(Arc::new(JsonFileVault::new(&path)));
    assert_eq!(restarted.active_user_id(), Some(id(1)));
    let sessions = restarted.sessions();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].display_name, "alice");
    assert_eq!(sessions[0].bearer.as_str(), "tok-alice");
}

#[test]
fn authorization_failure_is_not_a_credential_death() {
    let store = SessionStore::new();
    store.login(record(4, "dana", "tok-dana"));

    // Forbidden means "you may not do this", not "you are nobody": the HTTP
    // layer finds no rejection to report and the identity stays healthy.
    let body = r#"{"result":{"code":"403","state":"check_fail","message":"access denied"},"response":{}}"#;
    let envelope = ApiEnvelope::parse(body).unwrap();
    assert!(!envelope.is_ok());
    assert!(envelope.auth_rejection().is_none());
    assert!(store.current().unwrap().invalidated.is_none());
}

#[test]
fn mfa_challenge_leaves_held_sessions_untouched() {
    let store = SessionStore::new();
    store.login(record(4, "dana", "tok-dana"));

    let body = r#"{"result":{"code":"200","state":"mfa_need","message":"second factor required"},"response":{"mfa_token":"mfa-abc"}}"#;
    let envelope = ApiEnvelope::parse(body).unwrap();
    assert!(envelope.auth_rejection().is_none());
    assert_eq!(envelope.mfa_challenge().unwrap().mfa_token, "mfa-abc");
    assert!(store.current().unwrap().invalidated.is_none());
}
