//! Pure session-health classification.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::record::SessionRecord;

/// Health of one identity at a given instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SessionStatus {
    /// Credential usable as far as the client knows.
    Active,
    /// Past its client-known expiry.
    Expired {
        #[serde(with = "chrono::serde::ts_seconds")]
        expired_at: DateTime<Utc>,
    },
    /// The server declared the credential dead (revoked, superseded by a
    /// concurrent login, forced logout).
    Invalid {
        #[serde(with = "chrono::serde::ts_seconds")]
        at: DateTime<Utc>,
        reason: String,
    },
}

impl SessionStatus {
    pub fn is_active(&self) -> bool {
        matches!(self, SessionStatus::Active)
    }
}

/// Classify a record against the given wall clock.
///
/// Ordered, first match wins: a server invalidation is authoritative and
/// reason-bearing, so it must not be masked by a coincidental client-side
/// expiry; expiry is the fallback for servers that never push an explicit
/// signal. A missing timestamp means the condition is not met, never an
/// error.
pub fn classify(record: &SessionRecord, now: DateTime<Utc>) -> SessionStatus {
    if let Some(invalidation) = &record.invalidated {
        let reason = if invalidation.reason.is_empty() {
            "unknown".to_string()
        } else {
            invalidation.reason.clone()
        };
        return SessionStatus::Invalid {
            at: invalidation.at,
            reason,
        };
    }
    if let Some(expired_at) = record.expires_at {
        if now >= expired_at {
            return SessionStatus::Expired { expired_at };
        }
    }
    SessionStatus::Active
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use opsdesk_core::{Bearer, UserId};
    use proptest::prelude::*;

    use crate::record::{Invalidation, LoginKind};

    fn test_time(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn test_record() -> SessionRecord {
        SessionRecord::new(
            UserId::new(1).unwrap(),
            "Alice",
            Bearer::new("tok-1").unwrap(),
            LoginKind::Name,
            test_time(1_000),
        )
    }

    #[test]
    fn no_expiry_and_no_invalidation_is_active() {
        assert_eq!(classify(&test_record(), test_time(9_999_999)), SessionStatus::Active);
    }

    #[test]
    fn expiry_boundary_is_inclusive() {
        let record = test_record().with_expiry(test_time(2_000));

        assert!(classify(&record, test_time(1_999)).is_active());
        assert_eq!(
            classify(&record, test_time(2_000)),
            SessionStatus::Expired { expired_at: test_time(2_000) }
        );
        assert_eq!(
            classify(&record, test_time(5_000)),
            SessionStatus::Expired { expired_at: test_time(2_000) }
        );
    }

    #[test]
    fn invalidation_outranks_expiry() {
        let mut record = test_record().with_expiry(test_time(2_000));
        record.invalidated = Some(Invalidation {
            at: test_time(3_000),
            reason: "concurrent login".to_string(),
        });

        assert_eq!(
            classify(&record, test_time(5_000)),
            SessionStatus::Invalid {
                at: test_time(3_000),
                reason: "concurrent login".to_string(),
            }
        );
    }

    #[test]
    fn empty_invalidation_reason_reads_unknown() {
        let mut record = test_record();
        record.invalidated = Some(Invalidation {
            at: test_time(3_000),
            reason: String::new(),
        });

        let SessionStatus::Invalid { reason, .. } = classify(&record, test_time(3_001)) else {
            panic!("expected Invalid");
        };
        assert_eq!(reason, "unknown");
    }

    #[test]
    fn status_serializes_with_kind_tag() {
        let status = SessionStatus::Expired { expired_at: test_time(2_000) };
        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["kind"], "expired");
        assert_eq!(json["expired_at"], 2_000);
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: an invalidated record classifies `Invalid` for every
        /// combination of expiry and clock.
        #[test]
        fn invalidation_wins_for_all_clocks(
            expiry in proptest::option::of(0i64..4_000_000_000),
            invalidated_at in 0i64..4_000_000_000,
            now in 0i64..4_000_000_000,
        ) {
            let mut record = test_record();
            record.expires_at = expiry.map(test_time);
            record.invalidated = Some(Invalidation {
                at: test_time(invalidated_at),
                reason: "r".to_string(),
            });

            prop_assert!(
                matches!(
                    classify(&record, test_time(now)),
                    SessionStatus::Invalid { .. }
                ),
                "expected SessionStatus::Invalid"
            );
        }

        /// Property: with no invalidation, the classification follows the
        /// expiry comparison alone.
        #[test]
        fn expiry_comparison_decides_when_not_invalidated(
            expires_at in 0i64..4_000_000_000,
            now in 0i64..4_000_000_000,
        ) {
            let record = test_record().with_expiry(test_time(expires_at));
            let status = classify(&record, test_time(now));

            if now >= expires_at {
                prop_assert_eq!(status, SessionStatus::Expired { expired_at: test_time(expires_at) });
            } else {
                prop_assert_eq!(status, SessionStatus::Active);
            }
        }
    }
}
