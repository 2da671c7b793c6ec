//! `opsdesk-redirect` — post-auth return-path vetting.
//!
//! After sign-in the client wants to send the user back where they came
//! from. That return path arrives as an untrusted query parameter, which is
//! the classic open-redirect hole. This crate owns the one decision: stay
//! put, or navigate to a vetted same-origin target, and by which mechanism.

pub mod guard;

pub use guard::{RedirectConfigError, RedirectDecision, RedirectGuard};
