//! `opsdesk-envelope` — response envelope parsing for the HTTP boundary.
//!
//! The server wraps every JSON body in the same envelope. This crate turns a
//! raw body into the one classification the session core cares about: did
//! the request succeed, did it kill the credential, or does it want a second
//! factor. It owns no transport and holds no state.

pub mod wire;

pub use wire::{ApiEnvelope, AuthRejection, EnvelopeError, EnvelopeResult, MfaChallenge};
