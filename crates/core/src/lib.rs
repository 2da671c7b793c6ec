//! `opsdesk-core` — identity foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns)
//! shared by the session, redirect, and envelope crates.

pub mod error;
pub mod id;
pub mod token;

pub use error::{IdentityError, IdentityResult};
pub use id::UserId;
pub use token::Bearer;
