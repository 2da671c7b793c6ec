//! Tracing/logging initialization.
//!
//! Hosts embedding the session core call [`init`] once at startup. Session
//! internals log identity ids and transition names, never credentials, so
//! the emitted stream is safe to ship off the device.

use tracing_subscriber::EnvFilter;

/// Initialize tracing/logging for the process with the standard `info`
/// default.
///
/// Safe to call multiple times (subsequent calls are no-ops).
pub fn init() {
    init_with_default("info");
}

/// Initialize with a caller-chosen default directive, for hosts that want
/// their own baseline (say `opsdesk_session=debug`). `RUST_LOG` still
/// overrides.
pub fn init_with_default(directive: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive));

    // JSON logs + timestamps, configurable via RUST_LOG.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .json()
        .with_timer(tracing_subscriber::fmt::time::SystemTime)
        .with_target(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_init_is_a_noop() {
        init();
        init();
        init_with_default("debug");
    }
}
