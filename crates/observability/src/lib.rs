//! Process-level tracing setup shared by opsdesk host applications.

/// Initialize process-wide observability (tracing/logging).
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init();
}

/// Tracing configuration (filters, output shape).
pub mod tracing;
