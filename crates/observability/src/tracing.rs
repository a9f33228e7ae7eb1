//! Subscriber installation.
//!
//! Every entry point is idempotent: once a global subscriber is set, later
//! calls leave it in place.

use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset.
pub const DEFAULT_DIRECTIVE: &str = "info";

/// JSON logs to stdout, filtered by `RUST_LOG` or [`DEFAULT_DIRECTIVE`].
pub fn init() {
    init_with(DEFAULT_DIRECTIVE);
}

/// Like [`init`], with an explicit fallback directive (e.g. `"permit_auth=debug"`).
pub fn init_with(default_directive: &str) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter(default_directive))
        .json()
        .with_timer(tracing_subscriber::fmt::time::SystemTime)
        .with_current_span(false)
        .with_target(true)
        .try_init();
}

/// Human-readable output routed through the test harness, so logs only show
/// for failing tests.
pub fn init_for_tests() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter("permit_auth=debug,permit_infra=debug"))
        .with_test_writer()
        .try_init();
}

fn filter(default_directive: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_initialization_is_harmless() {
        init_for_tests();
        init_for_tests();
        init();
        ::tracing::debug!(kind = "roles", "after init");
    }
}
