//! Structured logging setup.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_FILTER: &str = "info,sqlx=warn";

fn filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// JSON logs on stdout, filtered by `RUST_LOG`. Call once at service startup;
/// later calls are ignored.
pub fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(filter())
        .with(fmt::layer().json().with_current_span(true).with_span_list(false))
        .try_init();
}

/// Plain-text logs routed through the test harness so they only show up for
/// failing tests.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::registry()
        .with(filter())
        .with(fmt::layer().with_test_writer())
        .try_init();
}
