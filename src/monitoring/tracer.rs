/*!
 * Tracing Setup
 * Structured logging for primitives and the agents driving them
 *
 * Primitives emit `tracing` events directly (debug on create/attach, trace
 * on blocking paths, warn on rejected handles and capacity violations).
 * This module only installs a subscriber to collect them.
 */

use tracing::{info, span, Level, Span};
use tracing_subscriber::{
    fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

/// Environment variable selecting JSON output
pub const TRACE_JSON_ENV: &str = "AGENT_SYNC_TRACE_JSON";

/// Initialize structured tracing
///
/// Environment variables:
/// - RUST_LOG: Set log level (default: info)
/// - AGENT_SYNC_TRACE_JSON: Enable JSON output (default: false)
///
/// Panics if a global subscriber is already installed; use
/// `try_init_tracing` where that can happen.
pub fn init_tracing() {
    if let Err(err) = try_init_tracing() {
        panic!("failed to install tracing subscriber: {err}");
    }
}

/// Initialize structured tracing, reporting instead of panicking when a
/// subscriber is already installed
pub fn try_init_tracing() -> Result<(), tracing_subscriber::util::TryInitError> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let use_json = std::env::var(TRACE_JSON_ENV)
        .map(|v| v == "1" || v == "true")
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(env_filter);

    if use_json {
        // JSON output for production/parsing
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_thread_names(true)
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_span_events(FmtSpan::CLOSE),
            )
            .try_init()?;
        info!("Structured tracing initialized with JSON output");
    } else {
        // Human-readable output for development
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_thread_names(true)
                    .with_span_events(FmtSpan::CLOSE)
                    .compact(),
            )
            .try_init()?;
        info!("Structured tracing initialized");
    }
    Ok(())
}

/// Span covering one agent's lifetime, so interleaved events from several
/// agents can be told apart
pub fn span_agent(name: &str) -> Span {
    span!(Level::INFO, "agent", name)
}
