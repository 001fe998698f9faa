/*!
 * Structured Tracing
 * Subscriber setup and the per-PE span used by the launcher
 */

use std::sync::Once;
use tracing::{info, info_span, Span};
use tracing_subscriber::{
    fmt::format::FmtSpan,
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

static INIT: Once = Once::new();

/// Initialize structured tracing
///
/// Environment variables:
/// - RUST_LOG: Set log level (default: info)
/// - SHMEM_TRACE_JSON: Enable JSON output (default: false)
///
/// Only the first call installs a subscriber, and a global subscriber that
/// is already installed is left alone.
pub fn init_tracing() {
    INIT.call_once(|| {
        let use_json = std::env::var("SHMEM_TRACE_JSON")
            .map(|v| v == "1" || v == "true")
            .unwrap_or(false);
        install(use_json);
    });
}

fn install(use_json: bool) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);

    let installed = if use_json {
        // JSON output for production/parsing
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_current_span(true)
                    .with_span_list(true),
            )
            .try_init()
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_span_events(FmtSpan::CLOSE)
                    .compact(),
            )
            .try_init()
    };

    if installed.is_ok() {
        info!(json = use_json, "structured tracing initialized");
    }
}

/// Span wrapping everything one PE thread does
pub fn pe_span(rank: usize, n_pes: usize) -> Span {
    info_span!("pe", rank, n_pes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        init_tracing();
        init_tracing();
        let span = pe_span(2, 4);
        let _entered = span.enter();
        info!("inside pe span");
    }
}
