/*!
 * Tracing
 * Subscriber setup and per-SVC spans
 */

use tracing::{debug, info, span, Level};
use tracing_subscriber::{fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global tracing subscriber
///
/// Environment variables:
/// - RUST_LOG: log level filter (default: info)
/// - KERNEL_TRACE_JSON: `1` or `true` for JSON output
///
/// `log` records are forwarded into the subscriber. Returns false if a global
/// subscriber was already installed.
pub fn init_tracing() -> bool {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let use_json = std::env::var("KERNEL_TRACE_JSON")
        .map(|v| v == "1" || v == "true")
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(env_filter);

    let installed = if use_json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_span_events(FmtSpan::CLOSE),
            )
            .try_init()
            .is_ok()
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_span_events(FmtSpan::CLOSE)
                    .compact(),
            )
            .try_init()
            .is_ok()
    };

    if installed {
        info!(json = use_json, "kernel tracing initialized");
    }
    installed
}

/// Span covering one system call
///
/// The guest result word is recorded when the call completes.
pub struct SvcSpan {
    span: tracing::Span,
}

impl SvcSpan {
    pub fn new(svc: u32, name: &'static str, thread: usize) -> Self {
        let span = span!(
            Level::DEBUG,
            "svc",
            svc = svc,
            name = name,
            thread = thread,
            result = tracing::field::Empty,
        );
        debug!(parent: &span, "svc 0x{:02X} ({}) from thread {}", svc, name, thread);
        Self { span }
    }

    /// Enter the span for the duration of the returned guard
    pub fn enter(&self) -> tracing::span::Entered<'_> {
        self.span.enter()
    }

    /// Record the value left in the caller's r0
    pub fn record_result(&self, result: u32) {
        self.span
            .record("result", tracing::field::display(format!("0x{result:08X}")));
    }
}
