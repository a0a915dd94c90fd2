/*!
 * Monitoring
 * Kernel metrics and structured tracing
 */

mod metrics;
mod tracer;

pub use metrics::{KernelMetrics, MetricsSnapshot};
pub use tracer::{init_tracing, SvcSpan};
