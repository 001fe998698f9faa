/*!
 * Monitoring
 * Structured tracing setup; per-PE counters live in the runtime
 */

mod tracer;

pub use tracer::{init_tracing, pe_span};
