/*!
 * Monitoring
 * Tracing subscriber setup
 */

mod tracer;

pub use tracer::{init_tracing, span_agent, try_init_tracing, TRACE_JSON_ENV};
