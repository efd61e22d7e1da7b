/*!
 * Monitoring Module
 * Tracing setup and lock-free wait statistics
 */

mod atomic_stats;
mod tracer;

pub use atomic_stats::{stats, WaitStats, WaitStatsSnapshot};
pub use tracer::{init_tracing, ENV_TRACE_JSON};
