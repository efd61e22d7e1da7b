/*!
 * waitpid-context
 * Non-blocking child process supervision for single-threaded event loops
 *
 * - `wait_once` / `wait_once_raw`: one `waitpid(2)` call on the caller's thread
 * - `WaitContext`: background worker + self-pipe, pollable or awaitable
 * - `decode` / `decode_raw`: raw wait status to structured record
 */

pub mod context;
pub mod core;
pub mod monitoring;
pub mod status;
pub mod waiter;

// Re-exports
pub use crate::context::WaitContext;
pub use crate::core::{
    Pid, WaitConfig, WaitError, WaitMode, WaitOption, WaitOptions, WaitResult, ANY_CHILD,
    SUPPORTS_CONTINUED,
};
pub use crate::monitoring::{init_tracing, stats, WaitStatsSnapshot};
pub use crate::status::{decode, decode_raw, ChildState, ChildStatus, StatusRecord};
pub use crate::waiter::{wait_once, wait_once_raw, WaitOutcome};
