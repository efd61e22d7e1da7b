/*!
 * Waiter Module
 * Synchronous wait primitive and its outcome conventions
 */

mod once;
mod outcome;

pub use once::{wait_once, wait_once_raw};
pub use outcome::WaitOutcome;

pub(crate) use once::{classify, raw_wait};
