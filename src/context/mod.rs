/*!
 * Wait Context Module
 *
 * Non-blocking supervision of a child process:
 * - Notification channel: self-pipe whose closure signals completion
 * - Background worker: detached thread performing the blocking wait
 * - Completion: single-writer-wins arbitration between worker and cancel
 * - Reactor integration: async wait via tokio
 */

mod channel;
mod completion;
mod interrupt;
mod reactor;
mod wait_context;
mod worker;

pub use wait_context::WaitContext;
