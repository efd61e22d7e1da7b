/*!
 * Reactor Integration
 *
 * Async wait on top of the notification channel using tokio's `AsyncFd`.
 * The read end is registered for read-readiness only while awaiting, and
 * deregistered before `fetch` can close it.
 */

use super::wait_context::WaitContext;
use crate::core::errors::WaitResult;
use crate::waiter::WaitOutcome;
use tokio::io::unix::AsyncFd;
use tokio::io::Interest;
use tracing::trace;

impl WaitContext {
    /// Resolve once the outcome is settled
    ///
    /// Must be called within a tokio runtime. No-hang contexts never wait and
    /// may resolve to `Pending`.
    pub async fn wait(&mut self) -> WaitResult<WaitOutcome> {
        loop {
            let outcome = self.fetch()?;
            if outcome.is_settled() || self.is_no_hang() {
                return Ok(outcome);
            }

            let Some(fd) = self.fd() else {
                return self.fetch();
            };

            let registration = AsyncFd::with_interest(fd, Interest::READABLE)?;
            let guard = registration.readable().await?;
            trace!(pid = self.pid(), fd, "notification channel readable");
            drop(guard);
            drop(registration);
        }
    }
}
