/*!
 * Completion Arbitration
 *
 * Single-writer-wins state shared by a wait context and its worker.
 *
 * # Protocol
 *
 * - Whoever wins `try_claim` (worker result, cancellation, or worker
 *   cleanup) is the only party allowed to publish an outcome
 * - Publishing stores the outcome, then closes the write end under the guard
 *   lock, so a reader that observes EOF also observes the outcome
 * - The guard lock also covers the worker registration, so an interrupt is
 *   never sent to a thread that has already left
 */

use super::interrupt;
use crate::core::errors::WaitResult;
use crate::monitoring::stats;
use crate::waiter::WaitOutcome;
use nix::sys::pthread::Pthread;
use nix::sys::signal::Signal;
use parking_lot::Mutex;
use std::os::fd::OwnedFd;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::OnceLock;
use tracing::{debug, warn};

/// Worker thread identity, valid while registered under the guard
#[derive(Debug, Clone, Copy)]
struct WorkerThread(Pthread);

// SAFETY: the id is an opaque handle only passed to pthread_kill, and only
// while the owning thread is registered.
unsafe impl Send for WorkerThread {}

#[derive(Debug)]
struct Guarded {
    writer: Option<OwnedFd>,
    worker: Option<WorkerThread>,
}

/// Shared completion state of a threaded wait
#[derive(Debug)]
pub(crate) struct Completion {
    claimed: AtomicBool,
    outcome: OnceLock<WaitResult<WaitOutcome>>,
    guard: Mutex<Guarded>,
}

impl Completion {
    pub(crate) fn new(writer: OwnedFd) -> Self {
        Self {
            claimed: AtomicBool::new(false),
            outcome: OnceLock::new(),
            guard: Mutex::new(Guarded {
                writer: Some(writer),
                worker: None,
            }),
        }
    }

    /// Compare-and-set the completion flag; the winner must publish
    #[inline]
    pub(crate) fn try_claim(&self) -> Option<Claim<'_>> {
        self.claimed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Claim {
                completion: self,
                published: false,
            })
    }

    #[inline]
    pub(crate) fn is_claimed(&self) -> bool {
        self.claimed.load(Ordering::Acquire)
    }

    /// Published outcome, once the write end has been closed
    pub(crate) fn outcome(&self) -> Option<WaitResult<WaitOutcome>> {
        self.outcome.get().cloned()
    }

    /// Whether the write end is still open
    pub(crate) fn is_open(&self) -> bool {
        self.guard.lock().writer.is_some()
    }

    pub(crate) fn register_worker(&self, thread: Pthread) {
        self.guard.lock().worker = Some(WorkerThread(thread));
    }

    pub(crate) fn deregister_worker(&self) {
        self.guard.lock().worker = None;
    }

    /// Interrupt a registered worker blocked in the wait call
    ///
    /// Returns whether a worker was signalled. Delivery failures are logged,
    /// never returned.
    pub(crate) fn interrupt_worker(&self, signal: Signal) -> bool {
        self.interrupt_worker_with(signal, interrupt::deliver)
    }

    fn interrupt_worker_with<F>(&self, signal: Signal, deliver: F) -> bool
    where
        F: FnOnce(Pthread, Signal) -> WaitResult<()>,
    {
        let guard = self.guard.lock();
        let Some(WorkerThread(thread)) = guard.worker else {
            return false;
        };
        match deliver(thread, signal) {
            Ok(()) => true,
            Err(e) => {
                warn!(?signal, error = %e, "failed to interrupt wait worker");
                false
            }
        }
    }

    fn publish(&self, outcome: WaitResult<WaitOutcome>) {
        match &outcome {
            Ok(WaitOutcome::Canceled) => {}
            Ok(_) => stats().inc_completed(),
            Err(_) => stats().inc_errors(),
        }
        debug!(outcome = ?outcome, "publishing wait outcome");

        // Only the claim holder reaches this point, so the cell is empty
        let _ = self.outcome.set(outcome);

        let writer = self.guard.lock().writer.take();
        drop(writer);
    }
}

/// Exclusive right to publish the outcome
///
/// Dropping an unpublished claim publishes `Canceled`, so the channel is
/// always closed exactly once.
#[must_use = "a claim must publish an outcome"]
pub(crate) struct Claim<'a> {
    completion: &'a Completion,
    published: bool,
}

impl Claim<'_> {
    pub(crate) fn publish(mut self, outcome: WaitResult<WaitOutcome>) {
        self.published = true;
        self.completion.publish(outcome);
    }
}

impl Drop for Claim<'_> {
    fn drop(&mut self) {
        if !self.published {
            self.published = true;
            self.completion.publish(Ok(WaitOutcome::Canceled));
        }
    }
}
