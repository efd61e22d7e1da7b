/*!
 * Wait Context
 *
 * Stateful handle over one wait. In threaded mode a detached worker blocks
 * on the caller's behalf and the caller observes completion through the
 * read end of the notification channel. In no-hang mode there is no worker
 * and each fetch polls once on the caller's thread.
 *
 * # Example
 *
 * ```ignore
 * let mut ctx = WaitContext::create(child_pid, WaitOptions::new())?
 *     .expect("thread limit reached, retry later");
 *
 * // register ctx.fd() with a reactor, or:
 * ctx.poll_ready(None)?;
 * match ctx.fetch()? {
 *     WaitOutcome::Ready(status) => println!("exit code {:?}", status.exit_code()),
 *     other => println!("no result: {:?}", other),
 * }
 * ```
 */

use super::channel::{self, ReadEnd};
use super::completion::Completion;
use super::interrupt;
use super::worker::{self, WorkerJob};
use crate::core::config::WaitConfig;
use crate::core::errors::{WaitError, WaitResult};
use crate::core::types::{Pid, WaitMode, WaitOptions};
use crate::monitoring::stats;
use crate::waiter::{wait_once, WaitOutcome};
use nix::errno::Errno;
use nix::sys::signal::Signal;
use std::fmt;
use std::io;
use std::os::fd::{AsFd, AsRawFd, BorrowedFd, RawFd};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};

/// State of the caller-owned read end
#[derive(Debug)]
enum Reader {
    /// Worker may still be running
    Open(ReadEnd),
    /// EOF observed; outcome is settled
    Drained,
    /// Released by `dispose`
    Disposed,
}

enum Mode {
    Synchronous {
        settled: Option<WaitOutcome>,
    },
    Threaded {
        reader: Reader,
        completion: Arc<Completion>,
        interrupt: Option<Signal>,
    },
}

/// Handle over an in-flight or settled wait
pub struct WaitContext {
    pid: Pid,
    options: WaitOptions,
    mode: Mode,
}

impl WaitContext {
    /// Create a context with the process-wide configuration
    ///
    /// Returns `Ok(None)` when the worker thread could not be spawned because
    /// of a system thread limit. That condition is transient: retrying later
    /// may succeed.
    pub fn create(pid: Pid, options: WaitOptions) -> WaitResult<Option<Self>> {
        Self::create_with(pid, options, WaitConfig::global())
    }

    /// Create a context with an explicit worker configuration
    pub fn create_with(
        pid: Pid,
        options: WaitOptions,
        config: &WaitConfig,
    ) -> WaitResult<Option<Self>> {
        Self::create_with_spawner(pid, options, config, worker::spawn)
    }

    fn create_with_spawner<F>(
        pid: Pid,
        options: WaitOptions,
        config: &WaitConfig,
        spawn: F,
    ) -> WaitResult<Option<Self>>
    where
        F: FnOnce(WorkerJob, &WaitConfig) -> io::Result<()>,
    {
        stats().inc_created();

        if options.is_no_hang() {
            stats().inc_no_hang();
            debug!(pid, "created no-hang wait context");
            return Ok(Some(Self {
                pid,
                options,
                mode: Mode::Synchronous { settled: None },
            }));
        }

        let interrupt = match config.interrupt_signal {
            Some(signal) if interrupt::ensure_handler(signal)? => Some(signal),
            _ => None,
        };

        let (reader, writer) = channel::open()?;
        let completion = Arc::new(Completion::new(writer));
        let job = WorkerJob {
            pid,
            options,
            interrupt,
            completion: Arc::clone(&completion),
        };

        if let Err(err) = spawn(job, config) {
            let errno = err.raw_os_error().map(Errno::from_raw);
            if errno == Some(Errno::EAGAIN) {
                stats().inc_spawn_retries();
                warn!(pid, "thread limit reached, wait context not created");
                return Ok(None);
            }
            error!(pid, error = %err, "failed to spawn wait worker");
            return Err(WaitError::os(
                "pthread_create",
                errno.unwrap_or(Errno::UnknownErrno),
            ));
        }

        stats().inc_threaded();
        debug!(pid, fd = reader.as_raw_fd(), "created threaded wait context");

        Ok(Some(Self {
            pid,
            options,
            mode: Mode::Threaded {
                reader: Reader::Open(reader),
                completion,
                interrupt,
            },
        }))
    }

    /// Target pid as given at creation
    #[inline]
    pub fn pid(&self) -> Pid {
        self.pid
    }

    #[inline]
    pub fn options(&self) -> WaitOptions {
        self.options
    }

    #[inline]
    pub fn mode(&self) -> WaitMode {
        self.options.mode()
    }

    #[inline]
    pub fn is_no_hang(&self) -> bool {
        self.options.is_no_hang()
    }

    /// Read end to register with an event loop for read-readiness
    ///
    /// `None` in no-hang mode, after the outcome was fetched, and after
    /// `dispose`.
    pub fn poll_fd(&self) -> Option<BorrowedFd<'_>> {
        match &self.mode {
            Mode::Threaded {
                reader: Reader::Open(end),
                ..
            } => Some(end.as_fd()),
            _ => None,
        }
    }

    /// Raw form of [`poll_fd`](Self::poll_fd)
    #[inline]
    pub fn fd(&self) -> Option<RawFd> {
        self.poll_fd().map(|fd| fd.as_raw_fd())
    }

    /// Fetch the outcome without blocking
    ///
    /// Threaded mode performs the confirmation read: `Pending` while the
    /// worker is still running, the settled outcome afterwards. No-hang mode
    /// polls the child once per call until a final outcome is found. Both are
    /// idempotent once settled.
    pub fn fetch(&mut self) -> WaitResult<WaitOutcome> {
        let pid = self.pid;
        match &mut self.mode {
            Mode::Synchronous { settled } => {
                if let Some(outcome) = settled {
                    return Ok(*outcome);
                }
                let outcome = wait_once(pid, self.options)?;
                if outcome.is_settled() {
                    *settled = Some(outcome);
                }
                Ok(outcome)
            }
            Mode::Threaded {
                reader, completion, ..
            } => {
                match reader {
                    Reader::Disposed => return Err(WaitError::Disposed),
                    Reader::Open(end) => {
                        if !end.try_recv()? {
                            return Ok(WaitOutcome::Pending);
                        }
                        debug!(pid, "notification channel closed");
                        *reader = Reader::Drained;
                    }
                    Reader::Drained => {}
                }
                completion
                    .outcome()
                    .unwrap_or(Ok(WaitOutcome::Canceled))
            }
        }
    }

    /// Block the calling thread until the outcome can be fetched
    ///
    /// Returns `false` if `timeout` elapsed first. `None` waits indefinitely.
    /// No-hang contexts are always ready.
    pub fn poll_ready(&self, timeout: Option<Duration>) -> WaitResult<bool> {
        match &self.mode {
            Mode::Synchronous { .. } => Ok(true),
            Mode::Threaded { reader, .. } => match reader {
                Reader::Open(end) => end.poll_readable(timeout),
                Reader::Drained => Ok(true),
                Reader::Disposed => Err(WaitError::Disposed),
            },
        }
    }

    /// Abandon the in-flight wait
    ///
    /// The first of cancellation and worker completion wins: a cancel after
    /// the worker published is a no-op, otherwise a later fetch yields
    /// `Canceled`. Interrupting the worker thread itself is best-effort.
    pub fn cancel(&self) -> WaitResult<()> {
        let Mode::Threaded {
            completion,
            interrupt,
            ..
        } = &self.mode
        else {
            return Err(WaitError::CannotCancel);
        };

        let Some(claim) = completion.try_claim() else {
            debug!(pid = self.pid, "cancel after completion ignored");
            return Ok(());
        };
        claim.publish(Ok(WaitOutcome::Canceled));
        stats().inc_canceled();

        // The outcome is already settled; a failed interrupt only leaves the
        // worker blocked until the child changes state
        if let Some(signal) = interrupt {
            let interrupted = completion.interrupt_worker(*signal);
            debug!(pid = self.pid, interrupted, "wait canceled");
        }
        Ok(())
    }

    /// Release the caller-owned descriptor; safe to call repeatedly
    ///
    /// A worker still in flight is left running detached.
    pub fn dispose(&mut self) {
        if let Mode::Threaded { reader, .. } = &mut self.mode {
            if !matches!(reader, Reader::Disposed) {
                debug!(pid = self.pid, "disposing wait context");
                *reader = Reader::Disposed;
            }
        }
    }

    /// Whether `dispose` was called
    pub fn is_disposed(&self) -> bool {
        matches!(
            self.mode,
            Mode::Threaded {
                reader: Reader::Disposed,
                ..
            }
        )
    }
}

impl fmt::Debug for WaitContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WaitContext")
            .field("pid", &self.pid)
            .field("options", &self.options)
            .field("fd", &self.fd())
            .finish()
    }
}

impl fmt::Display for WaitContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "waitpid.context: {:p}", self)
    }
}
