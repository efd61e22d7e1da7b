/*!
 * Background Wait Worker
 *
 * Detached thread that blocks in the wait call on behalf of the caller,
 * then publishes the outcome through the shared [`Completion`].
 *
 * On Linux the worker first observes the state change with
 * `waitid(WNOWAIT)`, claims the outcome, and only then reaps. A canceled
 * worker therefore never consumes a child's status. Elsewhere it blocks in
 * `waitpid` directly and discards the status if the claim was lost.
 *
 * Interruption is best-effort. A cancel that signals the worker after its
 * last `is_claimed` check but before it enters the wait is not seen until
 * the child next changes state. The outcome is still `Canceled`; only the
 * thread lingers.
 */

use super::completion::{Claim, Completion};
use super::interrupt;
use crate::core::config::WaitConfig;
use crate::core::types::{Pid, WaitOptions};
#[cfg(all(any(target_os = "linux", target_os = "android"), not(target_env = "uclibc")))]
use crate::status::ChildStatus;
use crate::waiter::{classify, raw_wait, WaitOutcome};
use nix::errno::Errno;
use nix::sys::pthread::pthread_self;
use nix::sys::signal::Signal;
use std::io;
use std::sync::Arc;
use std::thread;
use tracing::{debug, warn};

/// Everything the worker thread owns
pub(crate) struct WorkerJob {
    pub pid: Pid,
    pub options: WaitOptions,
    pub interrupt: Option<Signal>,
    pub completion: Arc<Completion>,
}

/// Spawn the detached worker
///
/// The join handle is dropped immediately; the caller never joins.
pub(crate) fn spawn(job: WorkerJob, config: &WaitConfig) -> io::Result<()> {
    let name = format!("{}-{}", config.thread_name, job.pid);
    thread::Builder::new()
        .name(name)
        .stack_size(config.stack_size)
        .spawn(move || run(job))
        .map(drop)
}

/// Runs on every exit path of the worker, including unwinding
///
/// Deregisters the thread, then claims the outcome as canceled if nothing
/// was published yet.
struct Cleanup<'a>(&'a Completion);

impl Drop for Cleanup<'_> {
    fn drop(&mut self) {
        self.0.deregister_worker();
        if let Some(claim) = self.0.try_claim() {
            debug!("worker left without an outcome");
            claim.publish(Ok(WaitOutcome::Canceled));
        }
    }
}

fn run(job: WorkerJob) {
    let completion = &*job.completion;
    let _cleanup = Cleanup(completion);

    if let Some(signal) = job.interrupt {
        if let Err(e) = interrupt::unblock_current(signal) {
            warn!(pid = job.pid, error = %e, "worker cannot be interrupted");
        }
    }
    completion.register_worker(pthread_self());
    debug!(pid = job.pid, options = ?job.options, "worker waiting");

    // The worker never uses no-hang
    let options = job.options.blocking();
    if let Some((claim, outcome)) = wait_for_child(job.pid, options, completion) {
        claim.publish(outcome);
    }
}

#[cfg(all(any(target_os = "linux", target_os = "android"), not(target_env = "uclibc")))]
fn wait_for_child(
    pid: Pid,
    options: WaitOptions,
    completion: &Completion,
) -> Option<(Claim<'_>, crate::core::errors::WaitResult<WaitOutcome>)> {
    loop {
        if completion.is_claimed() {
            return None;
        }

        let observed = match peek(pid, options) {
            Err(Errno::EINTR) => continue,
            Err(errno) => {
                let claim = completion.try_claim()?;
                return Some((claim, classify(pid, Err(errno))));
            }
            Ok(Some(child)) => child,
            Ok(None) => continue,
        };

        // Canceled between observation and reap: leave the status in place
        let Some(claim) = completion.try_claim() else {
            debug!(pid = observed.pid, "wait canceled, child left unreaped");
            return None;
        };

        let flags = options.no_hang().waitpid_flags();
        let outcome = loop {
            match raw_wait(observed.pid, flags) {
                Err(Errno::EINTR) => continue,
                result => break classify(observed.pid, result),
            }
        };

        // The observed change was consumed elsewhere before we could reap it
        let outcome = match outcome {
            Ok(WaitOutcome::Pending) => {
                debug!(pid = observed.pid, "observed state change vanished");
                Ok(WaitOutcome::Canceled)
            }
            other => other,
        };
        return Some((claim, outcome));
    }
}

/// Block until a matching child changes state, without consuming it
///
/// Reads `siginfo_t` directly: the status is reported for every signal,
/// including real-time ones.
#[cfg(all(any(target_os = "linux", target_os = "android"), not(target_env = "uclibc")))]
fn peek(pid: Pid, options: WaitOptions) -> nix::Result<Option<ChildStatus>> {
    use crate::status::decoder::decode_siginfo;
    use nix::unistd::getpgrp;
    use std::mem::MaybeUninit;

    let mut flags = libc::WEXITED | libc::WNOWAIT;
    if options.reports_stopped() {
        flags |= libc::WSTOPPED;
    }
    if options.reports_continued() {
        flags |= libc::WCONTINUED;
    }

    let (idtype, id) = match pid {
        -1 => (libc::P_ALL, 0),
        0 => (libc::P_PGID, getpgrp().as_raw().unsigned_abs()),
        p if p > 0 => (libc::P_PID, p.unsigned_abs()),
        p => (libc::P_PGID, p.unsigned_abs()),
    };

    let mut info = MaybeUninit::<libc::siginfo_t>::zeroed();
    // SAFETY: `info` is a valid out-pointer for the duration of the call
    let res = unsafe { libc::waitid(idtype, id, info.as_mut_ptr(), flags) };
    Errno::result(res)?;

    // SAFETY: zero-initialized, then filled in by the kernel
    let info = unsafe { info.assume_init() };
    // SAFETY: waitid only reports SIGCHLD-style siginfo
    let (child, status) = unsafe { (info.si_pid(), info.si_status()) };
    Ok(decode_siginfo(child, info.si_code, status))
}

#[cfg(not(all(any(target_os = "linux", target_os = "android"), not(target_env = "uclibc"))))]
fn wait_for_child(
    pid: Pid,
    options: WaitOptions,
    completion: &Completion,
) -> Option<(Claim<'_>, crate::core::errors::WaitResult<WaitOutcome>)> {
    let flags = options.waitpid_flags();

    let outcome = loop {
        if completion.is_claimed() {
            return None;
        }
        match raw_wait(pid, flags) {
            Err(Errno::EINTR) => continue,
            result => break classify(pid, result),
        }
    };

    match completion.try_claim() {
        Some(claim) => Some((claim, outcome)),
        None => {
            warn!(pid, outcome = ?outcome, "wait canceled after reaping, discarding status");
            None
        }
    }
}
