/*!
 * Worker Interruption
 *
 * Cooperative cancellation for a worker blocked in the wait call. A no-op
 * handler is installed without `SA_RESTART`, so delivering the signal to the
 * worker thread makes the wait fail with `EINTR`.
 *
 * The handler is only installed over the default or ignored disposition.
 * If the host already handles the signal, interruption is disabled and
 * cancellation only settles the outcome.
 */

use crate::core::errors::{WaitError, WaitResult};
use libc::c_int;
use nix::errno::Errno;
use nix::sys::pthread::{pthread_kill, Pthread};
use nix::sys::signal::{sigaction, SaFlags, SigAction, SigHandler, SigSet, Signal};
use parking_lot::Mutex;
use std::mem::MaybeUninit;
use std::ptr;
use tracing::{debug, warn};

/// Signals already examined, and whether the no-op handler owns them
static HANDLERS: Mutex<Vec<(Signal, bool)>> = Mutex::new(Vec::new());

extern "C" fn on_interrupt(_: c_int) {}

/// Install the no-op handler for `signal`, once per process
///
/// A handler the host already installed is left in place: returns
/// `Ok(false)` and the signal must not be used to interrupt workers.
pub(crate) fn ensure_handler(signal: Signal) -> WaitResult<bool> {
    let mut handlers = HANDLERS.lock();
    if let Some(&(_, owned)) = handlers.iter().find(|(s, _)| *s == signal) {
        return Ok(owned);
    }

    let owned = if host_handler(current_disposition(signal)?) {
        false
    } else {
        let action = SigAction::new(
            SigHandler::Handler(on_interrupt),
            SaFlags::empty(),
            SigSet::empty(),
        );
        // SAFETY: the handler touches no state and is async-signal-safe
        let previous =
            unsafe { sigaction(signal, &action) }.map_err(|e| WaitError::os("sigaction", e))?;

        // Lost a race with the host installing its own handler
        if matches!(previous.handler(), SigHandler::SigDfl | SigHandler::SigIgn) {
            true
        } else {
            // SAFETY: reinstalls exactly what was there before
            unsafe { sigaction(signal, &previous) }
                .map_err(|e| WaitError::os("sigaction", e))?;
            false
        }
    };

    if owned {
        debug!(?signal, "installed worker interrupt handler");
    } else {
        warn!(?signal, "signal has a host handler, workers will not be interrupted");
    }
    handlers.push((signal, owned));
    Ok(owned)
}

/// Current `sa_sigaction` for `signal`, without changing it
fn current_disposition(signal: Signal) -> WaitResult<libc::sighandler_t> {
    let mut current = MaybeUninit::<libc::sigaction>::zeroed();
    // SAFETY: a null new action only reads the disposition into `current`
    let res = unsafe { libc::sigaction(signal as c_int, ptr::null(), current.as_mut_ptr()) };
    Errno::result(res).map_err(|e| WaitError::os("sigaction", e))?;
    // SAFETY: zero-initialized, then filled in by the kernel
    Ok(unsafe { current.assume_init() }.sa_sigaction)
}

#[inline]
fn host_handler(disposition: libc::sighandler_t) -> bool {
    disposition != libc::SIG_DFL && disposition != libc::SIG_IGN
}

/// Make sure the calling thread can receive `signal`
pub(crate) fn unblock_current(signal: Signal) -> WaitResult<()> {
    let mut set = SigSet::empty();
    set.add(signal);
    set.thread_unblock()
        .map_err(|e| WaitError::os("pthread_sigmask", e))
}

/// Deliver `signal` to `thread`; a thread that already exited is not an error
pub(crate) fn deliver(thread: Pthread, signal: Signal) -> WaitResult<()> {
    match pthread_kill(thread, signal) {
        Ok(()) | Err(Errno::ESRCH) => Ok(()),
        Err(errno) => Err(WaitError::os("pthread_kill", errno)),
    }
}
