/*!
 * Synchronous Waiter
 *
 * One call to `waitpid(2)` on the caller's thread. Blocks unless NO_HANG is
 * set. Shared by the no-hang fast path and the background worker.
 */

use super::outcome::WaitOutcome;
use crate::core::errors::{WaitError, WaitResult};
use crate::core::types::{Pid, WaitOptions};
use crate::status::decode_raw;
use libc::c_int;
use nix::errno::Errno;
use nix::sys::wait::WaitPidFlag;
use tracing::{debug, trace};

/// Wait once for `pid` with `options`
///
/// - no eligible child → `Ok(NoChild)`
/// - NO_HANG and nothing changed → `Ok(Pending)`
/// - state change → `Ok(Ready(status))`
/// - any other failure → `Err(Os { op: "waitpid", .. })`
///
/// Interrupted calls are restarted.
pub fn wait_once(pid: Pid, options: WaitOptions) -> WaitResult<WaitOutcome> {
    let flags = options.waitpid_flags();
    loop {
        match raw_wait(pid, flags) {
            Err(Errno::EINTR) => continue,
            result => return classify(pid, result),
        }
    }
}

/// Stateless wrapper, usable without creating a context
#[inline]
pub fn wait_once_raw(pid: Pid, options: WaitOptions) -> WaitResult<WaitOutcome> {
    wait_once(pid, options)
}

/// What one `waitpid(2)` call returned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RawWait {
    /// `pid` changed state; `status` is the undecoded status word
    Changed { pid: Pid, status: c_int },
    /// NO_HANG and no child was ready
    StillAlive,
}

/// Single `waitpid(2)` call, no retry and no classification
///
/// Goes straight to libc so the status word survives for signals nix cannot
/// name.
pub(crate) fn raw_wait(pid: Pid, flags: WaitPidFlag) -> nix::Result<RawWait> {
    trace!(pid, ?flags, "waitpid");
    let mut status: c_int = 0;
    // SAFETY: `status` is a valid out-pointer for the duration of the call
    let reaped = unsafe { libc::waitpid(pid, &mut status, flags.bits()) };
    Ok(match Errno::result(reaped)? {
        0 => RawWait::StillAlive,
        child => RawWait::Changed { pid: child, status },
    })
}

/// Map a `waitpid(2)` result onto the outcome conventions
pub(crate) fn classify(pid: Pid, result: nix::Result<RawWait>) -> WaitResult<WaitOutcome> {
    match result {
        Ok(RawWait::Changed { pid: reaped, status }) => {
            let child = decode_raw(reaped, status)?;
            debug!(waited = pid, pid = child.pid, state = ?child.state, "child changed state");
            Ok(WaitOutcome::Ready(child))
        }
        Ok(RawWait::StillAlive) => Ok(WaitOutcome::Pending),
        Err(Errno::ECHILD) => {
            debug!(waited = pid, "no eligible child");
            Ok(WaitOutcome::NoChild)
        }
        Err(errno) => Err(WaitError::os("waitpid", errno)),
    }
}
