/*!
 * Status Decoder
 *
 * Pure translation of a wait status into a [`ChildStatus`]. Never calls the
 * wait primitive itself. Works on the raw status word, so signals outside
 * `nix::sys::signal::Signal` (real-time signals) decode like any other.
 */

use super::types::{ChildState, ChildStatus};
use crate::core::errors::{WaitError, WaitResult};
use crate::core::types::Pid;
use libc::c_int;
use nix::errno::Errno;
use nix::sys::signal::Signal;
use nix::sys::wait::WaitStatus;

/// Decode a classified wait status
///
/// Returns `None` for `StillAlive`, the only status that carries no state
/// change.
pub fn decode(status: WaitStatus) -> Option<ChildStatus> {
    let (pid, state) = match status {
        WaitStatus::Exited(pid, code) => (pid, ChildState::Exited { code }),
        WaitStatus::Signaled(pid, signal, core_dumped) => (
            pid,
            ChildState::Signaled {
                signal: signal as i32,
                core_dumped,
            },
        ),
        WaitStatus::Stopped(pid, signal) => (
            pid,
            ChildState::Stopped {
                signal: signal as i32,
            },
        ),
        #[cfg(any(target_os = "linux", target_os = "android"))]
        WaitStatus::PtraceEvent(pid, signal, _) => (
            pid,
            ChildState::Stopped {
                signal: signal as i32,
            },
        ),
        #[cfg(any(target_os = "linux", target_os = "android"))]
        WaitStatus::PtraceSyscall(pid) => (
            pid,
            ChildState::Stopped {
                signal: Signal::SIGTRAP as i32,
            },
        ),
        WaitStatus::Continued(pid) => (pid, ChildState::Continued),
        WaitStatus::StillAlive => return None,
    };

    Some(ChildStatus::new(pid.as_raw(), state))
}

/// Decode a raw `wait(2)` status word obtained for `pid`
///
/// Any signal number is accepted, including real-time signals. Fails with
/// `EINVAL` only for a word that encodes no state change at all.
pub fn decode_raw(pid: Pid, raw_status: c_int) -> WaitResult<ChildStatus> {
    let state = if libc::WIFEXITED(raw_status) {
        ChildState::Exited {
            code: libc::WEXITSTATUS(raw_status),
        }
    } else if libc::WIFSIGNALED(raw_status) {
        ChildState::Signaled {
            signal: libc::WTERMSIG(raw_status),
            core_dumped: libc::WCOREDUMP(raw_status),
        }
    } else if libc::WIFSTOPPED(raw_status) {
        ChildState::Stopped {
            signal: stop_signal(libc::WSTOPSIG(raw_status)),
        }
    } else if libc::WIFCONTINUED(raw_status) {
        ChildState::Continued
    } else {
        return Err(WaitError::os("decode", Errno::EINVAL));
    };

    Ok(ChildStatus::new(pid, state))
}

/// Decode the `siginfo_t` fields filled in by `waitid(2)`
///
/// `None` when no child was reported (`si_pid == 0`) or the code is not a
/// child state change.
#[cfg(any(target_os = "linux", target_os = "android"))]
pub(crate) fn decode_siginfo(pid: Pid, code: c_int, status: c_int) -> Option<ChildStatus> {
    if pid == 0 {
        return None;
    }

    let state = match code {
        libc::CLD_EXITED => ChildState::Exited { code: status },
        libc::CLD_KILLED | libc::CLD_DUMPED => ChildState::Signaled {
            signal: status,
            core_dumped: code == libc::CLD_DUMPED,
        },
        libc::CLD_STOPPED | libc::CLD_TRAPPED => ChildState::Stopped {
            signal: stop_signal(status),
        },
        libc::CLD_CONTINUED => ChildState::Continued,
        _ => return None,
    };

    Some(ChildStatus::new(pid, state))
}

/// Syscall-stops under `PTRACE_O_TRACESYSGOOD` report `SIGTRAP | 0x80`
#[inline]
fn stop_signal(signal: c_int) -> c_int {
    if cfg!(any(target_os = "linux", target_os = "android")) {
        signal & 0x7f
    } else {
        signal
    }
}
