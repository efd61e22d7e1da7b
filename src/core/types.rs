/*!
 * Core Types
 * Common types shared by the waiter, the decoder and the wait context
 */

use super::errors::WaitError;
use nix::sys::wait::WaitPidFlag;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::BitOr;
use std::str::FromStr;

/// Process ID type, signed so it can carry the POSIX wait sentinels
pub type Pid = i32;

/// Wait for any child process
pub const ANY_CHILD: Pid = -1;

/// Whether the platform can report a continued child (`WCONTINUED`)
pub const SUPPORTS_CONTINUED: bool = cfg!(any(
    target_os = "linux",
    target_os = "android",
    target_os = "freebsd",
    target_os = "macos",
    target_os = "ios",
    target_os = "netbsd",
    target_os = "openbsd",
    target_os = "dragonfly",
));

/// A single wait option, as named by the scripting binding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaitOption {
    /// Return immediately if no child has changed state
    NoHang,
    /// Also report stopped children
    Untraced,
    /// Also report children resumed by `SIGCONT`
    Continued,
}

impl FromStr for WaitOption {
    type Err = WaitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "nohang" => Ok(WaitOption::NoHang),
            "untraced" => Ok(WaitOption::Untraced),
            "continued" => Ok(WaitOption::Continued),
            other => Err(WaitError::InvalidOption(other.to_string())),
        }
    }
}

impl fmt::Display for WaitOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            WaitOption::NoHang => "nohang",
            WaitOption::Untraced => "untraced",
            WaitOption::Continued => "continued",
        })
    }
}

/// Immutable option set for a wait
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WaitOptions {
    no_hang: bool,
    report_stopped: bool,
    report_continued: bool,
}

impl WaitOptions {
    /// Blocking wait for terminated children only
    pub const fn new() -> Self {
        Self {
            no_hang: false,
            report_stopped: false,
            report_continued: false,
        }
    }

    #[inline]
    #[must_use]
    pub const fn no_hang(mut self) -> Self {
        self.no_hang = true;
        self
    }

    #[inline]
    #[must_use]
    pub const fn report_stopped(mut self) -> Self {
        self.report_stopped = true;
        self
    }

    #[inline]
    #[must_use]
    pub const fn report_continued(mut self) -> Self {
        self.report_continued = true;
        self
    }

    #[must_use]
    pub const fn with(self, option: WaitOption) -> Self {
        match option {
            WaitOption::NoHang => self.no_hang(),
            WaitOption::Untraced => self.report_stopped(),
            WaitOption::Continued => self.report_continued(),
        }
    }

    /// Parse option names such as `["nohang", "untraced"]`
    pub fn parse<I, S>(names: I) -> Result<Self, WaitError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        names
            .into_iter()
            .try_fold(Self::new(), |opts, name| Ok(opts.with(name.as_ref().parse()?)))
    }

    #[inline]
    pub const fn is_no_hang(&self) -> bool {
        self.no_hang
    }

    #[inline]
    pub const fn reports_stopped(&self) -> bool {
        self.report_stopped
    }

    #[inline]
    pub const fn reports_continued(&self) -> bool {
        self.report_continued
    }

    /// Same options with NO_HANG cleared, as used by the background worker
    #[inline]
    #[must_use]
    pub const fn blocking(mut self) -> Self {
        self.no_hang = false;
        self
    }

    /// Execution mode implied by these options
    #[inline]
    pub const fn mode(&self) -> WaitMode {
        if self.no_hang {
            WaitMode::Synchronous
        } else {
            WaitMode::Threaded
        }
    }

    /// Flags for `waitpid(2)`
    pub(crate) fn waitpid_flags(&self) -> WaitPidFlag {
        let mut flags = WaitPidFlag::empty();
        if self.no_hang {
            flags |= WaitPidFlag::WNOHANG;
        }
        if self.report_stopped {
            flags |= WaitPidFlag::WUNTRACED;
        }
        flags | self.continued_flag()
    }

    #[cfg(any(
        target_os = "linux",
        target_os = "android",
        target_os = "freebsd",
        target_os = "macos",
        target_os = "ios",
        target_os = "netbsd",
        target_os = "openbsd",
        target_os = "dragonfly",
    ))]
    fn continued_flag(&self) -> WaitPidFlag {
        if self.report_continued {
            WaitPidFlag::WCONTINUED
        } else {
            WaitPidFlag::empty()
        }
    }

    #[cfg(not(any(
        target_os = "linux",
        target_os = "android",
        target_os = "freebsd",
        target_os = "macos",
        target_os = "ios",
        target_os = "netbsd",
        target_os = "openbsd",
        target_os = "dragonfly",
    )))]
    fn continued_flag(&self) -> WaitPidFlag {
        WaitPidFlag::empty()
    }
}

impl From<WaitOption> for WaitOptions {
    fn from(option: WaitOption) -> Self {
        Self::new().with(option)
    }
}

impl BitOr<WaitOption> for WaitOptions {
    type Output = WaitOptions;

    fn bitor(self, rhs: WaitOption) -> Self::Output {
        self.with(rhs)
    }
}

impl BitOr for WaitOption {
    type Output = WaitOptions;

    fn bitor(self, rhs: WaitOption) -> Self::Output {
        WaitOptions::from(self).with(rhs)
    }
}

/// How a context observes the child
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaitMode {
    /// No-hang: every fetch polls once on the caller's thread
    Synchronous,
    /// A detached worker blocks on the caller's behalf
    Threaded,
}
