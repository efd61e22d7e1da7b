/*!
 * Status Types
 * Structured records produced by the status decoder
 */

use crate::core::types::Pid;
use serde::{Deserialize, Serialize};

/// Conventional shell exit code offset for signal termination
pub const SIGNAL_EXIT_BASE: i32 = 128;

/// Which state transition a child went through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ChildState {
    /// Normal exit
    Exited { code: i32 },
    /// Terminated by a signal
    Signaled { signal: i32, core_dumped: bool },
    /// Stopped by a signal (reported only with `untraced`)
    Stopped { signal: i32 },
    /// Resumed by `SIGCONT` (reported only with `continued`)
    Continued,
}

/// Decoded state change of one child
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChildStatus {
    pub pid: Pid,
    #[serde(flatten)]
    pub state: ChildState,
}

impl ChildStatus {
    #[inline]
    pub const fn new(pid: Pid, state: ChildState) -> Self {
        Self { pid, state }
    }

    /// Exit code; `128 + signal` for signal termination
    pub fn exit_code(&self) -> Option<i32> {
        match self.state {
            ChildState::Exited { code } => Some(code),
            ChildState::Signaled { signal, .. } => Some(SIGNAL_EXIT_BASE + signal),
            _ => None,
        }
    }

    pub fn terminating_signal(&self) -> Option<i32> {
        match self.state {
            ChildState::Signaled { signal, .. } => Some(signal),
            _ => None,
        }
    }

    /// Present only when the child was signal-terminated and dumped core
    pub fn core_dumped(&self) -> Option<bool> {
        match self.state {
            ChildState::Signaled {
                core_dumped: true, ..
            } => Some(true),
            _ => None,
        }
    }

    pub fn stop_signal(&self) -> Option<i32> {
        match self.state {
            ChildState::Stopped { signal } => Some(signal),
            _ => None,
        }
    }

    pub fn continued(&self) -> Option<bool> {
        match self.state {
            ChildState::Continued => Some(true),
            _ => None,
        }
    }

    /// Exited or signal-terminated, as opposed to stopped/continued
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self.state,
            ChildState::Exited { .. } | ChildState::Signaled { .. }
        )
    }

    /// Flat record with every optional field, for host bindings
    pub fn to_record(&self) -> StatusRecord {
        StatusRecord {
            pid: self.pid,
            exit_code: self.exit_code(),
            terminating_signal: self.terminating_signal(),
            core_dumped: self.core_dumped(),
            stop_signal: self.stop_signal(),
            continued: self.continued(),
        }
    }
}

/// Flat result record: `pid` plus whichever fields the transition populates
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusRecord {
    pub pid: Pid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub terminating_signal: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub core_dumped: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_signal: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub continued: Option<bool>,
}

impl From<ChildStatus> for StatusRecord {
    fn from(status: ChildStatus) -> Self {
        status.to_record()
    }
}
