/*!
 * Error Types
 * Centralized error handling with thiserror and miette
 */

use miette::Diagnostic;
use nix::errno::Errno;
use thiserror::Error;

/// Result type for wait operations
pub type WaitResult<T> = Result<T, WaitError>;

/// Errors surfaced by the synchronous waiter and the wait context
///
/// Expected empty outcomes (no eligible child, nothing ready yet, canceled)
/// are never errors; they are variants of [`WaitOutcome`](crate::WaitOutcome).
#[derive(Error, Debug, Clone, PartialEq, Eq, Diagnostic)]
pub enum WaitError {
    #[error("{op} failed: {errno}")]
    #[diagnostic(
        code(waitpid::os_error),
        help("The underlying system call failed. The errno identifies the cause.")
    )]
    Os { op: &'static str, errno: Errno },

    #[error("{op} on notification channel failed: {errno}")]
    #[diagnostic(
        code(waitpid::channel_io),
        help("Reading the completion channel failed. The wait itself may still be in flight.")
    )]
    Io { op: &'static str, errno: Errno },

    #[error("cannot cancel waitpid with nohang option")]
    #[diagnostic(
        code(waitpid::cannot_cancel),
        help("No-hang contexts never block and have no worker to cancel.")
    )]
    CannotCancel,

    #[error("wait context has been disposed")]
    #[diagnostic(
        code(waitpid::disposed),
        help("The poll descriptor was released. Create a new context to wait again.")
    )]
    Disposed,

    #[error("invalid wait option: {0}")]
    #[diagnostic(
        code(waitpid::invalid_option),
        help("Valid options are \"nohang\", \"untraced\" and \"continued\".")
    )]
    InvalidOption(String),
}

impl WaitError {
    #[inline]
    pub(crate) fn os(op: &'static str, errno: Errno) -> Self {
        WaitError::Os { op, errno }
    }

    #[inline]
    pub(crate) fn io(op: &'static str, errno: Errno) -> Self {
        WaitError::Io { op, errno }
    }

    /// Platform error code, when the error came from a system call
    pub fn errno(&self) -> Option<Errno> {
        match self {
            WaitError::Os { errno, .. } | WaitError::Io { errno, .. } => Some(*errno),
            _ => None,
        }
    }

    /// Name of the operation that failed, when the error came from a system call
    pub fn op(&self) -> Option<&'static str> {
        match self {
            WaitError::Os { op, .. } | WaitError::Io { op, .. } => Some(op),
            _ => None,
        }
    }

    /// True for channel I/O failures, as opposed to wait failures
    #[inline]
    pub fn is_io(&self) -> bool {
        matches!(self, WaitError::Io { .. })
    }
}

impl From<std::io::Error> for WaitError {
    fn from(err: std::io::Error) -> Self {
        let errno = err
            .raw_os_error()
            .map(Errno::from_raw)
            .unwrap_or(Errno::EIO);
        WaitError::io("poll", errno)
    }
}
