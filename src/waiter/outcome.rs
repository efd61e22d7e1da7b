/*!
 * Wait Outcomes
 */

use crate::status::ChildStatus;
use serde::{Deserialize, Serialize};

/// Non-error result of a wait
///
/// Only `Ready` carries a pid, so "did not complete" can never be mistaken
/// for a real child.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum WaitOutcome {
    /// A child changed state
    Ready(ChildStatus),
    /// No eligible child exists (`ECHILD`)
    NoChild,
    /// Nothing has changed yet; poll again later
    Pending,
    /// The wait was canceled before a child changed state
    Canceled,
}

impl WaitOutcome {
    #[inline]
    pub fn is_ready(&self) -> bool {
        matches!(self, WaitOutcome::Ready(_))
    }

    #[inline]
    pub fn is_pending(&self) -> bool {
        matches!(self, WaitOutcome::Pending)
    }

    /// Every outcome except `Pending` is final
    #[inline]
    pub fn is_settled(&self) -> bool {
        !self.is_pending()
    }

    pub fn status(&self) -> Option<&ChildStatus> {
        match self {
            WaitOutcome::Ready(status) => Some(status),
            _ => None,
        }
    }

    pub fn into_status(self) -> Option<ChildStatus> {
        match self {
            WaitOutcome::Ready(status) => Some(status),
            _ => None,
        }
    }
}

impl From<ChildStatus> for WaitOutcome {
    fn from(status: ChildStatus) -> Self {
        WaitOutcome::Ready(status)
    }
}
