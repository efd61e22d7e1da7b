/*!
 * Reactor Integration Tests
 * Awaiting a context on the tokio runtime
 */

use crate::support::{send, spawn_sh, spawn_sleeper};
use nix::sys::signal::Signal;
use std::time::Duration;
use waitpid_context::{WaitContext, WaitOptions, WaitOutcome};

#[tokio::test]
async fn test_wait_resolves_on_exit() {
    let (_child, pid) = spawn_sh("sleep 0.1; exit 7");
    let mut ctx = WaitContext::create(pid, WaitOptions::new())
        .unwrap()
        .unwrap();

    let outcome = tokio::time::timeout(Duration::from_secs(10), ctx.wait())
        .await
        .expect("wait timed out")
        .unwrap();

    let status = outcome.into_status().unwrap();
    assert_eq!(status.pid, pid);
    assert_eq!(status.exit_code(), Some(7));
}

#[tokio::test]
async fn test_wait_does_not_block_the_runtime() {
    let (_child, pid) = spawn_sleeper();
    let mut ctx = WaitContext::create(pid, WaitOptions::new())
        .unwrap()
        .unwrap();

    // Single-threaded runtime: the timer can only fire if wait() yields
    let pending = tokio::time::timeout(Duration::from_millis(100), ctx.wait()).await;
    assert!(pending.is_err());

    send(pid, Signal::SIGKILL);
    let outcome = tokio::time::timeout(Duration::from_secs(10), ctx.wait())
        .await
        .expect("wait timed out")
        .unwrap();
    assert_eq!(outcome.status().and_then(|s| s.exit_code()), Some(137));
}

#[tokio::test]
async fn test_wait_after_cancel_is_canceled() {
    let (_child, pid) = spawn_sleeper();
    let mut ctx = WaitContext::create(pid, WaitOptions::new())
        .unwrap()
        .unwrap();

    ctx.cancel().unwrap();
    let outcome = tokio::time::timeout(Duration::from_secs(10), ctx.wait())
        .await
        .expect("wait timed out")
        .unwrap();
    assert_eq!(outcome, WaitOutcome::Canceled);

    send(pid, Signal::SIGKILL);
}
