/*!
 * No-Hang Context Tests
 * Synchronous contexts poll once per fetch on the caller's thread
 */

use crate::support::{send, settle, spawn_exit, spawn_sleeper};
use nix::sys::signal::Signal;
use pretty_assertions::assert_eq;
use std::time::{Duration, Instant};
use waitpid_context::{WaitContext, WaitMode, WaitOptions, WaitOutcome};

fn no_hang(pid: i32) -> WaitContext {
    WaitContext::create(pid, WaitOptions::new().no_hang())
        .unwrap()
        .unwrap()
}

#[test]
fn test_unchanged_child_is_pending_without_blocking() {
    let (_child, pid) = spawn_sleeper();
    let mut ctx = no_hang(pid);

    assert_eq!(ctx.mode(), WaitMode::Synchronous);
    assert!(ctx.is_no_hang());
    assert!(ctx.fd().is_none());

    let start = Instant::now();
    assert_eq!(ctx.fetch().unwrap(), WaitOutcome::Pending);
    assert!(start.elapsed() < Duration::from_secs(1));

    send(pid, Signal::SIGKILL);
    let deadline = Instant::now() + Duration::from_secs(10);
    let mut outcome = ctx.fetch().unwrap();
    while outcome.is_pending() && Instant::now() < deadline {
        settle();
        outcome = ctx.fetch().unwrap();
    }
    assert_eq!(outcome.status().and_then(|s| s.terminating_signal()), Some(9));
}

#[test]
fn test_settled_result_is_cached() {
    let (_child, pid) = spawn_exit(2);
    let mut ctx = no_hang(pid);

    let deadline = Instant::now() + Duration::from_secs(10);
    let mut outcome = ctx.fetch().unwrap();
    while outcome.is_pending() && Instant::now() < deadline {
        settle();
        outcome = ctx.fetch().unwrap();
    }

    assert_eq!(outcome.status().and_then(|s| s.exit_code()), Some(2));
    // The child is already reaped; the cached result is returned again
    assert_eq!(ctx.fetch().unwrap(), outcome);
}

#[test]
fn test_dispose_on_no_hang_is_harmless() {
    let (_child, pid) = spawn_exit(0);
    let mut ctx = no_hang(pid);
    ctx.dispose();
    ctx.dispose();
    assert!(!ctx.is_disposed());
    settle();
    let _ = ctx.fetch();
}
