/*!
 * Threaded Context Tests
 * Natural completion observed through the notification channel
 */

use crate::support::{send, send_raw, spawn_exit, spawn_sh, spawn_sleeper, READY_TIMEOUT};
use nix::sys::signal::Signal;
use pretty_assertions::assert_eq;
use std::time::Duration;
use waitpid_context::{
    stats, wait_once, ChildState, ChildStatus, WaitConfig, WaitContext, WaitError, WaitMode,
    WaitOptions, WaitOutcome,
};

fn threaded(pid: i32) -> WaitContext {
    WaitContext::create(pid, WaitOptions::new())
        .expect("create failed")
        .expect("thread limit reached")
}

#[test]
fn test_natural_exit_makes_descriptor_ready() {
    let (_child, pid) = spawn_sh("sleep 0.1; exit 3");
    let mut ctx = threaded(pid);

    assert_eq!(ctx.mode(), WaitMode::Threaded);
    assert!(!ctx.is_no_hang());
    assert!(ctx.fd().is_some());

    assert!(ctx.poll_ready(Some(READY_TIMEOUT)).unwrap());
    let outcome = ctx.fetch().unwrap();
    assert_eq!(
        outcome,
        WaitOutcome::Ready(ChildStatus::new(pid, ChildState::Exited { code: 3 }))
    );
}

#[cfg(target_os = "linux")]
#[test]
fn test_realtime_signal_settles_and_reaps() {
    let rt = libc::SIGRTMIN();
    let (_child, pid) = spawn_sleeper();
    let mut ctx = threaded(pid);
    send_raw(pid, rt);

    assert!(ctx.poll_ready(Some(READY_TIMEOUT)).unwrap());
    let status = ctx.fetch().unwrap().into_status().expect("child result");
    assert_eq!(status.terminating_signal(), Some(rt));
    assert_eq!(status.exit_code(), Some(128 + rt));

    // The worker reaped the child
    assert_eq!(
        wait_once(pid, WaitOptions::new().no_hang()).unwrap(),
        WaitOutcome::NoChild
    );
}

#[test]
fn test_fetch_is_idempotent_once_settled() {
    let (_child, pid) = spawn_exit(5);
    let mut ctx = threaded(pid);

    assert!(ctx.poll_ready(Some(READY_TIMEOUT)).unwrap());
    let first = ctx.fetch().unwrap();
    let second = ctx.fetch().unwrap();

    assert_eq!(first, second);
    assert_eq!(first.status().map(|s| s.pid), Some(pid));
    // Read end is released after the confirmation read
    assert!(ctx.fd().is_none());
    assert!(ctx.poll_ready(Some(Duration::ZERO)).unwrap());
}

#[test]
fn test_fetch_before_exit_is_pending() {
    let (_child, pid) = spawn_sleeper();
    let mut ctx = threaded(pid);

    assert_eq!(ctx.fetch().unwrap(), WaitOutcome::Pending);
    assert!(!ctx.poll_ready(Some(Duration::from_millis(50))).unwrap());
    assert!(ctx.fd().is_some());

    send(pid, Signal::SIGKILL);
    assert!(ctx.poll_ready(Some(READY_TIMEOUT)).unwrap());
    let status = ctx.fetch().unwrap().into_status().unwrap();
    assert_eq!(status.terminating_signal(), Some(9));
    assert_eq!(status.exit_code(), Some(137));
}

#[test]
fn test_stopped_child_reported_with_untraced() {
    let (_child, pid) = spawn_sleeper();
    let mut ctx = WaitContext::create(pid, WaitOptions::new().report_stopped())
        .unwrap()
        .unwrap();

    send(pid, Signal::SIGSTOP);
    assert!(ctx.poll_ready(Some(READY_TIMEOUT)).unwrap());
    let status = ctx.fetch().unwrap().into_status().unwrap();
    assert_eq!(status.stop_signal(), Some(Signal::SIGSTOP as i32));

    send(pid, Signal::SIGKILL);
    let mut reaper = threaded(pid);
    assert!(reaper.poll_ready(Some(READY_TIMEOUT)).unwrap());
    assert!(reaper.fetch().unwrap().is_ready());
}

#[test]
fn test_dispose_twice_is_safe() {
    let (_child, pid) = spawn_exit(0);
    let mut ctx = threaded(pid);

    ctx.dispose();
    ctx.dispose();

    assert!(ctx.is_disposed());
    assert!(ctx.fd().is_none());
    assert_eq!(ctx.fetch(), Err(WaitError::Disposed));
    assert_eq!(ctx.poll_ready(Some(Duration::ZERO)), Err(WaitError::Disposed));
}

#[test]
fn test_drop_with_worker_in_flight() {
    let (_child, pid) = spawn_sleeper();
    let ctx = threaded(pid);
    drop(ctx);

    // The detached worker reaps the child once it dies
    send(pid, Signal::SIGKILL);
}

#[test]
fn test_custom_config_worker() {
    let (_child, pid) = spawn_exit(9);
    let config = WaitConfig::default()
        .with_thread_name("reaper")
        .with_stack_size(128 * 1024);

    let mut ctx = WaitContext::create_with(pid, WaitOptions::new(), &config)
        .unwrap()
        .unwrap();

    assert!(ctx.poll_ready(Some(READY_TIMEOUT)).unwrap());
    assert_eq!(
        ctx.fetch().unwrap().status().and_then(|s| s.exit_code()),
        Some(9)
    );
}

#[test]
fn test_stats_track_threaded_contexts() {
    let before = stats().snapshot();

    let (_child, pid) = spawn_exit(0);
    let mut ctx = threaded(pid);
    assert!(ctx.poll_ready(Some(READY_TIMEOUT)).unwrap());
    ctx.fetch().unwrap();

    let after = stats().snapshot();
    assert!(after.contexts_created > before.contexts_created);
    assert!(after.threaded > before.threaded);
    assert!(after.completed > before.completed);
}
