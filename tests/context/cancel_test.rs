/*!
 * Cancellation Tests
 * Cancel races against natural completion; exactly one outcome wins
 */

use crate::support::{send, settle, spawn_exit, spawn_sleeper, READY_TIMEOUT};
use nix::sys::signal::{raise, sigaction, SaFlags, SigAction, SigHandler, SigSet, Signal};
use pretty_assertions::assert_eq;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use waitpid_context::{wait_once, WaitConfig, WaitContext, WaitError, WaitOptions, WaitOutcome};

#[test]
fn test_cancel_before_exit_yields_canceled() {
    let (_child, pid) = spawn_sleeper();
    let mut ctx = WaitContext::create(pid, WaitOptions::new())
        .unwrap()
        .unwrap();

    ctx.cancel().unwrap();

    assert!(ctx.poll_ready(Some(READY_TIMEOUT)).unwrap());
    assert_eq!(ctx.fetch().unwrap(), WaitOutcome::Canceled);
    assert_eq!(ctx.fetch().unwrap(), WaitOutcome::Canceled);

    send(pid, Signal::SIGKILL);
    // A canceled worker never consumes the child's status
    let status = wait_once(pid, WaitOptions::new()).unwrap().into_status();
    #[cfg(target_os = "linux")]
    assert_eq!(status.and_then(|s| s.terminating_signal()), Some(9));
    #[cfg(not(target_os = "linux"))]
    let _ = status;
}

#[test]
fn test_cancel_twice_is_harmless() {
    let (_child, pid) = spawn_sleeper();
    let mut ctx = WaitContext::create(pid, WaitOptions::new())
        .unwrap()
        .unwrap();

    ctx.cancel().unwrap();
    ctx.cancel().unwrap();
    assert_eq!(ctx.fetch().unwrap(), WaitOutcome::Canceled);

    send(pid, Signal::SIGKILL);
    let _ = wait_once(pid, WaitOptions::new());
}

#[test]
fn test_cancel_after_completion_keeps_result() {
    let (_child, pid) = spawn_exit(6);
    let mut ctx = WaitContext::create(pid, WaitOptions::new())
        .unwrap()
        .unwrap();

    assert!(ctx.poll_ready(Some(READY_TIMEOUT)).unwrap());
    ctx.cancel().unwrap();

    let status = ctx.fetch().unwrap().into_status().unwrap();
    assert_eq!(status.pid, pid);
    assert_eq!(status.exit_code(), Some(6));
}

#[test]
fn test_cancel_without_interrupt_signal() {
    let (_child, pid) = spawn_sleeper();
    let config = WaitConfig::without_interrupt();
    let mut ctx = WaitContext::create_with(pid, WaitOptions::new(), &config)
        .unwrap()
        .unwrap();

    ctx.cancel().unwrap();
    assert!(ctx.poll_ready(Some(Duration::from_secs(1))).unwrap());
    assert_eq!(ctx.fetch().unwrap(), WaitOutcome::Canceled);

    send(pid, Signal::SIGKILL);
    settle();
    let _ = wait_once(pid, WaitOptions::new());
}

#[test]
fn test_cancel_no_hang_is_usage_error() {
    let (_child, pid) = spawn_exit(0);
    let ctx = WaitContext::create(pid, WaitOptions::new().no_hang())
        .unwrap()
        .unwrap();

    assert_eq!(ctx.cancel(), Err(WaitError::CannotCancel));
    let _ = wait_once(pid, WaitOptions::new());
}

#[test]
fn test_cancel_after_dispose_is_noop() {
    let (_child, pid) = spawn_sleeper();
    let mut ctx = WaitContext::create(pid, WaitOptions::new())
        .unwrap()
        .unwrap();

    ctx.dispose();
    ctx.cancel().unwrap();

    send(pid, Signal::SIGKILL);
    let _ = wait_once(pid, WaitOptions::new());
}

static HOST_HITS: AtomicUsize = AtomicUsize::new(0);

extern "C" fn on_host_signal(_: libc::c_int) {
    HOST_HITS.fetch_add(1, Ordering::SeqCst);
}

#[test]
fn test_host_handler_survives_context_creation() {
    // SIGWINCH is reserved for this test within the binary
    let signal = Signal::SIGWINCH;
    let host = SigAction::new(
        SigHandler::Handler(on_host_signal),
        SaFlags::SA_RESTART,
        SigSet::empty(),
    );
    unsafe { sigaction(signal, &host) }.unwrap();
    raise(signal).unwrap();
    assert_eq!(HOST_HITS.load(Ordering::SeqCst), 1);

    let (_child, pid) = spawn_sleeper();
    let config = WaitConfig::default().with_interrupt_signal(Some(signal));
    let mut ctx = WaitContext::create_with(pid, WaitOptions::new(), &config)
        .unwrap()
        .unwrap();

    raise(signal).unwrap();
    assert_eq!(HOST_HITS.load(Ordering::SeqCst), 2);

    // Without an interrupt the cancel still settles the outcome
    ctx.cancel().unwrap();
    assert!(ctx.poll_ready(Some(READY_TIMEOUT)).unwrap());
    assert_eq!(ctx.fetch().unwrap(), WaitOutcome::Canceled);

    send(pid, Signal::SIGKILL);
    let _ = wait_once(pid, WaitOptions::new());
}
