/*!
 * Shared helpers for spawning test children
 */

#![allow(dead_code)]

use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid as NixPid;
use std::process::{Child, Command};
use std::time::Duration;
use waitpid_context::Pid;

/// Spawn `sh -c <script>` and return the child handle and its pid
pub fn spawn_sh(script: &str) -> (Child, Pid) {
    let child = Command::new("sh")
        .args(["-c", script])
        .spawn()
        .expect("failed to spawn sh");
    let pid = i32::try_from(child.id()).expect("pid fits in i32");
    (child, pid)
}

/// Child that exits immediately with `code`
pub fn spawn_exit(code: i32) -> (Child, Pid) {
    spawn_sh(&format!("exit {}", code))
}

/// Child that stays alive for a long time
pub fn spawn_sleeper() -> (Child, Pid) {
    spawn_sh("exec sleep 30")
}

pub fn send(pid: Pid, signal: Signal) {
    kill(NixPid::from_raw(pid), signal).expect("kill failed");
}

/// Send a signal by number, including ones `Signal` cannot name
pub fn send_raw(pid: Pid, signo: i32) {
    let res = unsafe { libc::kill(pid, signo) };
    assert_eq!(res, 0, "kill({}, {}) failed", pid, signo);
}

/// Give an exiting child time to become a zombie
pub fn settle() {
    std::thread::sleep(Duration::from_millis(100));
}

pub const READY_TIMEOUT: Duration = Duration::from_secs(10);
