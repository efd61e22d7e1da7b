/*!
 * Notification Channel
 *
 * Self-pipe used as an edge-triggered completion signal. The worker never
 * writes to it: closing the write end produces EOF on the read end, which
 * is the only event the caller waits for.
 */

use crate::core::errors::{WaitError, WaitResult};
use nix::errno::Errno;
use nix::fcntl::{fcntl, FcntlArg, FdFlag, OFlag};
use nix::poll::{poll, PollFd, PollFlags, PollTimeout};
use nix::unistd::{pipe, read};
use std::os::fd::{AsFd, AsRawFd, BorrowedFd, OwnedFd, RawFd};
use std::time::{Duration, Instant};

/// Caller-visible read end, opened non-blocking
#[derive(Debug)]
pub(crate) struct ReadEnd {
    fd: OwnedFd,
}

/// Create the pipe pair: non-blocking read end, worker-owned write end
pub(crate) fn open() -> WaitResult<(ReadEnd, OwnedFd)> {
    let (reader, writer) = pipe().map_err(|e| WaitError::os("pipe", e))?;

    for fd in [&reader, &writer] {
        fcntl(fd.as_raw_fd(), FcntlArg::F_SETFD(FdFlag::FD_CLOEXEC))
            .map_err(|e| WaitError::os("fcntl", e))?;
    }
    fcntl(reader.as_raw_fd(), FcntlArg::F_SETFL(OFlag::O_NONBLOCK))
        .map_err(|e| WaitError::os("fcntl", e))?;

    Ok((ReadEnd { fd: reader }, writer))
}

impl ReadEnd {
    /// Non-blocking confirmation read
    ///
    /// `Ok(false)` while the write end is open, `Ok(true)` once it has been
    /// closed (EOF) or anything was written.
    pub(crate) fn try_recv(&self) -> WaitResult<bool> {
        let mut buf = [0u8; 2];
        match read(self.fd.as_raw_fd(), &mut buf) {
            Ok(_) => Ok(true),
            Err(Errno::EAGAIN) | Err(Errno::EINTR) => Ok(false),
            Err(errno) => Err(WaitError::io("read", errno)),
        }
    }

    /// Block in `poll(2)` until readable or `timeout` elapses
    ///
    /// `None` waits indefinitely. Returns whether the channel became readable.
    pub(crate) fn poll_readable(&self, timeout: Option<Duration>) -> WaitResult<bool> {
        let deadline = timeout.map(|t| Instant::now() + t);

        loop {
            let timeout = match deadline {
                None => PollTimeout::NONE,
                Some(deadline) => {
                    let remaining = deadline.saturating_duration_since(Instant::now());
                    let millis = u16::try_from(remaining.as_millis()).unwrap_or(u16::MAX);
                    PollTimeout::from(millis)
                }
            };

            let mut fds = [PollFd::new(self.fd.as_fd(), PollFlags::POLLIN)];
            match poll(&mut fds, timeout) {
                Ok(0) => {
                    if deadline.map_or(false, |d| Instant::now() >= d) {
                        return Ok(false);
                    }
                }
                Ok(_) => return Ok(true),
                Err(Errno::EINTR) => {}
                Err(errno) => return Err(WaitError::io("poll", errno)),
            }
        }
    }
}

impl AsFd for ReadEnd {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.fd.as_fd()
    }
}

impl AsRawFd for ReadEnd {
    fn as_raw_fd(&self) -> RawFd {
        self.fd.as_raw_fd()
    }
}
