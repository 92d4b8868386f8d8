// SPDX-License-Identifier: MIT

//! Decide which file descriptors survive into the child.

use std::os::fd::RawFd;

use nix::libc::c_int;

use crate::runtime::platform::StdStreams;

/// The launcher's own standard streams.  On Linux the child inherits them in
/// place, so no redirection happens.
pub fn std_streams() -> StdStreams<RawFd> {
    StdStreams { input: 0, output: 1, error: 2 }
}

/// The only descriptors the child keeps open.
#[derive(Debug, Clone)]
pub struct InheritFds {
    fds: [RawFd; 3],
    max_fd: c_int,
}

impl InheritFds {
    pub fn new(fds: [RawFd; 3]) -> std::io::Result<Self> {
        if fds.iter().any(|fd| *fd < 0) {
            return Err(std::io::Error::from_raw_os_error(nix::libc::EBADF));
        }
        Ok(Self { fds, max_fd: max_fd() })
    }

    #[cfg(test)]
    pub fn fds(&self) -> &[RawFd; 3] {
        &self.fds
    }

    /// Close every descriptor except the inherited ones and `also_keep`.
    ///
    /// Runs in the forked child, so it must not allocate.  Descriptors above
    /// the soft open-file limit are closed too.
    pub fn close_others(&self, also_keep: [RawFd; 2]) {
        let mut keep = [self.fds[0], self.fds[1], self.fds[2], also_keep[0], also_keep[1]];
        keep.sort_unstable();

        let mut low: u32 = 0;
        for fd in keep {
            let fd = fd as u32;
            if fd > low {
                self.close_range(low, fd - 1);
            }
            low = low.max(fd.saturating_add(1));
        }
        self.close_range(low, u32::MAX);
    }

    fn close_range(&self, first: u32, last: u32) {
        let ret = unsafe { nix::libc::syscall(nix::libc::SYS_close_range, first, last, 0u32) };
        if ret == 0 {
            return;
        }
        // Kernels before 5.9 lack close_range.  The loop can only reach the
        // larger of the soft and hard open-file limits.
        let last = last.min(self.max_fd as u32);
        for fd in first..=last {
            // Ignore errors, in case the FD is already closed.
            let _ = unsafe { nix::libc::close(fd as c_int) };
        }
    }
}

/// Highest descriptor number the process may have open.
fn max_fd() -> c_int {
    let soft = match nix::unistd::sysconf(nix::unistd::SysconfVar::OPEN_MAX) {
        Ok(Some(n)) if n > 0 => n.min(c_int::MAX as nix::libc::c_long) as c_int,
        _ => 1024,
    };
    let mut limit = nix::libc::rlimit { rlim_cur: 0, rlim_max: 0 };
    let hard = if unsafe { nix::libc::getrlimit(nix::libc::RLIMIT_NOFILE, &mut limit) } == 0 {
        limit.rlim_max.min(MAX_FALLBACK_FD as nix::libc::rlim_t) as c_int
    } else {
        0
    };
    soft.max(hard)
}

/// Bound for the close loop, for an unlimited hard limit.
const MAX_FALLBACK_FD: c_int = 1 << 20;
