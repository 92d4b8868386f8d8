// SPDX-License-Identifier: MIT

//! Fork the child and hold it at a gate until it is resumed.
//!
//! The forked child closes everything outside the allow-list, then blocks
//! reading the gate pipe.  Resuming writes one byte to the gate; the child
//! then runs `execv`.  The status pipe is close-on-exec: a successful exec
//! closes it without data, a failed exec writes the errno into it.  If the
//! gate is closed without a byte, the child exits without running the image.

use std::{
    ffi::CString,
    fs::File,
    io::{Read, Write},
    os::{fd::AsRawFd, unix::ffi::OsStrExt as _},
};

use nix::{
    fcntl::OFlag,
    libc,
    sys::{
        signal::{Signal, kill},
        wait::{WaitStatus, waitpid},
    },
    unistd::{AccessFlags, ForkResult, Pid, access, fork, pipe2},
};

use super::fd::InheritFds;
use crate::runtime::cmdline::CommandLine;

/// Exit code of a child that was never released from the gate.
const GATE_CLOSED_EXIT: i32 = 1;

/// Exit code of a child whose exec failed.
const EXEC_FAILED_EXIT: i32 = 127;

pub struct SuspendedChild {
    pid: Pid,
    // Dropping the gate without a byte makes the child exit.
    gate: Option<File>,
    status: Option<File>,
    exit: Option<WaitStatus>,
}

impl SuspendedChild {
    pub fn spawn(cmd: &CommandLine, inherit: &InheritFds) -> std::io::Result<Self> {
        // As much as possible is performed before the fork.
        // In a multithreaded program, only async-signal-safe functions may be
        // called by the child until execve, and memory allocation is not one.
        let image = CString::new(cmd.image().as_bytes())?;
        access(image.as_c_str(), AccessFlags::X_OK)?;

        let mut args = Vec::with_capacity(cmd.tokens().len());
        for token in cmd.tokens() {
            args.push(CString::new(token.as_bytes())?);
        }
        let mut argv: Vec<*const libc::c_char> = args.iter().map(|a| a.as_ptr()).collect();
        argv.push(std::ptr::null());

        let (gate_r, gate_w) = pipe2(OFlag::O_CLOEXEC)?;
        let (status_r, status_w) = pipe2(OFlag::O_CLOEXEC)?;
        let keep = [gate_r.as_raw_fd(), status_w.as_raw_fd()];

        match unsafe { fork() } {
            Err(e) => Err(e.into()),
            Ok(ForkResult::Child) => {
                inherit.close_others(keep);
                if !wait_for_gate(keep[0]) {
                    unsafe { libc::_exit(GATE_CLOSED_EXIT) };
                }
                unsafe { libc::execv(image.as_ptr(), argv.as_ptr()) };
                // To reach here means the exec failed.
                let errno = nix::errno::Errno::last_raw().to_ne_bytes();
                unsafe {
                    libc::write(keep[1], errno.as_ptr().cast(), errno.len());
                    libc::_exit(EXEC_FAILED_EXIT)
                }
            }
            Ok(ForkResult::Parent { child }) => {
                // The child's ends close here, so the parent sees EOF on the
                // status pipe once the child execs or exits.
                drop(gate_r);
                drop(status_w);
                Ok(Self {
                    pid: child,
                    gate: Some(File::from(gate_w)),
                    status: Some(File::from(status_r)),
                    exit: None,
                })
            }
        }
    }

    pub fn pid(&self) -> Pid {
        self.pid
    }

    /// Release the child from the gate, and report whether its exec worked.
    pub fn resume(&mut self) -> std::io::Result<()> {
        let mut gate = self.gate.take().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "child already resumed")
        })?;
        gate.write_all(&[1])?;
        drop(gate);

        let mut report = Vec::new();
        if let Some(mut status) = self.status.take() {
            status.read_to_end(&mut report)?;
        }
        match <[u8; 4]>::try_from(report.as_slice()) {
            Ok(errno) => Err(std::io::Error::from_raw_os_error(i32::from_ne_bytes(errno))),
            Err(_) => Ok(()),
        }
    }

    /// Kill the child and reap it.
    pub fn terminate(&mut self) -> std::io::Result<()> {
        if self.exit.is_some() {
            return Ok(());
        }
        kill(self.pid, Signal::SIGKILL)?;
        self.exit = Some(waitpid(self.pid, None)?);
        Ok(())
    }

    pub fn wait(&mut self) -> std::io::Result<()> {
        if self.exit.is_none() {
            self.exit = Some(waitpid(self.pid, None)?);
        }
        Ok(())
    }

    /// The exit code, with a signal death reported the way shells do.
    pub fn exit_code(&self) -> std::io::Result<u32> {
        match self.exit {
            Some(WaitStatus::Exited(_, code)) => Ok(code as u32),
            Some(WaitStatus::Signaled(_, signal, _)) => Ok(128 + signal as u32),
            Some(status) => Err(std::io::Error::other(format!(
                "child has no exit code: {:?}",
                status
            ))),
            None => Err(std::io::Error::other("child has not exited")),
        }
    }
}

impl Drop for SuspendedChild {
    /// Never leave the child behind unreaped.
    fn drop(&mut self) {
        if self.exit.is_none() {
            let _ = kill(self.pid, Signal::SIGKILL);
            let _ = waitpid(self.pid, None);
        }
    }
}

/// Block until the parent writes the gate byte.
/// Returns false if the gate closed first.
fn wait_for_gate(gate: libc::c_int) -> bool {
    let mut buf = [0u8; 1];
    loop {
        let n = unsafe { libc::read(gate, buf.as_mut_ptr().cast(), 1) };
        if n == 1 {
            return true;
        }
        if n < 0 && nix::errno::Errno::last() == nix::errno::Errno::EINTR {
            continue;
        }
        return false;
    }
}

#[cfg(test)]
mod tests {
    use super::{EXEC_FAILED_EXIT, GATE_CLOSED_EXIT, SuspendedChild};
    use crate::runtime::cmdline::CommandLine;
    use crate::runtime::spawn_linux::fd::InheritFds;
    use std::ffi::{OsStr, OsString};

    fn shell(script: &str) -> CommandLine {
        CommandLine::new(OsStr::new("/bin/sh"), &[OsString::from("-c"), OsString::from(script)])
            .expect("valid command line")
    }

    fn std_only() -> InheritFds {
        InheritFds::new([0, 1, 2]).expect("valid fds")
    }

    #[test]
    fn resumed_child_runs_and_exits() {
        let mut child = SuspendedChild::spawn(&shell("exit 42"), &std_only()).expect("spawn");
        child.resume().expect("resume");
        child.wait().expect("wait");
        assert_eq!(child.exit_code().unwrap(), 42);
    }

    #[test]
    fn missing_image_fails_before_fork() {
        let cmd = CommandLine::new(OsStr::new("/no/such/program"), &[]).unwrap();
        let err = SuspendedChild::spawn(&cmd, &std_only()).err().expect("spawn must fail");
        assert_eq!(err.raw_os_error(), Some(nix::libc::ENOENT));
    }

    #[test]
    fn closing_gate_stops_child() {
        let mut child = SuspendedChild::spawn(&shell("exit 0"), &std_only()).expect("spawn");
        drop(child.gate.take());
        child.wait().expect("wait");
        assert_eq!(child.exit_code().unwrap(), GATE_CLOSED_EXIT as u32);
    }

    #[test]
    fn exec_failure_reported_on_resume() {
        // Executable, but not a valid image.
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("not-an-image");
        std::fs::write(&path, b"\x00\x01\x02\x03").unwrap();
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        }
        let cmd = CommandLine::new(path.as_os_str(), &[]).unwrap();
        let mut child = SuspendedChild::spawn(&cmd, &std_only()).expect("spawn");
        let err = child.resume().expect_err("exec must fail");
        assert_eq!(err.raw_os_error(), Some(nix::libc::ENOEXEC));
        child.wait().expect("wait");
        assert_eq!(child.exit_code().unwrap(), EXEC_FAILED_EXIT as u32);
    }

    #[test]
    fn terminate_suspended_child() {
        let mut child = SuspendedChild::spawn(&shell("exit 0"), &std_only()).expect("spawn");
        child.terminate().expect("terminate");
        assert_eq!(child.exit_code().unwrap(), 128 + nix::libc::SIGKILL as u32);
        // Already reaped.
        child.terminate().expect("second terminate");
    }

    #[test]
    fn dropped_child_is_reaped() {
        use nix::errno::Errno;
        use nix::sys::wait::{WaitPidFlag, waitpid};

        let child = SuspendedChild::spawn(&shell("exit 0"), &std_only()).expect("spawn");
        let pid = child.pid();
        drop(child);
        assert_eq!(waitpid(pid, Some(WaitPidFlag::WNOHANG)), Err(Errno::ECHILD));
    }
}
