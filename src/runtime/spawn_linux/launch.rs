// SPDX-License-Identifier: MIT

//! The launch steps, mapped onto fork, a start gate, and `sched_setaffinity`.

use std::os::fd::RawFd;

use tracing::debug;

use super::fd::{InheritFds, std_streams};
use super::group::{CpuGroup, current_process_affinity};
use super::process::SuspendedChild;
use crate::runtime::affinity::AffinityMask;
use crate::runtime::cmdline::CommandLine;
use crate::runtime::platform::{Platform, StdStreams};

#[derive(Debug, Default)]
pub struct LinuxPlatform;

impl Platform for LinuxPlatform {
    type Handle = RawFd;
    type Group = CpuGroup;
    type InheritList = InheritFds;
    type Child = SuspendedChild;

    fn create_group(&self) -> std::io::Result<CpuGroup> {
        Ok(CpuGroup::new())
    }

    fn allowed_cpus(&self) -> std::io::Result<AffinityMask> {
        current_process_affinity()
    }

    fn limit_group(&self, group: &CpuGroup, cpus: &AffinityMask) -> std::io::Result<()> {
        group.limit_affinity(cpus)
    }

    fn std_streams(&self) -> StdStreams<RawFd> {
        std_streams()
    }

    fn inherit_only(&self, handles: [RawFd; 3]) -> std::io::Result<InheritFds> {
        InheritFds::new(handles)
    }

    fn spawn_suspended(
        &self,
        cmd: &CommandLine,
        // Already in place at 0, 1 and 2.
        _streams: &StdStreams<RawFd>,
        inherit: &InheritFds,
    ) -> std::io::Result<SuspendedChild> {
        let child = SuspendedChild::spawn(cmd, inherit)?;
        debug!(pid = child.pid().as_raw(), "created suspended process");
        Ok(child)
    }

    fn assign(&self, group: &CpuGroup, child: &SuspendedChild) -> std::io::Result<()> {
        group.assign(child.pid())
    }

    fn resume(&self, child: &mut SuspendedChild) -> std::io::Result<()> {
        child.resume()
    }

    /// SIGKILL carries no exit code; the child reports death by signal.
    fn terminate(&self, child: &mut SuspendedChild, _exit_code: u32) -> std::io::Result<()> {
        child.terminate()
    }

    fn wait(&self, child: &mut SuspendedChild) -> std::io::Result<()> {
        child.wait()
    }

    fn exit_code(&self, child: &mut SuspendedChild) -> std::io::Result<u32> {
        child.exit_code()
    }
}
