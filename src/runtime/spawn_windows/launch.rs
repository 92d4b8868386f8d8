// SPDX-License-Identifier: MIT

//! The launch steps, mapped onto job objects and suspended process creation.

use tracing::{debug, warn};
use windows::Win32::Foundation::{HANDLE, INVALID_HANDLE_VALUE};
use windows_sys::Win32::System::Console;

use super::attribute_list::ThreadAttributeList;
use super::job::{Job, current_process_affinity};
use super::process::ChildProcess;
use crate::runtime::affinity::AffinityMask;
use crate::runtime::cmdline::CommandLine;
use crate::runtime::platform::{Platform, StdStreams};

#[derive(Debug, Default)]
pub struct WindowsPlatform;

impl Platform for WindowsPlatform {
    type Handle = HANDLE;
    type Group = Job;
    type InheritList = ThreadAttributeList;
    type Child = ChildProcess;

    fn create_group(&self) -> std::io::Result<Job> {
        Job::new()
    }

    fn allowed_cpus(&self) -> std::io::Result<AffinityMask> {
        current_process_affinity()
    }

    fn limit_group(&self, group: &Job, cpus: &AffinityMask) -> std::io::Result<()> {
        group.limit_affinity(cpus)
    }

    fn std_streams(&self) -> StdStreams<HANDLE> {
        StdStreams {
            input: std_handle(Console::STD_INPUT_HANDLE, "stdin"),
            output: std_handle(Console::STD_OUTPUT_HANDLE, "stdout"),
            error: std_handle(Console::STD_ERROR_HANDLE, "stderr"),
        }
    }

    fn inherit_only(&self, handles: [HANDLE; 3]) -> std::io::Result<ThreadAttributeList> {
        ThreadAttributeList::handle_list(handles.to_vec())
    }

    fn spawn_suspended(
        &self,
        cmd: &CommandLine,
        streams: &StdStreams<HANDLE>,
        inherit: &ThreadAttributeList,
    ) -> std::io::Result<ChildProcess> {
        let child = ChildProcess::spawn_suspended(cmd, streams, inherit)?;
        debug!(pid = child.pid(), "created suspended process");
        Ok(child)
    }

    fn assign(&self, group: &Job, child: &ChildProcess) -> std::io::Result<()> {
        group.assign(child.process())
    }

    fn resume(&self, child: &mut ChildProcess) -> std::io::Result<()> {
        child.resume()
    }

    fn terminate(&self, child: &mut ChildProcess, exit_code: u32) -> std::io::Result<()> {
        child.terminate(exit_code)
    }

    fn wait(&self, child: &mut ChildProcess) -> std::io::Result<()> {
        child.wait()
    }

    fn exit_code(&self, child: &mut ChildProcess) -> std::io::Result<u32> {
        child.exit_code()
    }
}

/// Look up the launcher's own standard handle.
/// Processes without a console may have none; that is passed along as is.
fn std_handle(which: Console::STD_HANDLE, name: &str) -> HANDLE {
    let handle = HANDLE(unsafe { Console::GetStdHandle(which) });
    if handle.0.is_null() || handle == INVALID_HANDLE_VALUE {
        warn!(stream = name, "no standard handle to pass to the child");
    }
    handle
}
