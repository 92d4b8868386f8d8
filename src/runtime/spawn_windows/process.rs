// SPDX-License-Identifier: MIT

//! Creation and control of the child process.

use std::mem;

use windows::Win32::{
    Foundation::{HANDLE, WAIT_OBJECT_0},
    System::Threading,
};

use super::attribute_list::ThreadAttributeList;
use super::conv::{ScopedHandle, as_c_str_w, os_error};
use crate::runtime::cmdline::CommandLine;
use crate::runtime::platform::StdStreams;

/// The child process and its main thread.
/// Both handles are closed on drop; the process itself is not touched.
pub struct ChildProcess {
    pid: u32,
    process: ScopedHandle,
    thread: ScopedHandle,
}

impl ChildProcess {
    /// Create the process with its main thread suspended.
    /// Only the handles in the attribute list are inherited, and the standard
    /// streams must be among them.
    pub fn spawn_suspended(
        cmd: &CommandLine,
        streams: &StdStreams<HANDLE>,
        inherit: &ThreadAttributeList,
    ) -> std::io::Result<Self> {
        let app = as_c_str_w(cmd.image());
        // CreateProcessW may write into the command line buffer.
        let mut cmdline = cmd.wide().to_vec();

        unsafe {
            let mut si_ex: Threading::STARTUPINFOEXW = mem::zeroed();
            si_ex.StartupInfo.cb = mem::size_of::<Threading::STARTUPINFOEXW>() as u32;
            si_ex.StartupInfo.dwFlags = Threading::STARTF_USESTDHANDLES;
            si_ex.StartupInfo.hStdInput = streams.input;
            si_ex.StartupInfo.hStdOutput = streams.output;
            si_ex.StartupInfo.hStdError = streams.error;
            si_ex.lpAttributeList = inherit.list();

            let mut pi: Threading::PROCESS_INFORMATION = mem::zeroed();

            Threading::CreateProcessW(
                windows::core::PCWSTR(app.as_ptr()), // application name
                Some(windows::core::PWSTR(cmdline.as_mut_ptr())), // command line
                None, // process attributes
                None, // thread attributes
                // Must be true for any inheritance at all; the attribute list
                // narrows it to the allowed handles.
                true,
                Threading::CREATE_SUSPENDED // assign the job before the first instruction runs
                | Threading::CREATE_UNICODE_ENVIRONMENT
                | Threading::EXTENDED_STARTUPINFO_PRESENT, // lpAttributeList is set
                None, // inherit the environment
                windows::core::PCWSTR::null(), // inherit the current directory
                &si_ex.StartupInfo,
                &mut pi,
            )
            .map_err(os_error)?;

            Ok(Self {
                pid: pi.dwProcessId,
                process: ScopedHandle::new(pi.hProcess),
                thread: ScopedHandle::new(pi.hThread),
            })
        }
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }

    pub fn process(&self) -> HANDLE {
        self.process.raw()
    }

    pub fn resume(&self) -> std::io::Result<()> {
        if unsafe { Threading::ResumeThread(self.thread.raw()) } == u32::MAX {
            return Err(std::io::Error::last_os_error());
        }
        Ok(())
    }

    pub fn terminate(&self, exit_code: u32) -> std::io::Result<()> {
        unsafe { Threading::TerminateProcess(self.process.raw(), exit_code) }.map_err(os_error)
    }

    pub fn wait(&self) -> std::io::Result<()> {
        let ret = unsafe { Threading::WaitForSingleObject(self.process.raw(), Threading::INFINITE) };
        if ret != WAIT_OBJECT_0 {
            return Err(std::io::Error::last_os_error());
        }
        Ok(())
    }

    pub fn exit_code(&self) -> std::io::Result<u32> {
        let mut code = 0u32;
        unsafe { Threading::GetExitCodeProcess(self.process.raw(), &mut code) }.map_err(os_error)?;
        Ok(code)
    }
}
