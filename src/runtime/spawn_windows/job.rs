// SPDX-License-Identifier: MIT

//! Job object that pins its processes to a CPU set.

use windows::Win32::{
    Foundation::HANDLE,
    System::{JobObjects, Threading},
};

use super::conv::{ScopedHandle, os_error};
use crate::runtime::affinity::AffinityMask;

/// Anonymous job object, closed on drop.
///
/// No kill-on-close limit is set: a child that outlives the launcher keeps
/// running, still bound by the job's limits.
pub struct Job {
    handle: ScopedHandle,
}

impl Job {
    pub fn new() -> std::io::Result<Self> {
        let handle = unsafe { JobObjects::CreateJobObjectW(None, windows::core::PCWSTR::null()) }
            .map_err(os_error)?;
        Ok(Self { handle: ScopedHandle::new(handle) })
    }

    /// Limit every process in the job to the CPUs in the mask.
    pub fn limit_affinity(&self, cpus: &AffinityMask) -> std::io::Result<()> {
        let affinity = cpus.to_native().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "CPU outside the native affinity mask")
        })?;

        let mut basic = JobObjects::JOBOBJECT_BASIC_LIMIT_INFORMATION::default();
        basic.LimitFlags = JobObjects::JOB_OBJECT_LIMIT_AFFINITY;
        basic.Affinity = affinity;

        unsafe {
            JobObjects::SetInformationJobObject(
                self.handle.raw(),
                JobObjects::JobObjectBasicLimitInformation,
                &basic as *const _ as *const core::ffi::c_void,
                std::mem::size_of::<JobObjects::JOBOBJECT_BASIC_LIMIT_INFORMATION>() as u32,
            )
        }
        .map_err(os_error)
    }

    pub fn assign(&self, process: HANDLE) -> std::io::Result<()> {
        unsafe { JobObjects::AssignProcessToJobObject(self.handle.raw(), process) }.map_err(os_error)
    }
}

/// The CPUs this process may run on, which may be fewer than the system's.
pub fn current_process_affinity() -> std::io::Result<AffinityMask> {
    let mut process_mask: usize = 0;
    let mut system_mask: usize = 0;
    unsafe {
        Threading::GetProcessAffinityMask(
            Threading::GetCurrentProcess(),
            &mut process_mask,
            &mut system_mask,
        )
    }
    .map_err(os_error)?;
    Ok(AffinityMask::from_native(process_mask))
}
