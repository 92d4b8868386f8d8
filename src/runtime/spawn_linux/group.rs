// SPDX-License-Identifier: MIT

//! CPU group for Linux.
//!
//! Linux has no job objects.  The group holds the affinity limit and applies
//! it to each attached process with `sched_setaffinity`; anything the process
//! forks afterwards inherits the same affinity from it.

use std::cell::RefCell;

use nix::sched::{CpuSet, sched_getaffinity, sched_setaffinity};
use nix::unistd::Pid;

use crate::runtime::affinity::AffinityMask;

#[derive(Default)]
pub struct CpuGroup {
    limit: RefCell<Option<CpuSet>>,
}

impl CpuGroup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn limit_affinity(&self, cpus: &AffinityMask) -> std::io::Result<()> {
        let mut set = CpuSet::new();
        for cpu in cpus.indexes() {
            set.set(cpu)?;
        }
        *self.limit.borrow_mut() = Some(set);
        Ok(())
    }

    /// Apply the group's limit to the process.
    pub fn assign(&self, pid: Pid) -> std::io::Result<()> {
        match self.limit.borrow().as_ref() {
            None => Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "resource group has no affinity limit",
            )),
            Some(set) => Ok(sched_setaffinity(pid, set)?),
        }
    }
}

/// The CPUs this process may run on, which may be fewer than the system's.
pub fn current_process_affinity() -> std::io::Result<AffinityMask> {
    let set = sched_getaffinity(Pid::from_raw(0))?;
    let mut mask = AffinityMask::empty();
    for cpu in 0..CpuSet::count() {
        if set.is_set(cpu)? {
            mask.set(cpu);
        }
    }
    Ok(mask)
}
