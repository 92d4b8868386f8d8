// SPDX-License-Identifier: MIT

//! Constrained launch for Linux.
//!
//! The steps match the Windows job-object sequence: the CPU limit is decided
//! before the child exists, the child is held before its first instruction
//! of the target image, pinned, and only then released.

mod fd;
mod group;
mod launch;
mod process;

pub(crate) use launch::LinuxPlatform;
