// SPDX-License-Identifier: MIT

//! Constrained launch for Windows.
//!
//! The child is created suspended, attached to a job object whose affinity
//! limit is already set, then resumed.  Handle inheritance is narrowed with
//! `PROC_THREAD_ATTRIBUTE_HANDLE_LIST` to the three standard handles.

mod attribute_list;
mod conv;
mod job;
mod launch;
mod process;

pub(crate) use launch::WindowsPlatform;
