// SPDX-License-Identifier: MIT

//! Description of a single launch.

use std::ffi::OsString;

use crate::runtime::error::LaunchError;
use crate::runtime::resolve::Resolution;

/// Describes how to launch the child process.
#[derive(Debug, Clone)]
pub struct LaunchEnv {
    /// The executable, either as a path or a name to search for.
    pub target: OsString,
    /// Passed through verbatim after the image.
    pub args: Vec<OsString>,
    pub resolution: Resolution,
}

impl LaunchEnv {
    /// Split the command into the target and its arguments.
    /// An empty command is a usage error.
    pub fn from_command(command: Vec<OsString>, resolution: Resolution) -> Result<Self, LaunchError> {
        let mut command = command.into_iter();
        let target = command.next().ok_or(LaunchError::Usage)?;
        Ok(Self {
            target,
            args: command.collect(),
            resolution,
        })
    }
}
