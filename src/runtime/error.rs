// SPDX-License-Identifier: MIT

//! Common error type.
//!
//! Every failure names the step that failed and carries the underlying OS
//! error, so the diagnostic can report the OS error code.

use std::fmt::Display;

use thiserror::Error;

use crate::runtime::cmdline::CommandLineError;
use crate::runtime::resolve::ResolveError;

/// Exit code reported when the launcher itself fails.
pub const FAILURE_EXIT_CODE: i32 = 1;

/// Each fallible OS operation performed while launching the child.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    CreateGroup,
    QueryAffinity,
    LimitGroup,
    InheritList,
    CreateProcess,
    AssignGroup,
    Resume,
    Terminate,
    Wait,
    ExitCode,
}

impl Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::CreateGroup => "resource group creation",
            Self::QueryAffinity => "CPU affinity query",
            Self::LimitGroup => "resource group affinity limit",
            Self::InheritList => "inheritable handle list setup",
            Self::CreateProcess => "process creation",
            Self::AssignGroup => "resource group assignment",
            Self::Resume => "thread resume",
            Self::Terminate => "child termination",
            Self::Wait => "wait for child",
            Self::ExitCode => "exit code retrieval",
        })
    }
}

#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("at least one argument required")]
    Usage,

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    CommandLine(#[from] CommandLineError),

    /// The process reported no allowed CPU at all.
    #[error("CPU affinity mask is empty")]
    EmptyAffinity,

    #[error("{step} failed with error code {}", os_code(.source))]
    Os {
        step: Step,
        source: std::io::Error,
    },

    /// The child exists, but could not be placed under the constraint or started.
    #[error("{step} failed with error code {}; {}", os_code(.source), terminate_note(.terminate))]
    Unconstrained {
        step: Step,
        source: std::io::Error,
        terminate: Option<std::io::Error>,
    },
}

impl LaunchError {
    pub fn os(step: Step, source: std::io::Error) -> Self {
        LaunchError::Os { step, source }
    }

    /// The step that failed, if the failure came from an OS call.
    #[cfg(test)]
    pub fn step(&self) -> Option<Step> {
        match self {
            Self::Os { step, .. } | Self::Unconstrained { step, .. } => Some(*step),
            _ => None,
        }
    }
}

/// Post-launch failure that does not count against the launch itself.
#[derive(Debug, Error)]
#[error("{step} failed with error code {}", os_code(.source))]
pub struct Anomaly {
    pub step: Step,
    pub source: std::io::Error,
}

/// Format the raw OS error code, falling back to the error text.
pub fn os_code(e: &std::io::Error) -> String {
    match e.raw_os_error() {
        Some(c) => c.to_string(),
        None => format!("unknown ({})", e),
    }
}

fn terminate_note(terminate: &Option<std::io::Error>) -> String {
    match terminate {
        None => "the child was terminated".to_string(),
        Some(e) => format!("terminating the child also failed with error code {}", os_code(e)),
    }
}
