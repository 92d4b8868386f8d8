// SPDX-License-Identifier: MIT

//! The constrained launch sequence.
//!
//! The group is created and limited before the child exists, and the child
//! is created suspended, so no instruction of the child runs outside the
//! limit.  Once the child exists, any failure to constrain or start it
//! terminates the child before the error is returned.

use std::ffi::{OsStr, OsString};

use tracing::{debug, trace};

use crate::runtime::cmdline::CommandLine;
use crate::runtime::error::{Anomaly, FAILURE_EXIT_CODE, LaunchError, Step};
use crate::runtime::platform::Platform;

/// Result of a launch that got the child running.
#[derive(Debug)]
pub struct Launched {
    /// The child's exit code, or 0 if it could not be observed.
    pub exit_code: u32,

    /// Set when the child ran, but its exit could not be observed.
    pub anomaly: Option<Anomaly>,
}

pub struct ConstrainedLauncher<P: Platform> {
    platform: P,
}

impl<P: Platform> ConstrainedLauncher<P> {
    pub fn new(platform: P) -> Self {
        Self { platform }
    }

    /// Run the image with the arguments, pinned to one CPU, and wait for it.
    pub fn launch(&self, image: &OsStr, args: &[OsString]) -> Result<Launched, LaunchError> {
        let group = self
            .platform
            .create_group()
            .map_err(|e| LaunchError::os(Step::CreateGroup, e))?;
        trace!("created resource group");

        let allowed = self
            .platform
            .allowed_cpus()
            .map_err(|e| LaunchError::os(Step::QueryAffinity, e))?;
        let cpu = allowed.first_cpu_only().ok_or(LaunchError::EmptyAffinity)?;
        debug!(cpu = ?cpu.lowest(), allowed = allowed.count(), "selected CPU");

        self.platform
            .limit_group(&group, &cpu)
            .map_err(|e| LaunchError::os(Step::LimitGroup, e))?;

        let streams = self.platform.std_streams();
        let inherit = self
            .platform
            .inherit_only(streams.allow_list())
            .map_err(|e| LaunchError::os(Step::InheritList, e))?;

        let cmd = CommandLine::new(image, args)?;
        debug!(image = ?cmd.image(), args = args.len(), "creating suspended process");

        let mut child = self
            .platform
            .spawn_suspended(&cmd, &streams, &inherit)
            .map_err(|e| LaunchError::os(Step::CreateProcess, e))?;

        let assigned = self.platform.assign(&group, &child);
        self.or_terminate(&mut child, Step::AssignGroup, assigned)?;

        let resumed = self.platform.resume(&mut child);
        self.or_terminate(&mut child, Step::Resume, resumed)?;
        trace!("child resumed");

        Ok(self.finish(&mut child))
    }

    /// The child exists but is not running under the limit; never leave it behind.
    fn or_terminate(
        &self,
        child: &mut P::Child,
        step: Step,
        res: std::io::Result<()>,
    ) -> Result<(), LaunchError> {
        match res {
            Ok(()) => Ok(()),
            Err(source) => {
                debug!(%step, error = %source, "terminating unconstrained child");
                let terminate = self
                    .platform
                    .terminate(child, FAILURE_EXIT_CODE as u32)
                    .err();
                Err(LaunchError::Unconstrained { step, source, terminate })
            }
        }
    }

    fn finish(&self, child: &mut P::Child) -> Launched {
        if let Err(source) = self.platform.wait(child) {
            return Launched {
                exit_code: 0,
                anomaly: Some(Anomaly { step: Step::Wait, source }),
            };
        }
        match self.platform.exit_code(child) {
            Ok(exit_code) => {
                debug!(exit_code, "child exited");
                Launched { exit_code, anomaly: None }
            }
            Err(source) => Launched {
                exit_code: 0,
                anomaly: Some(Anomaly { step: Step::ExitCode, source }),
            },
        }
    }
}
