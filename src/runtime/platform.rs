// SPDX-License-Identifier: MIT

//! The OS operations the launcher is built from.
//!
//! Each method is one step of the launch.  Resources handed out by the
//! platform own their OS handles and release them when dropped, so every
//! early return releases what was already acquired.

use std::io;

use crate::runtime::affinity::AffinityMask;
use crate::runtime::cmdline::CommandLine;

/// The launcher's own standard streams, shared with the child.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StdStreams<H> {
    pub input: H,
    pub output: H,
    pub error: H,
}

impl<H: Copy> StdStreams<H> {
    /// The complete set of handles the child may inherit.
    pub fn allow_list(&self) -> [H; 3] {
        [self.input, self.output, self.error]
    }
}

pub trait Platform {
    /// Raw standard stream handle.
    type Handle: Copy;

    /// Resource-limiting group that the child is attached to.
    type Group;

    /// Restricts handle inheritance at process creation.
    type InheritList;

    /// Owns the created process and its main thread.
    type Child;

    fn create_group(&self) -> io::Result<Self::Group>;

    /// The CPUs the current process itself may run on.
    fn allowed_cpus(&self) -> io::Result<AffinityMask>;

    fn limit_group(&self, group: &Self::Group, cpus: &AffinityMask) -> io::Result<()>;

    fn std_streams(&self) -> StdStreams<Self::Handle>;

    /// Build the list that makes exactly these handles inheritable.
    fn inherit_only(&self, handles: [Self::Handle; 3]) -> io::Result<Self::InheritList>;

    /// Create the process with its main thread not yet running.
    fn spawn_suspended(
        &self,
        cmd: &CommandLine,
        streams: &StdStreams<Self::Handle>,
        inherit: &Self::InheritList,
    ) -> io::Result<Self::Child>;

    fn assign(&self, group: &Self::Group, child: &Self::Child) -> io::Result<()>;

    fn resume(&self, child: &mut Self::Child) -> io::Result<()>;

    fn terminate(&self, child: &mut Self::Child, exit_code: u32) -> io::Result<()>;

    /// Block until the child exits.
    fn wait(&self, child: &mut Self::Child) -> io::Result<()>;

    fn exit_code(&self, child: &mut Self::Child) -> io::Result<u32>;
}
