//! # uniproc
//!
//! Runs a child program pinned to a single CPU core, with only the standard
//! streams inherited, and hands back its exit code.

pub mod runtime;

pub use runtime::error::{FAILURE_EXIT_CODE, LaunchError, Step};
pub use runtime::resolve::Resolution;
pub use runtime::{LaunchEnv, Launched, launch, run};

#[cfg(test)]
mod integration_tests;
