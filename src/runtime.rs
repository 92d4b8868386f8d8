// SPDX-License-Identifier: MIT

//! Manages the constrained launch of the child process.
//!
//! The `launch` function is the main entry point.  It takes a `LaunchEnv`
//! that names the executable and its arguments, runs it pinned to the first
//! CPU the launcher itself may use, with only the standard streams
//! inheritable, and waits for it to exit.

pub mod affinity;
pub mod cmdline;
pub mod error;
pub mod launcher;
pub mod platform;
pub mod resolve;
pub mod spawn;

pub use launcher::{ConstrainedLauncher, Launched};
pub use spawn::LaunchEnv;

use error::{FAILURE_EXIT_CODE, LaunchError};

#[cfg(target_os = "linux")]
mod spawn_linux;

#[cfg(target_os = "linux")]
type NativePlatform = spawn_linux::LinuxPlatform;

#[cfg(target_os = "windows")]
mod spawn_windows;

#[cfg(target_os = "windows")]
type NativePlatform = spawn_windows::WindowsPlatform;

#[cfg(not(any(target_os = "linux", target_os = "windows")))]
compile_error!("uniproc supports Linux and Windows");

/// Resolve the target, launch it, and wait for it to exit.
pub fn launch(env: LaunchEnv) -> Result<Launched, LaunchError> {
    let image = resolve::resolve(&env.target, env.resolution)?;
    ConstrainedLauncher::new(NativePlatform::default()).launch(&image, &env.args)
}

/// Launch, report any failure to stderr, and give the exit code for the launcher.
pub fn run(env: LaunchEnv) -> i32 {
    match launch(env) {
        Ok(launched) => {
            if let Some(anomaly) = &launched.anomaly {
                eprintln!("{}", anomaly);
            }
            // Windows exit codes are unsigned; keep the bits.
            launched.exit_code as i32
        }
        Err(e) => {
            eprintln!("{}", e);
            FAILURE_EXIT_CODE
        }
    }
}
