//! Utility helpers for running the tests.

use std::ffi::OsString;

use crate::{LaunchEnv, Resolution};

/// Convert the string values into an array of arguments.
pub fn str_as_args(args: &[&str]) -> Vec<OsString> {
    args.iter().map(OsString::from).collect()
}

/// The launch of a shell script, by absolute path.
#[cfg(target_os = "linux")]
pub fn shell(script: &str, extra: &[&str]) -> LaunchEnv {
    let mut args = str_as_args(&["-c", script, "sh"]);
    args.extend(str_as_args(extra));
    LaunchEnv {
        target: OsString::from("/bin/sh"),
        args,
        resolution: Resolution::Direct,
    }
}

/// Run a PowerShell command, found on the search path.
#[cfg(target_os = "windows")]
pub fn powershell(command: &str, extra: &[&str]) -> LaunchEnv {
    let mut args = str_as_args(&["-NoProfile", "-NonInteractive", "-Command", command]);
    args.extend(str_as_args(extra));
    LaunchEnv {
        target: OsString::from("powershell.exe"),
        args,
        resolution: Resolution::Search,
    }
}

/// Run a PowerShell script file with the arguments.
#[cfg(target_os = "windows")]
pub fn powershell_file(script: &std::path::Path, extra: &[&str]) -> LaunchEnv {
    let mut args = str_as_args(&["-NoProfile", "-NonInteractive", "-ExecutionPolicy", "Bypass", "-File"]);
    args.push(script.as_os_str().to_os_string());
    args.extend(str_as_args(extra));
    LaunchEnv {
        target: OsString::from("powershell.exe"),
        args,
        resolution: Resolution::Search,
    }
}

/// An absolute path that does not exist.
pub fn missing_program() -> LaunchEnv {
    #[cfg(target_os = "windows")]
    let target = OsString::from("C:\\no\\such\\directory\\program.exe");
    #[cfg(not(target_os = "windows"))]
    let target = OsString::from("/no/such/directory/program");
    LaunchEnv {
        target,
        args: vec![],
        resolution: Resolution::Direct,
    }
}
