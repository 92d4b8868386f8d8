//! Launch real programs through the native platform.

use std::ffi::OsString;

use crate::runtime::error::{LaunchError, Step};
use crate::{LaunchEnv, Resolution, launch, run};

use super::util;

/// A target that doesn't exist fails at process creation.
#[test]
fn missing_target() {
    match launch(util::missing_program()) {
        Err(LaunchError::Os { step, source }) => {
            assert_eq!(step, Step::CreateProcess);
            assert!(source.raw_os_error().is_some(), "no OS code in {:?}", source);
        }
        other => panic!("unexpected result: {:?}", other),
    }
    assert_eq!(run(util::missing_program()), crate::FAILURE_EXIT_CODE);
}

#[test]
fn missing_target_in_search() {
    let env = LaunchEnv {
        target: OsString::from("uniproc-surely-missing-program"),
        args: vec![],
        resolution: Resolution::Search,
    };
    assert!(matches!(launch(env), Err(LaunchError::Resolve(_))));
}

#[cfg(target_os = "linux")]
mod linux {
    use std::ffi::OsString;

    use nix::libc;
    use nix::sched::{CpuSet, sched_getaffinity};
    use nix::unistd::Pid;

    use crate::{LaunchEnv, Resolution, launch, run};

    use super::util;

    /// The child's exit code becomes the launcher's.
    #[test]
    fn exit_code_propagates() {
        let launched = launch(util::shell("exit 42", &[])).expect("launch");
        assert_eq!(launched.exit_code, 42);
        assert!(launched.anomaly.is_none());
        assert_eq!(run(util::shell("exit 42", &[])), 42);
    }

    #[test]
    fn search_resolves_target() {
        let env = LaunchEnv {
            target: OsString::from("sh"),
            args: util::str_as_args(&["-c", "exit 3"]),
            resolution: Resolution::Search,
        };
        assert_eq!(launch(env).expect("launch").exit_code, 3);
    }

    /// Arguments with spaces arrive as separate, whole arguments.
    #[test]
    fn arguments_pass_verbatim() {
        let script = r#"test "$#" -eq 3 && test "$1" = "a b" && test "$2" = "-x" && test "$3" = '"q"'"#;
        let launched = launch(util::shell(script, &["a b", "-x", "\"q\""])).expect("launch");
        assert_eq!(launched.exit_code, 0);
    }

    /// The child can only run on the lowest CPU the launcher may use.
    #[test]
    fn child_pinned_to_first_cpu() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("cpus");
        let launched = launch(util::shell(
            r#"grep Cpus_allowed_list /proc/self/status > "$1""#,
            &[out.to_str().unwrap()],
        ))
        .expect("launch");
        assert_eq!(launched.exit_code, 0);

        let line = std::fs::read_to_string(&out).unwrap();
        let allowed = line.split(':').nth(1).expect("list").trim().to_string();
        let own = sched_getaffinity(Pid::from_raw(0)).unwrap();
        let expected = (0..CpuSet::count()).find(|c| own.is_set(*c).unwrap_or(false)).unwrap();
        assert_eq!(allowed, expected.to_string());
    }

    /// A descriptor the launcher holds open is not visible to the child.
    #[test]
    fn extra_descriptor_not_inherited() {
        let (r, _w) = nix::unistd::pipe().expect("pipe");
        // Not close-on-exec, and above anything the shell uses.
        let extra = unsafe { libc::fcntl(std::os::fd::AsRawFd::as_raw_fd(&r), libc::F_DUPFD, 200) };
        assert!(extra >= 200);

        let script = format!("test ! -e /proc/self/fd/{extra}");
        let launched = launch(util::shell(&script, &[]));
        unsafe { libc::close(extra) };
        assert_eq!(launched.expect("launch").exit_code, 0, "fd {} leaked into the child", extra);
    }

    /// An argument beyond the Windows command line limit is fine here.
    #[test]
    fn long_argument_passes() {
        let long = "x".repeat(40_000);
        let launched = launch(util::shell(r#"test "${#1}" -eq 40000"#, &[long.as_str()])).expect("launch");
        assert_eq!(launched.exit_code, 0);
    }

    /// A signal death is reported like a shell does.
    #[test]
    fn killed_child_reports_signal() {
        let launched = launch(util::shell("kill -9 $$", &[])).expect("launch");
        assert_eq!(launched.exit_code, 128 + libc::SIGKILL as u32);
    }
}

#[cfg(target_os = "windows")]
mod windows {
    use ::windows::Win32::System::Threading::{GetCurrentProcess, GetProcessAffinityMask};

    use crate::runtime::affinity::AffinityMask;
    use crate::{launch, run};

    use super::util;

    #[test]
    fn exit_code_propagates() {
        let launched = launch(util::powershell("exit 42", &[])).expect("launch");
        assert_eq!(launched.exit_code, 42);
        assert!(launched.anomaly.is_none());
        assert_eq!(run(util::powershell("exit 42", &[])), 42);
    }

    /// Spaces, quotes and backslashes survive the quoted command line.
    #[test]
    fn arguments_pass_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("args.ps1");
        std::fs::write(
            &script,
            "if ($args.Count -eq 3 -and $args[0] -ceq 'a b' -and $args[1] -ceq 'c\"d' -and $args[2] -ceq 'e f\\') { exit 0 }\r\nexit 1\r\n",
        )
        .unwrap();
        let launched = launch(util::powershell_file(&script, &["a b", "c\"d", "e f\\"])).expect("launch");
        assert_eq!(launched.exit_code, 0);
    }

    /// The child sees a single CPU: the lowest one the launcher may use.
    #[test]
    fn child_pinned_to_first_cpu() {
        let mut process_mask: usize = 0;
        let mut system_mask: usize = 0;
        unsafe { GetProcessAffinityMask(GetCurrentProcess(), &mut process_mask, &mut system_mask) }
            .expect("affinity query");
        let expected = AffinityMask::from_native(process_mask).lowest().expect("a CPU");

        // Exits with the index of the only allowed CPU, or 1000 if there are several.
        let launched = launch(util::powershell(
            "$m = [System.Diagnostics.Process]::GetCurrentProcess().ProcessorAffinity.ToInt64(); \
             $i = 0; \
             while ($m -ne 0 -and ($m -band 1) -eq 0) { $m = $m -shr 1; $i++ }; \
             if ($m -ne 1) { exit 1000 }; \
             exit $i",
            &[],
        ))
        .expect("launch");
        assert_eq!(launched.exit_code, expected as u32);
    }
}
