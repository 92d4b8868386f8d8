// SPDX-License-Identifier: MIT

//! `uniproc [--search] <target> [args...]`
//!
//! Runs the target pinned to one CPU and exits with its exit code.

use std::ffi::OsString;

use clap::Parser;
use clap::error::ErrorKind;
use tracing_subscriber::EnvFilter;

use uniproc::{FAILURE_EXIT_CODE, LaunchEnv, Resolution};

/// Environment variable holding the log filter.
const LOG_ENV: &str = "UNIPROC_LOG";

#[derive(Parser, Debug)]
#[command(
    name = "uniproc",
    version,
    about = "Run a program pinned to a single CPU core, and exit with its exit code."
)]
struct Cli {
    /// Look the target up on the search path instead of using it as a path.
    #[arg(short, long)]
    search: bool,

    /// The target executable, followed by its arguments.
    #[arg(
        value_name = "TARGET",
        trailing_var_arg = true,
        allow_hyphen_values = true
    )]
    command: Vec<OsString>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
                _ => FAILURE_EXIT_CODE,
            };
            // Prints to stdout for help, stderr for errors.
            let _ = e.print();
            std::process::exit(code);
        }
    };

    let resolution = if cli.search {
        Resolution::Search
    } else {
        Resolution::Direct
    };
    let env = match LaunchEnv::from_command(cli.command, resolution) {
        Ok(env) => env,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(FAILURE_EXIT_CODE);
        }
    };

    std::process::exit(uniproc::run(env));
}
