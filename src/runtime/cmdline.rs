// SPDX-License-Identifier: MIT

//! Command line assembly.
//!
//! Windows passes the child a single string, which the child's runtime splits
//! back into arguments.  Every token is wrapped in double quotes so that
//! whitespace inside a token never splits it, and quotes and the backslashes
//! in front of them are escaped with the usual argv rules.
//!
//! See "Everyone quotes command line arguments the wrong way":
//!   https://learn.microsoft.com/en-us/archive/blogs/twistylittlepassagesallalike/everyone-quotes-command-line-arguments-the-wrong-way

use std::ffi::{OsStr, OsString};

use thiserror::Error;

/// Maximum length of the `CreateProcess` command line, in UTF-16 units,
/// including the terminating NUL.
#[cfg(target_os = "windows")]
pub const MAX_COMMAND_LINE: usize = 32_767;

/// Longest single argument `execve` accepts, in bytes including the NUL
/// (the kernel's `MAX_ARG_STRLEN`).  The total size is left to `execve`,
/// which reports `E2BIG`.
#[cfg(not(target_os = "windows"))]
pub const MAX_ARGUMENT: usize = 32 * 4096;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandLineError {
    #[error("nul character found in argument {0}")]
    Nul(usize),

    #[error("command line is {len} characters long, exceeding the limit of {max}")]
    TooLong { len: usize, max: usize },

    #[error("argument {index} is {len} bytes long, exceeding the limit of {max}")]
    ArgumentTooLong { index: usize, len: usize, max: usize },
}

/// The image to run plus the tokens handed to it.
/// The first token is always the image itself.
#[derive(Debug, Clone)]
pub struct CommandLine {
    tokens: Vec<OsString>,
    wide: Vec<u16>,
}

impl CommandLine {
    pub fn new(image: &OsStr, args: &[OsString]) -> Result<Self, CommandLineError> {
        let mut tokens = Vec::with_capacity(args.len() + 1);
        tokens.push(image.to_os_string());
        tokens.extend(args.iter().cloned());
        let wide = quote_command_line(&tokens)?;
        check_length(&tokens, &wide)?;
        Ok(Self { tokens, wide })
    }

    pub fn image(&self) -> &OsStr {
        &self.tokens[0]
    }

    pub fn tokens(&self) -> &[OsString] {
        &self.tokens
    }

    /// The quoted, NUL-terminated UTF-16 command line.
    pub fn wide(&self) -> &[u16] {
        &self.wide
    }
}

#[cfg(target_os = "windows")]
fn check_length(_tokens: &[OsString], wide: &[u16]) -> Result<(), CommandLineError> {
    if wide.len() > MAX_COMMAND_LINE {
        return Err(CommandLineError::TooLong {
            len: wide.len(),
            max: MAX_COMMAND_LINE,
        });
    }
    Ok(())
}

#[cfg(not(target_os = "windows"))]
fn check_length(tokens: &[OsString], _wide: &[u16]) -> Result<(), CommandLineError> {
    for (index, token) in tokens.iter().enumerate() {
        let len = token.len() + 1;
        if len > MAX_ARGUMENT {
            return Err(CommandLineError::ArgumentTooLong { index, len, max: MAX_ARGUMENT });
        }
    }
    Ok(())
}

/// Quote each token, join them with single spaces, and NUL terminate.
pub fn quote_command_line(tokens: &[OsString]) -> Result<Vec<u16>, CommandLineError> {
    let mut ret = vec![];
    for (i, token) in tokens.iter().enumerate() {
        if i > 0 {
            ret.push(' ' as u16);
        }
        let token = wide(token);
        if token.contains(&0) {
            return Err(CommandLineError::Nul(i));
        }
        append_quoted(&mut ret, &token);
    }
    ret.push(0);
    Ok(ret)
}

fn append_quoted(cmd: &mut Vec<u16>, arg: &[u16]) {
    cmd.push('"' as u16);
    let mut backslash_count = 0;
    for &c in arg {
        if c == '\\' as u16 {
            backslash_count += 1;
            continue;
        }
        if c == '"' as u16 {
            // Escape all the backslashes, and add one for the escaped '"'.
            cmd.extend(std::iter::repeat_n('\\' as u16, backslash_count * 2 + 1));
        } else {
            cmd.extend(std::iter::repeat_n('\\' as u16, backslash_count));
        }
        cmd.push(c);
        backslash_count = 0;
    }

    // The closing quote must stay a meta-character.
    cmd.extend(std::iter::repeat_n('\\' as u16, backslash_count * 2));
    cmd.push('"' as u16);
}

#[cfg(target_os = "windows")]
fn wide(s: &OsStr) -> Vec<u16> {
    use std::os::windows::ffi::OsStrExt;
    s.encode_wide().collect()
}

#[cfg(not(target_os = "windows"))]
fn wide(s: &OsStr) -> Vec<u16> {
    s.to_string_lossy().encode_utf16().collect()
}
