// SPDX-License-Identifier: MIT

//! Turn the requested target into the image path handed to process creation.

use std::ffi::{OsStr, OsString};

use thiserror::Error;

/// How the target names the executable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Resolution {
    /// The target is the image path, used as given.
    #[default]
    Direct,
    /// The target is looked up on the search path, probing the default
    /// executable extensions.
    Search,
}

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("executable {0:?} not found: {1}")]
    NotFound(OsString, which::Error),

    #[error("path to {0:?} is too long ({1} characters, limit {2})")]
    PathTooLong(OsString, usize, usize),
}

/// Longest image path accepted, counting the terminating NUL.
#[cfg(target_os = "windows")]
pub const MAX_IMAGE_PATH: usize = 260;

#[cfg(not(target_os = "windows"))]
pub const MAX_IMAGE_PATH: usize = 4096;

/// Find the image to run for the target.
pub fn resolve(target: &OsStr, resolution: Resolution) -> Result<OsString, ResolveError> {
    let image = match resolution {
        Resolution::Direct => target.to_os_string(),
        Resolution::Search => which::which(target)
            .map_err(|e| ResolveError::NotFound(target.to_os_string(), e))?
            .into_os_string(),
    };
    let len = path_len(&image) + 1;
    if len > MAX_IMAGE_PATH {
        return Err(ResolveError::PathTooLong(target.to_os_string(), len, MAX_IMAGE_PATH));
    }
    Ok(image)
}

#[cfg(target_os = "windows")]
fn path_len(s: &OsStr) -> usize {
    use std::os::windows::ffi::OsStrExt;
    s.encode_wide().count()
}

#[cfg(not(target_os = "windows"))]
fn path_len(s: &OsStr) -> usize {
    s.len()
}
