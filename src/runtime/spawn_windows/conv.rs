// SPDX-License-Identifier: MIT

//! Various type conversion routines.

use std::ffi::OsStr;
use std::os::windows::ffi::OsStrExt;

use windows::Win32::Foundation::{CloseHandle, HANDLE};
use windows_result::HRESULT;

/// Convert the OS string into a null-terminated wide (16-bit) C string.
pub fn as_c_str_w(s: &OsStr) -> Vec<u16> {
    s.encode_wide().chain(std::iter::once(0)).collect()
}

/// Convert the library error into an I/O error carrying the Win32 error code.
pub fn os_error(e: windows::core::Error) -> std::io::Error {
    std::io::Error::from_raw_os_error(win32_code(e.code()))
}

/// Win32 failures are reported as `HRESULT_FROM_WIN32(code)`; unwrap them.
fn win32_code(hr: HRESULT) -> i32 {
    let code = hr.0 as u32;
    if code & 0xFFFF_0000 == 0x8007_0000 {
        (code & 0xFFFF) as i32
    } else {
        hr.0
    }
}

/// A handle that is closed when dropped.
pub struct ScopedHandle(HANDLE);

impl ScopedHandle {
    pub fn new(handle: HANDLE) -> Self {
        Self(handle)
    }

    pub fn raw(&self) -> HANDLE {
        self.0
    }
}

impl Drop for ScopedHandle {
    fn drop(&mut self) {
        if !self.0.is_invalid() {
            let _ = unsafe { CloseHandle(self.0) };
        }
    }
}
