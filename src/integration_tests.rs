//! Integration test code.
//!
//! This launches real programs through the native platform and checks what
//! the child observed.

mod executables;
pub(crate) mod util;
