// SPDX-License-Identifier: MIT

//! Process/Thread Attribute List.
//! Because much of windows requires explicit add/remove actions,
//! wrapping it in a single struct that implements Drop will make code maintenance easier.

use windows::Win32::{
    Foundation::{ERROR_INSUFFICIENT_BUFFER, GetLastError, HANDLE},
    System::Threading,
};

use super::conv::os_error;

pub trait ThreadAttribute {
    fn lp_value(&self) -> *const core::ffi::c_void;
    fn attribute(&self) -> usize;
    fn cb_size(&self) -> usize;
}

/// The only handles the child may inherit.
pub type ThreadAttributeHandles = Vec<HANDLE>;

impl ThreadAttribute for ThreadAttributeHandles {
    fn lp_value(&self) -> *const core::ffi::c_void {
        self.as_ptr() as *const core::ffi::c_void
    }

    fn attribute(&self) -> usize {
        Threading::PROC_THREAD_ATTRIBUTE_HANDLE_LIST as usize
    }

    fn cb_size(&self) -> usize {
        self.len() * std::mem::size_of::<HANDLE>()
    }
}

pub struct ThreadAttributeList {
    // The list stores pointers to the attribute values, not copies,
    // so the values must live as long as the list.
    _attributes: Vec<Box<dyn ThreadAttribute>>,
    // Backing memory for the opaque list; usize keeps it pointer aligned.
    _attr_buf: Vec<usize>,
    attr_list: Threading::LPPROC_THREAD_ATTRIBUTE_LIST,
}

impl ThreadAttributeList {
    pub fn new(attributes: Vec<Box<dyn ThreadAttribute>>) -> std::io::Result<Self> {
        let count = attributes.len() as u32;
        unsafe {
            // Get the expected size.
            // With no buffer, this fails with an insufficient buffer error and
            // reports the size it needs.
            let mut attr_size: usize = 0;
            if let Err(e) = Threading::InitializeProcThreadAttributeList(
                None,           // query buffer size
                count,          // number of attributes to set
                Some(0),        // must be 0
                &mut attr_size, // output required size in bytes
            ) {
                if GetLastError() != ERROR_INSUFFICIENT_BUFFER {
                    return Err(os_error(e));
                }
            }

            let word = std::mem::size_of::<usize>();
            let mut attr_buf = vec![0usize; attr_size.div_ceil(word)];
            let attr_list = Threading::LPPROC_THREAD_ATTRIBUTE_LIST(attr_buf.as_mut_ptr().cast::<_>());
            Threading::InitializeProcThreadAttributeList(
                Some(attr_list), // allocated buffer
                count,           // matches number of attributes to set
                Some(0),         // must be 0
                &mut attr_size,  // the computed size from the previous call
            )
            .map_err(os_error)?;

            // From here on the list is initialized, so Drop must delete it.
            let ret = Self { _attributes: attributes, _attr_buf: attr_buf, attr_list };

            for attr in &ret._attributes {
                Threading::UpdateProcThreadAttribute(
                    ret.attr_list,
                    0, // dwFlags must be 0
                    attr.attribute(),
                    Some(attr.lp_value()),
                    attr.cb_size(),
                    None, // don't care about the previous value of this attribute.
                    None, // don't care about the size of the not-returned previous value.
                )
                .map_err(os_error)?;
            }

            Ok(ret)
        }
    }

    /// Restrict inheritance to exactly the listed handles.
    pub fn handle_list(handles: ThreadAttributeHandles) -> std::io::Result<Self> {
        Self::new(vec![Box::new(handles)])
    }

    pub fn list(&self) -> Threading::LPPROC_THREAD_ATTRIBUTE_LIST {
        self.attr_list
    }
}

impl Drop for ThreadAttributeList {
    fn drop(&mut self) {
        unsafe { Threading::DeleteProcThreadAttributeList(self.attr_list) };
    }
}
