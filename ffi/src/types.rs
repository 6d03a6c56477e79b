//! Types and string conversions for the FFI boundary.
//!
//! # Design
//! C callers only ever see `Smq` through a pointer. Strings cross the
//! boundary as NUL-terminated `char *`: borrowed on the way in, and on the
//! way out allocated by Rust and released by `smq_free_string`.

use std::borrow::Cow;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;

/// Opaque handle to a running `smq_core::Client`.
pub struct Smq {
    pub(crate) inner: smq_core::Client,
}

/// Borrow a C string, or `None` if the pointer is null.
///
/// Invalid UTF-8 is replaced rather than rejected so a message with a stray
/// byte is still delivered.
///
/// # Safety
/// `ptr` must be null or point to a NUL-terminated string that outlives the
/// returned value.
pub(crate) unsafe fn borrow_str<'a>(ptr: *const c_char) -> Option<Cow<'a, str>> {
    if ptr.is_null() {
        return None;
    }
    Some(unsafe { CStr::from_ptr(ptr) }.to_string_lossy())
}

/// Move a Rust string to the C heap. Interior NULs truncate the message.
pub(crate) fn into_c_string(s: String) -> *mut c_char {
    let bytes = match s.find('\0') {
        Some(end) => s[..end].to_string(),
        None => s,
    };
    CString::new(bytes)
        .map(CString::into_raw)
        .unwrap_or(std::ptr::null_mut())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_borrows_as_none() {
        assert!(unsafe { borrow_str(std::ptr::null()) }.is_none());
    }

    #[test]
    fn interior_nul_truncates() {
        let ptr = into_c_string("abc\0def".to_string());
        assert!(!ptr.is_null());
        let back = unsafe { CString::from_raw(ptr) };
        assert_eq!(back.to_str().unwrap(), "abc");
    }
}
