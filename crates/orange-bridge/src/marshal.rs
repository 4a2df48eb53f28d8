//! String marshaling across the native boundary
//!
//! Outbound text becomes a `CString` owned by the caller for the duration of
//! the call. Inbound strings are wrapped in [`NativeString`], which copies
//! the bytes out and, when the provider transferred ownership, hands the
//! buffer back through `release` exactly once when the guard drops.

use crate::error::{Error, Result};
use crate::provider::{EntryPointProvider, StringOwnership};
use std::ffi::{CStr, CString, c_char};
use std::ptr::NonNull;

/// Convert managed text into a NUL-terminated native string
pub fn to_native(text: &str) -> Result<CString> {
    CString::new(text).map_err(|e| {
        Error::invalid_argument(format!(
            "statement contains a NUL byte at offset {}",
            e.nul_position()
        ))
    })
}

/// Scoped borrow of a string returned by the engine
pub struct NativeString<'p> {
    ptr: NonNull<c_char>,
    provider: &'p dyn EntryPointProvider,
}

impl<'p> NativeString<'p> {
    /// Take a string returned by `entry_point`.
    ///
    /// A null pointer means the engine produced no result at all, which is
    /// reported as an `EngineCallFailure`.
    ///
    /// # Safety
    ///
    /// `ptr` must be null or a NUL-terminated string returned by `provider`
    /// that nobody else will release.
    pub unsafe fn acquire(
        ptr: *const c_char,
        provider: &'p dyn EntryPointProvider,
        entry_point: &str,
    ) -> Result<Self> {
        let ptr = NonNull::new(ptr.cast_mut()).ok_or_else(|| {
            Error::engine_call(format!("`{}` returned a null pointer", entry_point))
        })?;
        Ok(Self { ptr, provider })
    }

    /// Copy the native bytes into a `String`, replacing invalid UTF-8
    pub fn to_text(&self) -> String {
        // SAFETY: `acquire` guarantees a live NUL-terminated buffer until drop.
        let bytes = unsafe { CStr::from_ptr(self.ptr.as_ptr()) };
        bytes.to_string_lossy().into_owned()
    }

    /// Copy the text out and release the buffer
    pub fn into_text(self) -> String {
        self.to_text()
    }
}

impl Drop for NativeString<'_> {
    fn drop(&mut self) {
        if self.provider.ownership() == StringOwnership::Transferred {
            // SAFETY: the guard is the sole owner and drops once.
            unsafe { self.provider.release_string(self.ptr.as_ptr()) };
        }
    }
}
