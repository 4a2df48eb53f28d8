//! Test engine exporting only `exec` and `info`
//!
//! Like the production engine, results live in one engine-owned buffer that
//! the next call overwrites. Callers copy them and never free them.

use std::ffi::{CStr, CString, c_char};
use std::ptr;
use std::sync::Mutex;

/// Text returned by `info`
pub const INFO_TEXT: &str = "Orange minimal fixture engine";

static BUFFER: Mutex<Option<CString>> = Mutex::new(None);

fn store(text: String) -> *const c_char {
    let Ok(text) = CString::new(text) else {
        return ptr::null();
    };
    let mut buffer = BUFFER.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    buffer.insert(text).as_ptr()
}

/// `const char* exec(const char* sql)`: answers `ok: <statement>`.
///
/// # Safety
///
/// `sql` must be null or point to a NUL-terminated string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn exec(sql: *const c_char) -> *const c_char {
    if sql.is_null() {
        return ptr::null();
    }
    let sql = unsafe { CStr::from_ptr(sql) }.to_string_lossy();
    store(format!("ok: {}", sql))
}

/// `const char* info(void)`
#[unsafe(no_mangle)]
pub extern "C" fn info() -> *const c_char {
    store(INFO_TEXT.to_string())
}
