//! Test engine exporting the complete native contract
//!
//! Built as a shared library so the bridge tests can open it the same way
//! the service opens `dbms`. Every result is a fresh heap string handed to
//! the caller and freed through `release`. The `fixture_*` counters let a
//! test check the bridge's side of that contract.

use std::ffi::{CStr, CString, c_char};
use std::ptr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Text returned by `info`
pub const INFO_TEXT: &str = "Orange fixture engine 1.0";

static READY: AtomicBool = AtomicBool::new(false);
static SETUP_CALLS: AtomicUsize = AtomicUsize::new(0);
static HANDED_OUT: AtomicUsize = AtomicUsize::new(0);
static RELEASED: AtomicUsize = AtomicUsize::new(0);

fn hand_out(text: String) -> *const c_char {
    match CString::new(text) {
        Ok(text) => {
            HANDED_OUT.fetch_add(1, Ordering::SeqCst);
            text.into_raw()
        }
        Err(_) => ptr::null(),
    }
}

/// `void setup(void)`
#[unsafe(no_mangle)]
pub extern "C" fn setup() {
    SETUP_CALLS.fetch_add(1, Ordering::SeqCst);
    READY.store(true, Ordering::SeqCst);
}

/// `const char* exec(const char* sql)`: answers with the statement upper-cased.
///
/// Returns null before `setup` has run.
///
/// # Safety
///
/// `sql` must be null or point to a NUL-terminated string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn exec(sql: *const c_char) -> *const c_char {
    if sql.is_null() || !READY.load(Ordering::SeqCst) {
        return ptr::null();
    }
    let sql = unsafe { CStr::from_ptr(sql) }.to_string_lossy();
    hand_out(sql.to_uppercase())
}

/// `const char* info(void)`
#[unsafe(no_mangle)]
pub extern "C" fn info() -> *const c_char {
    hand_out(INFO_TEXT.to_string())
}

/// `void release(const char* ptr)`
///
/// # Safety
///
/// `ptr` must be null or a string returned by `exec`/`info` that has not
/// been released yet.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn release(ptr: *const c_char) {
    if ptr.is_null() {
        return;
    }
    drop(unsafe { CString::from_raw(ptr.cast_mut()) });
    RELEASED.fetch_add(1, Ordering::SeqCst);
}

/// Number of `setup` calls so far
#[unsafe(no_mangle)]
pub extern "C" fn fixture_setup_calls() -> usize {
    SETUP_CALLS.load(Ordering::SeqCst)
}

/// Number of strings handed out by `exec`/`info`
#[unsafe(no_mangle)]
pub extern "C" fn fixture_handed_out() -> usize {
    HANDED_OUT.load(Ordering::SeqCst)
}

/// Number of strings freed through `release`
#[unsafe(no_mangle)]
pub extern "C" fn fixture_released() -> usize {
    RELEASED.load(Ordering::SeqCst)
}
