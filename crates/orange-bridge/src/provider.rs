//! Entry-point providers
//!
//! A provider hands the bridge the engine's C entry points. Two bindings
//! exist:
//!
//! - [`DynamicProvider`] opens the library at runtime and resolves the
//!   symbols by name, so the engine binary can be swapped without rebuilding
//!   the service.
//! - [`StaticProvider`] carries entry points fixed at compile time. With the
//!   `static-engine` feature, [`StaticProvider::linked`] binds the symbols
//!   exported by a `dbms` library linked into the binary.
//!
//! Native contract:
//!
//! ```text
//! void        setup(void);              // optional
//! const char* exec(const char* sql);
//! const char* info(void);
//! void        release(const char* ptr); // optional, frees exec/info results
//! ```

use crate::error::{Error, Result};
use crate::library;
use libloading::{Library, Symbol};
use std::ffi::c_char;
use std::fmt::Debug;
use std::path::{Path, PathBuf};

/// `void setup(void)`
pub type SetupFn = unsafe extern "C" fn();
/// `const char* exec(const char* sql)`
pub type ExecFn = unsafe extern "C" fn(*const c_char) -> *const c_char;
/// `const char* info(void)`
pub type InfoFn = unsafe extern "C" fn() -> *const c_char;
/// `void release(const char* ptr)`
pub type ReleaseFn = unsafe extern "C" fn(*const c_char);

/// Who owns a string returned by `exec` or `info`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringOwnership {
    /// The engine keeps the buffer; the caller copies it and must not free it
    Borrowed,
    /// The caller receives the buffer and frees it through `release`
    Transferred,
}

/// Resolved engine entry points
#[derive(Debug, Clone, Copy)]
pub struct EntryPoints {
    /// One-time initialization, absent in engines that need none
    pub setup: Option<SetupFn>,
    /// Statement execution
    pub exec: ExecFn,
    /// Engine status text
    pub info: InfoFn,
    /// Frees strings returned by `exec`/`info`
    pub release: Option<ReleaseFn>,
}

impl EntryPoints {
    /// Ownership of returned strings implied by the exported entry points
    pub fn ownership(&self) -> StringOwnership {
        if self.release.is_some() {
            StringOwnership::Transferred
        } else {
            StringOwnership::Borrowed
        }
    }
}

/// Source of the native entry points the bridge calls into.
///
/// Implementations must be callable from several threads; serialization of
/// non-reentrant engines happens in the bridge, not here.
pub trait EntryPointProvider: Send + Sync + Debug {
    /// Human readable origin, used in logs and health output
    fn describe(&self) -> String;

    /// Whether the engine exports `setup`
    fn has_setup(&self) -> bool;

    /// Ownership of strings returned by `exec` and `info`
    fn ownership(&self) -> StringOwnership;

    /// Run the engine's one-time initialization.
    ///
    /// # Safety
    ///
    /// Must be called at most once, before any `exec`/`info` call.
    unsafe fn setup(&self) -> Result<()>;

    /// Execute one statement.
    ///
    /// # Safety
    ///
    /// `sql` must point to a NUL-terminated string that outlives the call.
    unsafe fn exec(&self, sql: *const c_char) -> *const c_char;

    /// Fetch the engine status string.
    ///
    /// # Safety
    ///
    /// The engine must have been set up.
    unsafe fn info(&self) -> *const c_char;

    /// Free a string previously returned by `exec` or `info`.
    ///
    /// # Safety
    ///
    /// `ptr` must come from this provider, must not be used afterwards, and
    /// must be released exactly once. No-op for borrowed strings.
    unsafe fn release_string(&self, ptr: *const c_char);
}

/// Shared call path for providers backed by raw C function pointers
macro_rules! forward_entry_points {
    () => {
        fn has_setup(&self) -> bool {
            self.entry_points.setup.is_some()
        }

        fn ownership(&self) -> StringOwnership {
            self.entry_points.ownership()
        }

        unsafe fn setup(&self) -> Result<()> {
            if let Some(setup) = self.entry_points.setup {
                unsafe { setup() };
            }
            Ok(())
        }

        unsafe fn exec(&self, sql: *const c_char) -> *const c_char {
            unsafe { (self.entry_points.exec)(sql) }
        }

        unsafe fn info(&self) -> *const c_char {
            unsafe { (self.entry_points.info)() }
        }

        unsafe fn release_string(&self, ptr: *const c_char) {
            if let Some(release) = self.entry_points.release {
                unsafe { release(ptr) };
            }
        }
    };
}

/// Entry points resolved from a library opened at runtime
#[derive(Debug)]
pub struct DynamicProvider {
    entry_points: EntryPoints,
    path: PathBuf,
    // Keeps the function pointers above valid; unloaded on drop.
    _library: Library,
}

impl DynamicProvider {
    /// Open the library at `path` and resolve its entry points
    ///
    /// # Errors
    ///
    /// `LoadFailure` if the file is missing or the dynamic linker rejects
    /// it; `SymbolNotFound` if `exec` or `info` is not exported.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        library::check_exists(path)?;

        // SAFETY: loading runs the library's static initializers. The engine
        // library is part of the deployment and trusted.
        let library = unsafe { Library::new(path) }
            .map_err(|e| Error::load_failure(path, e.to_string()))?;

        // SAFETY: the symbol types match the native contract documented above.
        let entry_points = unsafe {
            EntryPoints {
                exec: required::<ExecFn>(&library, "exec")?,
                info: required::<InfoFn>(&library, "info")?,
                setup: optional::<SetupFn>(&library, "setup"),
                release: optional::<ReleaseFn>(&library, "release"),
            }
        };

        tracing::debug!(
            "Resolved engine entry points from {} (setup: {}, release: {})",
            path.display(),
            entry_points.setup.is_some(),
            entry_points.release.is_some()
        );

        Ok(Self {
            entry_points,
            path: path.to_path_buf(),
            _library: library,
        })
    }
}

impl EntryPointProvider for DynamicProvider {
    fn describe(&self) -> String {
        format!("dynamic:{}", self.path.display())
    }

    forward_entry_points!();
}

unsafe fn required<T: Copy>(library: &Library, name: &str) -> Result<T> {
    let symbol: Symbol<'_, T> =
        unsafe { library.get(name.as_bytes()) }.map_err(|_| Error::symbol_not_found(name))?;
    Ok(*symbol)
}

unsafe fn optional<T: Copy>(library: &Library, name: &str) -> Option<T> {
    unsafe { library.get::<T>(name.as_bytes()) }
        .ok()
        .map(|symbol| *symbol)
}

/// Entry points fixed at compile time
#[derive(Debug, Clone)]
pub struct StaticProvider {
    label: String,
    entry_points: EntryPoints,
}

impl StaticProvider {
    /// Wrap entry points known at compile time
    pub fn new(label: impl Into<String>, entry_points: EntryPoints) -> Self {
        Self {
            label: label.into(),
            entry_points,
        }
    }

    /// Bind the entry points of the `dbms` library linked into this binary.
    ///
    /// Static linking cannot express an optional symbol, so the linked
    /// library must export `setup` as well.
    #[cfg(feature = "static-engine")]
    pub fn linked() -> Self {
        Self::new(
            "dbms",
            EntryPoints {
                setup: Some(linked::setup),
                exec: linked::exec,
                info: linked::info,
                release: None,
            },
        )
    }
}

impl EntryPointProvider for StaticProvider {
    fn describe(&self) -> String {
        format!("static:{}", self.label)
    }

    forward_entry_points!();
}

#[cfg(feature = "static-engine")]
mod linked {
    use std::ffi::c_char;

    #[link(name = "dbms")]
    unsafe extern "C" {
        pub fn setup();
        pub fn exec(sql: *const c_char) -> *const c_char;
        pub fn info() -> *const c_char;
    }
}
