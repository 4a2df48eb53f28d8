//! Stub engine speaking the native string contract

use crate::error::{Error, Result};
use crate::provider::{EntryPointProvider, StringOwnership};
use parking_lot::Mutex;
use std::ffi::{CStr, CString, c_char};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicIsize, AtomicUsize, Ordering};

type ExecHook = dyn Fn(&[u8]) -> Option<Vec<u8>> + Send + Sync;
type InfoHook = dyn Fn() -> Vec<u8> + Send + Sync;

/// How the stub hands strings back
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StubOwnership {
    /// Fresh heap string per call, freed through `release`
    Transferred,
    /// One engine-owned buffer overwritten by every call
    Borrowed,
}

/// Call counters shared between a stub and its providers
#[derive(Debug, Default)]
pub struct StubCalls {
    setup: AtomicUsize,
    exec: AtomicUsize,
    info: AtomicUsize,
    release: AtomicUsize,
    outstanding: AtomicIsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    arguments: Mutex<Vec<String>>,
}

impl StubCalls {
    /// Number of `setup` calls
    pub fn setup_count(&self) -> usize {
        self.setup.load(Ordering::SeqCst)
    }

    /// Number of `exec` calls
    pub fn exec_count(&self) -> usize {
        self.exec.load(Ordering::SeqCst)
    }

    /// Number of `info` calls
    pub fn info_count(&self) -> usize {
        self.info.load(Ordering::SeqCst)
    }

    /// Number of strings handed back through `release`
    pub fn release_count(&self) -> usize {
        self.release.load(Ordering::SeqCst)
    }

    /// Transferred strings not yet released
    pub fn outstanding(&self) -> isize {
        self.outstanding.load(Ordering::SeqCst)
    }

    /// Highest number of `exec`/`info`/`release` calls observed running at once
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Statements received by `exec`, in arrival order
    pub fn arguments(&self) -> Vec<String> {
        self.arguments.lock().clone()
    }

    fn enter(&self) -> InFlight<'_> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        InFlight(self)
    }
}

struct InFlight<'a>(&'a StubCalls);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Scriptable engine double
#[derive(Clone)]
pub struct StubEngine {
    exec: Arc<ExecHook>,
    info: Arc<InfoHook>,
    ownership: StubOwnership,
    has_setup: bool,
    setup_failure: Option<String>,
    calls: Arc<StubCalls>,
}

impl StubEngine {
    /// Build a stub from `exec` and `info` behavior.
    ///
    /// `exec` receives the statement bytes; returning `None` makes the
    /// entry point return a null pointer.
    pub fn new(
        exec: impl Fn(&[u8]) -> Option<Vec<u8>> + Send + Sync + 'static,
        info: impl Fn() -> Vec<u8> + Send + Sync + 'static,
    ) -> Self {
        Self {
            exec: Arc::new(exec),
            info: Arc::new(info),
            ownership: StubOwnership::Transferred,
            has_setup: true,
            setup_failure: None,
            calls: Arc::new(StubCalls::default()),
        }
    }

    /// Engine that answers every statement with the statement itself
    pub fn echo() -> Self {
        Self::new(|sql| Some(sql.to_vec()), || b"orange stub engine".to_vec())
    }

    /// Choose how result strings are handed back
    pub fn with_ownership(mut self, ownership: StubOwnership) -> Self {
        self.ownership = ownership;
        self
    }

    /// Make `setup` fail with `reason`
    pub fn with_failing_setup(mut self, reason: impl Into<String>) -> Self {
        self.setup_failure = Some(reason.into());
        self
    }

    /// Pretend the engine exports no `setup` entry point
    pub fn without_setup(mut self) -> Self {
        self.has_setup = false;
        self
    }

    /// Shared call counters
    pub fn calls(&self) -> &Arc<StubCalls> {
        &self.calls
    }

    /// Provider to hand to an `EngineHandle`
    pub fn provider(&self) -> StubProvider {
        StubProvider {
            engine: self.clone(),
            buffer: Mutex::new(CString::default()),
        }
    }
}

impl fmt::Debug for StubEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StubEngine")
            .field("ownership", &self.ownership)
            .field("has_setup", &self.has_setup)
            .field("calls", &self.calls)
            .finish_non_exhaustive()
    }
}

/// Entry-point provider backed by a [`StubEngine`]
#[derive(Debug)]
pub struct StubProvider {
    engine: StubEngine,
    // Result buffer for `StubOwnership::Borrowed`.
    buffer: Mutex<CString>,
}

impl StubProvider {
    fn hand_out(&self, mut bytes: Vec<u8>) -> *const c_char {
        // A C string ends at its first NUL.
        if let Some(end) = bytes.iter().position(|&b| b == 0) {
            bytes.truncate(end);
        }
        let text = CString::new(bytes).unwrap_or_default();

        match self.engine.ownership {
            StubOwnership::Transferred => {
                self.engine.calls.outstanding.fetch_add(1, Ordering::SeqCst);
                text.into_raw()
            }
            StubOwnership::Borrowed => {
                let mut buffer = self.buffer.lock();
                *buffer = text;
                buffer.as_ptr()
            }
        }
    }
}

impl EntryPointProvider for StubProvider {
    fn describe(&self) -> String {
        "stub".to_string()
    }

    fn has_setup(&self) -> bool {
        self.engine.has_setup
    }

    fn ownership(&self) -> StringOwnership {
        match self.engine.ownership {
            StubOwnership::Transferred => StringOwnership::Transferred,
            StubOwnership::Borrowed => StringOwnership::Borrowed,
        }
    }

    unsafe fn setup(&self) -> Result<()> {
        self.engine.calls.setup.fetch_add(1, Ordering::SeqCst);
        match &self.engine.setup_failure {
            Some(reason) => Err(Error::initialization(reason.clone())),
            None => Ok(()),
        }
    }

    unsafe fn exec(&self, sql: *const c_char) -> *const c_char {
        let calls = &self.engine.calls;
        let _in_flight = calls.enter();
        calls.exec.fetch_add(1, Ordering::SeqCst);

        let sql = unsafe { CStr::from_ptr(sql) }.to_bytes().to_vec();
        calls
            .arguments
            .lock()
            .push(String::from_utf8_lossy(&sql).into_owned());

        match (self.engine.exec)(&sql) {
            Some(output) => self.hand_out(output),
            None => std::ptr::null(),
        }
    }

    unsafe fn info(&self) -> *const c_char {
        let calls = &self.engine.calls;
        let _in_flight = calls.enter();
        calls.info.fetch_add(1, Ordering::SeqCst);
        self.hand_out((self.engine.info)())
    }

    unsafe fn release_string(&self, ptr: *const c_char) {
        if self.engine.ownership != StubOwnership::Transferred {
            return;
        }
        let _in_flight = self.engine.calls.enter();
        drop(unsafe { CString::from_raw(ptr.cast_mut()) });
        self.engine.calls.release.fetch_add(1, Ordering::SeqCst);
        self.engine.calls.outstanding.fetch_sub(1, Ordering::SeqCst);
    }
}
