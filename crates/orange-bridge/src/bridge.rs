//! Query bridge: one statement round-trip through the native engine

use crate::engine::EngineHandle;
use crate::error::{Error, Result};
use crate::marshal::{self, NativeString};
use crate::provider::EntryPointProvider;
use parking_lot::Mutex;
use serde::Serialize;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

/// Result of one executed statement
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResult {
    /// Wall-clock time spent inside the native `exec` call
    pub elapsed_seconds: f64,
    /// Engine output, passed through verbatim
    pub result_text: String,
}

/// Engine status text
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InfoResult {
    /// Free-form engine description
    pub info_text: String,
}

/// Marshals statements into the engine and results back out
#[derive(Debug)]
pub struct Bridge {
    engine: Arc<EngineHandle>,
    /// Serializes native calls for engines that are not reentrant
    gate: Option<Mutex<()>>,
}

impl Bridge {
    /// Create a bridge over an engine handle
    pub fn new(engine: Arc<EngineHandle>, serialize_calls: bool) -> Self {
        Self {
            engine,
            gate: serialize_calls.then(|| Mutex::new(())),
        }
    }

    /// Underlying engine handle
    pub fn engine(&self) -> &Arc<EngineHandle> {
        &self.engine
    }

    /// Whether native calls go through the serialization gate
    pub fn is_serialized(&self) -> bool {
        self.gate.is_some()
    }

    /// Execute one statement
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` for a blank statement or one with a NUL byte
    /// - `NotInitialized` if the engine has not been set up
    /// - `EngineCallFailure` if the native call produced no result
    pub fn run_query(&self, sql: &str) -> Result<QueryResult> {
        if sql.trim().is_empty() {
            return Err(Error::invalid_argument("statement is empty"));
        }
        let native_sql = marshal::to_native(sql)?;

        let (result_text, elapsed) = self
            .engine
            .with_provider(|provider| {
                self.call_native("exec", || {
                    let start = Instant::now();
                    // SAFETY: `native_sql` is NUL-terminated and outlives the call.
                    let raw = unsafe { provider.exec(native_sql.as_ptr()) };
                    let elapsed = start.elapsed();
                    let text = copy_out(raw, provider, "exec")?;
                    Ok((text, elapsed))
                })
            })
            .and_then(|outcome| outcome)
            .inspect_err(|e| log_call_failure("exec", e))?;

        tracing::debug!(
            "Executed statement ({} bytes) in {:.3}ms, {} bytes of output",
            sql.len(),
            elapsed.as_secs_f64() * 1000.0,
            result_text.len()
        );

        Ok(QueryResult {
            elapsed_seconds: elapsed.as_secs_f64(),
            result_text,
        })
    }

    /// Fetch the engine's status text
    ///
    /// # Errors
    ///
    /// `NotInitialized` before setup; `EngineCallFailure` if `info` produced
    /// no result.
    pub fn fetch_info(&self) -> Result<InfoResult> {
        let info_text = self
            .engine
            .with_provider(|provider| {
                self.call_native("info", || {
                    // SAFETY: `with_provider` only runs on an initialized engine.
                    let raw = unsafe { provider.info() };
                    copy_out(raw, provider, "info")
                })
            })
            .and_then(|outcome| outcome)
            .inspect_err(|e| log_call_failure("info", e))?;

        Ok(InfoResult { info_text })
    }

    /// Run one native call site under the gate.
    ///
    /// A panic raised below this point is turned into `EngineCallFailure`
    /// instead of unwinding into the request handler.
    fn call_native<T>(&self, entry_point: &str, call: impl FnOnce() -> Result<T>) -> Result<T> {
        let _guard = self.gate.as_ref().map(|gate| gate.lock());
        panic::catch_unwind(AssertUnwindSafe(call)).unwrap_or_else(|payload| {
            Err(Error::engine_call(format!(
                "`{}` panicked: {}",
                entry_point,
                panic_message(payload.as_ref())
            )))
        })
    }
}

/// Copy a returned string and release it if ownership was transferred.
///
/// Runs inside the gate: a borrowed buffer is only valid until the engine's
/// next call, and `release` is itself a native call.
fn copy_out(
    raw: *const std::ffi::c_char,
    provider: &dyn EntryPointProvider,
    entry_point: &str,
) -> Result<String> {
    // SAFETY: `raw` was just returned by `provider` and is not shared.
    let native = unsafe { NativeString::acquire(raw, provider, entry_point) }?;
    Ok(native.into_text())
}

fn log_call_failure(entry_point: &str, err: &Error) {
    if let Error::EngineCallFailure(_) = err {
        tracing::error!("Native `{}` call failed: {}", entry_point, err);
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
