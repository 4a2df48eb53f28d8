//! Engine handle: lifecycle of the loaded native library
//!
//! ```text
//! load()     setup()        release()
//! ──────► Loaded ──────► Initialized ──────► Released
//!            │
//!            └──────► Failed   (setup reported an error)
//! ```
//!
//! A process loads the engine through [`EngineHandle::load`] at most once,
//! even after that handle has been released.
//!
//! Native calls take the handle's read lock, so any number of them can run
//! at once. `setup` and `release` take the write lock: release waits for
//! in-flight calls to drain before the library is unloaded.

use crate::config::{EngineConfig, ProviderKind};
use crate::error::{Error, Result};
use crate::provider::{DynamicProvider, EntryPointProvider};
use parking_lot::RwLock;
use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

/// Claimed by the first successful [`EngineHandle::load`]; never cleared
static PROCESS_ENGINE: AtomicBool = AtomicBool::new(false);

/// Lifecycle state of an engine handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineState {
    /// No library bound
    Unloaded,
    /// Library bound, `setup` not yet run
    Loaded,
    /// Ready to serve calls
    Initialized,
    /// `setup` failed; the engine will never serve calls
    Failed,
    /// Library unloaded at shutdown
    Released,
}

impl fmt::Display for EngineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Unloaded => "unloaded",
            Self::Loaded => "loaded",
            Self::Initialized => "initialized",
            Self::Failed => "failed",
            Self::Released => "released",
        };
        f.write_str(s)
    }
}

struct Slot {
    state: EngineState,
    provider: Option<Box<dyn EntryPointProvider>>,
}

/// Owner of the loaded native engine
pub struct EngineHandle {
    slot: RwLock<Slot>,
    description: String,
}

impl EngineHandle {
    /// Load the engine described by `config`.
    ///
    /// Succeeds at most once per process. A load that fails does not use
    /// up the process's one load.
    ///
    /// # Errors
    ///
    /// `LoadFailure` if the library cannot be loaded or an engine was
    /// already loaded in this process; `SymbolNotFound` if a required entry
    /// point is missing.
    pub fn load(config: &EngineConfig) -> Result<Self> {
        let path = config.resolved_path();
        if PROCESS_ENGINE.load(Ordering::Acquire) {
            return Err(already_loaded(path));
        }

        let provider: Box<dyn EntryPointProvider> = match config.provider {
            ProviderKind::Dynamic => Box::new(DynamicProvider::open(&path)?),
            ProviderKind::Static => linked_provider(&path)?,
        };

        // Two racing loads may both open the library; only one claims it.
        if PROCESS_ENGINE
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(already_loaded(path));
        }

        let handle = Self::from_provider(provider);
        tracing::info!("Loaded native engine ({})", handle.description);
        Ok(handle)
    }

    /// Wrap an already constructed provider. The handle starts `Loaded`.
    pub fn from_provider(provider: Box<dyn EntryPointProvider>) -> Self {
        let description = provider.describe();
        Self {
            slot: RwLock::new(Slot {
                state: EngineState::Loaded,
                provider: Some(provider),
            }),
            description,
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> EngineState {
        self.slot.read().state
    }

    /// Provider description
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Run the engine's one-time initialization.
    ///
    /// Runs the native `setup` at most once. Later calls on an initialized
    /// handle return immediately; later calls after a failed setup fail
    /// again without entering the engine.
    ///
    /// # Errors
    ///
    /// `InitializationFailure` if `setup` fails, failed before, or the
    /// handle was released.
    pub fn setup(&self) -> Result<()> {
        let mut slot = self.slot.write();
        match slot.state {
            EngineState::Initialized => return Ok(()),
            EngineState::Loaded => {}
            EngineState::Failed => {
                return Err(Error::initialization("engine setup already failed"));
            }
            state => {
                return Err(Error::initialization(format!(
                    "cannot set up an engine in state '{}'",
                    state
                )));
            }
        }

        let provider = slot
            .provider
            .as_deref()
            .ok_or_else(|| Error::initialization("no provider bound"))?;

        if provider.has_setup() {
            // SAFETY: guarded by the write lock and the state check above, so
            // this runs once and before any exec/info call.
            let outcome = unsafe { provider.setup() }.map_err(|e| match e {
                Error::InitializationFailure(_) => e,
                other => Error::initialization(other.to_string()),
            });
            if let Err(e) = outcome {
                slot.state = EngineState::Failed;
                tracing::error!("Native engine setup failed: {}", e);
                return Err(e);
            }
            tracing::info!("Native engine setup completed");
        } else {
            tracing::debug!("Native engine exports no setup entry point");
        }

        slot.state = EngineState::Initialized;
        Ok(())
    }

    /// Unload the engine once in-flight calls have drained.
    ///
    /// Releasing twice is a no-op. The process still counts as having
    /// loaded its engine afterwards.
    pub fn release(&self) {
        let mut slot = self.slot.write();
        if let Some(provider) = slot.provider.take() {
            drop(provider);
            tracing::info!("Released native engine ({})", self.description);
        }
        slot.state = EngineState::Released;
    }

    /// Run `f` against the provider of an initialized engine.
    ///
    /// # Errors
    ///
    /// `NotInitialized` unless the handle is `Initialized`.
    pub fn with_provider<R>(&self, f: impl FnOnce(&dyn EntryPointProvider) -> R) -> Result<R> {
        let slot = self.slot.read();
        match (slot.state, slot.provider.as_deref()) {
            (EngineState::Initialized, Some(provider)) => Ok(f(provider)),
            _ => Err(Error::NotInitialized),
        }
    }
}

impl Drop for EngineHandle {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for EngineHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineHandle")
            .field("description", &self.description)
            .field("state", &self.state())
            .finish()
    }
}

fn already_loaded(path: std::path::PathBuf) -> Error {
    Error::load_failure(path, "an engine is already loaded in this process")
}

#[cfg(feature = "static-engine")]
fn linked_provider(_path: &std::path::Path) -> Result<Box<dyn EntryPointProvider>> {
    Ok(Box::new(crate::provider::StaticProvider::linked()))
}

#[cfg(not(feature = "static-engine"))]
fn linked_provider(path: &std::path::Path) -> Result<Box<dyn EntryPointProvider>> {
    Err(Error::load_failure(
        path,
        "static provider requested but orange-bridge was built without the `static-engine` feature",
    ))
}
