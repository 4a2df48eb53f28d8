//! Orange Bridge - native engine bridge for the Orange DBMS
//!
//! Loads the natively compiled `dbms` library once, forwards SQL statements
//! into it across the C boundary and returns the engine's text output with
//! the time spent in the call.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                  Bridge                     │
//! │   (validation, marshaling, timing, gate)    │
//! └──────────────┬──────────────────────────────┘
//!                │
//! ┌──────────────┴──────────────────────────────┐
//! │               EngineHandle                  │
//! │   (Loaded → Initialized → Released)         │
//! └──────────────┬──────────────────────────────┘
//!                │
//! ┌──────────────┴──────────────────────────────┐
//! │            EntryPointProvider               │
//! │     DynamicProvider  │  StaticProvider      │
//! └─────────────────────────────────────────────┘
//! ```

#![deny(missing_docs)]
#![warn(clippy::all)]

pub mod bridge;
pub mod config;
pub mod engine;
pub mod error;
pub mod library;
pub mod marshal;
pub mod provider;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use bridge::{Bridge, InfoResult, QueryResult};
pub use config::{EngineConfig, ProviderKind};
pub use engine::{EngineHandle, EngineState};
pub use error::{Error, Result};
pub use provider::{DynamicProvider, EntryPointProvider, EntryPoints, StaticProvider, StringOwnership};
