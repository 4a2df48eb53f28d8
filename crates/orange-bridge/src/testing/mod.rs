//! Testing infrastructure for the engine bridge
//!
//! Provides an in-process stand-in for the native engine so bridge and
//! server tests run without a compiled `dbms` library.
//!
//! # Usage
//!
//! ```rust,no_run
//! use orange_bridge::testing::StubEngine;
//! use orange_bridge::{Bridge, EngineHandle};
//! use std::sync::Arc;
//!
//! let stub = StubEngine::echo();
//! let engine = Arc::new(EngineHandle::from_provider(Box::new(stub.provider())));
//! engine.setup().unwrap();
//! let bridge = Bridge::new(engine, true);
//! assert_eq!(bridge.run_query("select 1").unwrap().result_text, "select 1");
//! assert_eq!(stub.calls().exec_count(), 1);
//! ```

mod stub;

pub use stub::{StubCalls, StubEngine, StubOwnership, StubProvider};
