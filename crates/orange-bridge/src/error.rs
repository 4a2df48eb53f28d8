//! Error types for the Orange engine bridge

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using the bridge Error
pub type Result<T> = std::result::Result<T, Error>;

/// Failures raised while loading, initializing or calling the native engine
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Library file missing, incompatible, or rejected by the dynamic linker
    #[error("Failed to load native engine from {}: {reason}", path.display())]
    LoadFailure {
        /// Path that was handed to the loader
        path: PathBuf,
        /// Loader diagnostic
        reason: String,
    },

    /// A required entry point is not exported by the library
    #[error("Native engine does not export required entry point `{symbol}`")]
    SymbolNotFound {
        /// Name of the missing entry point
        symbol: String,
    },

    /// The engine's `setup` entry point failed
    #[error("Native engine initialization failed: {0}")]
    InitializationFailure(String),

    /// A call was attempted before `setup` completed, or after release
    #[error("Native engine is not initialized")]
    NotInitialized,

    /// Input rejected before it reached the engine
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The foreign call mechanism itself failed
    #[error("Native engine call failed: {0}")]
    EngineCallFailure(String),
}

impl Error {
    /// Create a load failure
    pub fn load_failure(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::LoadFailure {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a missing-symbol error
    pub fn symbol_not_found(symbol: impl Into<String>) -> Self {
        Self::SymbolNotFound {
            symbol: symbol.into(),
        }
    }

    /// Create an initialization failure
    pub fn initialization(msg: impl Into<String>) -> Self {
        Self::InitializationFailure(msg.into())
    }

    /// Create an invalid-argument error
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Create an engine call failure
    pub fn engine_call(msg: impl Into<String>) -> Self {
        Self::EngineCallFailure(msg.into())
    }

    /// Stable machine-readable name for the error kind
    pub fn kind(&self) -> &'static str {
        match self {
            Self::LoadFailure { .. } => "load_failure",
            Self::SymbolNotFound { .. } => "symbol_not_found",
            Self::InitializationFailure(_) => "initialization_failure",
            Self::NotInitialized => "not_initialized",
            Self::InvalidArgument(_) => "invalid_argument",
            Self::EngineCallFailure(_) => "engine_call_failure",
        }
    }
}
