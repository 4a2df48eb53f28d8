//! REST API handlers

pub mod error;
pub mod exec;
pub mod health;
pub mod info;

pub use error::ApiError;
