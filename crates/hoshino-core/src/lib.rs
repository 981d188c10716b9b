//! hoshino-core — shared configuration and error types.
//!
//! Everything that was ambient global state in earlier prototypes (adb binary
//! path, on-device dump paths, screen coordinates, wait policy) lives in an
//! explicit [`config::HoshinoConfig`] that is loaded once at process start
//! and passed into each component at construction.

pub mod config;
pub mod error;

pub use config::HoshinoConfig;
pub use error::{CoreError, Result};
