//! Error types for the hoshino-device crate.

use thiserror::Error;

/// All errors that can originate from device commands.
///
/// These never cross the bridge boundary as panics — callers absorb them
/// into boolean/optional outcomes.
#[derive(Debug, Error)]
pub enum DeviceError {
    /// The adb binary could not be spawned.
    #[error("adb spawn error: {0}")]
    Spawn(String),

    /// The command ran but exited non-zero.
    #[error("adb command failed (exit {code}): {stderr}")]
    CommandFailed { code: i32, stderr: String },

    /// The command exceeded the configured per-command timeout.
    #[error("adb command timed out after {ms}ms")]
    Timeout { ms: u64 },

    /// Underlying I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout this crate.
pub type Result<T> = std::result::Result<T, DeviceError>;
