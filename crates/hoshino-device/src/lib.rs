//! hoshino-device — the command channel to one attached Android device.
//!
//! The [`DeviceChannel`] trait is the seam between the bridge logic and the
//! physical device: production code uses [`AdbChannel`] (spawns the `adb`
//! binary), tests substitute a scripted double. Nothing above this crate
//! shells out directly.

pub mod adb;
pub mod channel;
pub mod error;

pub use adb::AdbChannel;
pub use channel::DeviceChannel;
pub use error::{DeviceError, Result};
