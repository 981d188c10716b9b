use async_trait::async_trait;

use crate::error::Result;

/// Command-style interface to one attached device.
///
/// Implementations must be `Send + Sync` so a single channel can be shared
/// behind an `Arc` by the capturer and the injector. Every method is a
/// one-shot command: no connection state, no event stream back from the
/// device — the device never calls us.
#[async_trait]
pub trait DeviceChannel: Send + Sync {
    /// Dump the current UI hierarchy to `remote_path` on the device.
    async fn dump_ui_hierarchy(&self, remote_path: &str) -> Result<()>;

    /// Transfer `remote_path` from the device to `local_path`, overwriting.
    async fn pull_file(&self, remote_path: &str, local_path: &str) -> Result<()>;

    /// Read a device setting (e.g. `secure` / `default_input_method`).
    /// Returns stdout with surrounding whitespace trimmed.
    async fn get_setting(&self, namespace: &str, key: &str) -> Result<String>;

    /// Register an input method with the system.
    async fn enable_input_method(&self, id: &str) -> Result<()>;

    /// Make an input method the active one.
    async fn set_input_method(&self, id: &str) -> Result<()>;

    /// Send an app-level broadcast with one string extra and return raw
    /// stdout. Callers inspect stdout for the receiver's acknowledgment —
    /// a zero exit alone does not prove the receiving app handled it.
    async fn broadcast(&self, action: &str, extra_key: &str, extra_value: &str) -> Result<String>;

    /// Tap the screen at device pixel coordinates.
    async fn tap(&self, x: u32, y: u32) -> Result<()>;

    /// Inject a virtual keypress by Android keycode.
    async fn key_event(&self, code: u32) -> Result<()>;
}
