use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_BIND: &str = "0.0.0.0";
pub const DEFAULT_MODEL: &str = "hoshino-agent";

/// Top-level config (hoshino.toml + HOSHINO_* env overrides).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HoshinoConfig {
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub device: DeviceConfig,
    #[serde(default)]
    pub bridge: BridgeConfig,
}

impl Default for HoshinoConfig {
    fn default() -> Self {
        Self {
            gateway: GatewayConfig::default(),
            device: DeviceConfig::default(),
            bridge: BridgeConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Model id reported on /v1/models and echoed in completions.
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default)]
    pub auth: AuthConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            bind: DEFAULT_BIND.to_string(),
            model: DEFAULT_MODEL.to_string(),
            auth: AuthConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// When true, /v1/* routes require `Authorization: Bearer <key>`.
    /// The key itself is generated and persisted on first start regardless.
    #[serde(default)]
    pub require_api_key: bool,
    /// Where the generated API key is persisted.
    #[serde(default = "default_key_file")]
    pub key_file: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            require_api_key: false,
            key_file: default_key_file(),
        }
    }
}

/// Everything needed to drive one attached Android device over adb.
///
/// Coordinates are static per-device configuration, not discovered at
/// runtime. `/debug/structure` exists to help pick them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// adb binary; resolved via PATH when not absolute.
    #[serde(default = "default_adb_path")]
    pub adb_path: String,
    /// Per-command timeout. Commands that outlive it are killed.
    #[serde(default = "default_command_timeout_secs")]
    pub command_timeout_secs: u64,
    /// On-device path `uiautomator dump` writes to.
    #[serde(default = "default_remote_dump_path")]
    pub remote_dump_path: String,
    /// Local path the dump is pulled to, overwritten on every capture.
    #[serde(default = "default_local_dump_path")]
    pub local_dump_path: String,
    /// IME that accepts Base64 text broadcasts.
    #[serde(default = "default_input_method")]
    pub input_method: String,
    /// Tap target that focuses the conversation input box.
    #[serde(default = "default_input_box")]
    pub input_box: Point,
    /// Fallback send button, used when the commit keypress fails.
    #[serde(default = "default_send_button")]
    pub send_button: Point,
    /// Android keycode for the commit keypress (66 = KEYCODE_ENTER).
    #[serde(default = "default_enter_key_code")]
    pub enter_key_code: u32,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            adb_path: default_adb_path(),
            command_timeout_secs: default_command_timeout_secs(),
            remote_dump_path: default_remote_dump_path(),
            local_dump_path: default_local_dump_path(),
            input_method: default_input_method(),
            input_box: default_input_box(),
            send_button: default_send_button(),
            enter_key_code: default_enter_key_code(),
        }
    }
}

/// A screen coordinate in device pixels.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Point {
    pub x: u32,
    pub y: u32,
}

/// Wait policy for one send → reply cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Delay between injection and the first snapshot attempt.
    #[serde(default = "default_initial_wait_ms")]
    pub initial_wait_ms: u64,
    /// Delay between snapshot attempts after the first.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Total budget for the wait phase, measured from the end of injection.
    /// Exhausted budget surfaces as "no reply observed".
    #[serde(default = "default_reply_deadline_ms")]
    pub reply_deadline_ms: u64,
    /// Settle delay between the focus tap and the text broadcast.
    #[serde(default = "default_focus_settle_ms")]
    pub focus_settle_ms: u64,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            initial_wait_ms: default_initial_wait_ms(),
            poll_interval_ms: default_poll_interval_ms(),
            reply_deadline_ms: default_reply_deadline_ms(),
            focus_settle_ms: default_focus_settle_ms(),
        }
    }
}

fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}
fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}
fn default_key_file() -> String {
    "api_key.txt".to_string()
}
fn default_adb_path() -> String {
    "adb".to_string()
}
fn default_command_timeout_secs() -> u64 {
    20
}
fn default_remote_dump_path() -> String {
    "/sdcard/ui_dump.xml".to_string()
}
fn default_local_dump_path() -> String {
    "ui_dump.xml".to_string()
}
fn default_input_method() -> String {
    "com.android.adbkeyboard/.AdbIME".to_string()
}
fn default_input_box() -> Point {
    Point { x: 500, y: 1000 }
}
fn default_send_button() -> Point {
    Point { x: 800, y: 1200 }
}
fn default_enter_key_code() -> u32 {
    66
}
fn default_initial_wait_ms() -> u64 {
    3_000
}
fn default_poll_interval_ms() -> u64 {
    1_000
}
fn default_reply_deadline_ms() -> u64 {
    10_000
}
fn default_focus_settle_ms() -> u64 {
    500
}

impl HoshinoConfig {
    /// Load config from a TOML file with HOSHINO_* env var overrides.
    ///
    /// Checks in order:
    ///   1. Explicit path argument
    ///   2. ~/.hoshino/hoshino.toml
    pub fn load(config_path: Option<&str>) -> crate::error::Result<Self> {
        let path = config_path
            .map(String::from)
            .unwrap_or_else(default_config_path);

        let config: HoshinoConfig = Figment::new()
            .merge(Toml::file(&path))
            .merge(Env::prefixed("HOSHINO_").split("_"))
            .extract()
            .map_err(|e| crate::error::CoreError::Config(e.to_string()))?;

        Ok(config)
    }
}

fn default_config_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.hoshino/hoshino.toml", home)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_known_device_layout() {
        let cfg = HoshinoConfig::default();
        assert_eq!(cfg.gateway.port, 5000);
        assert_eq!(cfg.device.input_method, "com.android.adbkeyboard/.AdbIME");
        assert_eq!(cfg.device.input_box.x, 500);
        assert_eq!(cfg.device.send_button.y, 1200);
        assert_eq!(cfg.device.enter_key_code, 66);
        assert_eq!(cfg.bridge.initial_wait_ms, 3_000);
    }

    #[test]
    fn missing_file_yields_defaults() {
        let cfg = HoshinoConfig::load(Some("/nonexistent/hoshino.toml"))
            .expect("figment treats a missing TOML file as empty");
        assert_eq!(cfg.gateway.bind, "0.0.0.0");
        assert!(!cfg.gateway.auth.require_api_key);
    }
}
