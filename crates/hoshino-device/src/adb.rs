//! `AdbChannel` — the production [`DeviceChannel`] backed by the `adb` binary.
//!
//! Each trait method is one `adb` invocation: spawn, capture stdout/stderr,
//! race against the configured timeout. `kill_on_drop` ensures a timed-out
//! child does not linger and hold the device's adb connection.

use async_trait::async_trait;
use hoshino_core::config::DeviceConfig;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command as AsyncCommand;
use tracing::debug;

use crate::{
    channel::DeviceChannel,
    error::{DeviceError, Result},
};

pub struct AdbChannel {
    adb_path: String,
    timeout: Duration,
}

impl AdbChannel {
    pub fn new(config: &DeviceConfig) -> Self {
        Self {
            adb_path: config.adb_path.clone(),
            timeout: Duration::from_secs(config.command_timeout_secs),
        }
    }

    /// Run one adb command to completion and return its raw output.
    async fn run(&self, args: &[&str]) -> Result<std::process::Output> {
        debug!(adb = %self.adb_path, ?args, "adb exec");

        let mut cmd = AsyncCommand::new(&self.adb_path);
        cmd.args(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        match tokio::time::timeout(self.timeout, cmd.output()).await {
            Ok(Ok(output)) => Ok(output),
            Ok(Err(e)) => Err(DeviceError::Spawn(format!("spawn failed: {e}"))),
            Err(_elapsed) => Err(DeviceError::Timeout {
                ms: self.timeout.as_millis() as u64,
            }),
        }
    }

    /// Run one adb command and require a zero exit status.
    async fn run_checked(&self, args: &[&str]) -> Result<String> {
        let output = self.run(args).await?;
        if !output.status.success() {
            return Err(DeviceError::CommandFailed {
                code: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait]
impl DeviceChannel for AdbChannel {
    async fn dump_ui_hierarchy(&self, remote_path: &str) -> Result<()> {
        self.run_checked(&["shell", "uiautomator", "dump", remote_path])
            .await
            .map(|_| ())
    }

    async fn pull_file(&self, remote_path: &str, local_path: &str) -> Result<()> {
        self.run_checked(&["pull", remote_path, local_path])
            .await
            .map(|_| ())
    }

    async fn get_setting(&self, namespace: &str, key: &str) -> Result<String> {
        let stdout = self
            .run_checked(&["shell", "settings", "get", namespace, key])
            .await?;
        Ok(stdout.trim().to_string())
    }

    async fn enable_input_method(&self, id: &str) -> Result<()> {
        self.run_checked(&["shell", "ime", "enable", id])
            .await
            .map(|_| ())
    }

    async fn set_input_method(&self, id: &str) -> Result<()> {
        self.run_checked(&["shell", "ime", "set", id])
            .await
            .map(|_| ())
    }

    async fn broadcast(&self, action: &str, extra_key: &str, extra_value: &str) -> Result<String> {
        self.run_checked(&[
            "shell",
            "am",
            "broadcast",
            "-a",
            action,
            "--es",
            extra_key,
            extra_value,
        ])
        .await
    }

    async fn tap(&self, x: u32, y: u32) -> Result<()> {
        let (x, y) = (x.to_string(), y.to_string());
        self.run_checked(&["shell", "input", "tap", x.as_str(), y.as_str()])
            .await
            .map(|_| ())
    }

    async fn key_event(&self, code: u32) -> Result<()> {
        let code = code.to_string();
        self.run_checked(&["shell", "input", "keyevent", code.as_str()])
            .await
            .map(|_| ())
    }
}
