//! UI snapshot capture: dump the hierarchy on-device, pull it local.

use hoshino_core::config::DeviceConfig;
use hoshino_device::DeviceChannel;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Captures the device's UI hierarchy to a fixed local file.
///
/// The local file is overwritten on every capture; there is no history and
/// the snapshot is stale the moment the screen changes again.
pub struct SnapshotCapturer {
    channel: Arc<dyn DeviceChannel>,
    remote_path: String,
    local_path: PathBuf,
}

impl SnapshotCapturer {
    pub fn new(channel: Arc<dyn DeviceChannel>, config: &DeviceConfig) -> Self {
        Self {
            channel,
            remote_path: config.remote_dump_path.clone(),
            local_path: PathBuf::from(&config.local_dump_path),
        }
    }

    /// Where the pulled snapshot lands.
    pub fn local_path(&self) -> &Path {
        &self.local_path
    }

    /// Dump and pull the current UI hierarchy.
    ///
    /// `true` only when both device commands succeed and the local file
    /// exists non-empty. Every failure mode collapses to `false`; whether to
    /// retry is the orchestrator's call, not ours.
    pub async fn capture(&self) -> bool {
        if let Err(e) = self.channel.dump_ui_hierarchy(&self.remote_path).await {
            debug!(error = %e, "ui dump failed");
            return false;
        }

        let local = self.local_path.to_string_lossy();
        if let Err(e) = self.channel.pull_file(&self.remote_path, &local).await {
            debug!(error = %e, "snapshot pull failed");
            return false;
        }

        match std::fs::metadata(&self.local_path) {
            Ok(meta) if meta.len() > 0 => true,
            Ok(_) => {
                debug!(path = %local, "pulled snapshot is empty");
                false
            }
            Err(e) => {
                debug!(path = %local, error = %e, "pulled snapshot missing");
                false
            }
        }
    }

    /// Size of the last pulled snapshot in bytes, 0 when absent.
    pub fn snapshot_bytes(&self) -> u64 {
        std::fs::metadata(&self.local_path)
            .map(|meta| meta.len())
            .unwrap_or(0)
    }
}
