//! Message injection: put text into the app's input field and commit it.
//!
//! Text goes in as a Base64 broadcast to the ADB keyboard IME rather than
//! `input text` — shell escaping mangles non-ASCII content, and the target
//! conversations are mostly CJK.

use base64::Engine;
use hoshino_core::config::{BridgeConfig, DeviceConfig};
use hoshino_device::DeviceChannel;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Broadcast action the ADB keyboard listens for Base64 payloads on.
pub const INPUT_BROADCAST_ACTION: &str = "ADB_INPUT_B64";

/// String-extra key carrying the encoded payload.
pub const INPUT_BROADCAST_EXTRA: &str = "msg";

/// Acknowledgment line the broadcast must print. A zero exit without this
/// line means the transport worked but the IME-side receiver did not.
pub const BROADCAST_ACK: &str = "Broadcast completed";

/// Injects one outgoing message per call. No deduplication: two calls with
/// the same text send it twice.
pub struct MessageInjector {
    channel: Arc<dyn DeviceChannel>,
    device: DeviceConfig,
    focus_settle: Duration,
}

impl MessageInjector {
    pub fn new(channel: Arc<dyn DeviceChannel>, device: &DeviceConfig, wait: &BridgeConfig) -> Self {
        Self {
            channel,
            device: device.clone(),
            focus_settle: Duration::from_millis(wait.focus_settle_ms),
        }
    }

    /// Run the full injection sequence. Each step may fail and every failure
    /// collapses to `false` — the bridge decides what that means.
    pub async fn inject(&self, text: &str) -> bool {
        // Fail fast: the Base64 broadcast is useless without the right IME,
        // so nothing else is attempted until the switch is confirmed.
        if !self.ensure_input_method().await {
            warn!("compatible input method unavailable, aborting injection");
            return false;
        }

        if !self.focus_input_box().await {
            return false;
        }

        if !self.broadcast_text(text).await {
            return false;
        }

        self.commit().await
    }

    /// Confirm the ADB keyboard is the active IME, switching if needed.
    ///
    /// The switch is verified by re-reading the setting — `ime set` exiting
    /// zero does not guarantee the system actually changed it.
    async fn ensure_input_method(&self) -> bool {
        let target = &self.device.input_method;

        match self.channel.get_setting("secure", "default_input_method").await {
            Ok(current) if current.contains(target.as_str()) => return true,
            Ok(current) => {
                debug!(current = %current, target = %target, "switching input method");
            }
            Err(e) => {
                debug!(error = %e, "input method query failed");
                return false;
            }
        }

        if let Err(e) = self.channel.enable_input_method(target).await {
            debug!(error = %e, "ime enable failed");
            return false;
        }
        if let Err(e) = self.channel.set_input_method(target).await {
            debug!(error = %e, "ime set failed");
            return false;
        }

        match self.channel.get_setting("secure", "default_input_method").await {
            Ok(current) => current.contains(target.as_str()),
            Err(_) => false,
        }
    }

    /// Tap the input box so the IME has a focused field to commit into.
    async fn focus_input_box(&self) -> bool {
        let point = self.device.input_box;
        if let Err(e) = self.channel.tap(point.x, point.y).await {
            debug!(error = %e, "focus tap failed");
            return false;
        }
        tokio::time::sleep(self.focus_settle).await;
        true
    }

    /// Base64-encode the text and hand it to the IME via broadcast.
    async fn broadcast_text(&self, text: &str) -> bool {
        let encoded = base64::engine::general_purpose::STANDARD.encode(text.as_bytes());

        match self
            .channel
            .broadcast(INPUT_BROADCAST_ACTION, INPUT_BROADCAST_EXTRA, &encoded)
            .await
        {
            Ok(stdout) if stdout.contains(BROADCAST_ACK) => true,
            Ok(stdout) => {
                warn!(stdout = %stdout.trim(), "text broadcast not acknowledged");
                false
            }
            Err(e) => {
                warn!(error = %e, "text broadcast failed");
                false
            }
        }
    }

    /// Commit the message: enter keypress first, send-button tap as fallback.
    async fn commit(&self) -> bool {
        if self.channel.key_event(self.device.enter_key_code).await.is_ok() {
            return true;
        }

        let point = self.device.send_button;
        match self.channel.tap(point.x, point.y).await {
            Ok(()) => {
                info!("message committed via send button fallback");
                true
            }
            Err(e) => {
                warn!(error = %e, "commit failed on both keypress and send button");
                false
            }
        }
    }
}
