//! The bridge orchestrator: one HTTP chat request → one device interaction
//! cycle.
//!
//! Sequence per request: inject the text, wait, then poll snapshot → extract
//! → mention-scan → marker-lookup until a reply surfaces or the deadline
//! passes. The whole cycle runs under one mutex — the snapshot file and the
//! device's IME setting are shared mutable state, and a second injection
//! racing the first's wait window would cross-wire the conversations.

use hoshino_core::config::{BridgeConfig, HoshinoConfig};
use hoshino_device::DeviceChannel;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::{
    correlate::{AdjacentText, CorrelationStrategy, MarkerMatch, MENTION_MARKER, SENT_MARKER_PREFIX},
    error::BridgeError,
    extract::extract_texts,
    inject::MessageInjector,
    snapshot::SnapshotCapturer,
};

pub struct MessageBridge {
    capturer: SnapshotCapturer,
    injector: MessageInjector,
    strategy: Box<dyn CorrelationStrategy>,
    wait: BridgeConfig,
    /// Single-flight guard around the whole send → poll cycle.
    flight: tokio::sync::Mutex<()>,
}

impl MessageBridge {
    pub fn new(channel: Arc<dyn DeviceChannel>, config: &HoshinoConfig) -> Self {
        Self::with_strategy(channel, config, Box::new(AdjacentText))
    }

    /// Construct with a non-default correlation strategy.
    pub fn with_strategy(
        channel: Arc<dyn DeviceChannel>,
        config: &HoshinoConfig,
        strategy: Box<dyn CorrelationStrategy>,
    ) -> Self {
        Self {
            capturer: SnapshotCapturer::new(Arc::clone(&channel), &config.device),
            injector: MessageInjector::new(channel, &config.device, &config.bridge),
            strategy,
            wait: config.bridge.clone(),
            flight: tokio::sync::Mutex::new(()),
        }
    }

    /// Send `text` to the conversation and wait for the agent's reply.
    ///
    /// Returns the reply text, or [`BridgeError::DeliveryFailed`] when the
    /// injection itself failed, or [`BridgeError::NoReplyObserved`] when the
    /// message went out but no reply was correlated before the deadline.
    /// The operation is plain async — callers wanting a harder cap can wrap
    /// it in `tokio::time::timeout`.
    pub async fn send_and_await_reply(&self, text: &str) -> Result<String, BridgeError> {
        let _flight = self.flight.lock().await;

        if !self.injector.inject(text).await {
            warn!("message injection failed");
            return Err(BridgeError::DeliveryFailed);
        }
        info!(chars = text.chars().count(), "message delivered, awaiting reply");

        // The deadline covers the whole wait phase, initial delay included.
        let deadline = Instant::now() + Duration::from_millis(self.wait.reply_deadline_ms);
        tokio::time::sleep(Duration::from_millis(self.wait.initial_wait_ms)).await;

        loop {
            if let Some(reply) = self.try_read_reply().await {
                info!(chars = reply.chars().count(), "reply correlated");
                return Ok(reply);
            }

            let now = Instant::now();
            if now >= deadline {
                warn!("reply deadline exhausted");
                return Err(BridgeError::NoReplyObserved);
            }
            let next = now + Duration::from_millis(self.wait.poll_interval_ms);
            tokio::time::sleep_until(next.min(deadline)).await;
        }
    }

    /// One snapshot → extract → correlate attempt.
    ///
    /// Any miss along the way (capture failed, blank screen, no mention, no
    /// agent name, marker not found) means "no reply yet" — indistinct by
    /// design, the poll loop just tries again.
    async fn try_read_reply(&self) -> Option<String> {
        if !self.capturer.capture().await {
            return None;
        }

        let texts = extract_texts(self.capturer.local_path());
        if texts.is_empty() {
            return None;
        }

        // Mention mode discovers WHICH agent answered; its preceding fragment
        // is the display name used as the marker-mode lookup key.
        let agent_name = match self.strategy.find_mention(&texts) {
            crate::correlate::CorrelationResult {
                preceding: Some(name),
                marker: Some(_),
            } => name,
            _ => return None,
        };
        debug!(agent = %agent_name, "mention marker found");

        match self.strategy.find_reply(&texts, &agent_name) {
            MarkerMatch::Found(reply) => Some(reply),
            MarkerMatch::FoundNoPredecessor => {
                debug!(agent = %agent_name, "sent marker is first fragment, no predecessor");
                None
            }
            MarkerMatch::NotFound => None,
        }
    }

    /// Diagnostic passthrough: all visible texts on the current screen.
    /// Capture failure yields the empty list.
    pub async fn page_texts(&self) -> Vec<String> {
        let _flight = self.flight.lock().await;

        if !self.capturer.capture().await {
            return Vec::new();
        }
        extract_texts(self.capturer.local_path())
    }

    /// Diagnostic passthrough: every mention and sent-marker hit on the
    /// current screen, with positional context. `None` when capture fails.
    pub async fn analyze_structure(&self) -> Option<StructureReport> {
        let _flight = self.flight.lock().await;

        if !self.capturer.capture().await {
            return None;
        }
        let texts = extract_texts(self.capturer.local_path());

        let mut mention_matches = Vec::new();
        let mut agent_matches = Vec::new();
        for (i, text) in texts.iter().enumerate() {
            let hit = || PatternHit {
                index: i,
                text: text.clone(),
                previous: (i > 0).then(|| texts[i - 1].clone()),
            };
            if text.contains(MENTION_MARKER) {
                mention_matches.push(hit());
            }
            if text.contains(SENT_MARKER_PREFIX) {
                agent_matches.push(hit());
            }
        }

        Some(StructureReport {
            total_texts: texts.len(),
            snapshot_bytes: self.capturer.snapshot_bytes(),
            all_texts: texts,
            mention_matches,
            agent_matches,
        })
    }
}

/// One pattern occurrence inside the extracted sequence.
#[derive(Debug, Clone, Serialize)]
pub struct PatternHit {
    pub index: usize,
    pub text: String,
    pub previous: Option<String>,
}

/// Screen structure summary returned by [`MessageBridge::analyze_structure`].
#[derive(Debug, Clone, Serialize)]
pub struct StructureReport {
    pub total_texts: usize,
    pub snapshot_bytes: u64,
    pub all_texts: Vec<String>,
    pub mention_matches: Vec<PatternHit>,
    pub agent_matches: Vec<PatternHit>,
}
