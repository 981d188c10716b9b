//! hoshino-bridge — turns a fire-and-forget UI automation action into a
//! correlated request/response exchange.
//!
//! The target chat application offers no callback when the agent replies, so
//! the bridge works in one direction only: inject the outgoing text into the
//! app's input field, then repeatedly snapshot the UI hierarchy and scan the
//! visible text for positional markers until a reply is found or the wait
//! budget runs out.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use hoshino_bridge::MessageBridge;
//! use hoshino_core::HoshinoConfig;
//! use hoshino_device::{AdbChannel, DeviceChannel};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = HoshinoConfig::default();
//!     let channel: Arc<dyn DeviceChannel> = Arc::new(AdbChannel::new(&config.device));
//!     let bridge = MessageBridge::new(channel, &config);
//!
//!     match bridge.send_and_await_reply("你好").await {
//!         Ok(reply) => println!("{reply}"),
//!         Err(e) => eprintln!("{e}"),
//!     }
//! }
//! ```

pub mod bridge;
pub mod correlate;
pub mod error;
pub mod extract;
pub mod inject;
pub mod snapshot;

pub use bridge::{MessageBridge, PatternHit, StructureReport};
pub use correlate::{AdjacentText, CorrelationResult, CorrelationStrategy, MarkerMatch};
pub use error::BridgeError;
pub use inject::MessageInjector;
pub use snapshot::SnapshotCapturer;
