// End-to-end bridge behavior against a scripted device channel.
// These pin the request/response contract the gateway depends on: which
// failures surface as DeliveryFailed vs NoReplyObserved, and how the
// injection sequence orders its device commands.

use async_trait::async_trait;
use base64::Engine;
use hoshino_bridge::{BridgeError, MessageBridge, MessageInjector};
use hoshino_core::HoshinoConfig;
use hoshino_device::{DeviceChannel, DeviceError};
use std::sync::{Arc, Mutex};

const ADB_IME: &str = "com.android.adbkeyboard/.AdbIME";
const REPLY: &str = "（语气危险）看来，你这只可爱的小白兔，终于落入了我的手里呢～";

const HAPPY_XML: &str = r#"<?xml version='1.0' encoding='UTF-8' standalone='yes' ?>
<hierarchy rotation="0">
  <node text="" class="android.widget.FrameLayout">
    <node text="黍" class="android.widget.TextView"/>
    <node text="@黍 收到新消息" class="android.widget.TextView"/>
    <node text="（语气危险）看来，你这只可爱的小白兔，终于落入了我的手里呢～" class="android.widget.TextView"/>
    <node text="发送消息给黍" class="android.widget.TextView"/>
  </node>
</hierarchy>"#;

struct MockState {
    ime_current: String,
    ime_switch_succeeds: bool,
    capture_ok: bool,
    broadcast_ack: bool,
    key_event_ok: bool,
    snapshot_xml: String,
    broadcasts: Vec<String>,
    taps: Vec<(u32, u32)>,
    key_events: Vec<u32>,
}

impl MockState {
    fn ready() -> Self {
        Self {
            ime_current: ADB_IME.to_string(),
            ime_switch_succeeds: true,
            capture_ok: true,
            broadcast_ack: true,
            key_event_ok: true,
            snapshot_xml: HAPPY_XML.to_string(),
            broadcasts: Vec::new(),
            taps: Vec::new(),
            key_events: Vec::new(),
        }
    }
}

#[derive(Clone)]
struct MockChannel {
    state: Arc<Mutex<MockState>>,
    local_dump_path: String,
}

impl MockChannel {
    fn new(state: MockState, config: &HoshinoConfig) -> Self {
        Self {
            state: Arc::new(Mutex::new(state)),
            local_dump_path: config.device.local_dump_path.clone(),
        }
    }

    fn channel_error() -> DeviceError {
        DeviceError::CommandFailed {
            code: 1,
            stderr: "error: device offline".to_string(),
        }
    }
}

#[async_trait]
impl DeviceChannel for MockChannel {
    async fn dump_ui_hierarchy(&self, _remote_path: &str) -> hoshino_device::Result<()> {
        if self.state.lock().unwrap().capture_ok {
            Ok(())
        } else {
            Err(Self::channel_error())
        }
    }

    async fn pull_file(&self, _remote_path: &str, local_path: &str) -> hoshino_device::Result<()> {
        let state = self.state.lock().unwrap();
        if !state.capture_ok {
            return Err(Self::channel_error());
        }
        assert_eq!(local_path, self.local_dump_path);
        std::fs::write(local_path, &state.snapshot_xml)?;
        Ok(())
    }

    async fn get_setting(&self, namespace: &str, key: &str) -> hoshino_device::Result<String> {
        assert_eq!((namespace, key), ("secure", "default_input_method"));
        Ok(self.state.lock().unwrap().ime_current.clone())
    }

    async fn enable_input_method(&self, _id: &str) -> hoshino_device::Result<()> {
        Ok(())
    }

    async fn set_input_method(&self, id: &str) -> hoshino_device::Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.ime_switch_succeeds {
            state.ime_current = id.to_string();
        }
        Ok(())
    }

    async fn broadcast(
        &self,
        action: &str,
        extra_key: &str,
        extra_value: &str,
    ) -> hoshino_device::Result<String> {
        assert_eq!(action, "ADB_INPUT_B64");
        assert_eq!(extra_key, "msg");
        let mut state = self.state.lock().unwrap();
        state.broadcasts.push(extra_value.to_string());
        if state.broadcast_ack {
            Ok("Broadcasting: Intent { act=ADB_INPUT_B64 }\nBroadcast completed: result=0\n".into())
        } else {
            Ok("Broadcasting: Intent { act=ADB_INPUT_B64 }\n".into())
        }
    }

    async fn tap(&self, x: u32, y: u32) -> hoshino_device::Result<()> {
        self.state.lock().unwrap().taps.push((x, y));
        Ok(())
    }

    async fn key_event(&self, code: u32) -> hoshino_device::Result<()> {
        let mut state = self.state.lock().unwrap();
        state.key_events.push(code);
        if state.key_event_ok {
            Ok(())
        } else {
            Err(Self::channel_error())
        }
    }
}

/// Config pointed at a per-test snapshot path, with a fast wait policy.
fn test_config(dir: &tempfile::TempDir) -> HoshinoConfig {
    let mut config = HoshinoConfig::default();
    config.device.local_dump_path = dir
        .path()
        .join("ui_dump.xml")
        .to_string_lossy()
        .into_owned();
    config.bridge.initial_wait_ms = 0;
    config.bridge.poll_interval_ms = 5;
    config.bridge.reply_deadline_ms = 50;
    config.bridge.focus_settle_ms = 0;
    config
}

fn build(state: MockState, config: &HoshinoConfig) -> (MockChannel, MessageBridge) {
    let channel = MockChannel::new(state, config);
    let bridge = MessageBridge::new(Arc::new(channel.clone()), config);
    (channel, bridge)
}

#[tokio::test]
async fn happy_path_returns_correlated_reply() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(&dir);
    let (channel, bridge) = build(MockState::ready(), &config);

    let reply = bridge.send_and_await_reply("你好").await;
    assert_eq!(reply.as_deref(), Ok(REPLY));

    // The outgoing text must have crossed the channel Base64-encoded.
    let state = channel.state.lock().unwrap();
    assert_eq!(state.broadcasts.len(), 1);
    let decoded = base64::engine::general_purpose::STANDARD
        .decode(&state.broadcasts[0])
        .unwrap();
    assert_eq!(String::from_utf8(decoded).unwrap(), "你好");
    // Committed via the enter keypress, not the fallback tap.
    assert_eq!(state.key_events, vec![66]);
}

#[tokio::test]
async fn capture_failure_after_send_is_no_reply_not_delivery_failure() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(&dir);
    let (channel, bridge) = build(
        MockState {
            capture_ok: false,
            ..MockState::ready()
        },
        &config,
    );

    // The send went through, so this must NOT be DeliveryFailed.
    let result = bridge.send_and_await_reply("你好").await;
    assert_eq!(result, Err(BridgeError::NoReplyObserved));
    assert_eq!(channel.state.lock().unwrap().broadcasts.len(), 1);
}

#[tokio::test]
async fn unacknowledged_broadcast_is_delivery_failure() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(&dir);
    let (channel, bridge) = build(
        MockState {
            broadcast_ack: false,
            ..MockState::ready()
        },
        &config,
    );

    let result = bridge.send_and_await_reply("你好").await;
    assert_eq!(result, Err(BridgeError::DeliveryFailed));
    // The broadcast was attempted but never committed.
    let state = channel.state.lock().unwrap();
    assert_eq!(state.broadcasts.len(), 1);
    assert!(state.key_events.is_empty());
}

#[tokio::test]
async fn injection_is_not_deduplicated() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(&dir);
    let channel = MockChannel::new(MockState::ready(), &config);
    let injector = MessageInjector::new(Arc::new(channel.clone()), &config.device, &config.bridge);

    assert!(injector.inject("同一句话").await);
    assert!(injector.inject("同一句话").await);

    assert_eq!(channel.state.lock().unwrap().broadcasts.len(), 2);
}

#[tokio::test]
async fn ime_that_never_converges_fails_before_any_broadcast() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(&dir);
    let channel = MockChannel::new(
        MockState {
            ime_current: "com.example.stock/.LatinIME".to_string(),
            ime_switch_succeeds: false,
            ..MockState::ready()
        },
        &config,
    );
    let injector = MessageInjector::new(Arc::new(channel.clone()), &config.device, &config.bridge);

    assert!(!injector.inject("你好").await);

    // Fail-fast ordering: no broadcast, no commit, not even the focus tap.
    let state = channel.state.lock().unwrap();
    assert!(state.broadcasts.is_empty());
    assert!(state.key_events.is_empty());
    assert!(state.taps.is_empty());
}

#[tokio::test]
async fn ime_switch_that_converges_allows_injection() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(&dir);
    let channel = MockChannel::new(
        MockState {
            ime_current: "com.example.stock/.LatinIME".to_string(),
            ..MockState::ready()
        },
        &config,
    );
    let injector = MessageInjector::new(Arc::new(channel.clone()), &config.device, &config.bridge);

    assert!(injector.inject("你好").await);
    assert_eq!(channel.state.lock().unwrap().broadcasts.len(), 1);
}

#[tokio::test]
async fn failed_keypress_falls_back_to_send_button_tap() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(&dir);
    let channel = MockChannel::new(
        MockState {
            key_event_ok: false,
            ..MockState::ready()
        },
        &config,
    );
    let injector = MessageInjector::new(Arc::new(channel.clone()), &config.device, &config.bridge);

    assert!(injector.inject("你好").await);

    let state = channel.state.lock().unwrap();
    let send_button = (config.device.send_button.x, config.device.send_button.y);
    assert!(state.taps.contains(&send_button));
}

#[tokio::test]
async fn blank_screen_is_no_reply() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(&dir);
    let (_, bridge) = build(
        MockState {
            snapshot_xml: r#"<hierarchy rotation="0"><node text=""/></hierarchy>"#.to_string(),
            ..MockState::ready()
        },
        &config,
    );

    let result = bridge.send_and_await_reply("你好").await;
    assert_eq!(result, Err(BridgeError::NoReplyObserved));
}

#[tokio::test]
async fn mention_without_agent_name_is_no_reply() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(&dir);
    // The "@" fragment is the very first text — no preceding name to use as
    // the marker lookup key.
    let (_, bridge) = build(
        MockState {
            snapshot_xml: r#"<hierarchy><node text="@黍 收到新消息"/><node text="正文"/></hierarchy>"#
                .to_string(),
            ..MockState::ready()
        },
        &config,
    );

    let result = bridge.send_and_await_reply("你好").await;
    assert_eq!(result, Err(BridgeError::NoReplyObserved));
}

#[tokio::test]
async fn diagnostics_report_pattern_positions() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(&dir);
    let (_, bridge) = build(MockState::ready(), &config);

    let texts = bridge.page_texts().await;
    assert_eq!(texts.len(), 4);
    assert_eq!(texts[0], "黍");

    let report = bridge.analyze_structure().await.expect("capture succeeds");
    assert_eq!(report.total_texts, 4);
    assert_eq!(report.mention_matches.len(), 1);
    assert_eq!(report.mention_matches[0].index, 1);
    assert_eq!(report.mention_matches[0].previous.as_deref(), Some("黍"));
    assert_eq!(report.agent_matches.len(), 1);
    assert_eq!(report.agent_matches[0].previous.as_deref(), Some(REPLY));
    assert!(report.snapshot_bytes > 0);
}

#[tokio::test]
async fn diagnostics_on_dead_channel_are_empty() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(&dir);
    let (_, bridge) = build(
        MockState {
            capture_ok: false,
            ..MockState::ready()
        },
        &config,
    );

    assert!(bridge.page_texts().await.is_empty());
    assert!(bridge.analyze_structure().await.is_none());
}
