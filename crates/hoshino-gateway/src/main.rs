use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

use hoshino_bridge::MessageBridge;
use hoshino_device::{AdbChannel, DeviceChannel};

mod app;
mod auth;
mod http;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hoshino_gateway=info,hoshino_bridge=info,tower_http=debug".into()),
        )
        .init();

    // load config: explicit path > HOSHINO_CONFIG env > ~/.hoshino/hoshino.toml
    let config_path = std::env::var("HOSHINO_CONFIG").ok();
    let config =
        hoshino_core::HoshinoConfig::load(config_path.as_deref()).unwrap_or_else(|e| {
            tracing::warn!("Config load failed ({}), using defaults", e);
            hoshino_core::HoshinoConfig::default()
        });

    let api_key = auth::load_or_create_api_key(&config.gateway.auth.key_file)?;
    info!(
        key = %auth::preview(&api_key),
        enforced = config.gateway.auth.require_api_key,
        "API key ready"
    );

    let channel: Arc<dyn DeviceChannel> = Arc::new(AdbChannel::new(&config.device));
    let bridge = MessageBridge::new(channel, &config);
    info!(
        adb = %config.device.adb_path,
        ime = %config.device.input_method,
        "message bridge initialized"
    );

    let bind = config.gateway.bind.clone();
    let port = config.gateway.port;

    let state = Arc::new(app::AppState::new(config, bridge, api_key));
    let router = app::build_router(state);

    let addr: SocketAddr = format!("{}:{}", bind, port).parse()?;
    info!("hoshino gateway listening on {}", addr);
    info!("chat endpoint: http://{}/v1/chat/completions", addr);
    info!("model list:    http://{}/v1/models", addr);
    info!("health check:  http://{}/health", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;
    Ok(())
}
