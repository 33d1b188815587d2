// Framework bootstrap for the rhythm server runtime.

use crate::frameworks::config;
use crate::interface_adapters::routes::app;
use crate::interface_adapters::state::AppState;
use crate::use_cases::SessionSettings;

use std::net::SocketAddr;
use std::{io::Result, sync::Arc};

fn init_runtime() {
    let _ = dotenvy::dotenv();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let json = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .json()
            .with_current_span(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .init();
    }

    std::panic::set_hook(Box::new(|info| {
        let backtrace = std::backtrace::Backtrace::capture();
        tracing::error!(%info, ?backtrace, "panic");
    }));
}

pub async fn run(listener: tokio::net::TcpListener) -> Result<()> {
    let address = listener.local_addr()?;
    let state = build_state();
    let app = app(state);

    tracing::info!(%address, "listening");

    // Serve app and report errors rather than panicking
    axum::serve(listener, app).await.inspect_err(|e| {
        tracing::error!(error = %e, "server error");
    })
}

pub async fn run_with_config() -> Result<()> {
    init_runtime();

    let address = SocketAddr::from(([127, 0, 0, 1], config::http_port()));

    // Bind TCP listener with error handling
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .inspect_err(|e| {
            tracing::error!(%address, error = %e, "failed to bind");
        })?;

    run(listener).await
}

fn build_state() -> Arc<AppState> {
    let settings = SessionSettings {
        tick_interval: config::tick_interval(),
        max_frame_dt: config::max_frame_dt(),
        sensor_start_timeout: config::sensor_start_timeout(),
        command_channel_capacity: config::COMMAND_CHANNEL_CAPACITY,
        event_channel_capacity: config::EVENT_CHANNEL_CAPACITY,
        frame_broadcast_capacity: config::FRAME_BROADCAST_CAPACITY,
        cue_broadcast_capacity: config::CUE_BROADCAST_CAPACITY,
    };
    tracing::debug!(
        tick_interval_us = settings.tick_interval.as_micros() as u64,
        max_frame_dt_ms = settings.max_frame_dt.as_millis() as u64,
        sensor_start_timeout_ms = settings.sensor_start_timeout.as_millis() as u64,
        "session settings configured"
    );

    Arc::new(AppState {
        settings,
        sensor_channel_capacity: config::SENSOR_CHANNEL_CAPACITY,
    })
}
