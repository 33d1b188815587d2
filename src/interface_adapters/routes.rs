use crate::interface_adapters::net::{healthz_handler, inspect_beatmap_handler, ws_handler};
use crate::interface_adapters::state::AppState;

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;

pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .route("/healthz", get(healthz_handler))
        .route("/beatmaps/inspect", post(inspect_beatmap_handler))
        .with_state(state)
}
