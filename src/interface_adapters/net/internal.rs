use crate::domain::{Beatmap, SpawnSchedule};
use crate::interface_adapters::http::ErrorResponse;
use crate::interface_adapters::protocol::BeatmapDto;

use axum::{extract::Json, http::StatusCode, response::IntoResponse};

#[derive(Debug, serde::Serialize)]
struct HealthResponse {
    status: &'static str,
}

#[derive(Debug, serde::Serialize)]
struct BeatmapSummary {
    bpm: f32,
    total_beats: usize,
    // Notes across every beat, including those on unknown lanes.
    total_notes: usize,
    // Notes whose lane label has no target; they never spawn.
    unresolved_lanes: usize,
    duration_ms: u64,
}

pub async fn healthz_handler() -> impl IntoResponse {
    Json(HealthResponse { status: "ok" })
}

pub async fn inspect_beatmap_handler(Json(payload): Json<BeatmapDto>) -> impl IntoResponse {
    let beatmap = match Beatmap::try_from(payload) {
        Ok(beatmap) => beatmap,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            )
                .into_response();
        }
    };

    let schedule = SpawnSchedule::from_beatmap(&beatmap);
    let summary = BeatmapSummary {
        bpm: beatmap.bpm(),
        total_beats: beatmap.total_beats(),
        total_notes: beatmap.total_notes(),
        unresolved_lanes: schedule.unresolved_lanes(),
        duration_ms: (beatmap.duration() * 1000.0).round() as u64,
    };
    (StatusCode::OK, Json(summary)).into_response()
}
