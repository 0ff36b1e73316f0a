use crate::{
    camera::{CameraError, FacingMode},
    server::SharedState,
};
use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

#[derive(Debug, Deserialize)]
pub struct CameraRequest {
    facing_mode: Option<FacingMode>,
}

#[derive(Debug, Serialize)]
pub struct CameraStatus {
    facing_mode: FacingMode,
    active: bool,
}

#[instrument(skip(state, body))]
pub async fn restart_camera(State(state): State<SharedState>, body: Bytes) -> Response {
    state.metrics.record_request("camera");

    let facing_mode = if body.is_empty() {
        state.camera_config.facing_mode
    } else {
        match serde_json::from_slice::<CameraRequest>(&body) {
            Ok(request) => request
                .facing_mode
                .unwrap_or(state.camera_config.facing_mode),
            Err(e) => {
                return super::error_response(
                    StatusCode::BAD_REQUEST,
                    format!("Invalid camera request: {}", e),
                )
            }
        }
    };

    match start(&state, facing_mode).await {
        Ok(status) => Json(status).into_response(),
        Err(e) => e.into_response(),
    }
}

async fn start(state: &SharedState, facing_mode: FacingMode) -> Result<CameraStatus, CameraError> {
    let media = state.pipeline.media();
    media.start_camera(facing_mode).await?;
    Ok(CameraStatus {
        facing_mode,
        active: media.is_streaming().await,
    })
}
