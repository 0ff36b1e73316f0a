mod camera;
mod capture;
mod classify;
mod health;
mod metrics;
mod submit;

use crate::{camera::CameraError, pipeline::PipelineError, server::SharedState};
use axum::{
    extract::DefaultBodyLimit,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::Serialize;

const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

pub fn api_routes() -> Router<SharedState> {
    Router::new()
        .route("/health", get(health::healthcheck))
        .route("/metrics", get(metrics::metrics_handler))
        .route("/camera", post(camera::restart_camera))
        .route("/capture", post(capture::capture))
        .route(
            "/classify",
            post(classify::classify_image).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route("/submit", post(submit::submit))
}

#[derive(Serialize)]
pub struct ErrorBody {
    error: String,
}

pub fn error_response(status: StatusCode, message: String) -> Response {
    (status, Json(ErrorBody { error: message })).into_response()
}

impl IntoResponse for PipelineError {
    fn into_response(self) -> Response {
        let status = match &self {
            PipelineError::ModelNotReady(_) => StatusCode::SERVICE_UNAVAILABLE,
            PipelineError::Camera(e) => camera_status(e),
            PipelineError::Snapshot(_) | PipelineError::Join(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        }
        error_response(status, self.to_string())
    }
}

impl IntoResponse for CameraError {
    fn into_response(self) -> Response {
        let status = camera_status(&self);
        if status.is_server_error() {
            tracing::error!("Camera request failed: {}", self);
        }
        error_response(status, self.to_string())
    }
}

fn camera_status(error: &CameraError) -> StatusCode {
    match error {
        CameraError::Access(_) | CameraError::NoActiveStream => StatusCode::SERVICE_UNAVAILABLE,
        CameraError::Decode(_) | CameraError::EmptyImage(_) => StatusCode::BAD_REQUEST,
        CameraError::Frame(_) | CameraError::Io(_) | CameraError::Join(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coin_classifier::ModelNotReadyError;

    #[test]
    fn test_error_status_mapping() {
        let response = PipelineError::ModelNotReady(ModelNotReadyError).into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let response = PipelineError::Camera(CameraError::NoActiveStream).into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let decode = image::load_from_memory(b"garbage").unwrap_err();
        let response = PipelineError::Camera(CameraError::Decode(decode)).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
