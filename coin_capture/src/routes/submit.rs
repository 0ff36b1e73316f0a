use crate::{
    server::SharedState,
    submission::{Submission, SubmissionError},
};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use coin_classifier::Label;
use serde::{Deserialize, Serialize};
use tracing::instrument;

#[derive(Debug, Deserialize)]
pub struct SubmitRequest {
    initials: String,
    outcome: Label,
    confidence: String,
}

#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    status: &'static str,
}

impl IntoResponse for SubmissionError {
    fn into_response(self) -> Response {
        super::error_response(StatusCode::BAD_REQUEST, self.to_string())
    }
}

#[instrument(skip(state))]
pub async fn submit(
    State(state): State<SharedState>,
    Json(request): Json<SubmitRequest>,
) -> Result<Json<SubmitResponse>, SubmissionError> {
    state.metrics.record_request("submit");

    Submission::new(&request.initials, request.outcome, request.confidence)?.send();

    Ok(Json(SubmitResponse { status: "sent" }))
}
