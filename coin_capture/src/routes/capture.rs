use crate::{
    pipeline::{Analysis, PipelineError},
    server::SharedState,
};
use axum::{extract::State, response::Json};
use std::time::Instant;
use tracing::instrument;

#[instrument(skip(state))]
pub async fn capture(State(state): State<SharedState>) -> Result<Json<Analysis>, PipelineError> {
    state.metrics.record_request("capture");

    let started = Instant::now();
    let analysis = state.pipeline.capture_and_classify().await?;
    state.metrics.record_classification(
        started.elapsed().as_millis() as u64,
        analysis.result.label,
        "capture",
    );

    Ok(Json(analysis))
}
