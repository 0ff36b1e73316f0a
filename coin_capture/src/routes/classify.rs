use crate::{
    pipeline::{Analysis, PipelineError},
    server::SharedState,
};
use axum::{body::Bytes, extract::State, response::Json};
use std::time::Instant;
use tracing::instrument;

#[instrument(skip(state, image_data), fields(bytes = image_data.len()))]
pub async fn classify_image(
    State(state): State<SharedState>,
    image_data: Bytes,
) -> Result<Json<Analysis>, PipelineError> {
    state.metrics.record_request("classify");

    let started = Instant::now();
    let analysis = state.pipeline.classify_upload(image_data.to_vec()).await?;
    state.metrics.record_classification(
        started.elapsed().as_millis() as u64,
        analysis.result.label,
        "classify",
    );

    Ok(Json(analysis))
}
