use axum::{extract::State, response::Json};
use std::sync::Arc;

use super::AppState;
use crate::api::models::HealthResponse;

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let context = state.context.current();
    let artifact = context.artifact();

    Json(HealthResponse {
        status: "ok",
        model_name: artifact.model().name().to_string(),
        model_format_version: artifact.format_version(),
        feature_count: artifact.pipeline().schema().len(),
        schema_fingerprint: format!("{:016x}", artifact.schema_fingerprint()),
        trained_at: artifact.trained_at().to_rfc3339(),
        ratings_version: context.ratings().version(),
        rated_players: context.ratings().len(),
        loaded_at: context.loaded_at().to_rfc3339(),
        refreshing: state.context.is_refreshing(),
    })
}
