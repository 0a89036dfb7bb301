use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};

use crate::api::models::ErrorResponse;
use crate::config::AppConfig;
use crate::errors::PredictionError;
use crate::rating::PlayerId;
use crate::services::context::SharedContext;

pub mod admin;
pub mod players;
pub mod predict;
pub mod status;

pub struct AppState {
    pub context: SharedContext,
    pub config: AppConfig,
}

pub fn error_response(status: StatusCode, error: impl Into<String>, unknown_players: Vec<PlayerId>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
            unknown_players,
        }),
    )
        .into_response()
}

/// Maps boundary failures to structured payloads; internal details stay in the log.
pub fn prediction_error_response(err: PredictionError) -> Response {
    let message = err.to_string();
    match err {
        PredictionError::UnknownPlayers(ids) => error_response(StatusCode::NOT_FOUND, message, ids),
        PredictionError::SamePlayer(_) => error_response(StatusCode::BAD_REQUEST, message, Vec::new()),
        PredictionError::Artifact(_) | PredictionError::Model(_) => {
            log::error!("Prediction failed: {}", message);
            error_response(
                StatusCode::SERVICE_UNAVAILABLE,
                "prediction model is unavailable",
                Vec::new(),
            )
        }
    }
}
