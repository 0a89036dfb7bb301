use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use std::sync::Arc;

use super::{error_response, prediction_error_response, AppState};
use crate::api::models::{PredictRequest, PredictResponse};

fn required(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub async fn predict_match(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<PredictRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            return error_response(StatusCode::BAD_REQUEST, rejection.body_text(), Vec::new());
        }
    };

    let (Some(player1), Some(player2), Some(surface)) = (
        required(request.player1),
        required(request.player2),
        required(request.surface),
    ) else {
        return error_response(
            StatusCode::BAD_REQUEST,
            "Missing required fields: player1, player2, surface",
            Vec::new(),
        );
    };

    let context = state.context.current();
    match context.predict(&player1, &player2, &surface) {
        Ok(prediction) => {
            let winner_name = context
                .attributes()
                .get(&prediction.predicted_winner)
                .and_then(|attributes| attributes.name.clone());
            Json(PredictResponse::new(prediction, surface, winner_name)).into_response()
        }
        Err(e) => prediction_error_response(e),
    }
}
