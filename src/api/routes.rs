use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::api::handlers::{
    admin::admin_refresh,
    players::{get_player_history, get_player_ratings},
    predict::predict_match,
    status::health,
    AppState,
};

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/predict", post(predict_match))
        .route("/api/players/:id/ratings", get(get_player_ratings))
        .route("/api/players/:id/history", get(get_player_history))
        .route("/api/admin/refresh", post(admin_refresh))
        .route("/api/health", get(health))
        .with_state(state)
}
