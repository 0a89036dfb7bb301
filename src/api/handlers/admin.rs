use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use super::{error_response, AppState};
use crate::services::context::rebuild;

fn is_authorized(headers: &HeaderMap, token: &str) -> bool {
    headers
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .is_some_and(|given| given == token)
}

/// Re-rates, retrains and swaps the served context in the background.
pub async fn admin_refresh(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Response {
    if !is_authorized(&headers, &state.config.server.admin_token) {
        return StatusCode::UNAUTHORIZED.into_response();
    }

    if !state.context.begin_refresh() {
        return error_response(StatusCode::CONFLICT, "refresh already in progress", Vec::new());
    }

    tokio::spawn(async move {
        log::info!("Admin triggered refresh started");
        let config = state.config.clone();
        let result = tokio::task::spawn_blocking(move || rebuild(&config)).await;

        match result {
            Ok(Ok(context)) => {
                state.context.publish(context);
                log::info!("Admin triggered refresh completed successfully");
            }
            Ok(Err(e)) => log::error!("Refresh failed, keeping current model: {:?}", e),
            Err(e) => log::error!("Refresh task panicked: {}", e),
        }
        state.context.end_refresh();
    });

    (StatusCode::ACCEPTED, "Refresh triggered").into_response()
}
