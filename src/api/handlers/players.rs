use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Deserialize;
use std::sync::Arc;

use super::{error_response, AppState};
use crate::api::models::{HistoryItem, PlayerRatingsResponse, SurfaceRating};
use crate::database::{self, history};
use crate::rating::Surface;

#[derive(Deserialize)]
pub struct HistoryParams {
    pub limit: Option<usize>,
}

fn unknown_player(player_id: String) -> Response {
    error_response(
        StatusCode::NOT_FOUND,
        format!("could not find player(s): {}", player_id),
        vec![player_id],
    )
}

pub async fn get_player_ratings(
    State(state): State<Arc<AppState>>,
    Path(player_id): Path<String>,
) -> Response {
    let context = state.context.current();
    if !context.is_known(&player_id) {
        return unknown_player(player_id);
    }

    let surfaces = context.ratings().surface_ratings(&player_id);
    let ratings = Surface::ALL
        .iter()
        .map(|surface| SurfaceRating {
            surface: surface.to_string(),
            rating: surfaces[surface.index()],
        })
        .collect();

    Json(PlayerRatingsResponse {
        name: context
            .attributes()
            .get(&player_id)
            .and_then(|attributes| attributes.name.clone()),
        rated: context.ratings().contains(&player_id),
        ratings,
        player_id,
    })
    .into_response()
}

pub async fn get_player_history(
    State(state): State<Arc<AppState>>,
    Path(player_id): Path<String>,
    Query(params): Query<HistoryParams>,
) -> Response {
    if !state.context.current().is_known(&player_id) {
        return unknown_player(player_id);
    }

    let limit = params.limit.unwrap_or(20).clamp(1, 500);
    let db_path = state.config.paths.database_path.clone();
    if !db_path.exists() {
        return error_response(StatusCode::NOT_FOUND, "no rating history has been published", Vec::new());
    }
    let id = player_id.clone();

    // Opened per request: the file is swapped on every rating run.
    let result = tokio::task::spawn_blocking(move || -> anyhow::Result<_> {
        let pool = database::create_pool(&db_path)?;
        let mut conn = database::get_connection(&pool)?;
        history::list_for_player(&mut conn, &id, limit)
    })
    .await;

    match result {
        Ok(Ok(entries)) => {
            let items: Vec<HistoryItem> = entries
                .iter()
                .map(|entry| HistoryItem::for_player(&player_id, entry))
                .collect();
            Json(items).into_response()
        }
        Ok(Err(e)) => {
            log::error!("History query failed for {}: {:#}", player_id, e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Query Error", Vec::new())
        }
        Err(e) => {
            log::error!("History task failed: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
