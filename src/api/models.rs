use serde::{Deserialize, Serialize};

use crate::predict::Prediction;
use crate::rating::{PlayerId, RatingHistoryEntry};

/// Every field is optional so that a missing one becomes a structured 400.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictRequest {
    pub player1: Option<String>,
    pub player2: Option<String>,
    pub surface: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictResponse {
    pub player1: PlayerId,
    pub player2: PlayerId,
    /// Echoes the request; unrecognized surfaces are accepted as-is.
    pub surface: String,
    pub predicted_winner: PlayerId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub predicted_winner_name: Option<String>,
    /// P(player1 wins).
    pub win_probability: f64,
}

impl PredictResponse {
    pub fn new(prediction: Prediction, surface: String, predicted_winner_name: Option<String>) -> Self {
        Self {
            player1: prediction.player1,
            player2: prediction.player2,
            surface,
            predicted_winner: prediction.predicted_winner,
            predicted_winner_name,
            win_probability: prediction.win_probability,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unknown_players: Vec<PlayerId>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SurfaceRating {
    pub surface: String,
    pub rating: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerRatingsResponse {
    pub player_id: PlayerId,
    pub name: Option<String>,
    /// `false` when every value is the cold-start default.
    pub rated: bool,
    pub ratings: Vec<SurfaceRating>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryItem {
    pub event_date: String,
    pub opponent_id: PlayerId,
    pub surface: String,
    pub won: bool,
    pub rating_before: f64,
    pub rating_after: f64,
}

impl HistoryItem {
    pub fn for_player(player_id: &str, entry: &RatingHistoryEntry) -> Self {
        let won = entry.winner_id == player_id;
        let (opponent_id, rating_before, rating_after) = if won {
            (&entry.loser_id, entry.winner_rating_before, entry.winner_rating_after)
        } else {
            (&entry.winner_id, entry.loser_rating_before, entry.loser_rating_after)
        };
        Self {
            event_date: entry.event_date.format("%Y-%m-%d").to_string(),
            opponent_id: opponent_id.clone(),
            surface: entry.surface.to_string(),
            won,
            rating_before,
            rating_after,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub model_name: String,
    pub model_format_version: u32,
    pub feature_count: usize,
    pub schema_fingerprint: String,
    pub trained_at: String,
    pub ratings_version: u64,
    pub rated_players: usize,
    pub loaded_at: String,
    pub refreshing: bool,
}
