use chrono::NaiveDate;
use std::path::PathBuf;

use crate::rating::Surface;

#[derive(Debug, Clone)]
pub struct RatingSettings {
    pub initial_rating: f64,
    pub k_factor: f64,
    pub fallback_surface: Surface,
    pub top_players: usize,
}

impl Default for RatingSettings {
    fn default() -> Self {
        Self {
            initial_rating: 1000.0,
            k_factor: 32.0,
            fallback_surface: Surface::Hard,
            top_players: 10,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ModelSettings {
    pub n_trees: usize,
    pub max_depth: u16,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub validation_fraction: f64,
    pub split_seed: u64,
    /// Only matches on or after this date are used for training.
    pub training_since: Option<NaiveDate>,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            n_trees: 200,
            max_depth: 10,
            min_samples_split: 5,
            min_samples_leaf: 2,
            validation_fraction: 0.2,
            split_seed: 42,
            training_since: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PathSettings {
    pub matches_dir: PathBuf,
    pub players_path: PathBuf,
    pub database_path: PathBuf,
    pub model_path: PathBuf,
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            matches_dir: env_path("MATCHES_DIR", "TML-Database-master"),
            players_path: env_path("PLAYERS_PATH", "player_database.csv"),
            database_path: env_path("DATABASE_PATH", "tennis_ratings.db"),
            model_path: env_path("MODEL_PATH", "match_predictor.json"),
        }
    }
}

fn env_path(key: &str, default: &str) -> PathBuf {
    std::env::var(key)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(default))
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub admin_token: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            admin_token: std::env::var("ADMIN_TOKEN").unwrap_or_else(|_| "secret".to_string()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub rating: RatingSettings,
    pub model: ModelSettings,
    pub paths: PathSettings,
    pub server: ServerSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl AppConfig {
    pub fn new() -> Self {
        Self {
            rating: RatingSettings::default(),
            model: ModelSettings::default(),
            paths: PathSettings::default(),
            server: ServerSettings::default(),
        }
    }
}
