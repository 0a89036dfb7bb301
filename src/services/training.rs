use anyhow::Result;
use log::{info, warn};
use std::path::Path;

use crate::config::AppConfig;
use crate::database::{self, ratings};
use crate::features::AttributeTable;
use crate::ingestion::{self, MatchLog};
use crate::model::{self, ModelArtifact};
use crate::rating::{replay_from_scratch, RatingStore};

/// Everything training reads: the match log, the published snapshot and the attributes.
pub struct TrainingInputs {
    pub log: MatchLog,
    pub ratings: RatingStore,
    pub attributes: AttributeTable,
}

pub struct TrainingService {
    config: AppConfig,
}

impl TrainingService {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    pub fn load_inputs(&self) -> Result<TrainingInputs> {
        let paths = &self.config.paths;
        let log = ingestion::load_match_log(&paths.matches_dir, self.config.rating.fallback_surface)?;
        let attributes = ingestion::load_or_derive(&paths.players_path, &log.records)?;
        let ratings = load_ratings_or_replay(&paths.database_path, &log, &self.config)?;
        Ok(TrainingInputs {
            log,
            ratings,
            attributes,
        })
    }

    /// Fits a new artifact; nothing is written.
    pub fn fit(&self, inputs: &TrainingInputs) -> Result<ModelArtifact> {
        info!("  → Building training set from {} matches", inputs.log.events.len());
        let artifact = model::train(
            &inputs.log.events,
            &inputs.ratings,
            &inputs.attributes,
            &self.config.rating,
            &self.config.model,
        )?;
        artifact.report().log();
        Ok(artifact)
    }

    pub fn run(&self) -> Result<ModelArtifact> {
        info!("=== Starting Model Training ===");
        let inputs = self.load_inputs()?;
        let artifact = self.fit(&inputs)?;
        artifact.save(&self.config.paths.model_path)?;
        info!("=== Model Training Complete ===");
        Ok(artifact)
    }
}

/// Reads the published snapshot, or replays the log in memory when none exists yet.
pub fn load_ratings_or_replay(db_path: &Path, log: &MatchLog, config: &AppConfig) -> Result<RatingStore> {
    if db_path.exists() {
        let pool = database::create_pool(db_path)?;
        let mut conn = database::get_connection(&pool)?;
        let store = ratings::load_store(&mut conn, config.rating.initial_rating)?;
        info!(
            "  → Loaded ratings for {} players from {}",
            store.len(),
            db_path.display()
        );
        return Ok(store);
    }

    warn!(
        "  → No rating database at {}, replaying {} matches in memory",
        db_path.display(),
        log.events.len()
    );
    Ok(replay_from_scratch(&log.events, &config.rating).store)
}
