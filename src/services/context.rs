use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use log::{info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use super::rating::RatingService;
use super::training::TrainingService;
use crate::config::AppConfig;
use crate::errors::{ArtifactError, PredictionError};
use crate::features::{AttributeTable, FeatureBuilder, Matchup};
use crate::model::ModelArtifact;
use crate::predict::batch::{predict_rows, BatchInput, PredictionRow};
use crate::predict::{Prediction, SymmetricPredictor};
use crate::rating::{PlayerId, RatingStore, Surface};

/// Ratings, attributes and a validated artifact that were loaded together and are
/// only ever replaced as a unit.
pub struct PredictionContext {
    ratings: RatingStore,
    attributes: AttributeTable,
    artifact: ModelArtifact,
    fallback_surface: Surface,
    loaded_at: DateTime<Utc>,
}

impl PredictionContext {
    pub fn new(
        ratings: RatingStore,
        attributes: AttributeTable,
        artifact: ModelArtifact,
        fallback_surface: Surface,
    ) -> Result<Self, ArtifactError> {
        artifact.validate()?;
        Ok(Self {
            ratings,
            attributes,
            artifact,
            fallback_surface,
            loaded_at: Utc::now(),
        })
    }

    pub fn predictor(&self) -> SymmetricPredictor<'_> {
        let builder = FeatureBuilder::new(&self.ratings, &self.attributes, self.fallback_surface);
        SymmetricPredictor::from_artifact(builder, &self.artifact)
    }

    /// A player is resolvable when either the attribute table or the ratings know them.
    pub fn is_known(&self, player_id: &str) -> bool {
        self.attributes.contains(player_id) || self.ratings.contains(player_id)
    }

    /// Resolves both players, accepts any surface label, and runs the symmetric predictor.
    pub fn predict(&self, player1: &str, player2: &str, surface: &str) -> Result<Prediction, PredictionError> {
        let mut unknown: Vec<PlayerId> = [player1, player2]
            .into_iter()
            .filter(|id| !self.is_known(id))
            .map(str::to_string)
            .collect();
        unknown.dedup();
        if !unknown.is_empty() {
            return Err(PredictionError::UnknownPlayers(unknown));
        }
        if player1 == player2 {
            return Err(PredictionError::SamePlayer(player1.to_string()));
        }

        let parsed = Surface::parse(surface);
        if parsed.is_none() {
            warn!(
                "Unrecognized surface {:?}, encoding as unknown and rating on {}",
                surface, self.fallback_surface
            );
        }

        self.predictor()
            .predict(&Matchup::new(player1, player2, parsed))
    }

    /// Scores a batch file. Matches naming an unknown player are skipped with a warning.
    pub fn predict_batch(&self, input: &BatchInput) -> Result<BatchOutcome, PredictionError> {
        let (known, unknown): (Vec<_>, Vec<_>) = input.matches.iter().cloned().partition(|m| {
            self.is_known(&m.matchup.player1) && self.is_known(&m.matchup.player2)
        });
        for skipped in &unknown {
            warn!(
                "Line {}: skipping {} vs {}, unknown player",
                skipped.line, skipped.matchup.player1, skipped.matchup.player2
            );
        }

        let rows = predict_rows(&self.predictor(), &known, Utc::now())?;
        Ok(BatchOutcome {
            rows,
            skipped: unknown.len(),
        })
    }

    pub fn ratings(&self) -> &RatingStore {
        &self.ratings
    }

    pub fn attributes(&self) -> &AttributeTable {
        &self.attributes
    }

    pub fn artifact(&self) -> &ModelArtifact {
        &self.artifact
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }
}

#[derive(Debug)]
pub struct BatchOutcome {
    pub rows: Vec<PredictionRow>,
    pub skipped: usize,
}

/// Loads the published artifact, retraining (and republishing) it when it is missing,
/// corrupt or inconsistent. Fails only when retraining fails too.
pub fn load_or_train(config: &AppConfig) -> Result<PredictionContext> {
    let service = TrainingService::new(config.clone());
    let inputs = service.load_inputs()?;
    let model_path = &config.paths.model_path;

    let artifact = match ModelArtifact::load(model_path) {
        Ok(artifact) => artifact,
        Err(e) => {
            warn!("Model artifact unusable ({:#}), retraining", e);
            let artifact = service
                .fit(&inputs)
                .context("Retraining failed, no usable model artifact to serve")?;
            artifact.save(model_path)?;
            artifact
        }
    };

    let context = PredictionContext::new(
        inputs.ratings,
        inputs.attributes,
        artifact,
        config.rating.fallback_surface,
    )?;
    info!(
        "  → Prediction context ready: {} rated players, {} with attributes",
        context.ratings.len(),
        context.attributes.len()
    );
    Ok(context)
}

/// Recomputes ratings, retrains and republishes both files, then returns the fresh
/// context. Nothing already being served is touched.
pub fn rebuild(config: &AppConfig) -> Result<PredictionContext> {
    RatingService::new(config.clone()).run(None)?;

    let service = TrainingService::new(config.clone());
    let inputs = service.load_inputs()?;
    let artifact = service.fit(&inputs)?;
    artifact.save(&config.paths.model_path)?;

    Ok(PredictionContext::new(
        inputs.ratings,
        inputs.attributes,
        artifact,
        config.rating.fallback_surface,
    )?)
}

/// Read-many, write-rarely handle to the current context. Readers take an `Arc` and
/// keep using it even if a newer context is published meanwhile.
pub struct SharedContext {
    current: RwLock<Arc<PredictionContext>>,
    refreshing: AtomicBool,
}

impl SharedContext {
    pub fn new(context: PredictionContext) -> Self {
        Self {
            current: RwLock::new(Arc::new(context)),
            refreshing: AtomicBool::new(false),
        }
    }

    pub fn current(&self) -> Arc<PredictionContext> {
        let guard = self.current.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    pub fn publish(&self, context: PredictionContext) {
        let next = Arc::new(context);
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        *guard = next;
    }

    /// `false` when another refresh is already running.
    pub fn begin_refresh(&self) -> bool {
        self.refreshing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub fn end_refresh(&self) {
        self.refreshing.store(false, Ordering::Release);
    }

    pub fn is_refreshing(&self) -> bool {
        self.refreshing.load(Ordering::Acquire)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::config::{ModelSettings, PathSettings, RatingSettings, ServerSettings};
    use crate::features::PlayerAttributes;
    use crate::model::train;
    use crate::rating::{replay_from_scratch, MatchEvent};
    use chrono::NaiveDate;
    use std::path::PathBuf;

    pub(crate) fn small_model_settings() -> ModelSettings {
        ModelSettings {
            n_trees: 10,
            max_depth: 4,
            min_samples_split: 2,
            min_samples_leaf: 1,
            ..Default::default()
        }
    }

    fn events() -> Vec<MatchEvent> {
        let mut events = Vec::new();
        for day in 1..=20 {
            let date = NaiveDate::from_ymd_opt(2023, 4, day).unwrap();
            for (winner, loser, surface) in [
                ("A1", "B2", Surface::Hard),
                ("B2", "C3", Surface::Clay),
                ("A1", "C3", Surface::Grass),
            ] {
                events.push(MatchEvent {
                    date,
                    winner_id: winner.to_string(),
                    loser_id: loser.to_string(),
                    surface,
                });
            }
        }
        events
    }

    /// Context trained in memory on a small three-player history.
    pub(crate) fn fixture_context() -> PredictionContext {
        let events = events();
        let rating_settings = RatingSettings::default();
        let replay = replay_from_scratch(&events, &rating_settings);

        let mut attributes = AttributeTable::new();
        attributes.insert(
            "A1".to_string(),
            PlayerAttributes {
                name: Some("Alpha".to_string()),
                height: Some(190.0),
                plays: Some("R".to_string()),
                ..Default::default()
            },
        );
        // Known by attributes only, never rated.
        attributes.insert("D4".to_string(), PlayerAttributes::default());

        let artifact = train(
            &events,
            &replay.store,
            &attributes,
            &rating_settings,
            &small_model_settings(),
        )
        .unwrap();
        PredictionContext::new(replay.store, attributes, artifact, Surface::Hard).unwrap()
    }

    #[test]
    fn test_predict_resolves_players() {
        let context = fixture_context();

        let prediction = context.predict("A1", "C3", "Grass").unwrap();
        assert!((0.0..=1.0).contains(&prediction.win_probability));

        match context.predict("A1", "ZZ9", "Hard") {
            Err(PredictionError::UnknownPlayers(ids)) => assert_eq!(ids, vec!["ZZ9".to_string()]),
            other => panic!("expected unknown player, got {:?}", other.map(|p| p.win_probability)),
        }

        assert!(matches!(
            context.predict("B2", "B2", "Hard"),
            Err(PredictionError::SamePlayer(_))
        ));
    }

    #[test]
    fn test_unknown_player_listed_once() {
        let context = fixture_context();
        match context.predict("ZZ", "ZZ", "Clay") {
            Err(e @ PredictionError::UnknownPlayers(_)) => {
                assert_eq!(e.to_string(), "could not find player(s): ZZ");
                assert!(matches!(e, PredictionError::UnknownPlayers(ids) if ids == vec!["ZZ".to_string()]));
            }
            other => panic!("expected unknown player, got {:?}", other.map(|p| p.win_probability)),
        }
    }

    #[test]
    fn test_unrated_and_unknown_surface_still_predict() {
        let context = fixture_context();

        let forward = context.predict("D4", "A1", "Sand").unwrap();
        let reverse = context.predict("A1", "D4", "Sand").unwrap();
        assert_eq!(forward.surface, None);
        assert!((forward.win_probability + reverse.win_probability - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_predict_batch_skips_unknown_players() {
        let context = fixture_context();
        let csv = "winner_id,loser_id,surface\nA1,C3,Hard\nZZ,A1,Clay\nD4,B2,Grass\n";
        let input = crate::predict::batch::read_batch("upcoming.csv", csv.as_bytes()).unwrap();

        let outcome = context.predict_batch(&input).unwrap();
        assert_eq!(outcome.skipped, 1);
        assert_eq!(outcome.rows.len(), 2);
        assert_eq!(outcome.rows[0].player1, "A1");
        assert_eq!(outcome.rows[1].player2, "B2");
        for row in &outcome.rows {
            assert!(row.win_probability >= 0.5 && row.win_probability <= 1.0);
            assert!(row.predicted_winner == row.player1 || row.predicted_winner == row.player2);
        }
    }

    #[test]
    fn test_publish_swaps_for_new_readers_only() {
        let shared = SharedContext::new(fixture_context());
        let before = shared.current();

        shared.publish(fixture_context());
        let after = shared.current();

        assert!(!Arc::ptr_eq(&before, &after));
        assert!(before.predict("A1", "B2", "Hard").is_ok());
    }

    #[test]
    fn test_refresh_flag_is_exclusive() {
        let shared = SharedContext::new(fixture_context());
        assert!(shared.begin_refresh());
        assert!(!shared.begin_refresh());
        shared.end_refresh();
        assert!(!shared.is_refreshing());
        assert!(shared.begin_refresh());
    }

    #[test]
    fn test_load_or_train_recovers_from_corrupt_artifact() {
        let dir: PathBuf = std::env::temp_dir().join(format!(
            "tennis_prediction_{}_context",
            std::process::id()
        ));
        let matches_dir = dir.join("matches");
        std::fs::create_dir_all(&matches_dir).unwrap();

        let mut csv = String::from("tourney_date,surface,winner_id,loser_id\n");
        for event in events() {
            csv.push_str(&format!(
                "{},{},{},{}\n",
                event.date.format("%Y%m%d"),
                event.surface,
                event.winner_id,
                event.loser_id
            ));
        }
        std::fs::write(matches_dir.join("2023.csv"), csv).unwrap();

        let model_path = dir.join("model.json");
        std::fs::write(&model_path, b"garbage").unwrap();

        let config = AppConfig {
            rating: RatingSettings::default(),
            model: small_model_settings(),
            paths: PathSettings {
                matches_dir,
                players_path: dir.join("players.csv"),
                database_path: dir.join("ratings.db"),
                model_path: model_path.clone(),
            },
            server: ServerSettings {
                admin_token: "t".to_string(),
            },
        };

        let context = load_or_train(&config).unwrap();
        assert!(context.is_known("C3"));
        assert!(ModelArtifact::load(&model_path).is_ok());
        assert!(dir.join("players.csv").exists());

        std::fs::remove_dir_all(&dir).ok();
    }
}
