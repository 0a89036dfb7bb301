use anyhow::{bail, Context, Result};
use log::{info, warn};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use super::artifact::ModelArtifact;
use super::classifier::{ForestClassifier, OutcomeModel};
use super::metrics::{evaluate, ClassificationMetrics};
use crate::config::{ModelSettings, RatingSettings};
use crate::features::{AttributeTable, FeatureBuilder, FeaturePipeline, Matchup};
use crate::rating::{MatchEvent, RatingStore};

/// One perspective of a historical match; `label` is 1.0 when `player1` won.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledMatchup {
    pub matchup: Matchup,
    pub label: f64,
}

/// Every match becomes two rows: winner first labelled 1, loser first labelled 0.
pub fn symmetrize(events: &[MatchEvent]) -> Vec<LabeledMatchup> {
    events
        .iter()
        .flat_map(|event| {
            let forward = Matchup::new(
                event.winner_id.clone(),
                event.loser_id.clone(),
                Some(event.surface),
            );
            let reverse = forward.reversed();
            [
                LabeledMatchup {
                    matchup: forward,
                    label: 1.0,
                },
                LabeledMatchup {
                    matchup: reverse,
                    label: 0.0,
                },
            ]
        })
        .collect()
}

/// Seeded shuffle of whole matches into (train, validation), so both perspectives of a
/// match always land on the same side.
pub fn split_matches(
    events: &[MatchEvent],
    validation_fraction: f64,
    seed: u64,
) -> (Vec<MatchEvent>, Vec<MatchEvent>) {
    let mut indices: Vec<usize> = (0..events.len()).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let fraction = validation_fraction.clamp(0.0, 1.0);
    let mut validation_len = (events.len() as f64 * fraction).round() as usize;
    // Never leave the training side empty.
    if validation_len >= events.len() {
        validation_len = events.len().saturating_sub(1);
    }

    let (validation_idx, train_idx) = indices.split_at(validation_len);
    let pick = |idx: &[usize]| idx.iter().map(|&i| events[i].clone()).collect::<Vec<_>>();
    (pick(train_idx), pick(validation_idx))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingReport {
    pub matches_used: usize,
    pub train_rows: usize,
    pub validation_rows: usize,
    pub feature_count: usize,
    /// `None` when the validation side is empty.
    pub validation: Option<ClassificationMetrics>,
}

impl TrainingReport {
    pub fn log(&self) {
        info!(
            "  → Trained on {} rows ({} matches), validated on {} rows, {} features",
            self.train_rows, self.matches_used, self.validation_rows, self.feature_count
        );
        match &self.validation {
            Some(metrics) => {
                let auc = metrics
                    .roc_auc
                    .map(|auc| format!("{:.3}", auc))
                    .unwrap_or_else(|| "n/a".to_string());
                info!(
                    "  → Validation accuracy {:.3}, ROC-AUC {}, log loss {:.4}, Brier {:.4}",
                    metrics.accuracy, auc, metrics.log_loss, metrics.brier_score
                );
            }
            None => warn!("  → No validation rows, skipping evaluation"),
        }
    }
}

/// Featurizes the symmetrized match log against `ratings` and fits a fresh artifact.
pub fn train(
    events: &[MatchEvent],
    ratings: &RatingStore,
    attributes: &AttributeTable,
    rating_settings: &RatingSettings,
    model_settings: &ModelSettings,
) -> Result<ModelArtifact> {
    let events: Vec<MatchEvent> = match model_settings.training_since {
        Some(since) => events.iter().filter(|e| e.date >= since).cloned().collect(),
        None => events.to_vec(),
    };
    if events.is_empty() {
        bail!("No matches available for training");
    }

    let (train_events, validation_events) = split_matches(
        &events,
        model_settings.validation_fraction,
        model_settings.split_seed,
    );
    info!(
        "  → Split {} matches into {} train / {} validation",
        events.len(),
        train_events.len(),
        validation_events.len()
    );

    let train_rows = symmetrize(&train_events);
    let validation_rows = symmetrize(&validation_events);

    let builder = FeatureBuilder::new(ratings, attributes, rating_settings.fallback_surface);
    let train_matchups: Vec<Matchup> = train_rows.iter().map(|r| r.matchup.clone()).collect();
    let train_labels: Vec<f64> = train_rows.iter().map(|r| r.label).collect();

    let (pipeline, x_train) = FeaturePipeline::fit(&builder, &train_matchups)
        .context("Failed to fit feature pipeline")?;
    info!(
        "  → Feature schema frozen with {} columns",
        pipeline.schema().len()
    );

    let classifier = ForestClassifier::fit(&x_train, &train_labels, model_settings)?;

    let validation = if validation_rows.is_empty() {
        None
    } else {
        let matchups: Vec<Matchup> = validation_rows.iter().map(|r| r.matchup.clone()).collect();
        let labels: Vec<f64> = validation_rows.iter().map(|r| r.label).collect();
        let x_validation = pipeline.transform_all(&builder, &matchups);
        let probabilities = classifier.predict_proba(&x_validation)?;
        Some(evaluate(&probabilities, &labels))
    };

    let report = TrainingReport {
        matches_used: train_events.len(),
        train_rows: train_rows.len(),
        validation_rows: validation_rows.len(),
        feature_count: pipeline.schema().len(),
        validation,
    };

    Ok(ModelArtifact::new(pipeline, classifier, report)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::PlayerAttributes;
    use crate::rating::{replay_from_scratch, Surface};
    use chrono::NaiveDate;

    fn event(day: u32, winner: &str, loser: &str, surface: Surface) -> MatchEvent {
        MatchEvent {
            date: NaiveDate::from_ymd_opt(2023, 1, day).unwrap(),
            winner_id: winner.to_string(),
            loser_id: loser.to_string(),
            surface,
        }
    }

    fn history() -> Vec<MatchEvent> {
        let surfaces = [Surface::Hard, Surface::Clay, Surface::Grass];
        let mut events = Vec::new();
        for day in 1..=28 {
            let surface = surfaces[day as usize % 3];
            // "ace" beats everyone, "mid" beats "low".
            events.push(event(day, "ace", "mid", surface));
            events.push(event(day, "mid", "low", surface));
            events.push(event(day, "ace", "low", surface));
        }
        events
    }

    fn attributes() -> AttributeTable {
        let mut table = AttributeTable::new();
        for (id, height, plays) in [("ace", 193.0, "R"), ("mid", 183.0, "L"), ("low", 175.0, "R")] {
            table.insert(
                id.to_string(),
                PlayerAttributes {
                    height: Some(height),
                    weight: Some(80.0),
                    plays: Some(plays.to_string()),
                    country: Some("ESP".to_string()),
                    ..Default::default()
                },
            );
        }
        table
    }

    fn small_settings() -> ModelSettings {
        ModelSettings {
            n_trees: 15,
            max_depth: 5,
            min_samples_split: 2,
            min_samples_leaf: 1,
            ..Default::default()
        }
    }

    #[test]
    fn test_symmetrize_doubles_and_balances() {
        let events = history();
        let rows = symmetrize(&events);

        assert_eq!(rows.len(), events.len() * 2);
        let positives = rows.iter().filter(|r| r.label == 1.0).count();
        assert_eq!(positives * 2, rows.len());

        assert_eq!(rows[0].matchup.player1, "ace");
        assert_eq!(rows[1].matchup.player1, "mid");
        assert_eq!(rows[1].label, 0.0);
        assert_eq!(rows[0].matchup.surface, rows[1].matchup.surface);
    }

    #[test]
    fn test_split_is_disjoint_and_seeded() {
        let events = history();
        let (train_a, validation_a) = split_matches(&events, 0.2, 42);
        let (train_b, validation_b) = split_matches(&events, 0.2, 42);

        assert_eq!(train_a.len() + validation_a.len(), events.len());
        assert_eq!(validation_a.len(), 17);
        assert_eq!(train_a, train_b);
        assert_eq!(validation_a, validation_b);
    }

    #[test]
    fn test_split_keeps_a_training_side() {
        let events = vec![event(1, "a", "b", Surface::Hard)];
        let (train, validation) = split_matches(&events, 1.0, 7);
        assert_eq!(train.len(), 1);
        assert!(validation.is_empty());
    }

    #[test]
    fn test_train_produces_consistent_artifact() {
        let events = history();
        let settings = RatingSettings::default();
        let replay = replay_from_scratch(&events, &settings);

        let artifact = train(&events, &replay.store, &attributes(), &settings, &small_settings()).unwrap();

        assert!(artifact.validate().is_ok());
        let report = artifact.report();
        assert_eq!(report.train_rows + report.validation_rows, events.len() * 2);
        assert_eq!(report.feature_count, artifact.pipeline().schema().len());
        assert!(report.validation.is_some());
    }

    #[test]
    fn test_train_respects_cutoff() {
        let events = history();
        let settings = RatingSettings::default();
        let replay = replay_from_scratch(&events, &settings);
        let model_settings = ModelSettings {
            training_since: NaiveDate::from_ymd_opt(2024, 1, 1),
            ..small_settings()
        };

        assert!(train(&events, &replay.store, &attributes(), &settings, &model_settings).is_err());
    }
}
