use log::debug;
use serde::Serialize;

use crate::errors::PredictionError;
use crate::features::{FeatureBuilder, FeaturePipeline, Matchup};
use crate::model::{ModelArtifact, OutcomeModel};
use crate::rating::{PlayerId, Surface};

/// Combined outcome for one matchup. `win_probability` is P(player1 wins).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub player1: PlayerId,
    pub player2: PlayerId,
    pub surface: Option<Surface>,
    pub predicted_winner: PlayerId,
    pub win_probability: f64,
    /// P(player1 wins) with player1 in the first slot.
    pub forward_probability: f64,
    /// P(player2 wins) with the slots swapped.
    pub reverse_probability: f64,
}

/// `(p_fwd + (1 - p_rev)) / 2`, so scoring (A, B) and (B, A) always sums to one.
pub fn combine(forward: f64, reverse: f64) -> f64 {
    (forward + (1.0 - reverse)) / 2.0
}

/// Scores every matchup in both slot orders and averages out positional bias.
/// Holds only shared references; safe to use from many threads at once.
pub struct SymmetricPredictor<'a> {
    builder: FeatureBuilder<'a>,
    pipeline: &'a FeaturePipeline,
    model: &'a dyn OutcomeModel,
}

impl<'a> SymmetricPredictor<'a> {
    pub fn new(
        builder: FeatureBuilder<'a>,
        pipeline: &'a FeaturePipeline,
        model: &'a dyn OutcomeModel,
    ) -> Self {
        Self {
            builder,
            pipeline,
            model,
        }
    }

    pub fn from_artifact(builder: FeatureBuilder<'a>, artifact: &'a ModelArtifact) -> Self {
        Self::new(builder, artifact.pipeline(), artifact.model())
    }

    pub fn predict(&self, matchup: &Matchup) -> Result<Prediction, PredictionError> {
        let mut predictions = self.predict_batch(std::slice::from_ref(matchup))?;
        predictions
            .pop()
            .ok_or_else(|| PredictionError::Model("no prediction returned".to_string()))
    }

    pub fn predict_batch(&self, matchups: &[Matchup]) -> Result<Vec<Prediction>, PredictionError> {
        if matchups.is_empty() {
            return Ok(Vec::new());
        }

        let forward_rows: Vec<Vec<f64>> = matchups
            .iter()
            .map(|m| self.pipeline.transform(&self.builder, m).values)
            .collect();
        let reverse_rows: Vec<Vec<f64>> = matchups
            .iter()
            .map(|m| self.pipeline.transform(&self.builder, &m.reversed()).values)
            .collect();

        let forward = self.score(&forward_rows)?;
        let reverse = self.score(&reverse_rows)?;

        Ok(matchups
            .iter()
            .zip(forward.into_iter().zip(reverse))
            .map(|(matchup, (p_fwd, p_rev))| {
                let win_probability = combine(p_fwd, p_rev);
                debug!(
                    "{} vs {}: forward {:.4}, reverse {:.4}, combined {:.4}",
                    matchup.player1, matchup.player2, p_fwd, p_rev, win_probability
                );

                // Exactly 0.5 goes to player2.
                let predicted_winner = if win_probability > 0.5 {
                    matchup.player1.clone()
                } else {
                    matchup.player2.clone()
                };

                Prediction {
                    player1: matchup.player1.clone(),
                    player2: matchup.player2.clone(),
                    surface: matchup.surface,
                    predicted_winner,
                    win_probability,
                    forward_probability: p_fwd,
                    reverse_probability: p_rev,
                }
            })
            .collect())
    }

    fn score(&self, rows: &[Vec<f64>]) -> Result<Vec<f64>, PredictionError> {
        let probabilities = self
            .model
            .predict_proba(rows)
            .map_err(|e| PredictionError::Model(e.to_string()))?;
        if probabilities.len() != rows.len() {
            return Err(PredictionError::Model(format!(
                "model returned {} probabilities for {} rows",
                probabilities.len(),
                rows.len()
            )));
        }
        Ok(probabilities)
    }
}
