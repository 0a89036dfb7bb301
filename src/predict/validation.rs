use log::info;

use super::symmetric::SymmetricPredictor;
use crate::errors::PredictionError;
use crate::features::Matchup;
use crate::model::{evaluate, symmetrize, ClassificationMetrics};
use crate::rating::MatchEvent;

/// Replays historical matches through the predictor in both orientations and scores
/// the combined probabilities against what actually happened.
pub fn validate_history(
    predictor: &SymmetricPredictor<'_>,
    events: &[MatchEvent],
) -> Result<ClassificationMetrics, PredictionError> {
    let rows = symmetrize(events);
    let matchups: Vec<Matchup> = rows.iter().map(|row| row.matchup.clone()).collect();
    let labels: Vec<f64> = rows.iter().map(|row| row.label).collect();

    info!(
        "  → Validating {} matches ({} oriented rows)",
        events.len(),
        rows.len()
    );

    let predictions = predictor.predict_batch(&matchups)?;
    let probabilities: Vec<f64> = predictions.iter().map(|p| p.win_probability).collect();

    Ok(evaluate(&probabilities, &labels))
}
