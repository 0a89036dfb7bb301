use anyhow::{anyhow, bail, Result};
use log::info;
use serde::{Deserialize, Serialize};
use smartcore::ensemble::random_forest_regressor::{
    RandomForestRegressor, RandomForestRegressorParameters,
};
use smartcore::linalg::basic::matrix::DenseMatrix;

use crate::config::ModelSettings;

/// Anything that turns schema-ordered feature rows into P(player1 wins).
pub trait OutcomeModel: Send + Sync {
    fn n_features(&self) -> usize;

    fn predict_proba(&self, rows: &[Vec<f64>]) -> Result<Vec<f64>>;

    fn name(&self) -> &str;
}

type Forest = RandomForestRegressor<f64, f64, DenseMatrix<f64>, Vec<f64>>;

/// Random forest fitted on 0/1 outcomes. The mean leaf value across trees is the
/// share of winning training rows that landed with the query, read as a probability.
#[derive(Serialize, Deserialize)]
pub struct ForestClassifier {
    forest: Forest,
    n_features: usize,
}

impl ForestClassifier {
    pub fn fit(rows: &[Vec<f64>], labels: &[f64], settings: &ModelSettings) -> Result<Self> {
        if rows.is_empty() {
            bail!("Cannot train outcome model on zero rows");
        }
        if rows.len() != labels.len() {
            bail!("Got {} feature rows for {} labels", rows.len(), labels.len());
        }

        let n_features = rows[0].len();
        let x = DenseMatrix::from_2d_vec(&rows.to_vec())
            .map_err(|e| anyhow!("Matrix error: {}", e))?;

        let params = RandomForestRegressorParameters::default()
            .with_n_trees(settings.n_trees)
            .with_max_depth(settings.max_depth)
            .with_min_samples_split(settings.min_samples_split)
            .with_min_samples_leaf(settings.min_samples_leaf)
            .with_seed(settings.split_seed);

        info!(
            "  → Fitting random forest (trees: {}, depth: {}, min split: {}, min leaf: {}) on {} rows x {} features",
            settings.n_trees,
            settings.max_depth,
            settings.min_samples_split,
            settings.min_samples_leaf,
            rows.len(),
            n_features
        );

        let forest = Forest::fit(&x, &labels.to_vec(), params)
            .map_err(|e| anyhow!("Training error: {}", e))?;

        Ok(Self { forest, n_features })
    }
}

impl OutcomeModel for ForestClassifier {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn predict_proba(&self, rows: &[Vec<f64>]) -> Result<Vec<f64>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        if let Some(row) = rows.iter().find(|row| row.len() != self.n_features) {
            bail!(
                "Feature row has {} values, model expects {}",
                row.len(),
                self.n_features
            );
        }

        let x = DenseMatrix::from_2d_vec(&rows.to_vec())
            .map_err(|e| anyhow!("Matrix error: {}", e))?;
        let predictions = self
            .forest
            .predict(&x)
            .map_err(|e| anyhow!("Predict error: {}", e))?;

        Ok(predictions.into_iter().map(|p| p.clamp(0.0, 1.0)).collect())
    }

    fn name(&self) -> &str {
        "Random Forest"
    }
}
