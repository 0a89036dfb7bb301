use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use log::info;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use super::classifier::{ForestClassifier, OutcomeModel};
use super::training::TrainingReport;
use crate::errors::{load_context, save_context, ArtifactError};
use crate::features::FeaturePipeline;

pub const ARTIFACT_FORMAT_VERSION: u32 = 1;

/// Classifier plus the preprocessing it was trained behind. Only ever handed out
/// after `validate` has passed.
#[derive(Serialize, Deserialize)]
pub struct ModelArtifact {
    format_version: u32,
    trained_at: DateTime<Utc>,
    schema_fingerprint: u64,
    pipeline: FeaturePipeline,
    classifier: ForestClassifier,
    report: TrainingReport,
}

impl ModelArtifact {
    pub fn new(
        pipeline: FeaturePipeline,
        classifier: ForestClassifier,
        report: TrainingReport,
    ) -> Result<Self, ArtifactError> {
        let artifact = Self {
            format_version: ARTIFACT_FORMAT_VERSION,
            trained_at: Utc::now(),
            schema_fingerprint: pipeline.schema().fingerprint(),
            pipeline,
            classifier,
            report,
        };
        artifact.validate()?;
        Ok(artifact)
    }

    pub fn validate(&self) -> Result<(), ArtifactError> {
        if self.format_version != ARTIFACT_FORMAT_VERSION {
            return Err(ArtifactError::FormatVersion {
                expected: ARTIFACT_FORMAT_VERSION,
                found: self.format_version,
            });
        }

        let schema = self.pipeline.schema();
        let fingerprint = schema.fingerprint();
        if fingerprint != self.schema_fingerprint {
            return Err(ArtifactError::Fingerprint {
                expected: self.schema_fingerprint,
                found: fingerprint,
            });
        }

        if self.classifier.n_features() != schema.len() {
            return Err(ArtifactError::FeatureCount {
                classifier: self.classifier.n_features(),
                schema: schema.len(),
            });
        }

        self.pipeline.validate()
    }

    pub fn pipeline(&self) -> &FeaturePipeline {
        &self.pipeline
    }

    pub fn model(&self) -> &dyn OutcomeModel {
        &self.classifier
    }

    pub fn report(&self) -> &TrainingReport {
        &self.report
    }

    pub fn format_version(&self) -> u32 {
        self.format_version
    }

    pub fn trained_at(&self) -> DateTime<Utc> {
        self.trained_at
    }

    pub fn schema_fingerprint(&self) -> u64 {
        self.schema_fingerprint
    }

    /// Writes next to `path` and renames over it, so readers never see half a file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).with_context(|| save_context("model artifact", path))?;
        }

        let tmp_path = path.with_extension("json.tmp");
        {
            let file = File::create(&tmp_path)
                .with_context(|| save_context("model artifact", &tmp_path))?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer(&mut writer, self)
                .with_context(|| save_context("model artifact", &tmp_path))?;
            writer
                .flush()
                .with_context(|| save_context("model artifact", &tmp_path))?;
        }

        fs::rename(&tmp_path, path).with_context(|| {
            format!(
                "Failed to move model artifact from {} to {}",
                tmp_path.display(),
                path.display()
            )
        })?;

        info!("  → Model artifact saved to {}", path.display());
        Ok(())
    }

    /// Loads and validates; an inconsistent artifact is refused.
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| load_context("model artifact", path))?;
        let artifact: Self = serde_json::from_reader(BufReader::new(file))
            .with_context(|| load_context("model artifact", path))?;
        artifact
            .validate()
            .with_context(|| format!("Model artifact at {} is inconsistent", path.display()))?;

        info!(
            "  → Loaded model artifact trained at {} ({} features)",
            artifact.trained_at.format("%Y-%m-%d %H:%M:%S"),
            artifact.pipeline.schema().len()
        );
        Ok(artifact)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ModelSettings, RatingSettings};
    use crate::features::AttributeTable;
    use crate::model::training::train;
    use crate::rating::{replay_from_scratch, MatchEvent, Surface};
    use chrono::NaiveDate;
    use std::path::PathBuf;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("tennis_prediction_{}_{}", std::process::id(), name))
    }

    fn trained() -> ModelArtifact {
        let mut events = Vec::new();
        for day in 1..=20 {
            let date = NaiveDate::from_ymd_opt(2022, 3, day).unwrap();
            for (winner, loser) in [("a", "b"), ("b", "c"), ("a", "c")] {
                events.push(MatchEvent {
                    date,
                    winner_id: winner.to_string(),
                    loser_id: loser.to_string(),
                    surface: Surface::Clay,
                });
            }
        }
        let rating_settings = RatingSettings::default();
        let model_settings = ModelSettings {
            n_trees: 5,
            max_depth: 3,
            min_samples_split: 2,
            min_samples_leaf: 1,
            ..Default::default()
        };
        let replay = replay_from_scratch(&events, &rating_settings);
        train(
            &events,
            &replay.store,
            &AttributeTable::new(),
            &rating_settings,
            &model_settings,
        )
        .unwrap()
    }

    #[test]
    fn test_save_and_load() {
        let artifact = trained();
        let path = temp_path("artifact.json");

        artifact.save(&path).unwrap();
        assert!(!path.with_extension("json.tmp").exists());

        let loaded = ModelArtifact::load(&path).unwrap();
        assert_eq!(loaded.pipeline(), artifact.pipeline());
        assert_eq!(loaded.schema_fingerprint(), artifact.schema_fingerprint());

        let row = vec![0.0; artifact.pipeline().schema().len()];
        assert_eq!(
            loaded.model().predict_proba(&[row.clone()]).unwrap(),
            artifact.model().predict_proba(&[row]).unwrap()
        );

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_unsupported_version_is_refused() {
        let mut artifact = trained();
        artifact.format_version = 99;
        assert_eq!(
            artifact.validate(),
            Err(ArtifactError::FormatVersion {
                expected: ARTIFACT_FORMAT_VERSION,
                found: 99
            })
        );
    }

    #[test]
    fn test_fingerprint_mismatch_is_refused() {
        let mut artifact = trained();
        artifact.schema_fingerprint ^= 1;
        assert!(matches!(
            artifact.validate(),
            Err(ArtifactError::Fingerprint { .. })
        ));
    }

    #[test]
    fn test_corrupt_file_fails_to_load() {
        let path = temp_path("corrupt.json");
        std::fs::write(&path, b"{ not json").unwrap();
        assert!(ModelArtifact::load(&path).is_err());
        std::fs::remove_file(&path).ok();
    }
}
