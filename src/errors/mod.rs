use std::path::Path;
use thiserror::Error;

use crate::rating::PlayerId;

/// A match or request record that must not reach the rating engine or feature builder.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("line {line}: missing winner identifier")]
    MissingWinner { line: u64 },
    #[error("line {line}: missing loser identifier")]
    MissingLoser { line: u64 },
    #[error("line {line}: winner and loser are both {player_id}")]
    SelfMatch { line: u64, player_id: PlayerId },
    #[error("line {line}: unparseable match date {value:?}")]
    InvalidDate { line: u64, value: String },
}

/// An outcome model artifact whose parts do not belong together.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ArtifactError {
    #[error("artifact format version {found} is not supported (expected {expected})")]
    FormatVersion { expected: u32, found: u32 },
    #[error("classifier expects {classifier} features but the schema has {schema} columns")]
    FeatureCount { classifier: usize, schema: usize },
    #[error("scaler column {0:?} is not part of the feature schema")]
    ScalerColumn(String),
    #[error("scaler was fitted on {scaler} columns but the schema declares {schema} numeric columns")]
    ScalerWidth { scaler: usize, schema: usize },
    #[error("surface encoder column {0:?} is not part of the feature schema")]
    EncoderColumn(String),
    #[error("schema fingerprint {found:016x} does not match the recorded {expected:016x}")]
    Fingerprint { expected: u64, found: u64 },
}

/// Failures reported at the prediction boundary.
#[derive(Debug, Error)]
pub enum PredictionError {
    #[error("could not find player(s): {}", .0.join(", "))]
    UnknownPlayers(Vec<PlayerId>),
    #[error("a player cannot be matched against themselves: {0}")]
    SamePlayer(PlayerId),
    #[error(transparent)]
    Artifact(#[from] ArtifactError),
    #[error("outcome model failed: {0}")]
    Model(String),
}

/// Add context to file loading errors
pub fn load_context(data_type: &str, path: &Path) -> String {
    format!("Failed to load {} from {}", data_type, path.display())
}

/// Add context to file writing errors
pub fn save_context(data_type: &str, path: &Path) -> String {
    format!("Failed to save {} to {}", data_type, path.display())
}
