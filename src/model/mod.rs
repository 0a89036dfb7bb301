pub mod artifact;
pub mod classifier;
pub mod metrics;
pub mod training;

pub use artifact::{ModelArtifact, ARTIFACT_FORMAT_VERSION};
pub use classifier::{ForestClassifier, OutcomeModel};
pub use metrics::{evaluate, ClassificationMetrics, ConfusionMatrix};
pub use training::{split_matches, symmetrize, train, LabeledMatchup, TrainingReport};
