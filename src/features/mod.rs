pub mod attributes;
pub mod builder;
pub mod encoder;
pub mod scaler;
pub mod schema;

pub use attributes::{AttributeTable, PlayerAttributes, UNKNOWN};
pub use builder::{FeatureBuilder, FeaturePipeline, FeatureVector, Matchup, NUMERIC_COLUMNS};
pub use encoder::SurfaceEncoder;
pub use scaler::StandardScaler;
pub use schema::{FeatureRow, FeatureSchema, SchemaDrift, FEATURE_SCHEMA_VERSION};
