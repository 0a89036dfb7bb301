pub mod settings;

pub use settings::{AppConfig, ModelSettings, PathSettings, RatingSettings, ServerSettings};
