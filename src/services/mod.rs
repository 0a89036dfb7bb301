pub mod context;
pub mod rating;
pub mod server;
pub mod training;

pub use context::{load_or_train, rebuild, BatchOutcome, PredictionContext, SharedContext};
pub use rating::{RatingRun, RatingService};
pub use server::ServerService;
pub use training::{TrainingInputs, TrainingService};
