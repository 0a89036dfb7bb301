pub mod batch;
pub mod symmetric;
pub mod validation;

pub use batch::{load_batch, save_predictions, BatchInput, BatchMatch, PredictionRow};
pub use symmetric::{combine, Prediction, SymmetricPredictor};
pub use validation::validate_history;
