pub mod elo;
pub mod engine;
pub mod store;
pub mod summary;
pub mod types;

pub use engine::{replay_from_scratch, RatingEngine, RatingReplay};
pub use store::{RatingStore, SurfaceRatings};
pub use summary::{summarize, RatingSummary};
pub use types::{MatchEvent, PlayerId, RatingHistoryEntry, RatingValue, SnapshotRow, Surface};
