pub mod matches;
pub mod players;

pub use matches::{load_match_log, parse_match_date, MatchLog, MatchRecord};
pub use players::{derive_from_matches, load_attribute_table, load_or_derive, save_attribute_table};
