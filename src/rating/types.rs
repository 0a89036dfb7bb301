use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

pub type PlayerId = String;
pub type RatingValue = f64;

/// Playing surface. Every player carries one rating per surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Surface {
    Carpet,
    Clay,
    Grass,
    Hard,
}

impl Surface {
    pub const ALL: [Surface; 4] = [Surface::Carpet, Surface::Clay, Surface::Grass, Surface::Hard];
    pub const COUNT: usize = Self::ALL.len();

    pub fn index(self) -> usize {
        match self {
            Surface::Carpet => 0,
            Surface::Clay => 1,
            Surface::Grass => 2,
            Surface::Hard => 3,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Surface::Carpet => "Carpet",
            Surface::Clay => "Clay",
            Surface::Grass => "Grass",
            Surface::Hard => "Hard",
        }
    }

    /// Case-insensitive parse; `None` for anything outside the fixed set.
    pub fn parse(label: &str) -> Option<Surface> {
        let trimmed = label.trim();
        Self::ALL
            .into_iter()
            .find(|surface| surface.as_str().eq_ignore_ascii_case(trimmed))
    }

    /// Missing or unrecognized labels map to `fallback` instead of being rejected.
    pub fn parse_or(label: Option<&str>, fallback: Surface) -> Surface {
        label.and_then(Surface::parse).unwrap_or(fallback)
    }
}

impl fmt::Display for Surface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One validated match outcome. Immutable once ingested.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchEvent {
    pub date: NaiveDate,
    pub winner_id: PlayerId,
    pub loser_id: PlayerId,
    pub surface: Surface,
}

/// Before/after ratings of both participants for one applied event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingHistoryEntry {
    pub event_date: NaiveDate,
    pub winner_id: PlayerId,
    pub loser_id: PlayerId,
    pub surface: Surface,
    pub winner_rating_before: RatingValue,
    pub loser_rating_before: RatingValue,
    pub winner_rating_after: RatingValue,
    pub loser_rating_after: RatingValue,
}

/// One row of the rating snapshot output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotRow {
    pub player_id: PlayerId,
    pub surface: Surface,
    pub rating: RatingValue,
}
