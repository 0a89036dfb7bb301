use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::rating::PlayerId;

/// Sentinel used for missing categorical attributes.
pub const UNKNOWN: &str = "unknown";

/// Static attributes of one player. Every field is optional; defaults apply at lookup.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerAttributes {
    pub name: Option<String>,
    pub height: Option<f64>,
    pub weight: Option<f64>,
    pub plays: Option<String>,
    pub country: Option<String>,
}

impl PlayerAttributes {
    pub fn height_or_zero(&self) -> f64 {
        self.height.unwrap_or(0.0)
    }

    pub fn weight_or_zero(&self) -> f64 {
        self.weight.unwrap_or(0.0)
    }

    pub fn plays_or_unknown(&self) -> &str {
        self.plays.as_deref().unwrap_or(UNKNOWN)
    }

    pub fn country_or_unknown(&self) -> &str {
        self.country.as_deref().unwrap_or(UNKNOWN)
    }

    /// Overwrites fields with the present values of `newer`.
    fn merge_from(&mut self, newer: PlayerAttributes) {
        if newer.name.is_some() {
            self.name = newer.name;
        }
        if newer.height.is_some() {
            self.height = newer.height;
        }
        if newer.weight.is_some() {
            self.weight = newer.weight;
        }
        if newer.plays.is_some() {
            self.plays = newer.plays;
        }
        if newer.country.is_some() {
            self.country = newer.country;
        }
    }
}

/// Numeric attribute parsing: blank, non-numeric and non-finite values count as absent.
pub fn parse_numeric(raw: Option<&str>) -> Option<f64> {
    raw.map(str::trim)
        .and_then(|value| value.parse::<f64>().ok())
        .filter(|value| value.is_finite())
}

/// Categorical attribute parsing: blank values count as absent.
pub fn parse_category(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

#[derive(Debug, Clone, Default)]
pub struct AttributeTable {
    players: HashMap<PlayerId, PlayerAttributes>,
}

static EMPTY_ATTRIBUTES: PlayerAttributes = PlayerAttributes {
    name: None,
    height: None,
    weight: None,
    plays: None,
    country: None,
};

impl AttributeTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces whatever was stored for `player_id`.
    pub fn insert(&mut self, player_id: PlayerId, attributes: PlayerAttributes) {
        self.players.insert(player_id, attributes);
    }

    /// Keeps earlier values for fields `attributes` leaves empty.
    pub fn upsert(&mut self, player_id: PlayerId, attributes: PlayerAttributes) {
        self.players
            .entry(player_id)
            .or_default()
            .merge_from(attributes);
    }

    pub fn get(&self, player_id: &str) -> Option<&PlayerAttributes> {
        self.players.get(player_id)
    }

    /// Attributes for `player_id`, or an all-absent record for players not in the table.
    pub fn lookup(&self, player_id: &str) -> &PlayerAttributes {
        self.players.get(player_id).unwrap_or(&EMPTY_ATTRIBUTES)
    }

    pub fn contains(&self, player_id: &str) -> bool {
        self.players.contains_key(player_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PlayerId, &PlayerAttributes)> {
        self.players.iter()
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}
