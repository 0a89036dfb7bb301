use std::collections::HashMap;

use super::types::{PlayerId, RatingValue, SnapshotRow, Surface};

pub type SurfaceRatings = [RatingValue; Surface::COUNT];

/// Current rating of every seen player on every surface.
///
/// Players that were never recorded are implicitly at `initial_rating`.
/// Lookups never insert; only the rating engine writes through `record`.
/// `version` counts applied writes so readers can tell snapshots apart.
#[derive(Debug, Clone, PartialEq)]
pub struct RatingStore {
    initial_rating: RatingValue,
    version: u64,
    ratings: HashMap<PlayerId, SurfaceRatings>,
}

impl RatingStore {
    pub fn new(initial_rating: RatingValue) -> Self {
        Self {
            initial_rating,
            version: 0,
            ratings: HashMap::new(),
        }
    }

    /// Rebuilds a store from persisted snapshot rows.
    pub fn from_rows(rows: &[SnapshotRow], initial_rating: RatingValue, version: u64) -> Self {
        let mut ratings: HashMap<PlayerId, SurfaceRatings> = HashMap::new();
        for row in rows {
            let entry = ratings
                .entry(row.player_id.clone())
                .or_insert([initial_rating; Surface::COUNT]);
            entry[row.surface.index()] = row.rating;
        }

        Self {
            initial_rating,
            version,
            ratings,
        }
    }

    pub fn get_rating(&self, player_id: &str, surface: Surface) -> RatingValue {
        self.ratings
            .get(player_id)
            .map(|surfaces| surfaces[surface.index()])
            .unwrap_or(self.initial_rating)
    }

    pub fn surface_ratings(&self, player_id: &str) -> SurfaceRatings {
        self.ratings
            .get(player_id)
            .copied()
            .unwrap_or([self.initial_rating; Surface::COUNT])
    }

    pub fn contains(&self, player_id: &str) -> bool {
        self.ratings.contains_key(player_id)
    }

    pub fn initial_rating(&self) -> RatingValue {
        self.initial_rating
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn len(&self) -> usize {
        self.ratings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ratings.is_empty()
    }

    pub fn players(&self) -> impl Iterator<Item = (&PlayerId, &SurfaceRatings)> {
        self.ratings.iter()
    }

    /// One row per player per surface, ordered by player id then surface.
    pub fn snapshot_rows(&self) -> Vec<SnapshotRow> {
        let mut player_ids: Vec<&PlayerId> = self.ratings.keys().collect();
        player_ids.sort_unstable();

        player_ids
            .into_iter()
            .flat_map(|player_id| {
                let surfaces = self.ratings[player_id];
                Surface::ALL.into_iter().map(move |surface| SnapshotRow {
                    player_id: player_id.clone(),
                    surface,
                    rating: surfaces[surface.index()],
                })
            })
            .collect()
    }

    /// First write for a player initializes all of its surfaces to the default.
    pub(crate) fn record(&mut self, player_id: &str, surface: Surface, rating: RatingValue) {
        let initial_rating = self.initial_rating;
        let surfaces = self
            .ratings
            .entry(player_id.to_string())
            .or_insert([initial_rating; Surface::COUNT]);
        surfaces[surface.index()] = rating;
        self.version += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_player_is_at_default_on_every_surface() {
        let store = RatingStore::new(1000.0);
        for surface in Surface::ALL {
            assert_eq!(store.get_rating("never-seen", surface), 1000.0);
        }
        assert_eq!(store.surface_ratings("never-seen"), [1000.0; 4]);
    }

    #[test]
    fn test_lookup_does_not_insert() {
        let store = RatingStore::new(1000.0);
        let _ = store.get_rating("ghost", Surface::Clay);
        assert!(store.is_empty());
        assert!(!store.contains("ghost"));
    }

    #[test]
    fn test_record_initializes_other_surfaces_lazily() {
        let mut store = RatingStore::new(1000.0);
        store.record("p1", Surface::Grass, 1040.0);

        assert_eq!(store.get_rating("p1", Surface::Grass), 1040.0);
        assert_eq!(store.get_rating("p1", Surface::Hard), 1000.0);
        assert_eq!(store.version(), 1);
    }

    #[test]
    fn test_snapshot_rows_round_trip() {
        let mut store = RatingStore::new(1000.0);
        store.record("b", Surface::Clay, 990.0);
        store.record("a", Surface::Hard, 1010.0);

        let rows = store.snapshot_rows();
        assert_eq!(rows.len(), 8);
        assert_eq!(rows[0].player_id, "a");

        let rebuilt = RatingStore::from_rows(&rows, 1000.0, store.version());
        assert_eq!(rebuilt, store);
    }
}
