use log::info;

use super::elo;
use super::store::RatingStore;
use super::types::{MatchEvent, RatingHistoryEntry};
use crate::config::RatingSettings;

/// Result of replaying a match log against a rating store.
#[derive(Debug, Clone)]
pub struct RatingReplay {
    pub store: RatingStore,
    pub history: Vec<RatingHistoryEntry>,
}

/// Sequential Elo updater.
///
/// Events are applied exactly in the order given; the caller is responsible for
/// handing them over in non-decreasing date order. Nothing is buffered or resorted.
pub struct RatingEngine {
    k_factor: f64,
}

impl RatingEngine {
    pub fn new(settings: &RatingSettings) -> Self {
        Self {
            k_factor: settings.k_factor,
        }
    }

    /// Applies one event and returns its history entry.
    pub fn apply(&self, store: &mut RatingStore, event: &MatchEvent) -> RatingHistoryEntry {
        let winner_before = store.get_rating(&event.winner_id, event.surface);
        let loser_before = store.get_rating(&event.loser_id, event.surface);

        let (winner_after, loser_after) = elo::update(winner_before, loser_before, self.k_factor);

        store.record(&event.winner_id, event.surface, winner_after);
        store.record(&event.loser_id, event.surface, loser_after);

        RatingHistoryEntry {
            event_date: event.date,
            winner_id: event.winner_id.clone(),
            loser_id: event.loser_id.clone(),
            surface: event.surface,
            winner_rating_before: winner_before,
            loser_rating_before: loser_before,
            winner_rating_after: winner_after,
            loser_rating_after: loser_after,
        }
    }

    /// Takes ownership of `store`, applies every event in order and hands the store back
    /// together with one history entry per event.
    pub fn replay(&self, mut store: RatingStore, events: &[MatchEvent]) -> RatingReplay {
        info!("Replaying {} matches (k = {})", events.len(), self.k_factor);

        let history = events
            .iter()
            .map(|event| self.apply(&mut store, event))
            .collect();

        RatingReplay { store, history }
    }
}

/// Replays `events` against a fresh cold-start store.
pub fn replay_from_scratch(events: &[MatchEvent], settings: &RatingSettings) -> RatingReplay {
    let engine = RatingEngine::new(settings);
    engine.replay(RatingStore::new(settings.initial_rating), events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rating::types::Surface;
    use chrono::NaiveDate;

    fn event(day: u32, winner: &str, loser: &str, surface: Surface) -> MatchEvent {
        MatchEvent {
            date: NaiveDate::from_ymd_opt(2023, 1, day).unwrap(),
            winner_id: winner.to_string(),
            loser_id: loser.to_string(),
            surface,
        }
    }

    fn settings() -> RatingSettings {
        RatingSettings::default()
    }

    #[test]
    fn test_single_event_history_entry() {
        let replay = replay_from_scratch(&[event(1, "p1", "p2", Surface::Clay)], &settings());

        assert_eq!(replay.history.len(), 1);
        let entry = &replay.history[0];
        assert_eq!(entry.winner_rating_before, 1000.0);
        assert_eq!(entry.loser_rating_before, 1000.0);
        assert_eq!(entry.winner_rating_after, 1016.0);
        assert_eq!(entry.loser_rating_after, 984.0);
        assert_eq!(replay.store.get_rating("p1", Surface::Clay), 1016.0);
        assert_eq!(replay.store.get_rating("p1", Surface::Hard), 1000.0);
    }

    #[test]
    fn test_history_is_one_to_one_with_events() {
        let events = vec![
            event(1, "a", "b", Surface::Hard),
            event(2, "b", "c", Surface::Grass),
            event(3, "c", "a", Surface::Hard),
            event(4, "a", "c", Surface::Carpet),
        ];
        let replay = replay_from_scratch(&events, &settings());

        assert_eq!(replay.history.len(), events.len());
        for (entry, event) in replay.history.iter().zip(&events) {
            assert_eq!(entry.winner_id, event.winner_id);
            assert_eq!(entry.loser_id, event.loser_id);
            assert_eq!(entry.surface, event.surface);
        }
    }

    #[test]
    fn test_replay_is_deterministic() {
        let events = vec![
            event(1, "a", "b", Surface::Hard),
            event(2, "c", "a", Surface::Hard),
            event(3, "b", "c", Surface::Clay),
            event(4, "a", "c", Surface::Hard),
            event(5, "b", "a", Surface::Grass),
        ];

        let first = replay_from_scratch(&events, &settings());
        let second = replay_from_scratch(&events, &settings());

        assert_eq!(first.store, second.store);
        assert_eq!(first.store.snapshot_rows(), second.store.snapshot_rows());
        assert_eq!(first.history, second.history);
    }

    #[test]
    fn test_replay_is_order_sensitive() {
        let original = vec![
            event(1, "a", "b", Surface::Hard),
            event(2, "a", "c", Surface::Hard),
        ];
        let reversed: Vec<MatchEvent> = original.iter().rev().cloned().collect();
        let mixed = vec![
            event(1, "a", "b", Surface::Hard),
            event(2, "b", "a", Surface::Hard),
        ];
        let mixed_reversed: Vec<MatchEvent> = mixed.iter().rev().cloned().collect();

        let in_order = replay_from_scratch(&mixed, &settings());
        let out_of_order = replay_from_scratch(&mixed_reversed, &settings());
        assert_ne!(in_order.store.snapshot_rows(), out_of_order.store.snapshot_rows());

        // Same winner twice: the second gain shrinks, so the opponents end up differently.
        let forward = replay_from_scratch(&original, &settings());
        let backward = replay_from_scratch(&reversed, &settings());
        assert_ne!(
            forward.store.get_rating("b", Surface::Hard),
            backward.store.get_rating("b", Surface::Hard)
        );
    }

    #[test]
    fn test_cold_start_for_absent_player() {
        let replay = replay_from_scratch(&[event(1, "a", "b", Surface::Hard)], &settings());
        for surface in Surface::ALL {
            assert_eq!(replay.store.get_rating("zzz", surface), 1000.0);
        }
    }

    #[test]
    fn test_three_match_scenario_orders_players() {
        let events = vec![
            event(1, "P1", "P2", Surface::Hard),
            event(2, "P2", "P3", Surface::Hard),
            event(3, "P1", "P3", Surface::Hard),
        ];
        let replay = replay_from_scratch(&events, &settings());
        let p1 = replay.store.get_rating("P1", Surface::Hard);
        let p2 = replay.store.get_rating("P2", Surface::Hard);
        let p3 = replay.store.get_rating("P3", Surface::Hard);

        assert!(p1 > p3);
        assert!(p2 < p1 && p2 > p3);
    }
}
