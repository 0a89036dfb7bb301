use log::info;

use super::store::RatingStore;
use super::types::{PlayerId, RatingValue, Surface};

#[derive(Debug, Clone)]
pub struct RatingSummary {
    pub matches_processed: usize,
    pub players: usize,
    pub mean_by_surface: Vec<(Surface, RatingValue)>,
    pub top_players: Vec<(PlayerId, RatingValue)>,
}

pub fn summarize(store: &RatingStore, matches_processed: usize, top_n: usize) -> RatingSummary {
    RatingSummary {
        matches_processed,
        players: store.len(),
        mean_by_surface: mean_by_surface(store),
        top_players: top_players_by_mean(store, top_n),
    }
}

fn mean_by_surface(store: &RatingStore) -> Vec<(Surface, RatingValue)> {
    if store.is_empty() {
        return Vec::new();
    }

    Surface::ALL
        .into_iter()
        .map(|surface| {
            let sum: f64 = store.players().map(|(_, r)| r[surface.index()]).sum();
            (surface, sum / store.len() as f64)
        })
        .collect()
}

fn top_players_by_mean(store: &RatingStore, top_n: usize) -> Vec<(PlayerId, RatingValue)> {
    let mut averages: Vec<(PlayerId, RatingValue)> = store
        .players()
        .map(|(id, ratings)| {
            let mean = ratings.iter().sum::<f64>() / ratings.len() as f64;
            (id.clone(), mean)
        })
        .collect();

    // Ties broken by id so the listing is stable across runs.
    averages.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    averages.truncate(top_n);
    averages
}

impl RatingSummary {
    pub fn log(&self) {
        info!("Rating statistics:");
        info!("  → Total matches processed: {}", self.matches_processed);
        info!("  → Total unique players: {}", self.players);
        for (surface, mean) in &self.mean_by_surface {
            info!("  → Average rating on {}: {:.2}", surface, mean);
        }
        info!("Top {} players by average rating:", self.top_players.len());
        for (rank, (player_id, mean)) in self.top_players.iter().enumerate() {
            info!("  {:>2}. {} ({:.2})", rank + 1, player_id, mean);
        }
    }
}
