use super::types::RatingValue;

/// Expected score of `rating` against `opponent_rating` on the 400-point logistic scale.
pub fn expected_score(rating: RatingValue, opponent_rating: RatingValue) -> f64 {
    1.0 / (1.0 + 10f64.powf((opponent_rating - rating) / 400.0))
}

/// Returns `(new_winner_rating, new_loser_rating)` after one decided match.
pub fn update(
    winner_rating: RatingValue,
    loser_rating: RatingValue,
    k_factor: f64,
) -> (RatingValue, RatingValue) {
    let expected_winner = expected_score(winner_rating, loser_rating);
    let expected_loser = 1.0 - expected_winner;

    let winner_new = winner_rating + k_factor * (1.0 - expected_winner);
    let loser_new = loser_rating + k_factor * (0.0 - expected_loser);

    (winner_new, loser_new)
}
