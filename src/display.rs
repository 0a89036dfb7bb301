//! Human-readable terminal output for the CLI.

use colored::*;

use crate::model::{ClassificationMetrics, TrainingReport};
use crate::predict::Prediction;
use crate::rating::RatingSummary;
use crate::services::BatchOutcome;
use std::path::Path;

pub fn prediction(prediction: &Prediction, surface_label: &str) {
    let winner_probability = if prediction.predicted_winner == prediction.player1 {
        prediction.win_probability
    } else {
        1.0 - prediction.win_probability
    };

    println!();
    println!(
        "{} vs {} on {}",
        prediction.player1.bold(),
        prediction.player2.bold(),
        surface_label.cyan()
    );
    if prediction.surface.is_none() {
        println!("{}", "  (unrecognized surface, encoded as unknown)".yellow());
    }
    println!(
        "  Predicted winner: {} ({:.1}%)",
        prediction.predicted_winner.green().bold(),
        winner_probability * 100.0
    );
    println!(
        "  {}",
        format!(
            "P({} wins) = {:.4}  [forward {:.4}, reverse {:.4}]",
            prediction.player1,
            prediction.win_probability,
            prediction.forward_probability,
            prediction.reverse_probability
        )
        .bright_black()
    );
}

pub fn batch_predictions(outcome: &BatchOutcome, rejected: usize, output: &Path) {
    println!();
    for row in &outcome.rows {
        println!(
            "  {} vs {} on {}: {} ({:.1}%)",
            row.player1,
            row.player2,
            row.surface.cyan(),
            row.predicted_winner.green().bold(),
            row.win_probability * 100.0
        );
    }
    println!(
        "{} {} predictions written to {}",
        "Saved:".green().bold(),
        outcome.rows.len(),
        output.display()
    );
    if outcome.skipped + rejected > 0 {
        println!(
            "{}",
            format!(
                "  {} rows rejected, {} matches with unknown players skipped",
                rejected, outcome.skipped
            )
            .yellow()
        );
    }
}

pub fn metrics(title: &str, metrics: &ClassificationMetrics) {
    println!();
    println!("{}", title.bright_white().bold());
    println!("{}", "─".repeat(40).bright_black());
    println!("{}", metrics);
}

pub fn training_report(report: &TrainingReport) {
    println!();
    println!(
        "{} {} train rows, {} validation rows, {} features",
        "Trained:".green().bold(),
        report.train_rows,
        report.validation_rows,
        report.feature_count
    );
    match &report.validation {
        Some(validation) => metrics("Validation", validation),
        None => println!("{}", "No validation rows".yellow()),
    }
}

pub fn rating_summary(summary: &RatingSummary, rejected: usize) {
    println!();
    println!(
        "{} {} matches, {} players, {} rows rejected",
        "Rated:".green().bold(),
        summary.matches_processed,
        summary.players,
        rejected
    );
    for (surface, mean) in &summary.mean_by_surface {
        println!("  {:<7} mean {:.1}", surface.to_string().cyan(), mean);
    }
    if !summary.top_players.is_empty() {
        println!("{}", "Top players (mean across surfaces):".bright_white());
        for (rank, (player_id, rating)) in summary.top_players.iter().enumerate() {
            println!("  {:>2}. {:<12} {:.1}", rank + 1, player_id, rating);
        }
    }
}
