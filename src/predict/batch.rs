use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use log::{info, warn};
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufReader, Read, Write};
use std::path::Path;

use super::symmetric::{Prediction, SymmetricPredictor};
use crate::errors::{load_context, save_context, PredictionError};
use crate::features::attributes::parse_category;
use crate::features::Matchup;
use crate::ingestion::MatchRecord;
use crate::rating::Surface;

pub const REQUIRED_COLUMNS: [&str; 3] = ["winner_id", "loser_id", "surface"];

/// One upcoming match from a batch file. The `winner_id` column is read as player1.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchMatch {
    pub line: u64,
    pub matchup: Matchup,
    /// Surface exactly as written, echoed back in the output.
    pub surface_label: String,
}

#[derive(Debug, Default)]
pub struct BatchInput {
    pub matches: Vec<BatchMatch>,
    pub rejected: usize,
}

impl BatchInput {
    fn accept(&mut self, source: &str, line: u64, record: MatchRecord) {
        let (Some(player1), Some(player2)) = (
            parse_category(record.winner_id.as_deref()),
            parse_category(record.loser_id.as_deref()),
        ) else {
            warn!("{}: line {}: missing player id", source, line);
            self.rejected += 1;
            return;
        };
        if player1 == player2 {
            warn!("{}: line {}: {} listed against themselves", source, line, player1);
            self.rejected += 1;
            return;
        }

        let surface_label = record.surface.as_deref().unwrap_or("").trim().to_string();
        let surface = Surface::parse(&surface_label);
        if surface.is_none() {
            warn!(
                "{}: line {}: unrecognized surface {:?}, encoding as unknown",
                source, line, surface_label
            );
        }

        self.matches.push(BatchMatch {
            line,
            matchup: Matchup::new(player1, player2, surface),
            surface_label,
        });
    }
}

/// Reads matches to predict. Missing required columns fail the whole file; bad rows
/// are skipped and counted.
pub fn read_batch<R: Read>(source: &str, reader: R) -> Result<BatchInput> {
    let mut rdr = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let headers = rdr
        .byte_headers()
        .with_context(|| format!("Failed to read CSV headers of {}", source))?
        .clone();

    let missing: Vec<&str> = REQUIRED_COLUMNS
        .into_iter()
        .filter(|column| !headers.iter().any(|h| h == column.as_bytes()))
        .collect();
    if !missing.is_empty() {
        bail!("{} is missing required columns: {}", source, missing.join(", "));
    }

    let mut input = BatchInput::default();
    for result in rdr.byte_records() {
        let record = match result {
            Ok(record) => record,
            Err(e) if e.is_io_error() => {
                return Err(e).with_context(|| format!("Failed to read CSV row in {}", source));
            }
            Err(e) => {
                warn!("{}: unreadable row: {}", source, e);
                input.rejected += 1;
                continue;
            }
        };
        let line = record.position().map(|p| p.line()).unwrap_or_default();

        let parsed: csv::Result<MatchRecord> = record.deserialize(Some(&headers));
        match parsed {
            Ok(row) => input.accept(source, line, row),
            Err(e) => {
                warn!("{}: line {}: unreadable row: {}", source, line, e);
                input.rejected += 1;
            }
        }
    }

    Ok(input)
}

pub fn load_batch(path: &Path) -> Result<BatchInput> {
    let file = File::open(path).with_context(|| load_context("match batch", path))?;
    let input = read_batch(&path.display().to_string(), BufReader::new(file))?;
    info!(
        "  → Loaded {} matches to predict from {} ({} rejected)",
        input.matches.len(),
        path.display(),
        input.rejected
    );
    Ok(input)
}

/// One line of the predictions file. `win_probability` belongs to `predicted_winner`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionRow {
    pub prediction_time: String,
    pub player1: String,
    pub player2: String,
    pub surface: String,
    pub predicted_winner: String,
    pub win_probability: f64,
}

impl PredictionRow {
    pub fn new(batch_match: &BatchMatch, prediction: &Prediction, predicted_at: DateTime<Utc>) -> Self {
        let win_probability = if prediction.predicted_winner == prediction.player1 {
            prediction.win_probability
        } else {
            1.0 - prediction.win_probability
        };

        Self {
            prediction_time: predicted_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            player1: prediction.player1.clone(),
            player2: prediction.player2.clone(),
            surface: batch_match.surface_label.clone(),
            predicted_winner: prediction.predicted_winner.clone(),
            win_probability,
        }
    }
}

/// Scores every match in one batch.
pub fn predict_rows(
    predictor: &SymmetricPredictor<'_>,
    matches: &[BatchMatch],
    predicted_at: DateTime<Utc>,
) -> Result<Vec<PredictionRow>, PredictionError> {
    let matchups: Vec<Matchup> = matches.iter().map(|m| m.matchup.clone()).collect();
    let predictions = predictor.predict_batch(&matchups)?;

    Ok(matches
        .iter()
        .zip(&predictions)
        .map(|(batch_match, prediction)| PredictionRow::new(batch_match, prediction, predicted_at))
        .collect())
}

pub fn write_predictions<W: Write>(rows: &[PredictionRow], writer: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn save_predictions(rows: &[PredictionRow], path: &Path) -> Result<()> {
    let tmp_path = path.with_extension("csv.tmp");
    let file = File::create(&tmp_path).with_context(|| save_context("predictions", &tmp_path))?;
    write_predictions(rows, file).with_context(|| save_context("predictions", &tmp_path))?;
    fs::rename(&tmp_path, path).with_context(|| save_context("predictions", path))?;
    info!("  → Saved {} predictions to {}", rows.len(), path.display());
    Ok(())
}
