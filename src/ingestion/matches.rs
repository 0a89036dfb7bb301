use anyhow::{Context, Result};
use chrono::NaiveDate;
use log::{debug, info, warn};
use serde::Deserialize;
use std::fs::{self, File};
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use crate::errors::{load_context, ValidationError};
use crate::rating::{MatchEvent, Surface};

/// Raw match row. Columns vary across seasons, so every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct MatchRecord {
    pub tourney_date: Option<String>,
    pub surface: Option<String>,
    pub winner_id: Option<String>,
    pub loser_id: Option<String>,
    pub winner_name: Option<String>,
    pub loser_name: Option<String>,
    pub winner_ht: Option<String>,
    pub loser_ht: Option<String>,
    pub winner_wt: Option<String>,
    pub loser_wt: Option<String>,
    pub winner_hand: Option<String>,
    pub loser_hand: Option<String>,
    pub winner_ioc: Option<String>,
    pub loser_ioc: Option<String>,
}

impl MatchRecord {
    /// Validates the row into an event. Only the surface is defaulted; identifiers and
    /// date must be present.
    pub fn to_event(&self, line: u64, fallback_surface: Surface) -> Result<MatchEvent, ValidationError> {
        let winner_id = non_blank(&self.winner_id).ok_or(ValidationError::MissingWinner { line })?;
        let loser_id = non_blank(&self.loser_id).ok_or(ValidationError::MissingLoser { line })?;
        if winner_id == loser_id {
            return Err(ValidationError::SelfMatch {
                line,
                player_id: winner_id.to_string(),
            });
        }

        let raw_date = self.tourney_date.as_deref().unwrap_or("");
        let date = parse_match_date(raw_date).ok_or_else(|| ValidationError::InvalidDate {
            line,
            value: raw_date.to_string(),
        })?;

        Ok(MatchEvent {
            date,
            winner_id: winner_id.to_string(),
            loser_id: loser_id.to_string(),
            surface: Surface::parse_or(self.surface.as_deref(), fallback_surface),
        })
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Accepts `YYYYMMDD` and `YYYY-MM-DD`.
pub fn parse_match_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    // Some exports write the compact form as a float.
    let raw = raw.strip_suffix(".0").unwrap_or(raw);
    NaiveDate::parse_from_str(raw, "%Y%m%d")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%Y-%m-%d"))
        .ok()
}

/// Validated events in non-decreasing date order, plus the raw rows that produced them.
/// `records[i]` is always the row behind `events[i]`.
#[derive(Debug, Default)]
pub struct MatchLog {
    pub events: Vec<MatchEvent>,
    pub records: Vec<MatchRecord>,
    pub rejected: usize,
    pub files: usize,
}

impl MatchLog {
    /// Stable, so rows on the same date keep their file order. Records move with
    /// their events.
    pub(crate) fn sort_by_date(&mut self) {
        let mut paired: Vec<(MatchEvent, MatchRecord)> = self
            .events
            .drain(..)
            .zip(self.records.drain(..))
            .collect();
        paired.sort_by_key(|(event, _)| event.date);
        (self.events, self.records) = paired.into_iter().unzip();
    }

    /// Reads one CSV source, appending accepted rows and counting rejected ones.
    pub fn read_source<R: Read>(&mut self, source: &str, reader: R, fallback_surface: Surface) -> Result<()> {
        let mut rdr = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(reader);
        let headers = rdr
            .byte_headers()
            .with_context(|| format!("Failed to read CSV headers of {}", source))?
            .clone();

        // Byte records, so a bad encoding in one row only rejects that row.
        for result in rdr.byte_records() {
            let record = match result {
                Ok(record) => record,
                Err(e) if e.is_io_error() => {
                    return Err(e).with_context(|| format!("Failed to read CSV row in {}", source));
                }
                Err(e) => {
                    warn!("{}: unreadable row: {}", source, e);
                    self.rejected += 1;
                    continue;
                }
            };
            let line = record.position().map(|p| p.line()).unwrap_or_default();

            let row: MatchRecord = match record.deserialize(Some(&headers)) {
                Ok(row) => row,
                Err(e) => {
                    warn!("{}: line {}: unreadable row: {}", source, line, e);
                    self.rejected += 1;
                    continue;
                }
            };

            match row.to_event(line, fallback_surface) {
                Ok(event) => {
                    self.events.push(event);
                    self.records.push(row);
                }
                Err(e) => {
                    warn!("{}: {}", source, e);
                    self.rejected += 1;
                }
            }
        }

        self.files += 1;
        Ok(())
    }
}

/// Every `*.csv` under `dir` in file-name order, skipping in-progress tournament dumps.
pub fn match_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir).with_context(|| load_context("match directory", dir))?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry.with_context(|| load_context("match directory", dir))?.path();
        let is_csv = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
        let is_ongoing = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.contains("ongoing_tourneys"));

        if is_csv && !is_ongoing {
            files.push(path);
        } else if is_csv {
            debug!("Skipping {}", path.display());
        }
    }

    files.sort();
    Ok(files)
}

pub fn load_match_log(dir: &Path, fallback_surface: Surface) -> Result<MatchLog> {
    let files = match_files(dir)?;
    info!("  → Reading {} match file(s) from {}", files.len(), dir.display());

    let mut log = MatchLog::default();
    for path in &files {
        let file = File::open(path).with_context(|| load_context("match file", path))?;
        let source = path.display().to_string();
        log.read_source(&source, BufReader::new(file), fallback_surface)?;
    }
    log.sort_by_date();

    info!(
        "  → Loaded {} matches ({} rejected)",
        log.events.len(),
        log.rejected
    );
    Ok(log)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
tourney_date,surface,winner_id,winner_name,winner_ht,winner_hand,winner_ioc,loser_id,loser_name,loser_ht,loser_hand,loser_ioc
20230105,Hard,A1,Alpha,188,R,ESP,B2,Bravo,,L,ARG
20230101,Clay,B2,Bravo,,L,ARG,C3,Charlie,180,R,USA
20230101,,C3,Charlie,180,R,USA,A1,Alpha,188,R,ESP
20230102,Hard,,Nobody,,,,A1,Alpha,188,R,ESP
20230103,Grass,A1,Alpha,188,R,ESP,A1,Alpha,188,R,ESP
notadate,Hard,A1,Alpha,188,R,ESP,C3,Charlie,180,R,USA
2023-01-04,Sand,C3,Charlie,180,R,USA,B2,Bravo,,L,ARG
";

    fn sample_log() -> MatchLog {
        let mut log = MatchLog::default();
        log.read_source("sample.csv", SAMPLE.as_bytes(), Surface::Hard)
            .unwrap();
        log.sort_by_date();
        log
    }

    #[test]
    fn test_invalid_rows_are_rejected() {
        let log = sample_log();
        assert_eq!(log.events.len(), 4);
        assert_eq!(log.records.len(), 4);
        assert_eq!(log.rejected, 3);
    }

    #[test]
    fn test_events_sorted_stably_by_date() {
        let log = sample_log();
        let order: Vec<(&str, &str)> = log
            .events
            .iter()
            .map(|e| (e.winner_id.as_str(), e.loser_id.as_str()))
            .collect();
        assert_eq!(order, vec![("B2", "C3"), ("C3", "A1"), ("C3", "B2"), ("A1", "B2")]);
    }

    #[test]
    fn test_records_follow_event_order() {
        let log = sample_log();
        assert_eq!(log.records.len(), log.events.len());
        for (event, record) in log.events.iter().zip(&log.records) {
            assert_eq!(record.winner_id.as_deref(), Some(event.winner_id.as_str()));
            assert_eq!(record.loser_id.as_deref(), Some(event.loser_id.as_str()));
        }
    }

    #[test]
    fn test_bad_encoding_rejects_only_that_row() {
        let mut bytes = b"tourney_date,surface,winner_id,winner_name,loser_id\n".to_vec();
        bytes.extend_from_slice(b"20230101,Hard,A1,Alpha,B2\n");
        bytes.extend_from_slice(b"20230102,Hard,B2,\xC3\x28,C3\n");
        bytes.extend_from_slice(b"20230103,Clay,C3,Charlie,A1\n");

        let mut log = MatchLog::default();
        log.read_source("encoding.csv", bytes.as_slice(), Surface::Hard)
            .unwrap();

        assert_eq!(log.events.len(), 2);
        assert_eq!(log.rejected, 1);
        assert_eq!(log.events[1].winner_id, "C3");
    }

    #[test]
    fn test_missing_or_unknown_surface_uses_fallback() {
        let log = sample_log();
        assert_eq!(log.events[1].surface, Surface::Hard);
        assert_eq!(log.events[2].surface, Surface::Hard);
        assert_eq!(log.events[0].surface, Surface::Clay);
    }

    #[test]
    fn test_validation_errors_carry_line() {
        let record = MatchRecord {
            tourney_date: Some("20230101".to_string()),
            winner_id: Some("A1".to_string()),
            ..Default::default()
        };
        assert_eq!(
            record.to_event(9, Surface::Hard),
            Err(ValidationError::MissingLoser { line: 9 })
        );
    }

    #[test]
    fn test_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2019, 7, 1);
        assert_eq!(parse_match_date("20190701"), expected);
        assert_eq!(parse_match_date("2019-07-01"), expected);
        assert_eq!(parse_match_date("20190701.0"), expected);
        assert_eq!(parse_match_date("07/01/2019"), None);
    }

    #[test]
    fn test_match_files_skips_ongoing() {
        let dir = std::env::temp_dir().join(format!("tennis_prediction_matches_{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("2024.csv"), SAMPLE).unwrap();
        fs::write(dir.join("2023.csv"), SAMPLE).unwrap();
        fs::write(dir.join("ongoing_tourneys.csv"), SAMPLE).unwrap();
        fs::write(dir.join("notes.txt"), "x").unwrap();

        let files = match_files(&dir).unwrap();
        let names: Vec<_> = files
            .iter()
            .filter_map(|p| p.file_name().and_then(|n| n.to_str()))
            .collect();
        assert_eq!(names, vec!["2023.csv", "2024.csv"]);

        let log = load_match_log(&dir, Surface::Hard).unwrap();
        assert_eq!(log.files, 2);
        assert_eq!(log.events.len(), 8);

        fs::remove_dir_all(&dir).ok();
    }
}
