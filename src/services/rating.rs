use anyhow::{Context, Result};
use log::info;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::AppConfig;
use crate::database::{self, history, ratings};
use crate::errors::save_context;
use crate::ingestion::{self, MatchLog};
use crate::rating::{replay_from_scratch, summarize, RatingReplay, RatingSummary};

/// Replays the full match log and publishes the resulting snapshot and history.
pub struct RatingService {
    config: AppConfig,
}

pub struct RatingRun {
    pub replay: RatingReplay,
    pub summary: RatingSummary,
    pub rejected: usize,
}

impl RatingService {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    pub fn run(&self, export_dir: Option<&Path>) -> Result<RatingRun> {
        info!("=== Starting Rating Computation ===");

        let paths = &self.config.paths;
        let log = ingestion::load_match_log(&paths.matches_dir, self.config.rating.fallback_surface)?;
        ingestion::load_or_derive(&paths.players_path, &log.records)?;

        let run = self.rate(&log);
        publish_database(&paths.database_path, &run.replay)?;

        if let Some(dir) = export_dir {
            export_csv(dir, &run.replay)?;
        }

        run.summary.log();
        info!("=== Rating Computation Complete ===");
        Ok(run)
    }

    pub fn rate(&self, log: &MatchLog) -> RatingRun {
        let replay = replay_from_scratch(&log.events, &self.config.rating);
        let summary = summarize(&replay.store, replay.history.len(), self.config.rating.top_players);
        RatingRun {
            replay,
            summary,
            rejected: log.rejected,
        }
    }
}

/// `<path>.tmp` next to `path`.
pub fn tmp_sibling(path: &Path) -> PathBuf {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    PathBuf::from(tmp)
}

/// Builds a fresh database beside the live one and renames it into place.
pub fn publish_database(db_path: &Path, replay: &RatingReplay) -> Result<()> {
    let tmp_path = tmp_sibling(db_path);
    info!("Target DB: {}, Temp DB: {}", db_path.display(), tmp_path.display());

    if tmp_path.exists() {
        fs::remove_file(&tmp_path)
            .with_context(|| format!("Failed to remove stale {}", tmp_path.display()))?;
    }

    write_database(&tmp_path, replay)?;

    fs::rename(&tmp_path, db_path).with_context(|| {
        format!(
            "Failed to swap {} into {}",
            tmp_path.display(),
            db_path.display()
        )
    })?;
    info!("  → Swapped database to {}", db_path.display());
    Ok(())
}

fn write_database(path: &Path, replay: &RatingReplay) -> Result<()> {
    let pool = database::create_pool(path)?;
    let mut conn = database::get_connection(&pool)?;

    database::setup::reset_database(&mut conn)?;
    info!("  → Database schema reset");

    let rows = ratings::save_store(&mut conn, &replay.store)?;
    info!("  → Saved {} rating rows for {} players", rows, replay.store.len());

    let entries = history::insert_history(&mut conn, &replay.history)?;
    info!("  → Saved {} history entries", entries);

    Ok(())
}

fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path).with_context(|| save_context("CSV export", path))?;
    for row in rows {
        wtr.serialize(row).with_context(|| save_context("CSV export", path))?;
    }
    wtr.flush().with_context(|| save_context("CSV export", path))?;
    Ok(())
}

/// `final_ratings.csv` and `rating_history.csv` under `dir`.
pub fn export_csv(dir: &Path, replay: &RatingReplay) -> Result<()> {
    fs::create_dir_all(dir).with_context(|| save_context("export directory", dir))?;

    let ratings_path = dir.join("final_ratings.csv");
    write_csv(&ratings_path, &replay.store.snapshot_rows())?;

    let history_path = dir.join("rating_history.csv");
    write_csv(&history_path, &replay.history)?;

    info!("  → Exported ratings and history to {}", dir.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RatingSettings;
    use crate::rating::{MatchEvent, Surface};
    use chrono::NaiveDate;

    fn replay() -> RatingReplay {
        let date = NaiveDate::from_ymd_opt(2022, 5, 1).unwrap();
        let events = vec![
            MatchEvent {
                date,
                winner_id: "A1".to_string(),
                loser_id: "B2".to_string(),
                surface: Surface::Clay,
            },
            MatchEvent {
                date,
                winner_id: "B2".to_string(),
                loser_id: "C3".to_string(),
                surface: Surface::Hard,
            },
        ];
        replay_from_scratch(&events, &RatingSettings::default())
    }

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("tennis_prediction_{}_{}", std::process::id(), name));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_tmp_sibling_appends_suffix() {
        assert_eq!(tmp_sibling(Path::new("data/ratings.db")), PathBuf::from("data/ratings.db.tmp"));
    }

    #[test]
    fn test_publish_replaces_database() {
        let dir = temp_dir("publish");
        let db_path = dir.join("ratings.db");
        let replay = replay();

        publish_database(&db_path, &replay).unwrap();
        publish_database(&db_path, &replay).unwrap();
        assert!(!tmp_sibling(&db_path).exists());

        let pool = database::create_pool(&db_path).unwrap();
        let mut conn = database::get_connection(&pool).unwrap();
        let store = ratings::load_store(&mut conn, 1000.0).unwrap();
        assert_eq!(store, replay.store);
        assert_eq!(history::count(&mut conn).unwrap(), 2);

        drop(conn);
        drop(pool);
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_export_writes_both_files() {
        let dir = temp_dir("export");
        export_csv(&dir, &replay()).unwrap();

        let ratings_csv = fs::read_to_string(dir.join("final_ratings.csv")).unwrap();
        assert!(ratings_csv.starts_with("player_id,surface,rating"));
        assert_eq!(ratings_csv.lines().count(), 1 + 3 * 4);

        let history_csv = fs::read_to_string(dir.join("rating_history.csv")).unwrap();
        assert_eq!(history_csv.lines().count(), 3);
        assert!(history_csv.contains("2022-05-01,A1,B2,Clay,1000.0,1000.0,1016.0,984.0"));

        fs::remove_dir_all(&dir).ok();
    }
}
