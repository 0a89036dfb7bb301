use anyhow::{Context, Result};
use rusqlite::params;

use super::connection::DbConn;
use crate::rating::RatingHistoryEntry;

const SELECT_COLUMNS: &str = "SELECT event_date, winner_id, loser_id, surface, winner_before, loser_before, winner_after, loser_after FROM rating_history";

/// Appends entries in the order given; `id` preserves replay order.
pub fn insert_history(conn: &mut DbConn, entries: &[RatingHistoryEntry]) -> Result<usize> {
    let tx = conn.transaction().context("Failed to open history transaction")?;
    {
        let mut stmt = tx.prepare(
            "INSERT INTO rating_history (event_date, winner_id, loser_id, surface, winner_before, loser_before, winner_after, loser_after) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        )?;
        for entry in entries {
            stmt.execute(params![
                entry.event_date,
                entry.winner_id,
                entry.loser_id,
                entry.surface,
                entry.winner_rating_before,
                entry.loser_rating_before,
                entry.winner_rating_after,
                entry.loser_rating_after,
            ])
            .context("Failed to insert rating history entry")?;
        }
    }
    tx.commit().context("Failed to commit rating history")?;
    Ok(entries.len())
}

fn parse_history_row(row: &rusqlite::Row) -> rusqlite::Result<RatingHistoryEntry> {
    Ok(RatingHistoryEntry {
        event_date: row.get(0)?,
        winner_id: row.get(1)?,
        loser_id: row.get(2)?,
        surface: row.get(3)?,
        winner_rating_before: row.get(4)?,
        loser_rating_before: row.get(5)?,
        winner_rating_after: row.get(6)?,
        loser_rating_after: row.get(7)?,
    })
}

pub fn count(conn: &mut DbConn) -> Result<usize> {
    conn.query_row("SELECT COUNT(*) FROM rating_history", [], |row| row.get::<_, i64>(0))
        .map(|n| n as usize)
        .context("Failed to count rating history")
}

/// Most recent `limit` matches involving `player_id`, newest first.
pub fn list_for_player(conn: &mut DbConn, player_id: &str, limit: usize) -> Result<Vec<RatingHistoryEntry>> {
    let sql = format!(
        "{} WHERE winner_id = ?1 OR loser_id = ?1 ORDER BY id DESC LIMIT ?2",
        SELECT_COLUMNS
    );

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params![player_id, limit as i64], parse_history_row)?
        .collect::<rusqlite::Result<Vec<_>>>()
        .with_context(|| format!("Failed to load rating history for {}", player_id))?;

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RatingSettings;
    use crate::database::{create_pool, get_connection, setup::reset_database};
    use crate::rating::{replay_from_scratch, MatchEvent, Surface};
    use chrono::NaiveDate;

    #[test]
    fn test_history_round_trip_for_player() {
        let path = std::env::temp_dir().join(format!(
            "tennis_prediction_{}_history.db",
            std::process::id()
        ));
        let _ = std::fs::remove_file(&path);
        let pool = create_pool(&path).unwrap();
        let mut conn = get_connection(&pool).unwrap();
        reset_database(&mut conn).unwrap();

        let date = NaiveDate::from_ymd_opt(2020, 2, 2).unwrap();
        let events: Vec<MatchEvent> = [("A1", "B2"), ("B2", "C3"), ("A1", "C3")]
            .iter()
            .map(|(w, l)| MatchEvent {
                date,
                winner_id: w.to_string(),
                loser_id: l.to_string(),
                surface: Surface::Hard,
            })
            .collect();
        let replay = replay_from_scratch(&events, &RatingSettings::default());

        insert_history(&mut conn, &replay.history).unwrap();
        assert_eq!(count(&mut conn).unwrap(), 3);

        let c3 = list_for_player(&mut conn, "C3", 10).unwrap();
        assert_eq!(c3.len(), 2);
        assert_eq!(c3[0], replay.history[2]);
        assert_eq!(c3[1], replay.history[1]);

        assert_eq!(list_for_player(&mut conn, "A1", 1).unwrap().len(), 1);

        drop(conn);
        drop(pool);
        std::fs::remove_file(&path).ok();
    }
}
