use anyhow::{Context, Result};
use rusqlite::params;

use super::connection::DbConn;
use super::metadata;
use super::models::{META_INITIAL_RATING, META_STORE_VERSION};
use crate::rating::{RatingStore, SnapshotRow};

const SELECT_COLUMNS: &str = "SELECT player_id, surface, rating FROM ratings";

/// Replaces the stored snapshot in one transaction.
pub fn insert_snapshot(conn: &mut DbConn, rows: &[SnapshotRow]) -> Result<usize> {
    let tx = conn.transaction().context("Failed to open snapshot transaction")?;
    tx.execute("DELETE FROM ratings", [])
        .context("Failed to clear ratings")?;
    {
        let mut stmt = tx.prepare("INSERT INTO ratings (player_id, surface, rating) VALUES (?1, ?2, ?3)")?;
        for row in rows {
            stmt.execute(params![row.player_id, row.surface, row.rating])
                .with_context(|| format!("Failed to insert rating for {}", row.player_id))?;
        }
    }
    tx.commit().context("Failed to commit rating snapshot")?;
    Ok(rows.len())
}

fn parse_snapshot_row(row: &rusqlite::Row) -> rusqlite::Result<SnapshotRow> {
    Ok(SnapshotRow {
        player_id: row.get(0)?,
        surface: row.get(1)?,
        rating: row.get(2)?,
    })
}

pub fn load_snapshot(conn: &mut DbConn) -> Result<Vec<SnapshotRow>> {
    let sql = format!("{} ORDER BY player_id, surface", SELECT_COLUMNS);

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([], parse_snapshot_row)?
        .collect::<rusqlite::Result<Vec<_>>>()
        .context("Failed to load rating snapshot")?;

    Ok(rows)
}

/// Persists the snapshot together with what is needed to rebuild the store exactly.
pub fn save_store(conn: &mut DbConn, store: &RatingStore) -> Result<usize> {
    let written = insert_snapshot(conn, &store.snapshot_rows())?;
    metadata::set_value(conn, META_INITIAL_RATING, &store.initial_rating().to_string())?;
    metadata::set_value(conn, META_STORE_VERSION, &store.version().to_string())?;
    Ok(written)
}

/// Rebuilds the store; `default_initial` applies when the database predates the metadata.
pub fn load_store(conn: &mut DbConn, default_initial: f64) -> Result<RatingStore> {
    let rows = load_snapshot(conn)?;
    let initial = metadata::get_parsed::<f64>(conn, META_INITIAL_RATING)?.unwrap_or(default_initial);
    let version = metadata::get_parsed::<u64>(conn, META_STORE_VERSION)?.unwrap_or_default();
    Ok(RatingStore::from_rows(&rows, initial, version))
}
