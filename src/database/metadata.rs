use anyhow::{Context, Result};
use rusqlite::{params, OptionalExtension};

use super::connection::DbConn;

pub fn set_value(conn: &mut DbConn, key: &str, value: &str) -> Result<()> {
    let sql = "INSERT INTO metadata (key, value) VALUES (?1, ?2) ON CONFLICT(key) DO UPDATE SET value = excluded.value";

    conn.execute(sql, params![key, value])
        .with_context(|| format!("Failed to store metadata {}", key))
        .map(|_| ())
}

pub fn get_value(conn: &mut DbConn, key: &str) -> Result<Option<String>> {
    let sql = "SELECT value FROM metadata WHERE key = ?1";

    conn.query_row(sql, params![key], |row| row.get(0))
        .optional()
        .with_context(|| format!("Failed to read metadata {}", key))
}

/// Reads and parses a metadata value; absent keys yield `None`.
pub fn get_parsed<T: std::str::FromStr>(conn: &mut DbConn, key: &str) -> Result<Option<T>> {
    match get_value(conn, key)? {
        Some(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|_| anyhow::anyhow!("Metadata {} has unparseable value {:?}", key, raw)),
        None => Ok(None),
    }
}
