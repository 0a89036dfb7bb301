use anyhow::{Context, Result};
use log::info;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, Read, Write};
use std::path::Path;

use super::matches::MatchRecord;
use crate::errors::{load_context, save_context};
use crate::features::attributes::{parse_category, parse_numeric};
use crate::features::{AttributeTable, PlayerAttributes};

/// One row of `player_database.csv`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerRecord {
    pub player_id: Option<String>,
    pub name: Option<String>,
    pub height: Option<String>,
    pub weight: Option<String>,
    pub plays: Option<String>,
    pub country: Option<String>,
}

impl PlayerRecord {
    fn to_attributes(&self) -> PlayerAttributes {
        PlayerAttributes {
            name: parse_category(self.name.as_deref()),
            height: parse_numeric(self.height.as_deref()),
            weight: parse_numeric(self.weight.as_deref()),
            plays: parse_category(self.plays.as_deref()),
            country: parse_category(self.country.as_deref()),
        }
    }

    fn from_attributes(player_id: &str, attributes: &PlayerAttributes) -> Self {
        Self {
            player_id: Some(player_id.to_string()),
            name: attributes.name.clone(),
            height: attributes.height.map(|h| h.to_string()),
            weight: attributes.weight.map(|w| w.to_string()),
            plays: attributes.plays.clone(),
            country: attributes.country.clone(),
        }
    }
}

pub fn read_attribute_table<R: Read>(reader: R) -> Result<AttributeTable> {
    let mut rdr = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let mut table = AttributeTable::new();

    for result in rdr.deserialize() {
        let record: PlayerRecord = result.context("Failed to parse player row")?;
        let Some(player_id) = parse_category(record.player_id.as_deref()) else {
            continue;
        };
        table.insert(player_id, record.to_attributes());
    }
    Ok(table)
}

pub fn load_attribute_table(path: &Path) -> Result<AttributeTable> {
    let file = File::open(path).with_context(|| load_context("player database", path))?;
    let table = read_attribute_table(BufReader::new(file))
        .with_context(|| load_context("player database", path))?;
    info!("  → Loaded {} players from {}", table.len(), path.display());
    Ok(table)
}

/// Builds the table from both sides of every match row; later rows overwrite the
/// fields they carry. Given `MatchLog::records`, that means the most recent match wins.
pub fn derive_from_matches(records: &[MatchRecord]) -> AttributeTable {
    let mut table = AttributeTable::new();

    for record in records {
        let sides = [
            (
                &record.winner_id,
                &record.winner_name,
                &record.winner_ht,
                &record.winner_wt,
                &record.winner_hand,
                &record.winner_ioc,
            ),
            (
                &record.loser_id,
                &record.loser_name,
                &record.loser_ht,
                &record.loser_wt,
                &record.loser_hand,
                &record.loser_ioc,
            ),
        ];

        for (id, name, height, weight, hand, country) in sides {
            let Some(player_id) = parse_category(id.as_deref()) else {
                continue;
            };
            table.upsert(
                player_id,
                PlayerAttributes {
                    name: parse_category(name.as_deref()),
                    height: parse_numeric(height.as_deref()),
                    weight: parse_numeric(weight.as_deref()),
                    plays: parse_category(hand.as_deref()),
                    country: parse_category(country.as_deref()),
                },
            );
        }
    }

    table
}

pub fn write_attribute_table<W: Write>(table: &AttributeTable, writer: W) -> Result<()> {
    let mut players: Vec<_> = table.iter().collect();
    players.sort_by(|a, b| a.0.cmp(b.0));

    let mut wtr = csv::Writer::from_writer(writer);
    for (player_id, attributes) in players {
        wtr.serialize(PlayerRecord::from_attributes(player_id, attributes))?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn save_attribute_table(table: &AttributeTable, path: &Path) -> Result<()> {
    let tmp_path = path.with_extension("csv.tmp");
    let file = File::create(&tmp_path).with_context(|| save_context("player database", &tmp_path))?;
    write_attribute_table(table, file).with_context(|| save_context("player database", &tmp_path))?;
    fs::rename(&tmp_path, path).with_context(|| save_context("player database", path))?;
    info!("  → Saved {} players to {}", table.len(), path.display());
    Ok(())
}

/// Reads `path` when it exists; otherwise derives the table from the match rows and
/// writes it there for next time.
pub fn load_or_derive(path: &Path, records: &[MatchRecord]) -> Result<AttributeTable> {
    if path.exists() {
        return load_attribute_table(path);
    }

    info!(
        "  → {} not found, deriving player attributes from {} match rows",
        path.display(),
        records.len()
    );
    let table = derive_from_matches(records);
    save_attribute_table(&table, path)?;
    Ok(table)
}
