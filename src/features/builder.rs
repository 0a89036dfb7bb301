use anyhow::{Context, Result};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::attributes::{AttributeTable, PlayerAttributes};
use super::encoder::{dummy_column, SurfaceEncoder};
use super::scaler::StandardScaler;
use super::schema::{FeatureRow, FeatureSchema, SchemaDrift};
use crate::errors::ArtifactError;
use crate::rating::{PlayerId, RatingStore, Surface};

/// Columns standardized by the fitted scaler.
pub const NUMERIC_COLUMNS: [&str; 9] = [
    "player1_elo",
    "player2_elo",
    "height_1",
    "height_2",
    "weight_1",
    "weight_2",
    "height_diff",
    "weight_diff",
    "elo_diff",
];

/// Two players on a surface, `player1` being the side the model scores.
/// `surface` is `None` when the requested surface is not one of the known categories.
#[derive(Debug, Clone, PartialEq)]
pub struct Matchup {
    pub player1: PlayerId,
    pub player2: PlayerId,
    pub surface: Option<Surface>,
}

impl Matchup {
    pub fn new(player1: impl Into<PlayerId>, player2: impl Into<PlayerId>, surface: Option<Surface>) -> Self {
        Self {
            player1: player1.into(),
            player2: player2.into(),
            surface,
        }
    }

    pub fn reversed(&self) -> Self {
        Self {
            player1: self.player2.clone(),
            player2: self.player1.clone(),
            surface: self.surface,
        }
    }
}

/// Reads ratings and attributes for a matchup. Holds no fitted state.
pub struct FeatureBuilder<'a> {
    ratings: &'a RatingStore,
    attributes: &'a AttributeTable,
    fallback_surface: Surface,
}

impl<'a> FeatureBuilder<'a> {
    pub fn new(ratings: &'a RatingStore, attributes: &'a AttributeTable, fallback_surface: Surface) -> Self {
        Self {
            ratings,
            attributes,
            fallback_surface,
        }
    }

    /// Unscaled named features: surface one-hot, both ratings, both attribute blocks,
    /// then the pairwise differences.
    pub fn raw_row(&self, matchup: &Matchup, encoder: &SurfaceEncoder) -> FeatureRow {
        let rating_surface = matchup.surface.unwrap_or(self.fallback_surface);
        let elo_1 = self.ratings.get_rating(&matchup.player1, rating_surface);
        let elo_2 = self.ratings.get_rating(&matchup.player2, rating_surface);
        let attributes_1 = self.attributes.lookup(&matchup.player1);
        let attributes_2 = self.attributes.lookup(&matchup.player2);

        let mut row = FeatureRow::new();
        row.extend(encoder.encode(matchup.surface));
        row.push("player1_elo", elo_1);
        row.push("player2_elo", elo_2);
        push_player_block(&mut row, 1, attributes_1);
        push_player_block(&mut row, 2, attributes_2);

        row.push("height_diff", attributes_1.height_or_zero() - attributes_2.height_or_zero());
        row.push("weight_diff", attributes_1.weight_or_zero() - attributes_2.weight_or_zero());
        row.push("elo_diff", elo_1 - elo_2);
        row
    }
}

fn push_player_block(row: &mut FeatureRow, slot: u8, attributes: &PlayerAttributes) {
    row.push(format!("height_{}", slot), attributes.height_or_zero());
    row.push(format!("weight_{}", slot), attributes.weight_or_zero());
    row.push(
        dummy_column(&format!("plays_{}", slot), attributes.plays_or_unknown()),
        1.0,
    );
    row.push(
        dummy_column(&format!("country_{}", slot), attributes.country_or_unknown()),
        1.0,
    );
}

/// A model-ready row plus whatever reconciliation it needed.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    pub values: Vec<f64>,
    pub drift: SchemaDrift,
}

/// Fitted preprocessing state: surface encoder, scaler and the frozen schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeaturePipeline {
    surface_encoder: SurfaceEncoder,
    scaler: StandardScaler,
    schema: FeatureSchema,
}

impl FeaturePipeline {
    /// Fit mode: fits the encoder, freezes the schema from the training rows, fits the
    /// scaler, and returns the scaled training matrix alongside the pipeline.
    pub fn fit(builder: &FeatureBuilder<'_>, matchups: &[Matchup]) -> Result<(Self, Vec<Vec<f64>>)> {
        let surface_encoder = SurfaceEncoder::fit(&Surface::ALL);
        let raw_rows: Vec<FeatureRow> = matchups
            .iter()
            .map(|matchup| builder.raw_row(matchup, &surface_encoder))
            .collect();

        let schema = FeatureSchema::new(
            freeze_columns(&surface_encoder, &raw_rows),
            NUMERIC_COLUMNS.iter().map(|c| c.to_string()).collect(),
        );

        let mut rows: Vec<Vec<f64>> = raw_rows.iter().map(|row| schema.reconcile(row).0).collect();
        let scaler = fit_scaler(&schema, &rows)?;

        let pipeline = Self {
            surface_encoder,
            scaler,
            schema,
        };
        for row in rows.iter_mut() {
            pipeline.scale(row);
        }

        Ok((pipeline, rows))
    }

    /// Inference mode: fitted state is reused verbatim and the row is reconciled
    /// against the frozen schema.
    pub fn transform(&self, builder: &FeatureBuilder<'_>, matchup: &Matchup) -> FeatureVector {
        let raw = builder.raw_row(matchup, &self.surface_encoder);
        let (mut values, drift) = self.schema.reconcile(&raw);
        self.scale(&mut values);
        FeatureVector { values, drift }
    }

    pub fn transform_all(&self, builder: &FeatureBuilder<'_>, matchups: &[Matchup]) -> Vec<Vec<f64>> {
        matchups
            .iter()
            .map(|matchup| self.transform(builder, matchup).values)
            .collect()
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    /// Checks that encoder and scaler were fitted against this schema.
    pub fn validate(&self) -> Result<(), ArtifactError> {
        if self.scaler.len() != self.schema.numeric.len() {
            return Err(ArtifactError::ScalerWidth {
                scaler: self.scaler.len(),
                schema: self.schema.numeric.len(),
            });
        }
        if let Some(column) = self
            .scaler
            .columns()
            .iter()
            .find(|column| !self.schema.contains(column))
        {
            return Err(ArtifactError::ScalerColumn(column.clone()));
        }
        if let Some(column) = self
            .surface_encoder
            .columns()
            .into_iter()
            .find(|column| !self.schema.contains(column))
        {
            return Err(ArtifactError::EncoderColumn(column));
        }
        Ok(())
    }

    fn scale(&self, values: &mut [f64]) {
        for (idx, column) in self.scaler.columns().iter().enumerate() {
            if let Some(position) = self.schema.position(column) {
                values[position] = self.scaler.transform_value(idx, values[position]);
            }
        }
    }
}

/// Structural column order with the categorical dummies seen in training sorted
/// inside their block.
fn freeze_columns(encoder: &SurfaceEncoder, rows: &[FeatureRow]) -> Vec<String> {
    let mut columns = encoder.columns();
    columns.push("player1_elo".to_string());
    columns.push("player2_elo".to_string());

    for slot in 1..=2 {
        columns.push(format!("height_{}", slot));
        columns.push(format!("weight_{}", slot));
        columns.extend(dummies_with_prefix(rows, &format!("plays_{}_", slot)));
        columns.extend(dummies_with_prefix(rows, &format!("country_{}_", slot)));
    }

    columns.push("height_diff".to_string());
    columns.push("weight_diff".to_string());
    columns.push("elo_diff".to_string());
    columns
}

fn dummies_with_prefix(rows: &[FeatureRow], prefix: &str) -> BTreeSet<String> {
    rows.iter()
        .flat_map(|row| row.names())
        .filter(|name| name.starts_with(prefix))
        .map(str::to_string)
        .collect()
}

fn fit_scaler(schema: &FeatureSchema, rows: &[Vec<f64>]) -> Result<StandardScaler> {
    let positions: Vec<usize> = schema
        .numeric
        .iter()
        .map(|column| {
            schema
                .position(column)
                .with_context(|| format!("Numeric column {} missing from schema", column))
        })
        .collect::<Result<_>>()?;

    let flat: Vec<f64> = rows
        .iter()
        .flat_map(|row| positions.iter().map(move |&p| row[p]))
        .collect();
    let data = Array2::from_shape_vec((rows.len(), positions.len()), flat)
        .context("Failed to shape numeric training features")?;

    StandardScaler::fit(schema.numeric.clone(), &data)
}
