use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const FEATURE_SCHEMA_VERSION: u32 = 1;

/// Named feature values in the order the builder produced them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureRow {
    values: Vec<(String, f64)>,
}

impl FeatureRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: impl Into<String>, value: f64) {
        self.values.push((name.into(), value));
    }

    pub fn extend(&mut self, values: impl IntoIterator<Item = (String, f64)>) {
        self.values.extend(values);
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.values
            .iter()
            .find(|(column, _)| column == name)
            .map(|(_, value)| *value)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Columns a row had to gain or lose to match the frozen schema.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaDrift {
    pub missing: Vec<String>,
    pub extra: Vec<String>,
}

impl SchemaDrift {
    pub fn is_empty(&self) -> bool {
        self.missing.is_empty() && self.extra.is_empty()
    }
}

/// Ordered column list the outcome model was trained on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureSchema {
    pub version: u32,
    pub columns: Vec<String>,
    pub numeric: Vec<String>,
}

impl FeatureSchema {
    pub fn new(columns: Vec<String>, numeric: Vec<String>) -> Self {
        Self {
            version: FEATURE_SCHEMA_VERSION,
            columns,
            numeric,
        }
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn position(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.position(column).is_some()
    }

    /// FNV-1a over the version and the ordered column names.
    pub fn fingerprint(&self) -> u64 {
        const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
        const PRIME: u64 = 0x0000_0100_0000_01b3;

        let mut hash = OFFSET;
        let mut feed = |bytes: &[u8]| {
            for byte in bytes {
                hash ^= u64::from(*byte);
                hash = hash.wrapping_mul(PRIME);
            }
        };

        feed(&self.version.to_le_bytes());
        for column in &self.columns {
            feed(column.as_bytes());
            feed(&[0]);
        }
        hash
    }

    /// Lays `row` out in schema order. Schema columns the row lacks become 0.0,
    /// row columns the schema does not know are dropped.
    pub fn reconcile(&self, row: &FeatureRow) -> (Vec<f64>, SchemaDrift) {
        let lookup: HashMap<&str, f64> = row
            .values
            .iter()
            .map(|(name, value)| (name.as_str(), *value))
            .collect();

        let mut drift = SchemaDrift::default();
        let values = self
            .columns
            .iter()
            .map(|column| match lookup.get(column.as_str()) {
                Some(value) => *value,
                None => {
                    drift.missing.push(column.clone());
                    0.0
                }
            })
            .collect();

        drift.extra = row
            .names()
            .filter(|name| !self.contains(name))
            .map(str::to_string)
            .collect();

        if !drift.is_empty() {
            debug!(
                "Feature row reconciled: {} missing column(s) {:?}, {} dropped column(s) {:?}",
                drift.missing.len(),
                drift.missing,
                drift.extra.len(),
                drift.extra
            );
        }

        (values, drift)
    }
}
