use serde::{Deserialize, Serialize};

use crate::rating::Surface;

/// One-hot encoder for the surface category, fitted once on the fixed category set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurfaceEncoder {
    categories: Vec<Surface>,
}

impl SurfaceEncoder {
    pub fn fit(categories: &[Surface]) -> Self {
        let mut categories = categories.to_vec();
        categories.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        categories.dedup();
        Self { categories }
    }

    pub fn columns(&self) -> Vec<String> {
        self.categories
            .iter()
            .map(|surface| dummy_column("surface", surface.as_str()))
            .collect()
    }

    /// `None`, or a surface outside the fitted set, encodes as all zeros.
    pub fn encode(&self, surface: Option<Surface>) -> Vec<(String, f64)> {
        self.categories
            .iter()
            .map(|category| {
                let hot = if Some(*category) == surface { 1.0 } else { 0.0 };
                (dummy_column("surface", category.as_str()), hot)
            })
            .collect()
    }
}

pub fn dummy_column(prefix: &str, value: &str) -> String {
    format!("{}_{}", prefix, value)
}
