use anyhow::{bail, Result};
use ndarray::{Array2, Axis};
use serde::{Deserialize, Serialize};

/// Zero-mean, unit-variance scaling fitted once on training rows and reused verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    columns: Vec<String>,
    means: Vec<f64>,
    scales: Vec<f64>,
}

impl StandardScaler {
    /// `data` holds one row per sample and one column per entry of `columns`.
    pub fn fit(columns: Vec<String>, data: &Array2<f64>) -> Result<Self> {
        if data.ncols() != columns.len() {
            bail!(
                "Scaler got {} data columns for {} column names",
                data.ncols(),
                columns.len()
            );
        }

        let Some(means) = data.mean_axis(Axis(0)) else {
            bail!("Cannot fit scaler on zero rows");
        };
        let std_devs = data.std_axis(Axis(0), 0.0);

        // Constant columns keep their offset but are not stretched.
        let scales = std_devs
            .iter()
            .map(|&std| if std > 0.0 { std } else { 1.0 })
            .collect();

        Ok(Self {
            columns,
            means: means.to_vec(),
            scales,
        })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Scales the value of the `idx`-th fitted column.
    pub fn transform_value(&self, idx: usize, value: f64) -> f64 {
        (value - self.means[idx]) / self.scales[idx]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn names(cols: &[&str]) -> Vec<String> {
        cols.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_fit_centers_and_scales() {
        let data = array![[1.0, 10.0], [3.0, 10.0], [5.0, 10.0]];
        let scaler = StandardScaler::fit(names(&["a", "b"]), &data).unwrap();

        let scaled: Vec<f64> = [1.0, 3.0, 5.0]
            .iter()
            .map(|&v| scaler.transform_value(0, v))
            .collect();
        let mean: f64 = scaled.iter().sum::<f64>() / 3.0;
        let var: f64 = scaled.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / 3.0;

        assert!(mean.abs() < 1e-12);
        assert!((var - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_constant_column_uses_unit_scale() {
        let data = array![[2.0], [2.0]];
        let scaler = StandardScaler::fit(names(&["flat"]), &data).unwrap();
        assert_eq!(scaler.transform_value(0, 2.0), 0.0);
        assert_eq!(scaler.transform_value(0, 5.0), 3.0);
    }

    #[test]
    fn test_width_mismatch_is_rejected() {
        let data = array![[1.0, 2.0]];
        assert!(StandardScaler::fit(names(&["only_one"]), &data).is_err());
    }
}
