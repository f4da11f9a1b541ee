//! Feature standardization shared by training, evaluation and inference.
//!
//! The same `Scaler::scale_value` routine backs every transform entry point
//! so a sample is scaled bit-for-bit identically whether it arrives as a
//! batch row or as a single interactive `FeatureVector`.

use ndarray::{Array2, ArrayView1, Axis};
use serde::{Deserialize, Serialize};

use crate::data_handling::{FeatureVector, N_FEATURES};
use crate::error::{ClassifierError, Result};

/// Standard scaler (per-column mean / population std).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Scaler {
    pub mean: Vec<f64>,
    pub std: Vec<f64>,
}

impl Scaler {
    /// Standard deviations at or below this are treated as a constant column.
    const MIN_STD: f64 = 1e-12;

    /// Fit a `Scaler` from a matrix where rows are samples and columns are features.
    pub fn fit(x: &Array2<f64>) -> Result<Scaler> {
        let (nrows, ncols) = x.dim();
        if nrows == 0 || ncols == 0 {
            return Err(ClassifierError::InsufficientData(format!(
                "scaler fit requires a non-empty matrix, got {}x{}",
                nrows, ncols
            )));
        }
        if let Some(((row, col), _)) = x.indexed_iter().find(|(_, v)| !v.is_finite()) {
            return Err(ClassifierError::MalformedRecord {
                row: row + 1,
                column: column_name(col),
                message: "non-finite value".to_string(),
            });
        }

        let n = nrows as f64;
        let mean: Vec<f64> = x
            .axis_iter(Axis(1))
            .map(|col| col.sum() / n)
            .collect();

        let std = x
            .axis_iter(Axis(1))
            .zip(mean.iter())
            .map(|(col, &m)| {
                let var = col.iter().map(|&v| (v - m) * (v - m)).sum::<f64>() / n;
                let sd = var.sqrt();
                if sd > Self::MIN_STD {
                    sd
                } else {
                    1.0
                }
            })
            .collect();

        Ok(Scaler { mean, std })
    }

    pub fn n_features(&self) -> usize {
        self.mean.len()
    }

    #[inline]
    fn scale_value(&self, col: usize, value: f64) -> f64 {
        (value - self.mean[col]) / self.std[col]
    }

    /// Scale one row. Panics if the row width does not match the fitted width.
    pub fn transform_row(&self, row: ArrayView1<'_, f64>) -> Vec<f64> {
        assert_eq!(row.len(), self.n_features(), "row width does not match scaler");
        row.iter()
            .enumerate()
            .map(|(c, &v)| self.scale_value(c, v))
            .collect()
    }

    pub fn transform(&self, x: &Array2<f64>) -> Array2<f64> {
        assert_eq!(x.ncols(), self.n_features(), "matrix width does not match scaler");
        let mut out = x.clone();
        for mut row in out.axis_iter_mut(Axis(0)) {
            for (c, v) in row.iter_mut().enumerate() {
                *v = self.scale_value(c, *v);
            }
        }
        out
    }

    pub fn transform_vector(&self, vector: &FeatureVector) -> FeatureVector {
        let mut values = [0.0; N_FEATURES];
        for (c, (slot, &v)) in values.iter_mut().zip(vector.0.iter()).enumerate() {
            *slot = self.scale_value(c, v);
        }
        FeatureVector(values)
    }

    /// Check the invariants a persisted scaler must satisfy.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.mean.len() != N_FEATURES || self.std.len() != N_FEATURES {
            return Err(format!(
                "scaler must have {} mean/std entries, got {}/{}",
                N_FEATURES,
                self.mean.len(),
                self.std.len()
            ));
        }
        if self.mean.iter().any(|m| !m.is_finite()) {
            return Err("scaler mean contains non-finite values".to_string());
        }
        if self.std.iter().any(|s| !(s.is_finite() && *s > 0.0)) {
            return Err("scaler std must be strictly positive".to_string());
        }
        Ok(())
    }
}

fn column_name(col: usize) -> String {
    crate::data_handling::FEATURE_NAMES
        .get(col)
        .map(|s| s.to_string())
        .unwrap_or_else(|| format!("column {}", col))
}
