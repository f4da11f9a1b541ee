use ndarray::{Array2, ArrayView1, Axis};

use crate::error::Result;
use crate::models::distribution::argmax;

/// A small trait abstraction for the probabilistic base learners of the
/// voting ensemble.
///
/// Labels are class indices into the `ClassSet` owned by the ensemble, so
/// every implementation returns one probability per class in that order.
pub trait ClassifierModel {
    /// Fit the model on scaled features and encoded labels in `0..n_classes`.
    fn fit(&mut self, x: &Array2<f64>, y: &[usize], n_classes: usize) -> Result<()>;

    /// Number of classes the model was fit with (0 before fitting).
    fn n_classes(&self) -> usize;

    /// Class probabilities for one scaled sample.
    fn predict_proba_row(&self, row: ArrayView1<'_, f64>) -> Vec<f64>;

    /// Class probabilities for every row, shape `(n_samples, n_classes)`.
    fn predict_proba(&self, x: &Array2<f64>) -> Array2<f64> {
        let mut out = Array2::zeros((x.nrows(), self.n_classes()));
        for (row, mut out_row) in x.axis_iter(Axis(0)).zip(out.axis_iter_mut(Axis(0))) {
            let probs = self.predict_proba_row(row);
            for (slot, p) in out_row.iter_mut().zip(probs) {
                *slot = p;
            }
        }
        out
    }

    /// Most probable class index; ties go to the lowest index.
    fn predict_row(&self, row: ArrayView1<'_, f64>) -> usize {
        argmax(&self.predict_proba_row(row))
    }

    /// Optional human readable name for the model
    fn name(&self) -> &str {
        "classifier"
    }
}
