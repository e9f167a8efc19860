use crate::error::Result;
use crate::math::Matrix;

use super::{check_operands, check_size};

/// Categorical cross-entropy loss for use with a Softmax output layer.
///
/// Targets are one-hot (or soft) distributions over `size` classes. When the
/// model ends in a softmax layer the model skips [`CrossEntropyLoss::backward`]
/// and uses the fused gradient from `Layer::backward_cross_entropy`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrossEntropyLoss {
    pub size: usize,
}

impl CrossEntropyLoss {
    pub fn new(size: usize) -> Result<CrossEntropyLoss> {
        check_size(size)?;
        Ok(CrossEntropyLoss { size })
    }

    /// Per-sample loss `-ln(Σ clip(predicted) · expected)`, shape `rows × 1`.
    pub fn sample_losses(&self, predicted: &Matrix, expected: &Matrix) -> Result<Matrix> {
        check_operands(self.size, predicted, expected)?;
        let clipped = predicted.clip();
        let mut likelihoods = Matrix::zeros(predicted.rows, 1);
        for (out, (p, y)) in likelihoods
            .data
            .iter_mut()
            .zip(clipped.data.iter().zip(expected.data.iter()))
        {
            let confidence: f64 = p.iter().zip(y).map(|(p, y)| p * y).sum();
            out[0] = -confidence.ln();
        }
        Ok(likelihoods)
    }

    /// Mean of [`CrossEntropyLoss::sample_losses`].
    pub fn forward(&self, predicted: &Matrix, expected: &Matrix) -> Result<f64> {
        let losses = self.sample_losses(predicted, expected)?;
        Ok(losses.total() / losses.rows as f64)
    }

    /// Gradient with respect to the probabilities: `-y / (ŷ · rows)`.
    pub fn backward(&self, predicted: &Matrix, expected: &Matrix) -> Result<Matrix> {
        check_operands(self.size, predicted, expected)?;
        let rows = predicted.rows as f64;
        let mut d_inputs = Matrix::zeros(predicted.rows, predicted.cols);
        for (out, (p, y)) in d_inputs
            .data
            .iter_mut()
            .zip(predicted.data.iter().zip(expected.data.iter()))
        {
            for (d, (p, y)) in out.iter_mut().zip(p.iter().zip(y)) {
                *d = -y / p / rows;
            }
        }
        Ok(d_inputs)
    }
}
