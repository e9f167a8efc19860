use crate::error::Result;
use crate::math::matrix::{Matrix, CLIP_EPSILON};

use super::{check_operands, check_size};

/// Binary cross-entropy over `size` independent sigmoid outputs.
///
/// Predictions are clamped into `[1e-7, 1 - 1e-7]` so both `ln(ŷ)` and
/// `ln(1 - ŷ)` stay finite.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BceLoss {
    pub size: usize,
}

impl BceLoss {
    pub fn new(size: usize) -> Result<BceLoss> {
        check_size(size)?;
        Ok(BceLoss { size })
    }

    /// Scalar BCE: -mean(y·ln(p) + (1-y)·ln(1-p)) over every cell.
    pub fn forward(&self, predicted: &Matrix, expected: &Matrix) -> Result<f64> {
        check_operands(self.size, predicted, expected)?;
        let clipped = predicted.clamp(CLIP_EPSILON, 1.0 - CLIP_EPSILON);
        let rows = predicted.rows as f64;
        let sum: f64 = clipped
            .data
            .iter()
            .flatten()
            .zip(expected.data.iter().flatten())
            .map(|(p, y)| -(y * p.ln() + (1.0 - y) * (1.0 - p).ln()))
            .sum();
        Ok(sum / rows / self.size as f64)
    }

    /// Gradient: -(y/p - (1-y)/(1-p)) / (size · rows)
    pub fn backward(&self, predicted: &Matrix, expected: &Matrix) -> Result<Matrix> {
        check_operands(self.size, predicted, expected)?;
        let clipped = predicted.clamp(CLIP_EPSILON, 1.0 - CLIP_EPSILON);
        let scale = self.size as f64 * predicted.rows as f64;
        let mut d_inputs = Matrix::zeros(predicted.rows, predicted.cols);
        for (out, (p, y)) in d_inputs
            .data
            .iter_mut()
            .zip(clipped.data.iter().zip(expected.data.iter()))
        {
            for (d, (p, y)) in out.iter_mut().zip(p.iter().zip(y)) {
                *d = -(y / p - (1.0 - y) / (1.0 - p)) / scale;
            }
        }
        Ok(d_inputs)
    }
}
