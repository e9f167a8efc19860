use crate::error::Result;
use crate::math::Matrix;

use super::{check_operands, check_size};

/// Mean squared error over `size` output features.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MseLoss {
    pub size: usize,
}

impl MseLoss {
    pub fn new(size: usize) -> Result<MseLoss> {
        check_size(size)?;
        Ok(MseLoss { size })
    }

    /// Scalar MSE: mean((predicted - expected)²) over every cell.
    pub fn forward(&self, predicted: &Matrix, expected: &Matrix) -> Result<f64> {
        check_operands(self.size, predicted, expected)?;
        let diff = predicted.sub(expected)?;
        Ok(diff.pow_scalar(2.0).total() / (diff.rows * diff.cols) as f64)
    }

    /// Gradient: 2·(predicted - expected) / size
    pub fn backward(&self, predicted: &Matrix, expected: &Matrix) -> Result<Matrix> {
        check_operands(self.size, predicted, expected)?;
        Ok(predicted.sub(expected)?.mul_scalar(2.0 / self.size as f64))
    }
}
