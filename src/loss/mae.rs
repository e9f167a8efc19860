use crate::error::Result;
use crate::math::Matrix;

use super::{check_operands, check_size};

/// Mean absolute error over `size` output features.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaeLoss {
    pub size: usize,
}

impl MaeLoss {
    pub fn new(size: usize) -> Result<MaeLoss> {
        check_size(size)?;
        Ok(MaeLoss { size })
    }

    /// Scalar MAE: mean(|predicted - expected|) over every cell.
    pub fn forward(&self, predicted: &Matrix, expected: &Matrix) -> Result<f64> {
        check_operands(self.size, predicted, expected)?;
        let diff = predicted.sub(expected)?;
        Ok(diff.map(f64::abs).total() / (diff.rows * diff.cols) as f64)
    }

    /// Subgradient: sign(p - y) / size, 0 when equal.
    pub fn backward(&self, predicted: &Matrix, expected: &Matrix) -> Result<Matrix> {
        check_operands(self.size, predicted, expected)?;
        let n = self.size as f64;
        Ok(predicted.sub(expected)?.map(|diff| {
            if diff > 0.0 {
                1.0 / n
            } else if diff < 0.0 {
                -1.0 / n
            } else {
                0.0
            }
        }))
    }
}
