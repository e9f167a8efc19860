use serde::{Deserialize, Serialize};

use crate::error::{NnError, Result};
use crate::math::Matrix;

use super::{BceLoss, CrossEntropyLoss, MaeLoss, MseLoss};

/// Selects which loss function a model trains against.
///
/// - `Mse`                — Mean-squared error; pair with a Linear output.
/// - `Mae`                — Mean absolute error; pair with a Linear output.
/// - `CrossEntropy`       — Categorical cross-entropy; pair with Softmax output.
///   A model ending in Softmax uses the fused Softmax+CE gradient.
/// - `BinaryCrossEntropy` — Binary cross-entropy; pair with Sigmoid output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LossType {
    Mse,
    Mae,
    CrossEntropy,
    BinaryCrossEntropy,
}

impl LossType {
    pub fn code(self) -> i8 {
        match self {
            LossType::Mse => 0,
            LossType::Mae => 1,
            LossType::CrossEntropy => 2,
            LossType::BinaryCrossEntropy => 3,
        }
    }

    pub fn from_code(code: i8) -> Result<LossType> {
        match code {
            0 => Ok(LossType::Mse),
            1 => Ok(LossType::Mae),
            2 => Ok(LossType::CrossEntropy),
            3 => Ok(LossType::BinaryCrossEntropy),
            other => Err(NnError::CorruptData(format!("unknown loss type code {other}"))),
        }
    }

    /// Builds the loss for `size` output features.
    pub fn build(self, size: usize) -> Result<Loss> {
        Ok(match self {
            LossType::Mse => Loss::Mse(MseLoss::new(size)?),
            LossType::Mae => Loss::Mae(MaeLoss::new(size)?),
            LossType::CrossEntropy => Loss::CrossEntropy(CrossEntropyLoss::new(size)?),
            LossType::BinaryCrossEntropy => Loss::BinaryCrossEntropy(BceLoss::new(size)?),
        })
    }
}

/// A configured loss function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Loss {
    Mse(MseLoss),
    Mae(MaeLoss),
    CrossEntropy(CrossEntropyLoss),
    BinaryCrossEntropy(BceLoss),
}

impl Loss {
    pub fn loss_type(&self) -> LossType {
        match self {
            Loss::Mse(_) => LossType::Mse,
            Loss::Mae(_) => LossType::Mae,
            Loss::CrossEntropy(_) => LossType::CrossEntropy,
            Loss::BinaryCrossEntropy(_) => LossType::BinaryCrossEntropy,
        }
    }

    /// Expected feature width of both operands.
    pub fn size(&self) -> usize {
        match self {
            Loss::Mse(l) => l.size,
            Loss::Mae(l) => l.size,
            Loss::CrossEntropy(l) => l.size,
            Loss::BinaryCrossEntropy(l) => l.size,
        }
    }

    /// Scalar loss averaged over the batch.
    pub fn forward(&self, predicted: &Matrix, expected: &Matrix) -> Result<f64> {
        match self {
            Loss::Mse(l) => l.forward(predicted, expected),
            Loss::Mae(l) => l.forward(predicted, expected),
            Loss::CrossEntropy(l) => l.forward(predicted, expected),
            Loss::BinaryCrossEntropy(l) => l.forward(predicted, expected),
        }
    }

    /// Gradient of the loss with respect to `predicted`.
    pub fn backward(&self, predicted: &Matrix, expected: &Matrix) -> Result<Matrix> {
        match self {
            Loss::Mse(l) => l.backward(predicted, expected),
            Loss::Mae(l) => l.backward(predicted, expected),
            Loss::CrossEntropy(l) => l.backward(predicted, expected),
            Loss::BinaryCrossEntropy(l) => l.backward(predicted, expected),
        }
    }
}
