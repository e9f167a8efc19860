pub mod bce;
pub mod cross_entropy;
pub mod loss_type;
pub mod mae;
pub mod mse;

pub use bce::BceLoss;
pub use cross_entropy::CrossEntropyLoss;
pub use loss_type::{Loss, LossType};
pub use mae::MaeLoss;
pub use mse::MseLoss;

use crate::error::{NnError, Result};
use crate::math::Matrix;

fn check_size(size: usize) -> Result<()> {
    if size == 0 {
        return Err(NnError::InvalidDimensions { rows: 1, cols: 0 });
    }
    Ok(())
}

/// Both operands must be `rows × size` with the same row count.
fn check_operands(size: usize, predicted: &Matrix, expected: &Matrix) -> Result<()> {
    for (name, m) in [("predictions", predicted), ("targets", expected)] {
        if m.cols != size {
            return Err(NnError::Shape(format!(
                "loss expects {size} columns, {name} are {}x{}",
                m.rows, m.cols
            )));
        }
    }
    if predicted.rows != expected.rows {
        return Err(NnError::Shape(format!(
            "predictions have {} rows but targets have {}",
            predicted.rows, expected.rows
        )));
    }
    Ok(())
}
