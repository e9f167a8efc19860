use serde::{Deserialize, Serialize};

use crate::error::{NnError, Result};
use crate::math::Matrix;

/// How `Model::calculate_accuracy` scores predictions.
///
/// - `Regression`        — fraction of cells within `tolerance` of the target.
/// - `Categorical`       — arg-max of each prediction row matches the target's.
/// - `BinaryCategorical` — predictions thresholded at 0.5 match the targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccuracyType {
    Regression,
    Categorical,
    BinaryCategorical,
}

impl AccuracyType {
    pub fn code(self) -> i8 {
        match self {
            AccuracyType::Regression => 0,
            AccuracyType::Categorical => 1,
            AccuracyType::BinaryCategorical => 2,
        }
    }

    pub fn from_code(code: i8) -> Result<AccuracyType> {
        match code {
            0 => Ok(AccuracyType::Regression),
            1 => Ok(AccuracyType::Categorical),
            2 => Ok(AccuracyType::BinaryCategorical),
            other => Err(NnError::CorruptData(format!("unknown accuracy type code {other}"))),
        }
    }
}

fn same_shape(predicted: &Matrix, expected: &Matrix) -> Result<()> {
    if predicted.shape() != expected.shape() {
        return Err(NnError::Shape(format!(
            "predictions are {}x{} but targets are {}x{}",
            predicted.rows, predicted.cols, expected.rows, expected.cols
        )));
    }
    Ok(())
}

/// Fraction of cells with `|predicted - expected| < tolerance`.
pub fn regression_accuracy(predicted: &Matrix, expected: &Matrix, tolerance: f64) -> Result<f64> {
    same_shape(predicted, expected)?;
    let hits = predicted
        .data
        .iter()
        .flatten()
        .zip(expected.data.iter().flatten())
        .filter(|(p, y)| (*p - *y).abs() < tolerance)
        .count();
    Ok(hits as f64 / (predicted.rows * predicted.cols) as f64)
}

/// Index of the largest value in each row as a `rows × 1` matrix.
/// Ties resolve to the first maximum.
pub fn row_max(m: &Matrix) -> Matrix {
    let mut indices = Matrix::zeros(m.rows, 1);
    for (out, row) in indices.data.iter_mut().zip(&m.data) {
        let mut best = 0;
        for (i, v) in row.iter().enumerate() {
            if *v > row[best] {
                best = i;
            }
        }
        out[0] = best as f64;
    }
    indices
}

/// Fraction of rows whose arg-max agrees with the target's arg-max.
pub fn categorical_accuracy(predicted: &Matrix, expected: &Matrix) -> Result<f64> {
    same_shape(predicted, expected)?;
    let hits = row_max(predicted)
        .data
        .iter()
        .zip(row_max(expected).data.iter())
        .filter(|(p, y)| p[0] == y[0])
        .count();
    Ok(hits as f64 / predicted.rows as f64)
}

/// 0 where a value is below 0.5, 1 otherwise.
pub fn binary_outputs(m: &Matrix) -> Matrix {
    m.map(|v| if v < 0.5 { 0.0 } else { 1.0 })
}

/// Fraction of cells where the thresholded prediction equals the target.
pub fn binary_categorical_accuracy(predicted: &Matrix, expected: &Matrix) -> Result<f64> {
    same_shape(predicted, expected)?;
    let hits = binary_outputs(predicted)
        .data
        .iter()
        .flatten()
        .zip(expected.data.iter().flatten())
        .filter(|(p, y)| *p == *y)
        .count();
    Ok(hits as f64 / (predicted.rows * predicted.cols) as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_max_picks_first_maximum() {
        let m = Matrix::from_data(vec![vec![0.2, 0.7, 0.1], vec![0.5, 0.5, 0.0]]).unwrap();
        assert_eq!(row_max(&m).data, vec![vec![1.0], vec![0.0]]);
    }

    #[test]
    fn binary_threshold_is_inclusive_at_half() {
        let m = Matrix::from_data(vec![vec![0.49, 0.5, 0.9]]).unwrap();
        assert_eq!(binary_outputs(&m).data, vec![vec![0.0, 1.0, 1.0]]);
    }

    #[test]
    fn binary_accuracy_counts_cells() {
        let p = Matrix::from_data(vec![vec![0.2, 0.8], vec![0.6, 0.1]]).unwrap();
        let y = Matrix::from_data(vec![vec![0.0, 1.0], vec![0.0, 0.0]]).unwrap();
        assert!((binary_categorical_accuracy(&p, &y).unwrap() - 0.75).abs() < 1e-12);
    }

    #[test]
    fn codes_round_trip() {
        for t in [AccuracyType::Regression, AccuracyType::Categorical, AccuracyType::BinaryCategorical] {
            assert_eq!(AccuracyType::from_code(t.code()).unwrap(), t);
        }
        assert!(AccuracyType::from_code(9).is_err());
    }
}
