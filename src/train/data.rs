use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::error::{NnError, Result};
use crate::math::Matrix;

/// Applies one random permutation to the rows of both `x` and `y`, keeping
/// every sample paired with its target.
pub fn shuffle_dataset<R: Rng + ?Sized>(x: &Matrix, y: &Matrix, rng: &mut R) -> Result<(Matrix, Matrix)> {
    if x.rows != y.rows {
        return Err(NnError::Shape(format!(
            "features have {} rows but targets have {}",
            x.rows, y.rows
        )));
    }

    let mut indices: Vec<usize> = (0..x.rows).collect();
    indices.shuffle(rng);

    let pick = |m: &Matrix| Matrix {
        rows: m.rows,
        cols: m.cols,
        data: indices.iter().map(|&i| m.data[i].clone()).collect(),
    };
    Ok((pick(x), pick(y)))
}

pub fn shuffle_dataset_with_seed(x: &Matrix, y: &Matrix, seed: u64) -> Result<(Matrix, Matrix)> {
    shuffle_dataset(x, y, &mut StdRng::seed_from_u64(seed))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_stay_paired() {
        let x = Matrix::from_data((0..20).map(|i| vec![i as f64, -(i as f64)]).collect()).unwrap();
        let y = Matrix::from_data((0..20).map(|i| vec![i as f64 * 10.0]).collect()).unwrap();
        let (sx, sy) = shuffle_dataset_with_seed(&x, &y, 7).unwrap();

        assert_ne!(sx, x);
        for (xr, yr) in sx.data.iter().zip(&sy.data) {
            assert_eq!(xr[0] * 10.0, yr[0]);
            assert_eq!(xr[1], -xr[0]);
        }
        let mut firsts: Vec<f64> = sx.data.iter().map(|r| r[0]).collect();
        firsts.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(firsts, (0..20).map(|i| i as f64).collect::<Vec<_>>());
    }

    #[test]
    fn row_count_mismatch_is_rejected() {
        let x = Matrix::zeros(3, 1);
        let y = Matrix::zeros(2, 1);
        assert!(matches!(shuffle_dataset_with_seed(&x, &y, 1), Err(NnError::Shape(_))));
    }
}
