use rand::Rng;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use crate::error::{NnError, Result};

/// Floor applied by [`Matrix::clip`] to negative values.
pub const CLIP_EPSILON: f64 = 1e-7;

/// Axis selector for [`Matrix::sum`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    /// Axis 0: sum down each column, giving a `1 × cols` row.
    Columns,
    /// Axis 1: sum across each row, giving a `1 × rows` row of per-sample sums.
    Rows,
}

/// Dense row-major matrix of `f64`.
///
/// A 0×0 matrix (`Matrix::default()`) is the empty sentinel used for
/// uninitialized caches and accumulators.
///
/// Deserialization checks that `data` actually has `rows × cols` entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawMatrix")]
pub struct Matrix {
    pub rows: usize,
    pub cols: usize,
    pub data: Vec<Vec<f64>>,
}

#[derive(Deserialize)]
struct RawMatrix {
    rows: usize,
    cols: usize,
    data: Vec<Vec<f64>>,
}

impl TryFrom<RawMatrix> for Matrix {
    type Error = NnError;

    fn try_from(raw: RawMatrix) -> Result<Matrix> {
        if raw.rows == 0 && raw.cols == 0 && raw.data.is_empty() {
            return Ok(Matrix::default());
        }
        let matrix = Matrix::from_data(raw.data)?;
        if matrix.shape() != (raw.rows, raw.cols) {
            return Err(NnError::CorruptData(format!(
                "matrix declares {}x{} but holds {}x{}",
                raw.rows, raw.cols, matrix.rows, matrix.cols
            )));
        }
        Ok(matrix)
    }
}

impl Matrix {
    /// Zero-filled `rows × cols` matrix. Fails if either dimension is zero.
    pub fn new(rows: usize, cols: usize) -> Result<Matrix> {
        if rows == 0 || cols == 0 {
            return Err(NnError::InvalidDimensions { rows, cols });
        }
        Ok(Matrix::zeros(rows, cols))
    }

    /// Zero-filled matrix without dimension validation.
    pub fn zeros(rows: usize, cols: usize) -> Matrix {
        Matrix {
            rows,
            cols,
            data: vec![vec![0.0; cols]; rows],
        }
    }

    /// Builds a matrix from row vectors. Rejects empty input and ragged rows.
    pub fn from_data(data: Vec<Vec<f64>>) -> Result<Matrix> {
        let rows = data.len();
        let cols = data.first().map_or(0, |r| r.len());
        if rows == 0 || cols == 0 {
            return Err(NnError::InvalidDimensions { rows, cols });
        }
        if let Some(bad) = data.iter().find(|r| r.len() != cols) {
            return Err(NnError::InvalidDimensions { rows, cols: bad.len() });
        }
        Ok(Matrix { rows, cols, data })
    }

    /// Single-row matrix from a slice.
    pub fn row_vector(values: &[f64]) -> Result<Matrix> {
        Matrix::from_data(vec![values.to_vec()])
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0 || self.cols == 0
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Samples a single value from N(0, 1) using the Box-Muller transform.
    fn sample_standard_normal<R: Rng + ?Sized>(rng: &mut R) -> f64 {
        // Both uniforms on (0, 1] to avoid log(0).
        let u1: f64 = 1.0 - rng.gen::<f64>();
        let u2: f64 = 1.0 - rng.gen::<f64>();
        (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
    }

    /// He initialization: samples from N(0, sqrt(2 / rows)).
    ///
    /// Weights are stored as `input × output`, so `rows` is the fan-in.
    pub fn he<R: Rng + ?Sized>(rows: usize, cols: usize, rng: &mut R) -> Matrix {
        let std_dev = (2.0 / rows.max(1) as f64).sqrt();
        let mut res = Matrix::zeros(rows, cols);
        for row in res.data.iter_mut() {
            for v in row.iter_mut() {
                *v = Matrix::sample_standard_normal(rng) * std_dev;
            }
        }
        res
    }

    pub fn get(&self, row: usize, col: usize) -> Result<f64> {
        if row >= self.rows || col >= self.cols {
            return Err(NnError::IndexOutOfRange { row, col });
        }
        Ok(self.data[row][col])
    }

    pub fn set(&mut self, row: usize, col: usize, value: f64) -> Result<()> {
        if row >= self.rows || col >= self.cols {
            return Err(NnError::IndexOutOfRange { row, col });
        }
        self.data[row][col] = value;
        Ok(())
    }

    pub fn row(&self, row: usize) -> Result<&[f64]> {
        self.data
            .get(row)
            .map(|r| r.as_slice())
            .ok_or(NnError::IndexOutOfRange { row, col: 0 })
    }

    pub fn column(&self, col: usize) -> Result<Vec<f64>> {
        if col >= self.cols {
            return Err(NnError::IndexOutOfRange { row: 0, col });
        }
        Ok(self.data.iter().map(|r| r[col]).collect())
    }

    pub fn set_row(&mut self, row: usize, values: &[f64]) -> Result<()> {
        if row >= self.rows {
            return Err(NnError::IndexOutOfRange { row, col: 0 });
        }
        if values.len() != self.cols {
            return Err(NnError::InvalidDimensions { rows: 1, cols: values.len() });
        }
        self.data[row].copy_from_slice(values);
        Ok(())
    }

    pub fn set_column(&mut self, col: usize, values: &[f64]) -> Result<()> {
        if col >= self.cols {
            return Err(NnError::IndexOutOfRange { row: 0, col });
        }
        if values.len() != self.rows {
            return Err(NnError::InvalidDimensions { rows: values.len(), cols: 1 });
        }
        for (row, v) in self.data.iter_mut().zip(values) {
            row[col] = *v;
        }
        Ok(())
    }

    /// Copies rows `start..end` into a new matrix.
    pub fn slice_rows(&self, start: usize, end: usize) -> Result<Matrix> {
        if start >= end || end > self.rows {
            return Err(NnError::IndexOutOfRange { row: end, col: 0 });
        }
        Ok(Matrix {
            rows: end - start,
            cols: self.cols,
            data: self.data[start..end].to_vec(),
        })
    }

    fn check_same_shape(&self, rhs: &Matrix, op: &'static str) -> Result<()> {
        if self.rows != rhs.rows || self.cols != rhs.cols {
            return Err(NnError::DimensionMismatch {
                op,
                left: self.shape(),
                right: rhs.shape(),
            });
        }
        Ok(())
    }

    fn zip_with<F>(&self, rhs: &Matrix, op: &'static str, f: F) -> Result<Matrix>
    where
        F: Fn(f64, f64) -> f64,
    {
        self.check_same_shape(rhs, op)?;
        let data = self
            .data
            .iter()
            .zip(rhs.data.iter())
            .map(|(a, b)| a.iter().zip(b.iter()).map(|(x, y)| f(*x, *y)).collect())
            .collect();
        Ok(Matrix { rows: self.rows, cols: self.cols, data })
    }

    pub fn add(&self, rhs: &Matrix) -> Result<Matrix> {
        self.zip_with(rhs, "add", |a, b| a + b)
    }

    pub fn sub(&self, rhs: &Matrix) -> Result<Matrix> {
        self.zip_with(rhs, "sub", |a, b| a - b)
    }

    /// Element-wise (Hadamard) product of two same-shape matrices.
    pub fn hadamard(&self, rhs: &Matrix) -> Result<Matrix> {
        self.zip_with(rhs, "hadamard", |a, b| a * b)
    }

    /// Standard matrix product. Requires `self.cols == rhs.rows`.
    pub fn dot(&self, rhs: &Matrix) -> Result<Matrix> {
        if self.cols != rhs.rows {
            return Err(NnError::DimensionMismatch {
                op: "dot",
                left: self.shape(),
                right: rhs.shape(),
            });
        }

        let mut res = Matrix::zeros(self.rows, rhs.cols);
        for i in 0..res.rows {
            for j in 0..res.cols {
                let mut sum = 0.0;
                for k in 0..self.cols {
                    sum += self.data[i][k] * rhs.data[k][j];
                }
                res.data[i][j] = sum;
            }
        }
        Ok(res)
    }

    pub fn transpose(&self) -> Matrix {
        let mut res = Matrix::zeros(self.cols, self.rows);
        for i in 0..res.rows {
            for j in 0..res.cols {
                res.data[i][j] = self.data[j][i];
            }
        }
        res
    }

    pub fn map<F>(&self, functor: F) -> Matrix
    where
        F: Fn(f64) -> f64,
    {
        Matrix {
            rows: self.rows,
            cols: self.cols,
            data: self
                .data
                .iter()
                .map(|row| row.iter().map(|x| functor(*x)).collect())
                .collect(),
        }
    }

    pub fn neg(&self) -> Matrix {
        self.map(|x| -x)
    }

    pub fn add_scalar(&self, x: f64) -> Matrix {
        self.map(|v| v + x)
    }

    pub fn mul_scalar(&self, x: f64) -> Matrix {
        self.map(|v| v * x)
    }

    pub fn pow_scalar(&self, x: f64) -> Matrix {
        self.map(|v| v.powf(x))
    }

    pub fn sum(&self, axis: Axis) -> Matrix {
        match axis {
            Axis::Columns => {
                let mut res = Matrix::zeros(1, self.cols);
                for row in &self.data {
                    for (acc, v) in res.data[0].iter_mut().zip(row) {
                        *acc += v;
                    }
                }
                res
            }
            Axis::Rows => Matrix {
                rows: 1,
                cols: self.rows,
                data: vec![self.data.iter().map(|r| r.iter().sum()).collect()],
            },
        }
    }

    /// Sum of every element.
    pub fn total(&self) -> f64 {
        self.data.iter().flatten().sum()
    }

    /// Replaces negative values with [`CLIP_EPSILON`]. Values near or above 1 are untouched.
    pub fn clip(&self) -> Matrix {
        self.map(|v| if v < 0.0 { CLIP_EPSILON } else { v })
    }

    pub fn clamp(&self, lo: f64, hi: f64) -> Matrix {
        self.map(|v| v.clamp(lo, hi))
    }

    /// Adds a `1 × cols` row to every row of `self`.
    pub fn add_row_broadcast(&self, row: &Matrix) -> Result<Matrix> {
        if row.rows != 1 || row.cols != self.cols {
            return Err(NnError::DimensionMismatch {
                op: "add_row_broadcast",
                left: self.shape(),
                right: row.shape(),
            });
        }
        let mut res = self.clone();
        for r in res.data.iter_mut() {
            for (v, b) in r.iter_mut().zip(&row.data[0]) {
                *v += b;
            }
        }
        Ok(res)
    }

    /// Shape equality plus element-wise comparison within `tol`.
    pub fn approx_eq(&self, other: &Matrix, tol: f64) -> bool {
        self.shape() == other.shape()
            && self
                .data
                .iter()
                .flatten()
                .zip(other.data.iter().flatten())
                .all(|(a, b)| (a - b).abs() <= tol)
    }
}

impl Default for Matrix {
    fn default() -> Self {
        Matrix { rows: 0, cols: 0, data: vec![] }
    }
}
