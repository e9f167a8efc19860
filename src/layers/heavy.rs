//! Experimental quadratic ("heavy") layer: `Y = relu(X·W + X²·H + b)`.
//!
//! Each input feeds the output both linearly through `W` and through its
//! square via `H`. The layer is trained with [`crate::optim::HeavyAdam`] and
//! is not part of [`crate::network::Model`] or the model file format.

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::activation::activation::{relu, relu_backward};
use crate::error::{NnError, Result};
use crate::math::{Axis, Matrix};

#[derive(Debug, Clone)]
pub struct HeavyGradients {
    pub d_heavies: Matrix,
    pub d_weights: Matrix,
    pub d_biases: Matrix,
    pub d_inputs: Matrix,
}

#[derive(Debug, Clone)]
pub struct HeavyLayer {
    pub input_size: usize,
    pub output_size: usize,
    pub weights: Matrix,
    pub heavies: Matrix,
    pub biases: Matrix,
    relu_inputs: Matrix,
    x_squared: Matrix,
    rng: StdRng,
}

impl HeavyLayer {
    pub fn new(input_size: usize, output_size: usize) -> Result<HeavyLayer> {
        HeavyLayer::with_rng(input_size, output_size, StdRng::from_entropy())
    }

    pub fn with_seed(input_size: usize, output_size: usize, seed: u64) -> Result<HeavyLayer> {
        HeavyLayer::with_rng(input_size, output_size, StdRng::seed_from_u64(seed))
    }

    fn with_rng(input_size: usize, output_size: usize, rng: StdRng) -> Result<HeavyLayer> {
        if input_size == 0 || output_size == 0 {
            return Err(NnError::InvalidDimensions { rows: input_size, cols: output_size });
        }
        Ok(HeavyLayer {
            input_size,
            output_size,
            weights: Matrix::zeros(input_size, output_size),
            heavies: Matrix::zeros(input_size, output_size),
            biases: Matrix::zeros(1, output_size),
            relu_inputs: Matrix::default(),
            x_squared: Matrix::default(),
            rng,
        })
    }

    /// He-normal weights and heavies, zero biases.
    pub fn init(&mut self) {
        self.weights = Matrix::he(self.input_size, self.output_size, &mut self.rng);
        self.heavies = Matrix::he(self.input_size, self.output_size, &mut self.rng);
        self.biases = Matrix::zeros(1, self.output_size);
    }

    fn check_input(&self, x: &Matrix) -> Result<()> {
        if x.cols != self.input_size {
            return Err(NnError::Shape(format!(
                "heavy layer expects {} input columns, got {}",
                self.input_size, x.cols
            )));
        }
        Ok(())
    }

    pub fn forward(&mut self, x: &Matrix) -> Result<Matrix> {
        self.check_input(x)?;
        let x_squared = x.pow_scalar(2.0);
        let z = x
            .dot(&self.weights)?
            .add(&x_squared.dot(&self.heavies)?)?
            .add_row_broadcast(&self.biases)?;

        self.x_squared = x_squared;
        self.relu_inputs = z.clone();
        Ok(relu(z))
    }

    pub fn backward(&self, x: &Matrix, d_values: &Matrix) -> Result<HeavyGradients> {
        self.check_input(x)?;
        if d_values.cols != self.output_size || d_values.rows != x.rows {
            return Err(NnError::Shape(format!(
                "heavy layer expects {}x{} gradients, got {}x{}",
                x.rows, self.output_size, d_values.rows, d_values.cols
            )));
        }
        if self.relu_inputs.shape() != d_values.shape() {
            return Err(NnError::Shape("no cached forward pass for this batch".into()));
        }

        let delta = relu_backward(d_values, &self.relu_inputs)?;

        // dX = dY'·Wᵗ + 2X ⊙ (dY'·Hᵗ)
        let linear = delta.dot(&self.weights.transpose())?;
        let quadratic = delta.dot(&self.heavies.transpose())?.hadamard(&x.mul_scalar(2.0))?;

        Ok(HeavyGradients {
            d_heavies: self.x_squared.transpose().dot(&delta)?,
            d_weights: x.transpose().dot(&delta)?,
            d_biases: delta.sum(Axis::Columns),
            d_inputs: linear.add(&quadratic)?,
        })
    }
}
