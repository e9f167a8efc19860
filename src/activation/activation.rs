use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::math::matrix::Matrix;

/// Activation applied after a layer's affine transform.
///
/// `Softmax` is row-wise rather than element-wise; its derivative mixes all
/// outputs of a sample and is applied by the softmax layer through the
/// Jacobian, so [`Activation::backward`] passes the gradient through for it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Activation {
    Identity,
    ReLU,
    LeakyReLU { slope: f64 },
    Sigmoid,
    Softmax,
}

impl Activation {
    /// Applies the activation to `z`, consuming and returning the buffer.
    pub fn forward(&self, z: Matrix) -> Matrix {
        match self {
            Activation::Identity => z,
            Activation::ReLU => relu(z),
            Activation::LeakyReLU { slope } => leaky_relu(z, *slope),
            Activation::Sigmoid => sigmoid(z),
            Activation::Softmax => softmax(z),
        }
    }

    /// Multiplies the upstream gradient by the element-wise derivative.
    ///
    /// `inputs` is the pre-activation matrix and `outputs` the activated one;
    /// each kernel reads whichever it needs.
    pub fn backward(&self, d_values: &Matrix, inputs: &Matrix, outputs: &Matrix) -> Result<Matrix> {
        match self {
            Activation::Identity | Activation::Softmax => Ok(d_values.clone()),
            Activation::ReLU => relu_backward(d_values, inputs),
            Activation::LeakyReLU { slope } => leaky_relu_backward(d_values, inputs, *slope),
            Activation::Sigmoid => sigmoid_backward(d_values, outputs),
        }
    }
}

fn apply_in_place<F: Fn(f64) -> f64>(mut m: Matrix, f: F) -> Matrix {
    for v in m.data.iter_mut().flatten() {
        *v = f(*v);
    }
    m
}

pub fn relu(m: Matrix) -> Matrix {
    apply_in_place(m, |x| x.max(0.0))
}

/// Zeroes the gradient wherever the forward input was not positive.
pub fn relu_backward(d_values: &Matrix, inputs: &Matrix) -> Result<Matrix> {
    let mask = inputs.map(|x| if x > 0.0 { 1.0 } else { 0.0 });
    d_values.hadamard(&mask)
}

pub fn leaky_relu(m: Matrix, slope: f64) -> Matrix {
    apply_in_place(m, |x| if x >= 0.0 { x } else { slope * x })
}

pub fn leaky_relu_backward(d_values: &Matrix, inputs: &Matrix, slope: f64) -> Result<Matrix> {
    let scale = inputs.map(|x| if x < 0.0 { slope } else { 1.0 });
    d_values.hadamard(&scale)
}

pub fn sigmoid(m: Matrix) -> Matrix {
    apply_in_place(m, |x| 1.0 / (1.0 + (-x).exp()))
}

/// `dY · y · (1 - y)`, using the sigmoid outputs from the forward pass.
pub fn sigmoid_backward(d_values: &Matrix, outputs: &Matrix) -> Result<Matrix> {
    d_values.hadamard(&outputs.map(|y| y * (1.0 - y)))
}

/// Row-wise softmax. Each row is shifted by its maximum before exponentiation.
pub fn softmax(mut m: Matrix) -> Matrix {
    for row in m.data.iter_mut() {
        let max = row.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let mut sum = 0.0;
        for v in row.iter_mut() {
            *v = (*v - max).exp();
            sum += *v;
        }
        for v in row.iter_mut() {
            *v /= sum;
        }
    }
    m
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relu_backward_masks_non_positive_inputs() {
        let x = Matrix::from_data(vec![vec![-1.0, 0.0, 2.0]]).unwrap();
        let dy = Matrix::from_data(vec![vec![5.0, 5.0, 5.0]]).unwrap();
        let out = relu_backward(&dy, &x).unwrap();
        assert_eq!(out.data, vec![vec![0.0, 0.0, 5.0]]);
    }

    #[test]
    fn leaky_relu_scales_negative_side() {
        let x = Matrix::from_data(vec![vec![-2.0, 3.0]]).unwrap();
        assert_eq!(leaky_relu(x.clone(), 0.1).data, vec![vec![-0.2, 3.0]]);
        let dy = Matrix::from_data(vec![vec![1.0, 1.0]]).unwrap();
        assert_eq!(leaky_relu_backward(&dy, &x, 0.1).unwrap().data, vec![vec![0.1, 1.0]]);
    }

    #[test]
    fn sigmoid_at_zero_is_half() {
        let y = sigmoid(Matrix::zeros(1, 2));
        assert_eq!(y.data, vec![vec![0.5, 0.5]]);
        let dy = Matrix::from_data(vec![vec![1.0, 2.0]]).unwrap();
        assert_eq!(sigmoid_backward(&dy, &y).unwrap().data, vec![vec![0.25, 0.5]]);
    }

    #[test]
    fn softmax_survives_large_logits() {
        let z = Matrix::from_data(vec![vec![1000.0, 1000.0]]).unwrap();
        let y = softmax(z);
        assert!(y.data[0].iter().all(|v| (v - 0.5).abs() < 1e-12));
    }
}
