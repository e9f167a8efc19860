use crate::error::{NnError, Result};
use crate::math::Matrix;

use super::{check_gradient, validate_decay, validate_learning_rate};

/// Stochastic gradient descent with optional learning-rate decay and momentum.
///
/// The effective rate for step `t` is `learning_rate / (1 + decay · t)`.
/// With a non-zero momentum the update keeps a velocity per tensor:
/// `v = momentum · v - rate · g; param += v`.
#[derive(Debug, Clone)]
pub struct Sgd {
    pub learning_rate: f64,
    pub decay: f64,
    pub momentum: f64,
    iterations: u64,
    weight_momentums: Matrix,
    bias_momentums: Matrix,
}

impl Sgd {
    pub fn new(learning_rate: f64, decay: f64, momentum: f64) -> Result<Sgd> {
        validate_learning_rate(learning_rate)?;
        validate_decay(decay)?;
        if !(0.0..1.0).contains(&momentum) {
            return Err(NnError::InvalidHyperparameter(format!(
                "momentum must be in [0, 1), got {momentum}"
            )));
        }
        Ok(Sgd {
            learning_rate,
            decay,
            momentum,
            iterations: 0,
            weight_momentums: Matrix::default(),
            bias_momentums: Matrix::default(),
        })
    }

    /// Same hyperparameters, no velocity, iteration count reset.
    pub fn cold(&self) -> Sgd {
        Sgd {
            learning_rate: self.learning_rate,
            decay: self.decay,
            momentum: self.momentum,
            iterations: 0,
            weight_momentums: Matrix::default(),
            bias_momentums: Matrix::default(),
        }
    }

    pub fn iterations(&self) -> u64 {
        self.iterations
    }

    pub fn current_learning_rate(&self) -> f64 {
        self.learning_rate / (1.0 + self.decay * self.iterations as f64)
    }

    /// Applies one update to a layer's parameters given its gradients.
    pub fn update(
        &mut self,
        weights: &mut Matrix,
        biases: &mut Matrix,
        d_weights: &Matrix,
        d_biases: &Matrix,
    ) -> Result<()> {
        check_gradient(weights, d_weights)?;
        check_gradient(biases, d_biases)?;

        let rate = self.current_learning_rate();
        if self.momentum > 0.0 {
            if self.weight_momentums.shape() != weights.shape() {
                self.weight_momentums = Matrix::zeros(weights.rows, weights.cols);
                self.bias_momentums = Matrix::zeros(biases.rows, biases.cols);
            }
            self.weight_momentums = self
                .weight_momentums
                .mul_scalar(self.momentum)
                .sub(&d_weights.mul_scalar(rate))?;
            self.bias_momentums = self
                .bias_momentums
                .mul_scalar(self.momentum)
                .sub(&d_biases.mul_scalar(rate))?;
            *weights = weights.add(&self.weight_momentums)?;
            *biases = biases.add(&self.bias_momentums)?;
        } else {
            *weights = weights.sub(&d_weights.mul_scalar(rate))?;
            *biases = biases.sub(&d_biases.mul_scalar(rate))?;
        }

        self.iterations += 1;
        Ok(())
    }
}
