use crate::error::{NnError, Result};
use crate::math::Matrix;

use super::{check_gradient, validate_decay, validate_learning_rate};

/// First and second moment estimates for one parameter tensor.
#[derive(Debug, Clone, Default)]
pub(crate) struct Moments {
    momentum: Matrix,
    cache: Matrix,
}

impl Moments {
    /// Adam step for a single tensor. `step` is the zero-based iteration.
    pub(crate) fn apply(
        &mut self,
        param: &mut Matrix,
        grad: &Matrix,
        hyper: &AdamHyper,
        rate: f64,
        step: u64,
    ) -> Result<()> {
        if self.momentum.shape() != param.shape() {
            self.momentum = Matrix::zeros(param.rows, param.cols);
            self.cache = Matrix::zeros(param.rows, param.cols);
        }

        self.momentum = self
            .momentum
            .mul_scalar(hyper.beta1)
            .add(&grad.mul_scalar(1.0 - hyper.beta1))?;
        self.cache = self
            .cache
            .mul_scalar(hyper.beta2)
            .add(&grad.pow_scalar(2.0).mul_scalar(1.0 - hyper.beta2))?;

        let t = (step + 1) as i32;
        let m_hat = self.momentum.mul_scalar(1.0 / (1.0 - hyper.beta1.powi(t)));
        let v_hat = self.cache.mul_scalar(1.0 / (1.0 - hyper.beta2.powi(t)));

        for (p_row, (m_row, v_row)) in param
            .data
            .iter_mut()
            .zip(m_hat.data.iter().zip(v_hat.data.iter()))
        {
            for (p, (m, v)) in p_row.iter_mut().zip(m_row.iter().zip(v_row)) {
                *p -= rate * m / (v.sqrt() + hyper.epsilon);
            }
        }
        Ok(())
    }
}

/// Hyperparameters shared by [`Adam`] and [`crate::optim::HeavyAdam`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdamHyper {
    pub learning_rate: f64,
    pub decay: f64,
    pub epsilon: f64,
    pub beta1: f64,
    pub beta2: f64,
}

impl AdamHyper {
    pub fn new(learning_rate: f64, decay: f64, epsilon: f64, beta1: f64, beta2: f64) -> Result<AdamHyper> {
        validate_learning_rate(learning_rate)?;
        validate_decay(decay)?;
        if !(epsilon >= 0.0) {
            return Err(NnError::InvalidHyperparameter(format!(
                "epsilon must be non-negative, got {epsilon}"
            )));
        }
        for (name, beta) in [("beta1", beta1), ("beta2", beta2)] {
            if !(0.0..1.0).contains(&beta) {
                return Err(NnError::InvalidHyperparameter(format!(
                    "{name} must be in [0, 1), got {beta}"
                )));
            }
        }
        Ok(AdamHyper { learning_rate, decay, epsilon, beta1, beta2 })
    }

    pub(crate) fn rate_at(&self, iterations: u64) -> f64 {
        self.learning_rate / (1.0 + self.decay * iterations as f64)
    }
}

/// Adam with learning-rate decay and bias-corrected moment estimates.
#[derive(Debug, Clone)]
pub struct Adam {
    pub hyper: AdamHyper,
    iterations: u64,
    weights: Moments,
    biases: Moments,
}

impl Adam {
    pub fn new(learning_rate: f64, decay: f64, epsilon: f64, beta1: f64, beta2: f64) -> Result<Adam> {
        Ok(Adam::from_hyper(AdamHyper::new(learning_rate, decay, epsilon, beta1, beta2)?))
    }

    pub fn from_hyper(hyper: AdamHyper) -> Adam {
        Adam { hyper, iterations: 0, weights: Moments::default(), biases: Moments::default() }
    }

    pub fn iterations(&self) -> u64 {
        self.iterations
    }

    pub fn current_learning_rate(&self) -> f64 {
        self.hyper.rate_at(self.iterations)
    }

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
        self.weights.apply(weights, d_weights, &self.hyper, rate, self.iterations)?;
        self.biases.apply(biases, d_biases, &self.hyper, rate, self.iterations)?;
        self.iterations += 1;
        Ok(())
    }
}
