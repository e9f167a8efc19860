use crate::error::Result;
use crate::layers::heavy::{HeavyGradients, HeavyLayer};
use crate::math::Matrix;

use super::adam::{AdamHyper, Moments};
use super::check_gradient;

/// Adam over the three parameter tensors of a [`HeavyLayer`].
#[derive(Debug, Clone)]
pub struct HeavyAdam {
    pub hyper: AdamHyper,
    iterations: u64,
    heavies: Moments,
    weights: Moments,
    biases: Moments,
}

impl HeavyAdam {
    pub fn new(learning_rate: f64, decay: f64, epsilon: f64, beta1: f64, beta2: f64) -> Result<HeavyAdam> {
        Ok(HeavyAdam {
            hyper: AdamHyper::new(learning_rate, decay, epsilon, beta1, beta2)?,
            iterations: 0,
            heavies: Moments::default(),
            weights: Moments::default(),
            biases: Moments::default(),
        })
    }

    pub fn iterations(&self) -> u64 {
        self.iterations
    }

    pub fn update(
        &mut self,
        heavies: &mut Matrix,
        weights: &mut Matrix,
        biases: &mut Matrix,
        d_heavies: &Matrix,
        d_weights: &Matrix,
        d_biases: &Matrix,
    ) -> Result<()> {
        check_gradient(heavies, d_heavies)?;
        check_gradient(weights, d_weights)?;
        check_gradient(biases, d_biases)?;

        let rate = self.hyper.rate_at(self.iterations);
        let step = self.iterations;
        self.heavies.apply(heavies, d_heavies, &self.hyper, rate, step)?;
        self.weights.apply(weights, d_weights, &self.hyper, rate, step)?;
        self.biases.apply(biases, d_biases, &self.hyper, rate, step)?;
        self.iterations += 1;
        Ok(())
    }

    /// Convenience wrapper applying a backward result to its layer.
    pub fn step(&mut self, layer: &mut HeavyLayer, grads: &HeavyGradients) -> Result<()> {
        self.update(
            &mut layer.heavies,
            &mut layer.weights,
            &mut layer.biases,
            &grads.d_heavies,
            &grads.d_weights,
            &grads.d_biases,
        )
    }
}
