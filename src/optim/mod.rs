pub mod adam;
pub mod heavy_adam;
pub mod sgd;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub use adam::{Adam, AdamHyper};
pub use heavy_adam::HeavyAdam;
pub use sgd::Sgd;

use crate::error::{NnError, Result};
use crate::math::Matrix;

pub const KEY_LEARNING_RATE: &str = "learningRate";
pub const KEY_DECAY: &str = "decay";
pub const KEY_MOMENTUM: &str = "momentum";
pub const KEY_EPSILON: &str = "epsilon";
pub const KEY_BETA1: &str = "beta1";
pub const KEY_BETA2: &str = "beta2";

fn validate_learning_rate(learning_rate: f64) -> Result<()> {
    if !(learning_rate > 0.0) {
        return Err(NnError::InvalidHyperparameter(format!(
            "learning rate must be positive, got {learning_rate}"
        )));
    }
    Ok(())
}

fn validate_decay(decay: f64) -> Result<()> {
    if !(decay >= 0.0) {
        return Err(NnError::InvalidHyperparameter(format!(
            "decay must be non-negative, got {decay}"
        )));
    }
    Ok(())
}

fn check_gradient(param: &Matrix, grad: &Matrix) -> Result<()> {
    if param.shape() != grad.shape() {
        return Err(NnError::DimensionMismatch {
            op: "optimizer update",
            left: param.shape(),
            right: grad.shape(),
        });
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimizerType {
    Sgd,
    Adam,
}

impl OptimizerType {
    pub fn code(self) -> i8 {
        match self {
            OptimizerType::Sgd => 0,
            OptimizerType::Adam => 1,
        }
    }

    pub fn from_code(code: i8) -> Result<OptimizerType> {
        match code {
            0 => Ok(OptimizerType::Sgd),
            1 => Ok(OptimizerType::Adam),
            other => Err(NnError::CorruptData(format!("unknown optimizer type code {other}"))),
        }
    }
}

/// Optimizer attached to a dense layer.
///
/// A finalized model holds one instance per layer, each with its own
/// accumulators, all cloned cold from the prototype passed to `finalize`.
#[derive(Debug, Clone)]
pub enum Optimizer {
    Sgd(Sgd),
    Adam(Adam),
}

impl Optimizer {
    pub fn optimizer_type(&self) -> OptimizerType {
        match self {
            Optimizer::Sgd(_) => OptimizerType::Sgd,
            Optimizer::Adam(_) => OptimizerType::Adam,
        }
    }

    pub fn update(
        &mut self,
        weights: &mut Matrix,
        biases: &mut Matrix,
        d_weights: &Matrix,
        d_biases: &Matrix,
    ) -> Result<()> {
        match self {
            Optimizer::Sgd(o) => o.update(weights, biases, d_weights, d_biases),
            Optimizer::Adam(o) => o.update(weights, biases, d_weights, d_biases),
        }
    }

    /// Hyperparameters keyed by name, in sorted key order.
    pub fn values(&self) -> BTreeMap<String, f64> {
        let pairs: Vec<(&str, f64)> = match self {
            Optimizer::Sgd(o) => vec![
                (KEY_LEARNING_RATE, o.learning_rate),
                (KEY_DECAY, o.decay),
                (KEY_MOMENTUM, o.momentum),
            ],
            Optimizer::Adam(o) => vec![
                (KEY_LEARNING_RATE, o.hyper.learning_rate),
                (KEY_DECAY, o.hyper.decay),
                (KEY_EPSILON, o.hyper.epsilon),
                (KEY_BETA1, o.hyper.beta1),
                (KEY_BETA2, o.hyper.beta2),
            ],
        };
        pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
    }

    /// Rebuilds a cold optimizer from a type tag and its hyperparameters.
    pub fn from_values(optimizer_type: OptimizerType, values: &BTreeMap<String, f64>) -> Result<Optimizer> {
        let get = |key: &str| -> Result<f64> {
            values
                .get(key)
                .copied()
                .ok_or_else(|| NnError::CorruptData(format!("missing optimizer value '{key}'")))
        };
        match optimizer_type {
            OptimizerType::Sgd => Ok(Optimizer::Sgd(Sgd::new(
                get(KEY_LEARNING_RATE)?,
                get(KEY_DECAY)?,
                get(KEY_MOMENTUM)?,
            )?)),
            OptimizerType::Adam => Ok(Optimizer::Adam(Adam::new(
                get(KEY_LEARNING_RATE)?,
                get(KEY_DECAY)?,
                get(KEY_EPSILON)?,
                get(KEY_BETA1)?,
                get(KEY_BETA2)?,
            )?)),
        }
    }

    /// A copy with the same hyperparameters and no accumulated state.
    pub fn fresh(&self) -> Optimizer {
        match self {
            Optimizer::Sgd(o) => Optimizer::Sgd(o.cold()),
            Optimizer::Adam(o) => Optimizer::Adam(Adam::from_hyper(o.hyper)),
        }
    }
}

impl From<Sgd> for Optimizer {
    fn from(o: Sgd) -> Optimizer {
        Optimizer::Sgd(o)
    }
}

impl From<Adam> for Optimizer {
    fn from(o: Adam) -> Optimizer {
        Optimizer::Adam(o)
    }
}
