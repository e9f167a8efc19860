use serde::{Deserialize, Serialize};

use crate::error::{NnError, Result};

/// Layer type tag as stored in the binary model format.
///
/// - `Hidden`    — ReLU-activated dense layer.
/// - `Linear`    — dense layer without activation; regression outputs.
/// - `Sigmoid`   — sigmoid-activated; pair with binary cross-entropy.
/// - `LeakyReLU` — leaky ReLU; the slope is stored alongside the weights.
/// - `Softmax`   — row-wise softmax; pair with categorical cross-entropy.
/// - `Dropout`   — ReLU with inverted dropout; the rate is stored in the slope slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerType {
    Hidden,
    Linear,
    Sigmoid,
    #[serde(rename = "leaky_relu")]
    LeakyReLU,
    Softmax,
    Dropout,
}

impl LayerType {
    pub fn code(self) -> i8 {
        match self {
            LayerType::Hidden => 0,
            LayerType::Linear => 1,
            LayerType::Sigmoid => 2,
            LayerType::LeakyReLU => 3,
            LayerType::Softmax => 4,
            LayerType::Dropout => 5,
        }
    }

    pub fn from_code(code: i8) -> Result<LayerType> {
        match code {
            0 => Ok(LayerType::Hidden),
            1 => Ok(LayerType::Linear),
            2 => Ok(LayerType::Sigmoid),
            3 => Ok(LayerType::LeakyReLU),
            4 => Ok(LayerType::Softmax),
            5 => Ok(LayerType::Dropout),
            other => Err(NnError::CorruptData(format!("unknown layer type code {other}"))),
        }
    }
}
