use serde::{Deserialize, Serialize};

/// Statistics recorded by `Model::fit` on every reporting epoch.
///
/// `fit` evaluates the whole training set (and the validation set, when one
/// is given) with the non-dropping inference pass on epochs where
/// `epoch % log_every == 0`, and returns one `EpochStats` per such epoch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochStats {
    /// Zero-based epoch index.
    pub epoch: usize,
    /// Total epochs requested for this run.
    pub total_epochs: usize,
    /// Loss over the full training set after this epoch.
    pub train_loss: f64,
    /// Accuracy over the full training set, as a fraction in [0, 1].
    pub train_accuracy: f64,
    /// Validation loss, if a validation set was provided.
    pub val_loss: Option<f64>,
    /// Validation accuracy, if a validation set was provided.
    pub val_accuracy: Option<f64>,
    /// Wall-clock duration of the epoch's training batches in milliseconds.
    pub elapsed_ms: u64,
}
