use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Configuration for a `Model::fit` run.
///
/// # Fields
/// - `epochs`     — total number of full passes over the training data
/// - `batch_size` — rows per mini-batch; `0` trains on the full dataset as a
///                  single batch
/// - `log_every`  — evaluate and report every `log_every` epochs (epoch index
///                  `% log_every == 0`); `0` disables reporting
/// - `shuffle`    — reshuffle the rows before every epoch instead of walking
///                  the contiguous batches in dataset order
/// - `seed`       — seeds the shuffle so a run can be reproduced; `None`
///                  draws a fresh seed from the OS
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainConfig {
    pub epochs: usize,
    #[serde(default)]
    pub batch_size: usize,
    #[serde(default)]
    pub log_every: usize,
    #[serde(default)]
    pub shuffle: bool,
    #[serde(default)]
    pub seed: Option<u64>,
}

impl TrainConfig {
    /// Creates a config that never reports and keeps dataset order.
    pub fn new(epochs: usize, batch_size: usize) -> Self {
        TrainConfig { epochs, batch_size, log_every: 0, shuffle: false, seed: None }
    }

    pub fn log_every(mut self, log_every: usize) -> Self {
        self.log_every = log_every;
        self
    }

    pub fn shuffled(mut self) -> Self {
        self.shuffle = true;
        self
    }

    pub fn seeded(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Number of batches one epoch over `rows` samples is split into.
    pub fn batch_steps(&self, rows: usize) -> usize {
        if self.batch_size == 0 {
            1
        } else {
            rows.div_ceil(self.batch_size)
        }
    }

    /// Serializes the config to a pretty-printed JSON file.
    pub fn save_json(&self, path: &str) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Deserializes a `TrainConfig` from a JSON file.
    pub fn load_json(path: &str) -> Result<TrainConfig> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        Ok(serde_json::from_reader(reader)?)
    }
}
