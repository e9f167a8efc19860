use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{NnError, Result};
use crate::layers::dense::{Layer, LayerKind};
use crate::loss::LossType;
use crate::metrics::accuracy::AccuracyType;
use crate::network::model::Model;
use crate::optim::{Optimizer, OptimizerType};

/// Describes one layer in a model specification.
///
/// Fields:
/// - `kind`        — layer variant, including its slope or dropout rate
/// - `input_size`  — width of the input (the previous layer's `output_size`,
///                   or the raw feature count for the first layer)
/// - `output_size` — number of units
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerSpec {
    pub kind: LayerKind,
    pub input_size: usize,
    pub output_size: usize,
}

/// Optimizer type plus its named hyperparameters, as in the binary format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizerSpec {
    #[serde(rename = "type")]
    pub optimizer_type: OptimizerType,
    pub values: BTreeMap<String, f64>,
}

impl From<&Optimizer> for OptimizerSpec {
    fn from(optimizer: &Optimizer) -> Self {
        OptimizerSpec { optimizer_type: optimizer.optimizer_type(), values: optimizer.values() }
    }
}

/// A serializable description of a model architecture and its training
/// configuration, independent of trained weights.
///
/// `ModelSpec` can be saved to / loaded from JSON so that architectures can
/// be stored before training starts; [`ModelSpec::build`] turns it into a
/// finalized, initialized [`Model`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSpec {
    /// Human-readable name used as the model file stem.
    pub name: String,
    /// Ordered list of layer descriptions (input → output).
    pub layers: Vec<LayerSpec>,
    pub loss: LossType,
    pub optimizer: OptimizerSpec,
    pub accuracy: AccuracyType,
    /// Only used by regression accuracy.
    #[serde(default)]
    pub accuracy_tolerance: f64,
    /// Seed for weight initialization; entropy when absent.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl ModelSpec {
    /// Builds, finalizes and initializes the described model.
    pub fn build(&self) -> Result<Model> {
        let mut model = Model::new();
        for spec in &self.layers {
            model.add_layer(Layer::new(spec.kind, spec.input_size, spec.output_size)?)?;
        }
        let loss = self.loss.build(model.output_size())?;
        let optimizer = Optimizer::from_values(self.optimizer.optimizer_type, &self.optimizer.values)?;
        model.finalize(loss, optimizer, self.accuracy, self.accuracy_tolerance)?;
        match self.seed {
            Some(seed) => model.init_layers_with_seed(seed),
            None => model.init_layers(),
        }
        Ok(model)
    }

    /// Describes an existing finalized model. The first layer's optimizer
    /// stands for all of them, which holds for every model `finalize` built.
    pub fn from_model(name: &str, model: &Model) -> Result<ModelSpec> {
        let optimizer = model.optimizers()?.first().ok_or(NnError::NotFinalized)?;
        Ok(ModelSpec {
            name: name.to_string(),
            layers: model
                .layers()
                .iter()
                .map(|l| LayerSpec { kind: l.kind, input_size: l.input_size, output_size: l.output_size })
                .collect(),
            loss: model.loss()?.loss_type(),
            optimizer: OptimizerSpec::from(optimizer),
            accuracy: model.accuracy_type()?,
            accuracy_tolerance: model.accuracy_tolerance()?,
            seed: None,
        })
    }

    /// Serializes the spec to a pretty-printed JSON file.
    pub fn save_json(&self, path: &str) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Deserializes a `ModelSpec` from a JSON file.
    pub fn load_json(path: &str) -> Result<ModelSpec> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        Ok(serde_json::from_reader(reader)?)
    }
}
