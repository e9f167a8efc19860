use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{NnError, Result};
use crate::loss::LossType;
use crate::metrics::accuracy::AccuracyType;
use crate::network::model::Model;
use crate::optim::{Optimizer, OptimizerType};
use crate::persist::byte_reader::ByteReader;
use crate::persist::layer_data::{size_to_i32, SavedLayerData};
use crate::persist::{MODEL_MAGIC, VERSION};

/// A finalized model in transit to or from a file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedModelData {
    pub version: String,
    pub input_size: usize,
    pub output_size: usize,
    pub loss_type: LossType,
    pub accuracy_type: AccuracyType,
    pub accuracy_tolerance: f64,
    pub optimizer_type: OptimizerType,
    /// Optimizer hyperparameters, written in key order.
    pub optimizer_values: BTreeMap<String, f64>,
    pub layers: Vec<SavedLayerData>,
}

fn count_to_i8(value: usize, what: &str) -> Result<i8> {
    i8::try_from(value).map_err(|_| NnError::Shape(format!("{what} {value} exceeds the format limit of 127")))
}

impl SavedModelData {
    pub fn from_model(model: &Model) -> Result<SavedModelData> {
        let optimizer = model.optimizers()?.first().ok_or(NnError::NotFinalized)?;
        Ok(SavedModelData {
            version: VERSION.to_string(),
            input_size: model.input_size(),
            output_size: model.output_size(),
            loss_type: model.loss()?.loss_type(),
            accuracy_type: model.accuracy_type()?,
            accuracy_tolerance: model.accuracy_tolerance()?,
            optimizer_type: optimizer.optimizer_type(),
            optimizer_values: optimizer.values(),
            layers: model.layers().iter().map(SavedLayerData::from_layer).collect(),
        })
    }

    pub fn serialize(&self) -> Result<Vec<u8>> {
        if self.version.len() != VERSION.len() {
            return Err(NnError::CorruptData(format!(
                "version {:?} must be {} bytes",
                self.version,
                VERSION.len()
            )));
        }

        let mut buf = Vec::new();
        buf.extend_from_slice(MODEL_MAGIC);
        buf.extend_from_slice(self.version.as_bytes());
        buf.extend_from_slice(&count_to_i8(self.layers.len(), "layer count")?.to_le_bytes());
        buf.extend_from_slice(&size_to_i32(self.input_size, "model input size")?.to_le_bytes());
        buf.extend_from_slice(&size_to_i32(self.output_size, "model output size")?.to_le_bytes());
        buf.extend_from_slice(&self.loss_type.code().to_le_bytes());
        buf.extend_from_slice(&self.accuracy_type.code().to_le_bytes());
        buf.extend_from_slice(&self.accuracy_tolerance.to_le_bytes());
        buf.extend_from_slice(&self.optimizer_type.code().to_le_bytes());
        buf.extend_from_slice(&count_to_i8(self.optimizer_values.len(), "optimizer value count")?.to_le_bytes());
        for (key, value) in &self.optimizer_values {
            buf.extend_from_slice(&count_to_i8(key.len(), "optimizer key length")?.to_le_bytes());
            buf.extend_from_slice(key.as_bytes());
            buf.extend_from_slice(&value.to_le_bytes());
        }
        for layer in &self.layers {
            layer.serialize(&mut buf)?;
        }
        Ok(buf)
    }

    pub fn deserialize(bytes: &[u8]) -> Result<SavedModelData> {
        let mut reader = ByteReader::new(bytes);
        reader.expect_magic(MODEL_MAGIC, "model")?;

        let version = std::str::from_utf8(reader.take(VERSION.len())?)
            .map_err(|e| NnError::CorruptData(format!("version is not utf-8: {e}")))?
            .to_string();
        if version != VERSION {
            log::warn!("model file version {version} differs from library version {VERSION}");
        }

        let model_size = reader.read_i8()?;
        if model_size <= 0 {
            return Err(NnError::CorruptData(format!("layer count must be positive, got {model_size}")));
        }
        let input_size = reader.read_size("model input size")?;
        let output_size = reader.read_size("model output size")?;
        let loss_type = LossType::from_code(reader.read_i8()?)?;
        let accuracy_type = AccuracyType::from_code(reader.read_i8()?)?;
        let accuracy_tolerance = reader.read_f64()?;
        let optimizer_type = OptimizerType::from_code(reader.read_i8()?)?;

        let value_count = reader.read_i8()?;
        if value_count < 0 {
            return Err(NnError::CorruptData(format!("negative optimizer value count {value_count}")));
        }
        let mut optimizer_values = BTreeMap::new();
        for _ in 0..value_count {
            let key_len = reader.read_i8()?;
            if key_len < 0 {
                return Err(NnError::CorruptData(format!("negative optimizer key length {key_len}")));
            }
            let key = std::str::from_utf8(reader.take(key_len as usize)?)
                .map_err(|e| NnError::CorruptData(format!("optimizer key is not utf-8: {e}")))?
                .to_string();
            optimizer_values.insert(key, reader.read_f64()?);
        }

        let layers = (0..model_size)
            .map(|_| SavedLayerData::read(&mut reader))
            .collect::<Result<Vec<_>>>()?;

        let first_input = layers.first().map_or(0, |l| l.input_size);
        let last_output = layers.last().map_or(0, |l| l.output_size);
        if first_input != input_size || last_output != output_size {
            return Err(NnError::CorruptData(format!(
                "header declares {input_size}→{output_size} but layers span {first_input}→{last_output}"
            )));
        }
        if reader.remaining() > 0 {
            log::warn!("ignoring {} trailing bytes after model data", reader.remaining());
        }

        Ok(SavedModelData {
            version,
            input_size,
            output_size,
            loss_type,
            accuracy_type,
            accuracy_tolerance,
            optimizer_type,
            optimizer_values,
            layers,
        })
    }

    /// Rebuilds a finalized model with cold optimizers.
    pub fn into_model(self) -> Result<Model> {
        let mut model = Model::new();
        for layer in self.layers {
            model.add_layer(layer.into_layer()?)?;
        }
        let loss = self.loss_type.build(self.output_size)?;
        let optimizer = Optimizer::from_values(self.optimizer_type, &self.optimizer_values)?;
        model.finalize(loss, optimizer, self.accuracy_type, self.accuracy_tolerance)?;
        Ok(model)
    }
}

/// Encodes a finalized model in the binary format.
pub fn save_model(model: &Model) -> Result<Vec<u8>> {
    SavedModelData::from_model(model)?.serialize()
}

/// Decodes a model written by [`save_model`].
pub fn load_model(bytes: &[u8]) -> Result<Model> {
    SavedModelData::deserialize(bytes)?.into_model()
}

pub fn save_file<P: AsRef<Path>>(model: &Model, path: P) -> Result<()> {
    let bytes = save_model(model)?;
    std::fs::write(path.as_ref(), bytes)?;
    log::info!("saved model to {}", path.as_ref().display());
    Ok(())
}

pub fn load_file<P: AsRef<Path>>(path: P) -> Result<Model> {
    let bytes = std::fs::read(path.as_ref())?;
    let model = load_model(&bytes)?;
    log::info!("loaded {}-layer model from {}", model.len(), path.as_ref().display());
    Ok(model)
}

/// Writes the same data as [`save_file`] as pretty-printed JSON.
pub fn save_json<P: AsRef<Path>>(model: &Model, path: P) -> Result<()> {
    let data = SavedModelData::from_model(model)?;
    let file = std::fs::File::create(path.as_ref())?;
    let writer = std::io::BufWriter::new(file);
    serde_json::to_writer_pretty(writer, &data)?;
    Ok(())
}

pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Model> {
    let file = std::fs::File::open(path.as_ref())?;
    let reader = std::io::BufReader::new(file);
    // Well-formed JSON with the wrong structure is a corrupt model, not a syntax error.
    let data: SavedModelData = serde_json::from_reader(reader).map_err(|e| {
        if e.is_data() {
            NnError::CorruptData(e.to_string())
        } else {
            NnError::Json(e)
        }
    })?;
    if data.version != VERSION {
        log::warn!("model file version {} differs from library version {VERSION}", data.version);
    }
    data.into_model()
}
