use serde::{Deserialize, Serialize};

use crate::error::{NnError, Result};
use crate::layers::dense::{Layer, LayerKind};
use crate::layers::layer_type::LayerType;
use crate::math::Matrix;
use crate::persist::byte_reader::ByteReader;
use crate::persist::LAYER_MAGIC;

/// One layer as stored in a model file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedLayerData {
    pub layer_type: LayerType,
    pub input_size: usize,
    pub output_size: usize,
    /// Leaky ReLU slope or dropout rate; 0 for the other layer types.
    pub slope: f64,
    pub weights: Matrix,
    pub biases: Matrix,
}

pub(crate) fn size_to_i32(value: usize, what: &str) -> Result<i32> {
    i32::try_from(value)
        .map_err(|_| NnError::Shape(format!("{what} {value} does not fit the model format")))
}

impl SavedLayerData {
    pub fn from_layer(layer: &Layer) -> SavedLayerData {
        SavedLayerData {
            layer_type: layer.kind.layer_type(),
            input_size: layer.input_size,
            output_size: layer.output_size,
            slope: layer.kind.hyperparameter(),
            weights: layer.weights.clone(),
            biases: layer.biases.clone(),
        }
    }

    pub fn serialize(&self, buf: &mut Vec<u8>) -> Result<()> {
        if self.weights.shape() != (self.input_size, self.output_size)
            || self.biases.shape() != (1, self.output_size)
        {
            return Err(NnError::Shape(format!(
                "layer {}x{} holds {:?} weights and {:?} biases",
                self.input_size,
                self.output_size,
                self.weights.shape(),
                self.biases.shape()
            )));
        }

        buf.extend_from_slice(LAYER_MAGIC);
        buf.extend_from_slice(&self.layer_type.code().to_le_bytes());
        buf.extend_from_slice(&size_to_i32(self.input_size, "layer input size")?.to_le_bytes());
        buf.extend_from_slice(&size_to_i32(self.output_size, "layer output size")?.to_le_bytes());
        buf.extend_from_slice(&self.slope.to_le_bytes());
        for v in self.weights.data.iter().flatten().chain(self.biases.data.iter().flatten()) {
            buf.extend_from_slice(&v.to_le_bytes());
        }
        Ok(())
    }

    pub fn read(reader: &mut ByteReader) -> Result<SavedLayerData> {
        reader.expect_magic(LAYER_MAGIC, "layer")?;
        let layer_type = LayerType::from_code(reader.read_i8()?)?;
        let input_size = reader.read_size("layer input size")?;
        let output_size = reader.read_size("layer output size")?;
        let slope = reader.read_f64()?;

        let needed = input_size
            .checked_add(1)
            .and_then(|rows| rows.checked_mul(output_size))
            .and_then(|cells| cells.checked_mul(8));
        if needed.map_or(true, |n| n > reader.remaining()) {
            return Err(NnError::CorruptData(format!(
                "layer {input_size}x{output_size} is larger than the remaining {} bytes",
                reader.remaining()
            )));
        }

        let mut weights = Matrix::zeros(input_size, output_size);
        for v in weights.data.iter_mut().flatten() {
            *v = reader.read_f64()?;
        }
        let mut biases = Matrix::zeros(1, output_size);
        for v in biases.data.iter_mut().flatten() {
            *v = reader.read_f64()?;
        }

        Ok(SavedLayerData { layer_type, input_size, output_size, slope, weights, biases })
    }

    pub fn into_layer(self) -> Result<Layer> {
        let kind = LayerKind::from_type(self.layer_type, self.slope);
        Layer::from_parameters(kind, self.weights, self.biases)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leaky_slope_survives() {
        let mut layer = Layer::with_seed(LayerKind::LeakyReLU { slope: 0.05 }, 3, 2, 11).unwrap();
        layer.init();

        let mut buf = Vec::new();
        SavedLayerData::from_layer(&layer).serialize(&mut buf).unwrap();
        assert_eq!(buf.len(), 2 + 1 + 4 + 4 + 8 + 8 * (3 * 2 + 2));

        let restored = SavedLayerData::read(&mut ByteReader::new(&buf)).unwrap().into_layer().unwrap();
        assert_eq!(restored.kind, LayerKind::LeakyReLU { slope: 0.05 });
        assert_eq!(restored.weights, layer.weights);
        assert_eq!(restored.biases, layer.biases);
    }

    #[test]
    fn bad_layer_magic() {
        let mut buf = Vec::new();
        SavedLayerData::from_layer(&Layer::linear(1, 1).unwrap()).serialize(&mut buf).unwrap();
        buf[1] = b'X';
        assert!(matches!(
            SavedLayerData::read(&mut ByteReader::new(&buf)),
            Err(NnError::CorruptData(_))
        ));
    }
}
