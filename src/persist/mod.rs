//! Binary and JSON model files.
//!
//! Binary layout (little-endian):
//!
//! ```text
//! "NNML"  version[5]  modelSize:i8  inputSize:i32  outputSize:i32
//! lossType:i8  accuracyType:i8  accuracyTolerance:f64
//! optimizerType:i8  valueCount:i8  { keyLen:i8  key  value:f64 }*
//! { "LA"  layerType:i8  inputSize:i32  outputSize:i32  slope:f64
//!   weights[inputSize*outputSize]:f64  biases[outputSize]:f64 }*
//! ```
//!
//! Optimizer accumulators are never stored; a loaded model trains from cold
//! optimizers.

pub mod byte_reader;
pub mod layer_data;
pub mod model_data;

pub use byte_reader::ByteReader;
pub use layer_data::SavedLayerData;
pub use model_data::{load_file, load_json, load_model, save_file, save_json, save_model, SavedModelData};

pub const MODEL_MAGIC: &[u8; 4] = b"NNML";
pub const LAYER_MAGIC: &[u8; 2] = b"LA";
/// Format version written into every file; always 5 bytes.
pub const VERSION: &str = "1.0.3";
