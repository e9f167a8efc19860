pub mod activation;
pub mod error;
pub mod layers;
pub mod loss;
pub mod math;
pub mod metrics;
pub mod network;
pub mod optim;
pub mod persist;
pub mod train;

// Convenience re-exports
pub use activation::Activation;
pub use error::{NnError, Result};
pub use layers::dense::{Layer, LayerGradients, LayerKind};
pub use layers::heavy::HeavyLayer;
pub use loss::{Loss, LossType};
pub use math::matrix::{Axis, Matrix};
pub use metrics::accuracy::AccuracyType;
pub use network::model::Model;
pub use network::spec::ModelSpec;
pub use optim::{Adam, HeavyAdam, Optimizer, OptimizerType, Sgd};
pub use persist::{load_file, load_model, save_file, save_model};
pub use train::{EpochStats, LogSink, SilentLogger, TrainConfig, TrainingLogger};
