pub mod model;
pub mod spec;

pub use model::Model;
pub use spec::{LayerSpec, ModelSpec, OptimizerSpec};
