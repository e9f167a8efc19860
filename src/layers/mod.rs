pub mod dense;
pub mod heavy;
pub mod layer_type;

pub use dense::{Layer, LayerGradients, LayerKind};
pub use heavy::{HeavyGradients, HeavyLayer};
pub use layer_type::LayerType;
