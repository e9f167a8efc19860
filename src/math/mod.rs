pub mod binomial;
pub mod matrix;

pub use binomial::Binomial;
pub use matrix::{Axis, Matrix};
