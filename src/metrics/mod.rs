pub mod accuracy;

pub use accuracy::{
    binary_categorical_accuracy, binary_outputs, categorical_accuracy, regression_accuracy, row_max,
    AccuracyType,
};
