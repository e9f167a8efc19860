use std::fmt;

/// All errors that can occur while building, training or persisting a model.
#[derive(Debug)]
pub enum NnError {
    /// A matrix or layer was requested with a zero dimension, or built from ragged rows.
    InvalidDimensions { rows: usize, cols: usize },
    /// Matrix accessor called with an index outside the matrix.
    IndexOutOfRange { row: usize, col: usize },
    /// Two matrices have incompatible shapes for an algebra operation.
    DimensionMismatch {
        op: &'static str,
        left: (usize, usize),
        right: (usize, usize),
    },
    /// Layer or loss input whose width does not match the configured size.
    Shape(String),
    /// Constructor-time validation of a hyperparameter failed.
    InvalidHyperparameter(String),
    /// Serialized data could not be decoded.
    CorruptData(String),
    /// A layer's input size does not match the running output size of the model.
    ShapeChain { expected: usize, found: usize },
    /// The loss size does not match the model's output size.
    LossSizeMismatch { loss: usize, output: usize },
    /// The model was used before `finalize`.
    NotFinalized,
    /// A layer was added after `finalize`.
    AlreadyFinalized,
    Io(std::io::Error),
    Json(serde_json::Error),
}

pub type Result<T> = std::result::Result<T, NnError>;

impl fmt::Display for NnError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidDimensions { rows, cols } => {
                write!(f, "invalid matrix dimensions: {rows}, {cols}")
            }
            Self::IndexOutOfRange { row, col } => {
                write!(f, "index out of range: ({row}, {col})")
            }
            Self::DimensionMismatch { op, left, right } => write!(
                f,
                "dimension mismatch in {op}: {}x{} vs {}x{}",
                left.0, left.1, right.0, right.1
            ),
            Self::Shape(msg) => write!(f, "shape error: {msg}"),
            Self::InvalidHyperparameter(msg) => write!(f, "invalid hyperparameter: {msg}"),
            Self::CorruptData(msg) => write!(f, "corrupt data: {msg}"),
            Self::ShapeChain { expected, found } => write!(
                f,
                "layer input size {found} does not match previous output size {expected}"
            ),
            Self::LossSizeMismatch { loss, output } => write!(
                f,
                "loss size {loss} does not match model output size {output}"
            ),
            Self::NotFinalized => write!(f, "model has not been finalized"),
            Self::AlreadyFinalized => write!(f, "model has already been finalized"),
            Self::Io(e) => write!(f, "io error: {e}"),
            Self::Json(e) => write!(f, "json error: {e}"),
        }
    }
}

impl std::error::Error for NnError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for NnError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<serde_json::Error> for NnError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}
