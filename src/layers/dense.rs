use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::activation::Activation;
use crate::error::{NnError, Result};
use crate::layers::layer_type::LayerType;
use crate::math::{Axis, Binomial, Matrix};

/// The closed set of dense layer variants.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LayerKind {
    /// ReLU-activated.
    Hidden,
    Linear,
    Sigmoid,
    #[serde(rename = "leaky_relu")]
    LeakyReLU { slope: f64 },
    Softmax,
    /// ReLU with inverted dropout during training forward passes.
    Dropout { rate: f64 },
}

impl LayerKind {
    pub fn activation(&self) -> Activation {
        match self {
            LayerKind::Hidden | LayerKind::Dropout { .. } => Activation::ReLU,
            LayerKind::Linear => Activation::Identity,
            LayerKind::Sigmoid => Activation::Sigmoid,
            LayerKind::LeakyReLU { slope } => Activation::LeakyReLU { slope: *slope },
            LayerKind::Softmax => Activation::Softmax,
        }
    }

    pub fn layer_type(&self) -> LayerType {
        match self {
            LayerKind::Hidden => LayerType::Hidden,
            LayerKind::Linear => LayerType::Linear,
            LayerKind::Sigmoid => LayerType::Sigmoid,
            LayerKind::LeakyReLU { .. } => LayerType::LeakyReLU,
            LayerKind::Softmax => LayerType::Softmax,
            LayerKind::Dropout { .. } => LayerType::Dropout,
        }
    }

    /// The variant-specific hyperparameter (slope or dropout rate), `0.0` otherwise.
    pub fn hyperparameter(&self) -> f64 {
        match self {
            LayerKind::LeakyReLU { slope } => *slope,
            LayerKind::Dropout { rate } => *rate,
            _ => 0.0,
        }
    }

    pub fn from_type(layer_type: LayerType, hyperparameter: f64) -> LayerKind {
        match layer_type {
            LayerType::Hidden => LayerKind::Hidden,
            LayerType::Linear => LayerKind::Linear,
            LayerType::Sigmoid => LayerKind::Sigmoid,
            LayerType::LeakyReLU => LayerKind::LeakyReLU { slope: hyperparameter },
            LayerType::Softmax => LayerKind::Softmax,
            LayerType::Dropout => LayerKind::Dropout { rate: hyperparameter },
        }
    }

    fn validate(&self) -> Result<()> {
        match self {
            LayerKind::LeakyReLU { slope } if !slope.is_finite() => Err(
                NnError::InvalidHyperparameter(format!("leaky relu slope must be finite, got {slope}")),
            ),
            LayerKind::Dropout { rate } if !(0.0..1.0).contains(rate) => Err(
                NnError::InvalidHyperparameter(format!("dropout rate must be in [0, 1), got {rate}")),
            ),
            _ => Ok(()),
        }
    }
}

/// Gradients produced by one layer's backward pass.
#[derive(Debug, Clone)]
pub struct LayerGradients {
    pub d_weights: Matrix,
    pub d_biases: Matrix,
    pub d_inputs: Matrix,
}

/// Values recorded by `forward` for the matching `backward` call.
#[derive(Debug, Clone, Default)]
struct ForwardCache {
    /// Pre-activation `X·W + b`.
    inputs: Matrix,
    outputs: Matrix,
    /// Dropout mask, already scaled by `1 / (1 - rate)`.
    mask: Matrix,
}

/// A fully-connected layer with a fused activation.
///
/// `forward` overwrites the layer's cache and `backward` reads it, so a
/// backward call must follow the forward call on the same batch. Use
/// [`Layer::forward_inference`] for evaluation; it leaves the cache alone and
/// never applies dropout.
#[derive(Debug, Clone)]
pub struct Layer {
    pub kind: LayerKind,
    pub input_size: usize,
    pub output_size: usize,
    /// Shape `input_size × output_size`.
    pub weights: Matrix,
    /// Shape `1 × output_size`.
    pub biases: Matrix,
    cache: ForwardCache,
    rng: StdRng,
}

impl Layer {
    pub fn new(kind: LayerKind, input_size: usize, output_size: usize) -> Result<Layer> {
        Layer::build(kind, input_size, output_size, StdRng::from_entropy())
    }

    /// Like [`Layer::new`] with a deterministic random source for
    /// initialization and dropout masks.
    pub fn with_seed(kind: LayerKind, input_size: usize, output_size: usize, seed: u64) -> Result<Layer> {
        Layer::build(kind, input_size, output_size, StdRng::seed_from_u64(seed))
    }

    fn build(kind: LayerKind, input_size: usize, output_size: usize, rng: StdRng) -> Result<Layer> {
        if input_size == 0 || output_size == 0 {
            return Err(NnError::InvalidDimensions { rows: input_size, cols: output_size });
        }
        kind.validate()?;
        Ok(Layer {
            kind,
            input_size,
            output_size,
            weights: Matrix::zeros(input_size, output_size),
            biases: Matrix::zeros(1, output_size),
            cache: ForwardCache::default(),
            rng,
        })
    }

    pub fn hidden(input_size: usize, output_size: usize) -> Result<Layer> {
        Layer::new(LayerKind::Hidden, input_size, output_size)
    }

    pub fn linear(input_size: usize, output_size: usize) -> Result<Layer> {
        Layer::new(LayerKind::Linear, input_size, output_size)
    }

    pub fn sigmoid(input_size: usize, output_size: usize) -> Result<Layer> {
        Layer::new(LayerKind::Sigmoid, input_size, output_size)
    }

    pub fn leaky_relu(input_size: usize, output_size: usize, slope: f64) -> Result<Layer> {
        Layer::new(LayerKind::LeakyReLU { slope }, input_size, output_size)
    }

    pub fn softmax(input_size: usize, output_size: usize) -> Result<Layer> {
        Layer::new(LayerKind::Softmax, input_size, output_size)
    }

    pub fn dropout(input_size: usize, output_size: usize, rate: f64) -> Result<Layer> {
        Layer::new(LayerKind::Dropout { rate }, input_size, output_size)
    }

    /// Rebuilds a layer from stored parameters. Sizes are taken from `weights`.
    pub fn from_parameters(kind: LayerKind, weights: Matrix, biases: Matrix) -> Result<Layer> {
        let mut layer = Layer::new(kind, weights.rows, weights.cols)?;
        layer.set_parameters(weights, biases)?;
        Ok(layer)
    }

    pub fn parameters(&self) -> (&Matrix, &Matrix) {
        (&self.weights, &self.biases)
    }

    pub fn set_parameters(&mut self, weights: Matrix, biases: Matrix) -> Result<()> {
        if weights.shape() != (self.input_size, self.output_size) {
            return Err(NnError::Shape(format!(
                "weights must be {}x{}, got {}x{}",
                self.input_size, self.output_size, weights.rows, weights.cols
            )));
        }
        if biases.shape() != (1, self.output_size) {
            return Err(NnError::Shape(format!(
                "biases must be 1x{}, got {}x{}",
                self.output_size, biases.rows, biases.cols
            )));
        }
        self.weights = weights;
        self.biases = biases;
        Ok(())
    }

    pub fn reseed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }

    /// He-normal weights, zero biases.
    pub fn init(&mut self) {
        self.weights = Matrix::he(self.input_size, self.output_size, &mut self.rng);
        self.biases = Matrix::zeros(1, self.output_size);
    }

    fn check_input(&self, x: &Matrix) -> Result<()> {
        if x.cols != self.input_size {
            return Err(NnError::Shape(format!(
                "layer expects {} input columns, got {}x{}",
                self.input_size, x.rows, x.cols
            )));
        }
        Ok(())
    }

    fn check_gradient(&self, d_values: &Matrix, x: &Matrix) -> Result<()> {
        if d_values.cols != self.output_size || d_values.rows != x.rows {
            return Err(NnError::Shape(format!(
                "layer expects {}x{} gradients, got {}x{}",
                x.rows, self.output_size, d_values.rows, d_values.cols
            )));
        }
        Ok(())
    }

    fn affine(&self, x: &Matrix) -> Result<Matrix> {
        x.dot(&self.weights)?.add_row_broadcast(&self.biases)
    }

    /// Training forward pass. Caches the values `backward` needs.
    pub fn forward(&mut self, x: &Matrix) -> Result<Matrix> {
        self.check_input(x)?;
        let z = self.affine(x)?;
        let mut out = self.kind.activation().forward(z.clone());

        if let LayerKind::Dropout { rate } = self.kind {
            let keep = 1.0 - rate;
            let sampler = Binomial::new(1, keep)?;
            let mut mask = Matrix::zeros(out.rows, out.cols);
            for v in mask.data.iter_mut().flatten() {
                *v = sampler.sample(&mut self.rng) as f64 / keep;
            }
            out = out.hadamard(&mask)?;
            self.cache.mask = mask;
        }

        self.cache.inputs = z;
        self.cache.outputs = out.clone();
        Ok(out)
    }

    /// Forward pass without caching or dropout.
    pub fn forward_inference(&self, x: &Matrix) -> Result<Matrix> {
        self.check_input(x)?;
        Ok(self.kind.activation().forward(self.affine(x)?))
    }

    fn cached<'a>(&self, m: &'a Matrix, rows: usize, what: &str) -> Result<&'a Matrix> {
        if m.shape() != (rows, self.output_size) {
            return Err(NnError::Shape(format!(
                "no cached {what} for a {rows}-row batch; call forward first"
            )));
        }
        Ok(m)
    }

    /// Backward pass. `x` is the input given to the preceding `forward` call and
    /// `d_values` the gradient with respect to this layer's outputs.
    pub fn backward(&self, x: &Matrix, d_values: &Matrix) -> Result<LayerGradients> {
        self.check_input(x)?;
        self.check_gradient(d_values, x)?;
        let rows = x.rows;

        let delta = match self.kind {
            LayerKind::Linear => d_values.clone(),
            LayerKind::Hidden | LayerKind::LeakyReLU { .. } => {
                let z = self.cached(&self.cache.inputs, rows, "pre-activation")?;
                self.kind.activation().backward(d_values, z, &self.cache.outputs)?
            }
            LayerKind::Sigmoid => {
                let y = self.cached(&self.cache.outputs, rows, "outputs")?;
                self.kind.activation().backward(d_values, &self.cache.inputs, y)?
            }
            LayerKind::Softmax => {
                let y = self.cached(&self.cache.outputs, rows, "outputs")?;
                softmax_jacobian_backward(d_values, y)?
            }
            LayerKind::Dropout { .. } => {
                let mask = self.cached(&self.cache.mask, rows, "dropout mask")?;
                let z = self.cached(&self.cache.inputs, rows, "pre-activation")?;
                let masked = d_values.hadamard(mask)?;
                self.kind.activation().backward(&masked, z, &self.cache.outputs)?
            }
        };

        self.gradients(x, delta)
    }

    /// Fused softmax + categorical cross-entropy backward pass.
    ///
    /// The gradient with respect to the logits reduces to
    /// `(y_pred - y_true) / batch`, so the Jacobian is never formed.
    pub fn backward_cross_entropy(&self, x: &Matrix, y_true: &Matrix, y_pred: &Matrix) -> Result<LayerGradients> {
        if self.kind != LayerKind::Softmax {
            return Err(NnError::Shape(format!(
                "fused cross-entropy backward requires a softmax layer, got {:?}",
                self.kind
            )));
        }
        self.check_input(x)?;
        self.check_gradient(y_true, x)?;
        self.check_gradient(y_pred, x)?;

        let delta = y_pred.sub(y_true)?.mul_scalar(1.0 / x.rows as f64);
        self.gradients(x, delta)
    }

    fn gradients(&self, x: &Matrix, delta: Matrix) -> Result<LayerGradients> {
        Ok(LayerGradients {
            d_weights: x.transpose().dot(&delta)?,
            d_biases: delta.sum(Axis::Columns),
            d_inputs: delta.dot(&self.weights.transpose())?,
        })
    }
}

/// Applies the per-sample softmax Jacobian `J = diag(y) - y·yᵗ` to each row of `d_values`.
fn softmax_jacobian_backward(d_values: &Matrix, outputs: &Matrix) -> Result<Matrix> {
    let n = outputs.cols;
    let mut res = Matrix::zeros(d_values.rows, n);
    for (r, (y, g)) in outputs.data.iter().zip(d_values.data.iter()).enumerate() {
        let mut jacobian = Matrix::zeros(n, n);
        for i in 0..n {
            for j in 0..n {
                let diag = if i == j { y[i] } else { 0.0 };
                jacobian.data[i][j] = diag - y[i] * y[j];
            }
        }
        let column = Matrix { rows: n, cols: 1, data: g.iter().map(|v| vec![*v]).collect() };
        let product = jacobian.dot(&column)?;
        res.set_row(r, &product.column(0)?)?;
    }
    Ok(res)
}
