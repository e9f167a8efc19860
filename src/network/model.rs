use crate::error::{NnError, Result};
use crate::layers::dense::{Layer, LayerGradients, LayerKind};
use crate::loss::{Loss, LossType};
use crate::math::Matrix;
use crate::metrics::accuracy::{
    binary_categorical_accuracy, binary_outputs, categorical_accuracy, regression_accuracy, row_max,
    AccuracyType,
};
use crate::optim::Optimizer;
use crate::train::epoch_stats::EpochStats;
use crate::train::logger::TrainingLogger;
use crate::train::loop_fn::train_loop;
use crate::train::train_config::TrainConfig;

/// Everything bound to the model by [`Model::finalize`].
#[derive(Debug, Clone)]
struct Training {
    loss: Loss,
    optimizers: Vec<Optimizer>,
    accuracy_type: AccuracyType,
    accuracy_tolerance: f64,
}

/// An ordered stack of dense layers plus the loss, per-layer optimizers and
/// accuracy metric used to train it.
///
/// Lifecycle: [`Model::new`] → [`Model::add_layer`] for each layer →
/// [`Model::finalize`] → [`Model::init_layers`] → [`Model::fit`] /
/// [`Model::predict`]. Training, evaluation and prediction before `finalize`
/// fail with [`NnError::NotFinalized`].
#[derive(Debug, Clone, Default)]
pub struct Model {
    layers: Vec<Layer>,
    training: Option<Training>,
}

impl Model {
    pub fn new() -> Model {
        Model::default()
    }

    /// Appends a layer. Its input size must equal the current output size.
    pub fn add_layer(&mut self, layer: Layer) -> Result<()> {
        if self.training.is_some() {
            return Err(NnError::AlreadyFinalized);
        }
        if let Some(last) = self.layers.last() {
            if last.output_size != layer.input_size {
                return Err(NnError::ShapeChain { expected: last.output_size, found: layer.input_size });
            }
        }
        self.layers.push(layer);
        Ok(())
    }

    /// Binds the loss, optimizer and accuracy metric. Each layer gets its own
    /// cold copy of `optimizer`.
    pub fn finalize(
        &mut self,
        loss: Loss,
        optimizer: Optimizer,
        accuracy_type: AccuracyType,
        accuracy_tolerance: f64,
    ) -> Result<()> {
        if self.training.is_some() {
            return Err(NnError::AlreadyFinalized);
        }
        if self.layers.is_empty() {
            return Err(NnError::ShapeChain { expected: 0, found: 0 });
        }
        if loss.size() != self.output_size() {
            return Err(NnError::LossSizeMismatch { loss: loss.size(), output: self.output_size() });
        }
        if !(accuracy_tolerance >= 0.0) {
            return Err(NnError::InvalidHyperparameter(format!(
                "accuracy tolerance must be non-negative, got {accuracy_tolerance}"
            )));
        }

        let optimizers = self.layers.iter().map(|_| optimizer.fresh()).collect();
        self.training = Some(Training { loss, optimizers, accuracy_type, accuracy_tolerance });
        log::debug!(
            "finalized model {}→{} with {} layers, {:?} loss",
            self.input_size(),
            self.output_size(),
            self.layers.len(),
            loss.loss_type()
        );
        Ok(())
    }

    /// Draws fresh He-normal weights and zero biases for every layer.
    pub fn init_layers(&mut self) {
        for layer in &mut self.layers {
            layer.init();
        }
    }

    /// Deterministic [`Model::init_layers`]: layer `i` is reseeded with
    /// `seed + i` first, which also fixes its dropout masks.
    pub fn init_layers_with_seed(&mut self, seed: u64) {
        for (i, layer) in self.layers.iter_mut().enumerate() {
            layer.reseed(seed.wrapping_add(i as u64));
            layer.init();
        }
    }

    pub fn is_finalized(&self) -> bool {
        self.training.is_some()
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Input width of the first layer, 0 for an empty model.
    pub fn input_size(&self) -> usize {
        self.layers.first().map_or(0, |l| l.input_size)
    }

    /// Output width of the last layer, 0 for an empty model.
    pub fn output_size(&self) -> usize {
        self.layers.last().map_or(0, |l| l.output_size)
    }

    fn training(&self) -> Result<&Training> {
        self.training.as_ref().ok_or(NnError::NotFinalized)
    }

    pub fn loss(&self) -> Result<&Loss> {
        Ok(&self.training()?.loss)
    }

    pub fn accuracy_type(&self) -> Result<AccuracyType> {
        Ok(self.training()?.accuracy_type)
    }

    pub fn accuracy_tolerance(&self) -> Result<f64> {
        Ok(self.training()?.accuracy_tolerance)
    }

    /// The optimizers bound to each layer, in layer order.
    pub fn optimizers(&self) -> Result<&[Optimizer]> {
        Ok(&self.training()?.optimizers)
    }

    /// Training forward pass. Returns `[x, out_1, ..., out_n]`.
    pub fn forward(&mut self, x: &Matrix) -> Result<Vec<Matrix>> {
        self.training()?;
        let mut outputs = Vec::with_capacity(self.layers.len() + 1);
        outputs.push(x.clone());
        for layer in &mut self.layers {
            let next = layer.forward(&outputs[outputs.len() - 1])?;
            outputs.push(next);
        }
        Ok(outputs)
    }

    fn uses_fused_softmax(&self, loss: &Loss) -> bool {
        loss.loss_type() == LossType::CrossEntropy
            && self.layers.last().is_some_and(|l| l.kind == LayerKind::Softmax)
    }

    /// Backward pass over the outputs of the preceding [`Model::forward`].
    /// Gradients are returned in layer order.
    pub fn backward(&self, outputs: &[Matrix], y: &Matrix) -> Result<Vec<LayerGradients>> {
        let training = self.training()?;
        let n = self.layers.len();
        if outputs.len() != n + 1 {
            return Err(NnError::Shape(format!(
                "expected {} forward outputs, got {}",
                n + 1,
                outputs.len()
            )));
        }

        let prediction = &outputs[n];
        let mut gradients = Vec::with_capacity(n);
        let mut remaining = n;

        let mut d_values = if self.uses_fused_softmax(&training.loss) {
            let grads = self.layers[n - 1].backward_cross_entropy(&outputs[n - 1], y, prediction)?;
            let d_inputs = grads.d_inputs.clone();
            gradients.push(grads);
            remaining -= 1;
            d_inputs
        } else {
            training.loss.backward(prediction, y)?
        };

        for i in (0..remaining).rev() {
            let grads = self.layers[i].backward(&outputs[i], &d_values)?;
            d_values = grads.d_inputs.clone();
            gradients.push(grads);
        }

        gradients.reverse();
        Ok(gradients)
    }

    /// One forward → backward → update step on a single batch.
    pub fn train_batch(&mut self, x: &Matrix, y: &Matrix) -> Result<()> {
        let outputs = self.forward(x)?;
        let gradients = self.backward(&outputs, y)?;

        let training = self.training.as_mut().ok_or(NnError::NotFinalized)?;
        for ((layer, optimizer), grads) in self
            .layers
            .iter_mut()
            .zip(training.optimizers.iter_mut())
            .zip(&gradients)
        {
            optimizer.update(&mut layer.weights, &mut layer.biases, &grads.d_weights, &grads.d_biases)?;
        }
        Ok(())
    }

    /// Trains on `x`/`y` in contiguous mini-batches. See
    /// [`crate::train::train_loop`].
    pub fn fit(
        &mut self,
        x: &Matrix,
        y: &Matrix,
        validation: Option<(&Matrix, &Matrix)>,
        config: &TrainConfig,
        logger: &dyn TrainingLogger,
    ) -> Result<Vec<EpochStats>> {
        train_loop(self, x, y, validation, config, logger)
    }

    /// Inference forward pass; no dropout, no cache writes.
    pub fn infer(&self, x: &Matrix) -> Result<Matrix> {
        self.training()?;
        let mut current = x.clone();
        for layer in &self.layers {
            current = layer.forward_inference(&current)?;
        }
        Ok(current)
    }

    pub fn calculate_loss(&self, x: &Matrix, y: &Matrix) -> Result<f64> {
        let training = self.training()?;
        training.loss.forward(&self.infer(x)?, y)
    }

    pub fn calculate_accuracy(&self, x: &Matrix, y: &Matrix) -> Result<f64> {
        let training = self.training()?;
        let predicted = self.infer(x)?;
        match training.accuracy_type {
            AccuracyType::Regression => regression_accuracy(&predicted, y, training.accuracy_tolerance),
            AccuracyType::Categorical => categorical_accuracy(&predicted, y),
            AccuracyType::BinaryCategorical => binary_categorical_accuracy(&predicted, y),
        }
    }

    /// Raw outputs for regression, `rows × 1` class indices for categorical,
    /// 0/1 values for binary-categorical.
    pub fn predict(&self, x: &Matrix) -> Result<Matrix> {
        let training = self.training()?;
        let predicted = self.infer(x)?;
        Ok(match training.accuracy_type {
            AccuracyType::Regression => predicted,
            AccuracyType::Categorical => row_max(&predicted),
            AccuracyType::BinaryCategorical => binary_outputs(&predicted),
        })
    }
}
