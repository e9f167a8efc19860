// Trains a small XOR classifier and optionally writes it to the path given
// as the first argument. Set RUST_LOG=info to see the training progress.
use nnml::{
    save_file, AccuracyType, Adam, Layer, LogSink, LossType, Matrix, Model, NnError, TrainConfig,
};

fn main() -> Result<(), NnError> {
    env_logger::init();

    let inputs = Matrix::from_data(vec![
        vec![1.0, 0.0],
        vec![1.0, 1.0],
        vec![0.0, 1.0],
        vec![0.0, 0.0],
    ])?;
    let expected_outputs = Matrix::from_data(vec![vec![1.0], vec![0.0], vec![1.0], vec![0.0]])?;

    let mut model = Model::new();
    model.add_layer(Layer::hidden(2, 8)?)?;
    model.add_layer(Layer::sigmoid(8, 1)?)?;
    model.finalize(
        LossType::BinaryCrossEntropy.build(1)?,
        Adam::new(0.01, 0.0, 1e-7, 0.9, 0.999)?.into(),
        AccuracyType::BinaryCategorical,
        0.0,
    )?;
    model.init_layers_with_seed(42);

    let config = TrainConfig::new(2000, 0).log_every(500);
    model.fit(&inputs, &expected_outputs, None, &config, &LogSink)?;

    let predictions = model.infer(&inputs)?;
    for (input, output) in inputs.data.iter().zip(&predictions.data) {
        println!("Input: {:?} -> Output: {:.4}", input, output[0]);
    }
    println!(
        "accuracy = {:.2}",
        model.calculate_accuracy(&inputs, &expected_outputs)?
    );

    if let Some(path) = std::env::args().nth(1) {
        save_file(&model, &path)?;
        println!("model written to {path}");
    }
    Ok(())
}
