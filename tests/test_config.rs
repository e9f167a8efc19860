// JSON model specs and training configs.

use nnml::network::spec::ModelSpec;
use nnml::{
    AccuracyType, Layer, LayerKind, LossType, Matrix, Model, NnError, OptimizerType, TrainConfig,
};

const SPEC: &str = r#"{
    "name": "threshold",
    "layers": [
        { "kind": { "type": "leaky_relu", "slope": 0.01 }, "input_size": 2, "output_size": 8 },
        { "kind": { "type": "dropout", "rate": 0.1 }, "input_size": 8, "output_size": 8 },
        { "kind": { "type": "softmax" }, "input_size": 8, "output_size": 3 }
    ],
    "loss": "cross_entropy",
    "optimizer": {
        "type": "adam",
        "values": { "learningRate": 0.001, "decay": 0.0, "epsilon": 1e-7, "beta1": 0.9, "beta2": 0.999 }
    },
    "accuracy": "categorical",
    "seed": 5
}"#;

#[test]
fn spec_builds_a_finalized_model() {
    let spec: ModelSpec = serde_json::from_str(SPEC).unwrap();
    let model = spec.build().unwrap();

    assert!(model.is_finalized());
    assert_eq!((model.input_size(), model.output_size()), (2, 3));
    assert_eq!(model.layers()[0].kind, LayerKind::LeakyReLU { slope: 0.01 });
    assert_eq!(model.loss().unwrap().loss_type(), LossType::CrossEntropy);
    assert_eq!(model.accuracy_type().unwrap(), AccuracyType::Categorical);
    assert_eq!(model.optimizers().unwrap()[0].optimizer_type(), OptimizerType::Adam);
    assert_eq!(model.accuracy_tolerance().unwrap(), 0.0);

    // seeded: same weights every build
    let again = spec.build().unwrap();
    assert_eq!(model.layers()[1].weights, again.layers()[1].weights);
    assert!(model.layers()[0].weights.data.iter().flatten().any(|w| *w != 0.0));

    let classes = model.predict(&Matrix::zeros(4, 2)).unwrap();
    assert_eq!(classes.shape(), (4, 1));
}

#[test]
fn spec_with_broken_chain_fails() {
    let mut spec: ModelSpec = serde_json::from_str(SPEC).unwrap();
    spec.layers[1].input_size = 7;
    assert!(matches!(spec.build(), Err(NnError::ShapeChain { expected: 8, found: 7 })));
}

#[test]
fn spec_is_recovered_from_a_built_model() {
    let spec: ModelSpec = serde_json::from_str(SPEC).unwrap();
    let model = spec.build().unwrap();

    let mut exported = ModelSpec::from_model("threshold", &model).unwrap();
    assert_eq!(exported.seed, None);
    exported.seed = spec.seed;
    assert_eq!(exported, spec);

    let mut bare = Model::new();
    bare.add_layer(Layer::linear(2, 1).unwrap()).unwrap();
    assert!(matches!(ModelSpec::from_model("bare", &bare), Err(NnError::NotFinalized)));
}

#[test]
fn spec_file_round_trip() {
    let spec: ModelSpec = serde_json::from_str(SPEC).unwrap();
    let path = std::env::temp_dir().join(format!("nnml-spec-{}.json", std::process::id()));
    let path = path.to_str().unwrap().to_string();
    spec.save_json(&path).unwrap();
    assert_eq!(ModelSpec::load_json(&path).unwrap(), spec);
    std::fs::remove_file(&path).ok();
}

#[test]
fn train_config_from_json() {
    let config: TrainConfig =
        serde_json::from_str(r#"{ "epochs": 50, "batch_size": 16, "log_every": 10 }"#).unwrap();
    assert_eq!(config, TrainConfig::new(50, 16).log_every(10));
    assert!(!config.shuffle);

    let path = std::env::temp_dir().join(format!("nnml-train-{}.json", std::process::id()));
    let path = path.to_str().unwrap().to_string();
    config.save_json(&path).unwrap();
    assert_eq!(TrainConfig::load_json(&path).unwrap(), config);
    std::fs::remove_file(&path).ok();
}

#[test]
fn malformed_json_is_reported() {
    let path = std::env::temp_dir().join(format!("nnml-bad-{}.json", std::process::id()));
    std::fs::write(&path, "{ not json").unwrap();
    let err = TrainConfig::load_json(path.to_str().unwrap());
    assert!(matches!(err, Err(NnError::Json(_))));
    std::fs::remove_file(&path).ok();
}
