use std::collections::BTreeMap;

use nnml::layers::heavy::HeavyLayer;
use nnml::{Adam, HeavyAdam, Matrix, NnError, Optimizer, OptimizerType, Sgd};

fn scalar(v: f64) -> Matrix {
    Matrix::from_data(vec![vec![v]]).unwrap()
}

#[test]
fn single_adam_step() {
    let mut optimizer: Optimizer = Adam::new(0.01, 0.0, 1e-7, 0.9, 0.999).unwrap().into();
    let mut w = scalar(1.0);
    let mut b = scalar(0.0);
    optimizer.update(&mut w, &mut b, &scalar(1.0), &scalar(0.0)).unwrap();
    let decrease = 1.0 - w.data[0][0];
    assert!((decrease - 0.01 / (1.0 + 1e-7)).abs() < 1e-12);
}

#[test]
fn adam_decay_lowers_later_steps() {
    let mut adam = Adam::new(0.1, 1.0, 1e-7, 0.9, 0.999).unwrap();
    let (mut w, mut b) = (scalar(0.0), scalar(0.0));
    adam.update(&mut w, &mut b, &scalar(1.0), &scalar(1.0)).unwrap();
    let first = -w.data[0][0];
    adam.update(&mut w, &mut b, &scalar(1.0), &scalar(1.0)).unwrap();
    let second = -w.data[0][0] - first;
    assert!(second < first);
    assert_eq!(adam.iterations(), 2);
}

#[test]
fn sgd_values_round_trip() {
    let optimizer: Optimizer = Sgd::new(0.05, 0.001, 0.9).unwrap().into();
    let values = optimizer.values();
    let keys: Vec<&str> = values.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["decay", "learningRate", "momentum"]);

    let rebuilt = Optimizer::from_values(OptimizerType::Sgd, &values).unwrap();
    assert_eq!(rebuilt.values(), values);
    assert_eq!(rebuilt.optimizer_type(), OptimizerType::Sgd);
}

#[test]
fn adam_values_round_trip() {
    let optimizer: Optimizer = Adam::new(0.001, 0.0, 1e-7, 0.9, 0.999).unwrap().into();
    let values = optimizer.values();
    assert_eq!(values.len(), 5);
    assert_eq!(values["beta2"], 0.999);
    let rebuilt = Optimizer::from_values(OptimizerType::Adam, &values).unwrap();
    assert_eq!(rebuilt.values(), values);
}

#[test]
fn missing_value_is_corrupt() {
    let mut values = BTreeMap::new();
    values.insert("learningRate".to_string(), 0.1);
    assert!(matches!(
        Optimizer::from_values(OptimizerType::Sgd, &values),
        Err(NnError::CorruptData(_))
    ));
}

#[test]
fn fresh_copy_starts_cold() {
    let mut optimizer: Optimizer = Sgd::new(0.1, 0.0, 0.5).unwrap().into();
    let (mut w, mut b) = (scalar(0.0), scalar(0.0));
    optimizer.update(&mut w, &mut b, &scalar(1.0), &scalar(0.0)).unwrap();

    let mut cold = optimizer.fresh();
    let (mut w2, mut b2) = (scalar(0.0), scalar(0.0));
    cold.update(&mut w2, &mut b2, &scalar(1.0), &scalar(0.0)).unwrap();
    assert!((w2.data[0][0] + 0.1).abs() < 1e-12);
}

#[test]
fn heavy_adam_updates_all_three_tensors() {
    let mut layer = HeavyLayer::with_seed(2, 2, 3).unwrap();
    layer.init();
    let x = Matrix::from_data(vec![vec![0.5, -0.3], vec![1.0, 0.2]]).unwrap();
    let before = layer.clone();

    let out = layer.forward(&x).unwrap();
    let grads = layer.backward(&x, &out).unwrap();
    let mut optimizer = HeavyAdam::new(0.01, 0.0, 1e-7, 0.9, 0.999).unwrap();
    optimizer.step(&mut layer, &grads).unwrap();

    assert_eq!(optimizer.iterations(), 1);
    for (g, (now, then)) in [
        (&grads.d_weights, (&layer.weights, &before.weights)),
        (&grads.d_heavies, (&layer.heavies, &before.heavies)),
    ] {
        for ((gv, nv), tv) in g.data.iter().flatten().zip(now.data.iter().flatten()).zip(then.data.iter().flatten()) {
            if *gv != 0.0 {
                assert!(nv != tv);
            }
        }
    }
}

#[test]
fn mismatched_gradient_leaves_parameters_alone() {
    let mut optimizer: Optimizer = Adam::new(0.01, 0.0, 1e-7, 0.9, 0.999).unwrap().into();
    let mut w = Matrix::zeros(2, 2);
    let mut b = Matrix::zeros(1, 2);
    let err = optimizer.update(&mut w, &mut b, &Matrix::zeros(2, 2), &Matrix::zeros(1, 3));
    assert!(matches!(err, Err(NnError::DimensionMismatch { .. })));
    assert_eq!(w, Matrix::zeros(2, 2));
}
