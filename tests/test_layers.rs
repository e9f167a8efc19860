// Forward/backward contracts of the dense layer variants and the heavy layer.

use nnml::activation::activation::{relu, softmax};
use nnml::loss::CrossEntropyLoss;
use nnml::{Axis, HeavyLayer, Layer, LayerKind, Matrix, NnError};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn random_matrix(rows: usize, cols: usize, rng: &mut StdRng) -> Matrix {
    Matrix::from_data(
        (0..rows)
            .map(|_| (0..cols).map(|_| rng.gen_range(-1.0..1.0)).collect())
            .collect(),
    )
    .unwrap()
}

#[test]
fn relu_is_idempotent() {
    let mut rng = StdRng::seed_from_u64(1);
    let m = random_matrix(5, 4, &mut rng);
    let once = relu(m);
    assert_eq!(relu(once.clone()), once);
}

#[test]
fn softmax_rows_sum_to_one() {
    let mut rng = StdRng::seed_from_u64(2);
    let m = random_matrix(6, 5, &mut rng).mul_scalar(50.0);
    let s = softmax(m);
    for row in &s.data {
        assert!((row.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        assert!(row.iter().all(|v| *v >= 0.0));
    }
}

#[test]
fn fused_softmax_cross_entropy_matches_generic_backward() {
    let mut rng = StdRng::seed_from_u64(5);
    let mut layer = Layer::with_seed(LayerKind::Softmax, 3, 4, 9).unwrap();
    layer.init();

    let x = random_matrix(6, 3, &mut rng);
    let mut y_true = Matrix::zeros(6, 4);
    for r in 0..6 {
        y_true.set(r, r % 4, 1.0).unwrap();
    }

    let y_pred = layer.forward(&x).unwrap();
    let loss = CrossEntropyLoss::new(4).unwrap();
    let d_outputs = loss.backward(&y_pred, &y_true).unwrap();

    let generic = layer.backward(&x, &d_outputs).unwrap();
    let fused = layer.backward_cross_entropy(&x, &y_true, &y_pred).unwrap();

    assert!(generic.d_weights.approx_eq(&fused.d_weights, 1e-9));
    assert!(generic.d_biases.approx_eq(&fused.d_biases, 1e-9));
    assert!(generic.d_inputs.approx_eq(&fused.d_inputs, 1e-9));
}

#[test]
fn wrong_input_width_leaves_weights_untouched() {
    let mut layer = Layer::with_seed(LayerKind::Hidden, 3, 2, 1).unwrap();
    layer.init();
    let before = layer.weights.clone();

    let err = layer.forward(&Matrix::zeros(4, 5));
    assert!(matches!(err, Err(NnError::Shape(_))));
    assert_eq!(layer.weights, before);
}

#[test]
fn gradients_have_parameter_shapes() {
    let mut rng = StdRng::seed_from_u64(8);
    for kind in [
        LayerKind::Hidden,
        LayerKind::Linear,
        LayerKind::Sigmoid,
        LayerKind::LeakyReLU { slope: 0.1 },
        LayerKind::Softmax,
        LayerKind::Dropout { rate: 0.3 },
    ] {
        let mut layer = Layer::with_seed(kind, 4, 3, 2).unwrap();
        layer.init();
        let x = random_matrix(5, 4, &mut rng);
        let y = layer.forward(&x).unwrap();
        let grads = layer.backward(&x, &Matrix::zeros(5, 3).add_scalar(1.0)).unwrap();
        assert_eq!(y.shape(), (5, 3));
        assert_eq!(grads.d_weights.shape(), (4, 3));
        assert_eq!(grads.d_biases.shape(), (1, 3));
        assert_eq!(grads.d_inputs.shape(), (5, 4));
    }
}

#[test]
fn sigmoid_backward_matches_finite_difference() {
    let mut rng = StdRng::seed_from_u64(12);
    let mut layer = Layer::with_seed(LayerKind::Sigmoid, 2, 2, 4).unwrap();
    layer.init();
    let x = random_matrix(3, 2, &mut rng);
    let upstream = random_matrix(3, 2, &mut rng);

    // L = sum(Y ⊙ upstream), so dL/dY = upstream.
    let objective = |l: &Layer| l.forward_inference(&x).unwrap().hadamard(&upstream).unwrap().total();

    layer.forward(&x).unwrap();
    let grads = layer.backward(&x, &upstream).unwrap();

    let h = 1e-6;
    for r in 0..2 {
        for c in 0..2 {
            let mut plus = layer.clone();
            plus.weights.data[r][c] += h;
            let mut minus = layer.clone();
            minus.weights.data[r][c] -= h;
            let numeric = (objective(&plus) - objective(&minus)) / (2.0 * h);
            assert!((numeric - grads.d_weights.data[r][c]).abs() < 1e-6);
        }
    }
}

#[test]
fn dropout_masks_are_scaled_and_seeded() {
    let mut rng = StdRng::seed_from_u64(21);
    let x = random_matrix(50, 4, &mut rng);
    let mut a = Layer::with_seed(LayerKind::Dropout { rate: 0.5 }, 4, 8, 21).unwrap();
    a.init();
    let mut b = a.clone();

    let out_a = a.forward(&x).unwrap();
    let out_b = b.forward(&x).unwrap();
    assert_eq!(out_a, out_b);

    let clean = a.forward_inference(&x).unwrap();
    for (dropped, kept) in out_a.data.iter().flatten().zip(clean.data.iter().flatten()) {
        assert!(*dropped == 0.0 || (*dropped - 2.0 * kept).abs() < 1e-12);
    }
    let dropped = out_a
        .data
        .iter()
        .flatten()
        .zip(clean.data.iter().flatten())
        .filter(|(d, k)| **d == 0.0 && **k > 0.0)
        .count();
    assert!(dropped > 0);
}

#[test]
fn dropout_backward_masks_then_applies_relu_derivative() {
    let mut rng = StdRng::seed_from_u64(33);
    let mut layer = Layer::with_seed(LayerKind::Dropout { rate: 0.5 }, 4, 16, 33).unwrap();
    layer.init();
    let x = random_matrix(6, 4, &mut rng);
    let upstream = random_matrix(6, 16, &mut rng);

    let out = layer.forward(&x).unwrap();
    let clean = layer.forward_inference(&x).unwrap();
    let grads = layer.backward(&x, &upstream).unwrap();

    // Kept units carry 1/keep, dropped units 0, and units with z <= 0 get no gradient.
    let mut delta = Matrix::zeros(6, 16);
    for r in 0..6 {
        for c in 0..16 {
            let mask = if clean.data[r][c] > 0.0 { out.data[r][c] / clean.data[r][c] } else { 0.0 };
            delta.data[r][c] = upstream.data[r][c] * mask;
        }
    }
    let expected_weights = x.transpose().dot(&delta).unwrap();
    let expected_inputs = delta.dot(&layer.weights.transpose()).unwrap();
    assert!(grads.d_weights.approx_eq(&expected_weights, 1e-12));
    assert!(grads.d_biases.approx_eq(&delta.sum(Axis::Columns), 1e-12));
    assert!(grads.d_inputs.approx_eq(&expected_inputs, 1e-12));

    let sample = x.slice_rows(0, 1).unwrap();
    let out = layer.forward(&sample).unwrap();
    let clean = layer.forward_inference(&sample).unwrap();
    let grads = layer.backward(&sample, &Matrix::zeros(1, 16).add_scalar(1.0)).unwrap();
    let mut dropped = 0;
    for c in 0..16 {
        let kept = out.data[0][c] != 0.0;
        if !kept && clean.data[0][c] > 0.0 {
            dropped += 1;
        }
        let expected = if kept { 2.0 } else { 0.0 };
        assert_eq!(grads.d_biases.data[0][c], expected, "unit {c}");
        if !kept {
            assert!(grads.d_weights.column(c).unwrap().iter().all(|g| *g == 0.0));
        }
    }
    assert!(dropped > 0);
}

#[test]
fn invalid_hyperparameters_are_rejected() {
    assert!(matches!(
        Layer::dropout(2, 2, 1.0),
        Err(NnError::InvalidHyperparameter(_))
    ));
    assert!(matches!(
        Layer::leaky_relu(2, 2, f64::NAN),
        Err(NnError::InvalidHyperparameter(_))
    ));
    assert!(matches!(Layer::hidden(0, 2), Err(NnError::InvalidDimensions { .. })));
}

#[test]
fn heavy_layer_gradients_match_finite_differences() {
    let mut rng = StdRng::seed_from_u64(31);
    let mut layer = HeavyLayer::with_seed(3, 2, 17).unwrap();
    layer.init();
    let x = random_matrix(4, 3, &mut rng);
    let upstream = random_matrix(4, 2, &mut rng);

    let objective = |l: &HeavyLayer, input: &Matrix| {
        let mut scratch = l.clone();
        scratch.forward(input).unwrap().hadamard(&upstream).unwrap().total()
    };

    layer.forward(&x).unwrap();
    let grads = layer.backward(&x, &upstream).unwrap();
    let h = 1e-6;
    let tol = 1e-5;

    for r in 0..3 {
        for c in 0..2 {
            let (mut plus, mut minus) = (layer.clone(), layer.clone());
            plus.weights.data[r][c] += h;
            minus.weights.data[r][c] -= h;
            let numeric = (objective(&plus, &x) - objective(&minus, &x)) / (2.0 * h);
            assert!((numeric - grads.d_weights.data[r][c]).abs() < tol, "d_weights[{r}][{c}]");

            let (mut plus, mut minus) = (layer.clone(), layer.clone());
            plus.heavies.data[r][c] += h;
            minus.heavies.data[r][c] -= h;
            let numeric = (objective(&plus, &x) - objective(&minus, &x)) / (2.0 * h);
            assert!((numeric - grads.d_heavies.data[r][c]).abs() < tol, "d_heavies[{r}][{c}]");
        }
    }

    for c in 0..2 {
        let (mut plus, mut minus) = (layer.clone(), layer.clone());
        plus.biases.data[0][c] += h;
        minus.biases.data[0][c] -= h;
        let numeric = (objective(&plus, &x) - objective(&minus, &x)) / (2.0 * h);
        assert!((numeric - grads.d_biases.data[0][c]).abs() < tol, "d_biases[{c}]");
    }

    for r in 0..4 {
        for c in 0..3 {
            let (mut xp, mut xm) = (x.clone(), x.clone());
            xp.data[r][c] += h;
            xm.data[r][c] -= h;
            let numeric = (objective(&layer, &xp) - objective(&layer, &xm)) / (2.0 * h);
            assert!((numeric - grads.d_inputs.data[r][c]).abs() < tol, "d_inputs[{r}][{c}]");
        }
    }
}
