use nnml::loss::{BceLoss, CrossEntropyLoss, MaeLoss, MseLoss};
use nnml::{LossType, Matrix, NnError};

fn m(rows: Vec<Vec<f64>>) -> Matrix {
    Matrix::from_data(rows).unwrap()
}

#[test]
fn mse_value_and_gradient() {
    let loss = MseLoss::new(2).unwrap();
    let p = m(vec![vec![1.0, 2.0]]);
    let y = m(vec![vec![0.0, 0.0]]);
    assert!((loss.forward(&p, &y).unwrap() - 2.5).abs() < 1e-12);
    assert_eq!(loss.backward(&p, &y).unwrap().data, vec![vec![1.0, 2.0]]);
}

#[test]
fn mae_gradient_is_signed_and_zero_at_match() {
    let loss = MaeLoss::new(2).unwrap();
    let p = m(vec![vec![1.0, -2.0], vec![3.0, 0.0]]);
    let y = m(vec![vec![0.0, 0.0], vec![3.0, 0.0]]);
    assert!((loss.forward(&p, &y).unwrap() - 0.75).abs() < 1e-12);
    assert_eq!(
        loss.backward(&p, &y).unwrap().data,
        vec![vec![0.5, -0.5], vec![0.0, 0.0]]
    );
}

#[test]
fn cross_entropy_per_sample_and_mean() {
    let loss = CrossEntropyLoss::new(2).unwrap();
    let p = m(vec![vec![0.7, 0.3], vec![0.2, 0.8]]);
    let y = m(vec![vec![1.0, 0.0], vec![0.0, 1.0]]);

    let per_sample = loss.sample_losses(&p, &y).unwrap();
    assert_eq!(per_sample.shape(), (2, 1));
    assert!((per_sample.data[0][0] + 0.7f64.ln()).abs() < 1e-12);
    assert!((per_sample.data[1][0] + 0.8f64.ln()).abs() < 1e-12);

    let mean = loss.forward(&p, &y).unwrap();
    assert!((mean + (0.7f64.ln() + 0.8f64.ln()) / 2.0).abs() < 1e-12);

    let grad = loss.backward(&p, &y).unwrap();
    assert!((grad.data[0][0] + 1.0 / 0.7 / 2.0).abs() < 1e-12);
    assert_eq!(grad.data[0][1], 0.0);
}

#[test]
fn binary_cross_entropy_stays_finite_at_extremes() {
    let loss = BceLoss::new(2).unwrap();
    let p = m(vec![vec![0.0, 1.0]]);
    let y = m(vec![vec![0.0, 1.0]]);
    let value = loss.forward(&p, &y).unwrap();
    assert!(value.is_finite());
    assert!(value < 1e-6);
    assert!(loss.backward(&p, &y).unwrap().data.iter().flatten().all(|g| g.is_finite()));
}

#[test]
fn binary_cross_entropy_gradient() {
    let loss = BceLoss::new(1).unwrap();
    let p = m(vec![vec![0.25], vec![0.5]]);
    let y = m(vec![vec![1.0], vec![0.0]]);
    let grad = loss.backward(&p, &y).unwrap();
    // -(1/0.25)/2 and (1/0.5)/2
    assert!((grad.data[0][0] + 2.0).abs() < 1e-9);
    assert!((grad.data[1][0] - 1.0).abs() < 1e-9);
}

#[test]
fn width_and_row_mismatches_are_shape_errors() {
    for loss_type in [
        LossType::Mse,
        LossType::Mae,
        LossType::CrossEntropy,
        LossType::BinaryCrossEntropy,
    ] {
        let loss = loss_type.build(2).unwrap();
        assert_eq!(loss.loss_type(), loss_type);
        assert_eq!(loss.size(), 2);

        let wide = Matrix::zeros(2, 3).add_scalar(0.5);
        let ok = Matrix::zeros(2, 2).add_scalar(0.5);
        let short = Matrix::zeros(1, 2).add_scalar(0.5);
        assert!(matches!(loss.forward(&wide, &ok), Err(NnError::Shape(_))));
        assert!(matches!(loss.backward(&ok, &short), Err(NnError::Shape(_))));
        assert!(loss.forward(&ok, &ok).is_ok());
    }
}

#[test]
fn zero_size_is_invalid() {
    assert!(matches!(MseLoss::new(0), Err(NnError::InvalidDimensions { .. })));
    assert!(LossType::from_code(7).is_err());
}
