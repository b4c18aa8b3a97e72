//! Griffin-Lim reconstruction behavior: determinism, convergence, validation.

use glimpse::reconstruct::{self, ReconstructionParams};
use glimpse::transform::{self, TransformConfig};
use glimpse::window::WindowType;
use glimpse::{io, utils};

fn magnitude_of(y: &[f32], config: &TransformConfig) -> ndarray::Array2<f32> {
    let s = transform::forward(y, config).unwrap();
    transform::magnitude(&s)
}

#[test]
fn seeded_runs_are_bit_identical() {
    let y = io::tone(440.0, 16000, 0.3);
    let config = TransformConfig::new(512, 128, WindowType::Hann).unwrap();
    let magnitude = magnitude_of(&y, &config);
    let params = ReconstructionParams {
        iterations: 2,
        ..Default::default()
    };

    let a =
        reconstruct::reconstruct_with_seed(&magnitude, &config, &params, Some(y.len()), 1234)
            .unwrap();
    let b =
        reconstruct::reconstruct_with_seed(&magnitude, &config, &params, Some(y.len()), 1234)
            .unwrap();
    assert_eq!(a, b);

    let c = reconstruct::reconstruct_with_seed(&magnitude, &config, &params, Some(y.len()), 99)
        .unwrap();
    assert_ne!(a, c);
}

#[test]
fn iterations_reduce_magnitude_error() {
    let y = io::tone(440.0, 16000, 0.3);
    let config = TransformConfig::new(512, 128, WindowType::Hann).unwrap();
    let magnitude = magnitude_of(&y, &config);

    let run = |iterations: usize| {
        let params = ReconstructionParams {
            iterations,
            ..Default::default()
        };
        let restored =
            reconstruct::reconstruct_with_seed(&magnitude, &config, &params, Some(y.len()), 7)
                .unwrap();
        let restored_mag = magnitude_of(&restored, &config);
        utils::mse(
            magnitude.as_slice().unwrap(),
            restored_mag.as_slice().unwrap(),
        )
    };

    // Same starting phases; running the iteration must move the
    // resynthesized magnitudes toward the target.
    let err_zero = run(0);
    let err_four = run(4);
    assert!(
        err_four < err_zero,
        "4 iterations: {err_four}, 0 iterations: {err_zero}"
    );
}

#[test]
fn zero_iterations_still_produces_output() {
    let y = io::tone(440.0, 16000, 0.2);
    let config = TransformConfig::new(512, 128, WindowType::Hann).unwrap();
    let magnitude = magnitude_of(&y, &config);
    let params = ReconstructionParams {
        iterations: 0,
        ..Default::default()
    };

    let restored =
        reconstruct::reconstruct_with_seed(&magnitude, &config, &params, Some(y.len()), 1)
            .unwrap();
    assert_eq!(restored.len(), y.len());
    assert!(restored.iter().any(|&v| v.abs() > 1e-6));
    assert!(restored.iter().all(|v| v.is_finite()));
}

#[test]
fn negative_lambda_is_rejected_up_front() {
    let y = io::tone(440.0, 16000, 0.2);
    let config = TransformConfig::new(512, 128, WindowType::Hann).unwrap();
    let magnitude = magnitude_of(&y, &config);
    let params = ReconstructionParams {
        iterations: 2,
        damping_alpha: 0.99,
        damping_lambda: -0.5,
    };

    let err = reconstruct::reconstruct_with_seed(&magnitude, &config, &params, None, 0)
        .unwrap_err();
    assert!(matches!(
        err,
        glimpse::Error::InvalidParameter {
            name: "damping_lambda",
            ..
        }
    ));
}

#[test]
fn invalid_magnitude_is_rejected() {
    let config = TransformConfig::new(512, 128, WindowType::Hann).unwrap();
    let params = ReconstructionParams::default();

    // Wrong bin count for the configured frame size.
    let wrong = ndarray::Array2::<f32>::zeros((100, 8));
    let err = reconstruct::reconstruct_with_seed(&wrong, &config, &params, None, 0).unwrap_err();
    assert!(matches!(err, glimpse::Error::ShapeMismatch { .. }));

    // Negative magnitude entries.
    let mut negative = ndarray::Array2::<f32>::zeros((257, 8));
    negative[(3, 2)] = -1.0;
    let err =
        reconstruct::reconstruct_with_seed(&negative, &config, &params, None, 0).unwrap_err();
    assert!(matches!(err, glimpse::Error::InvalidParameter { .. }));
}

#[test]
fn output_length_follows_request() {
    let y = io::tone(440.0, 16000, 0.3);
    let config = TransformConfig::new(512, 128, WindowType::Hann).unwrap();
    let magnitude = magnitude_of(&y, &config);
    let params = ReconstructionParams {
        iterations: 1,
        ..Default::default()
    };

    let natural =
        reconstruct::reconstruct_with_seed(&magnitude, &config, &params, None, 5).unwrap();
    let n_frames = magnitude.shape()[1];
    assert_eq!(natural.len(), (n_frames - 1) * 128 + 512);

    let trimmed =
        reconstruct::reconstruct_with_seed(&magnitude, &config, &params, Some(1000), 5).unwrap();
    assert_eq!(trimmed.len(), 1000);
}

#[test]
fn reconstruction_keeps_dominant_frequency() {
    let sr = 16000;
    let y = io::tone(500.0, sr, 0.4);
    let config = TransformConfig::new(512, 128, WindowType::Hann).unwrap();
    let magnitude = magnitude_of(&y, &config);
    let params = ReconstructionParams {
        iterations: 8,
        ..Default::default()
    };

    let restored =
        reconstruct::reconstruct_with_seed(&magnitude, &config, &params, Some(y.len()), 3)
            .unwrap();
    let restored_mag = magnitude_of(&restored, &config);

    // The strongest bin of a middle frame should sit where the tone is.
    let expected_bin = (500.0 * 512.0 / sr as f32).round() as usize;
    let mid = restored_mag.shape()[1] / 2;
    let column = restored_mag.column(mid);
    let peak_bin = column
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
        .map(|(i, _)| i)
        .unwrap();
    assert!(
        (peak_bin as i64 - expected_bin as i64).abs() <= 1,
        "peak at bin {peak_bin}, expected near {expected_bin}"
    );
}
