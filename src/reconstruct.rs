use crate::transform::{self, TransformConfig};
use ndarray::Array2;
use num_complex::Complex32;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Parameters for damped Griffin-Lim phase reconstruction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReconstructionParams {
    /// Number of analysis/resynthesis refinement passes. Zero is valid
    /// and yields the resynthesis of the randomly-phased magnitude.
    pub iterations: usize,
    /// Present for compatibility with existing parameter sets; the
    /// current update rule does not use it. Must lie in `[0, 1]`.
    pub damping_alpha: f32,
    /// Damping strength for the magnitude re-imposition step. Each pass
    /// scales the magnitude-imposed estimate by
    /// `(1 + 2λ) / (1 + λ)²`, which is exactly
    /// `(1/(1+λ)) · (Ŝ + (λ/(1+λ)) · |M| · e^{i·arg(Ŝ)})` for an estimate
    /// `Ŝ` that already carries the target magnitude. `λ = 0` disables
    /// damping. Must be finite and non-negative.
    pub damping_lambda: f32,
}

impl Default for ReconstructionParams {
    fn default() -> Self {
        Self {
            iterations: 2,
            damping_alpha: 0.99,
            damping_lambda: 0.1,
        }
    }
}

impl ReconstructionParams {
    /// Check the numeric constraints on both damping parameters.
    pub fn validate(&self) -> crate::Result<()> {
        if !self.damping_lambda.is_finite() || self.damping_lambda < 0.0 {
            return Err(crate::Error::InvalidParameter {
                name: "damping_lambda",
                value: self.damping_lambda.to_string(),
                reason: "must be finite and >= 0".to_string(),
            });
        }
        if !self.damping_alpha.is_finite() || !(0.0..=1.0).contains(&self.damping_alpha) {
            return Err(crate::Error::InvalidParameter {
                name: "damping_alpha",
                value: self.damping_alpha.to_string(),
                reason: "must lie in [0, 1]".to_string(),
            });
        }
        Ok(())
    }

    /// Per-pass scale factor implied by `damping_lambda` (1.0 when λ = 0).
    pub fn damping_factor(&self) -> f32 {
        let lambda = self.damping_lambda;
        (1.0 + 2.0 * lambda) / ((1.0 + lambda) * (1.0 + lambda))
    }
}

/// Reconstruct a time-domain signal from a magnitude spectrogram by
/// damped Griffin-Lim iteration.
///
/// Starts from uniformly random phases in `[0, 2π)` drawn from `rng`,
/// then alternates inverse/forward transforms, each time re-imposing the
/// target magnitude on the refined phase and applying the damping scale
/// (see [`ReconstructionParams::damping_lambda`]). The result is a pure
/// function of `(magnitude, config, params, length, rng state)`.
///
/// All validation happens before the first transform call: bad params or
/// a magnitude that is empty, non-finite, negative, or inconsistent with
/// `config` never reach the FFT.
///
/// # Arguments
/// * `magnitude` - Target magnitudes (n_bins x n_frames), non-negative
/// * `config` - Transform configuration (`n_bins` must equal
///   `frame_size/2 + 1`)
/// * `params` - Iteration count and damping
/// * `length` - Optional exact output length, threaded through every
///   resynthesis; `None` yields the natural overlap-add length
/// * `rng` - Random source for the initial phases
pub fn reconstruct<R: Rng>(
    magnitude: &Array2<f32>,
    config: &TransformConfig,
    params: &ReconstructionParams,
    length: Option<usize>,
    rng: &mut R,
) -> crate::Result<Vec<f32>> {
    params.validate()?;
    config.validate()?;

    let n_bins = magnitude.shape().first().copied().unwrap_or(0);
    let n_frames = magnitude.shape().get(1).copied().unwrap_or(0);
    if n_bins == 0 || n_frames == 0 {
        return Err(crate::Error::InvalidSize {
            name: "magnitude",
            value: 0,
            reason: "magnitude spectrogram must be non-empty",
        });
    }
    if n_bins != config.n_bins() {
        return Err(crate::Error::ShapeMismatch {
            expected: format!(
                "{} bins for frame_size {}",
                config.n_bins(),
                config.frame_size
            ),
            got: format!("{n_bins} bins"),
        });
    }
    for &m in magnitude.iter() {
        if !m.is_finite() || m < 0.0 {
            return Err(crate::Error::InvalidParameter {
                name: "magnitude",
                value: m.to_string(),
                reason: "entries must be finite and non-negative".to_string(),
            });
        }
    }

    // Initial estimate: target magnitude with random phase.
    let mut estimate = Array2::<Complex32>::zeros((n_bins, n_frames));
    for (idx, val) in estimate.indexed_iter_mut() {
        let angle = rng.gen_range(0.0..std::f32::consts::TAU);
        *val = Complex32::from_polar(magnitude[idx], angle);
    }

    let damping = params.damping_factor();

    for _ in 0..params.iterations {
        let resynth = transform::inverse(&estimate, config, length)?;
        let reanalyzed = transform::forward(&resynth, config)?;

        // Resynthesis can run longer than the span the magnitude covers,
        // so the re-analysis may carry extra tail frames; only the
        // overlapping region updates the estimate.
        let re_bins = reanalyzed.shape()[0];
        let re_frames = reanalyzed.shape()[1];
        for ((i, j), val) in estimate.indexed_iter_mut() {
            if i < re_bins && j < re_frames {
                let refined = reanalyzed[(i, j)];
                let phase = if refined.norm() > 1e-10 {
                    refined / refined.norm()
                } else {
                    Complex32::new(1.0, 0.0)
                };
                *val = magnitude[(i, j)] * phase * damping;
            }
        }
    }

    transform::inverse(&estimate, config, length)
}

/// [`reconstruct`] with a fixed seed.
///
/// Two calls with the same inputs and seed produce bit-identical output.
pub fn reconstruct_with_seed(
    magnitude: &Array2<f32>,
    config: &TransformConfig,
    params: &ReconstructionParams,
    length: Option<usize>,
    seed: u64,
) -> crate::Result<Vec<f32>> {
    let mut rng = StdRng::seed_from_u64(seed);
    reconstruct(magnitude, config, params, length, &mut rng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::window::WindowType;

    fn test_config() -> TransformConfig {
        TransformConfig {
            frame_size: 256,
            hop_size: 64,
            window: WindowType::Hann,
        }
    }

    #[test]
    fn test_params_validation() {
        assert!(ReconstructionParams::default().validate().is_ok());

        let negative = ReconstructionParams {
            damping_lambda: -0.5,
            ..Default::default()
        };
        assert!(matches!(
            negative.validate(),
            Err(crate::Error::InvalidParameter {
                name: "damping_lambda",
                ..
            })
        ));

        let nan = ReconstructionParams {
            damping_lambda: f32::NAN,
            ..Default::default()
        };
        assert!(nan.validate().is_err());

        let alpha_high = ReconstructionParams {
            damping_alpha: 1.5,
            ..Default::default()
        };
        assert!(matches!(
            alpha_high.validate(),
            Err(crate::Error::InvalidParameter {
                name: "damping_alpha",
                ..
            })
        ));
    }

    #[test]
    fn test_damping_factor() {
        let undamped = ReconstructionParams {
            damping_lambda: 0.0,
            ..Default::default()
        };
        assert_eq!(undamped.damping_factor(), 1.0);

        let damped = ReconstructionParams {
            damping_lambda: 0.1,
            ..Default::default()
        };
        let expected = 1.2 / (1.1 * 1.1);
        assert!((damped.damping_factor() - expected).abs() < 1e-6);
        assert!(damped.damping_factor() < 1.0);
    }

    #[test]
    fn test_rejects_empty_magnitude() {
        let magnitude = Array2::<f32>::zeros((0, 0));
        let result = reconstruct_with_seed(
            &magnitude,
            &test_config(),
            &ReconstructionParams::default(),
            None,
            0,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_bin_mismatch() {
        // 100 bins cannot come from a 256-sample frame.
        let magnitude = Array2::<f32>::from_elem((100, 4), 1.0);
        let err = reconstruct_with_seed(
            &magnitude,
            &test_config(),
            &ReconstructionParams::default(),
            None,
            0,
        )
        .unwrap_err();
        assert!(matches!(err, crate::Error::ShapeMismatch { .. }));
    }

    #[test]
    fn test_rejects_negative_magnitude() {
        let mut magnitude = Array2::<f32>::from_elem((129, 4), 1.0);
        magnitude[(3, 1)] = -0.25;
        let err = reconstruct_with_seed(
            &magnitude,
            &test_config(),
            &ReconstructionParams::default(),
            None,
            0,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            crate::Error::InvalidParameter {
                name: "magnitude",
                ..
            }
        ));
    }

    #[test]
    fn test_seeded_runs_identical() {
        let magnitude = Array2::<f32>::from_elem((129, 8), 0.5);
        let config = test_config();
        let params = ReconstructionParams::default();

        let a = reconstruct_with_seed(&magnitude, &config, &params, None, 42).unwrap();
        let b = reconstruct_with_seed(&magnitude, &config, &params, None, 42).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_zero_iterations() {
        let magnitude = Array2::<f32>::from_elem((129, 8), 0.5);
        let config = test_config();
        let params = ReconstructionParams {
            iterations: 0,
            ..Default::default()
        };

        let out = reconstruct_with_seed(&magnitude, &config, &params, Some(500), 7).unwrap();
        assert_eq!(out.len(), 500);
        assert!(out.iter().all(|v| v.is_finite()));
    }
}
