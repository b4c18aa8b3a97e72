use crate::fft::FftPlan;
use crate::window::{self, WindowType};
use ndarray::Array2;
use num_complex::Complex32;

/// Analysis/synthesis parameters shared by the forward and inverse
/// transforms and by phase reconstruction.
///
/// Frames start at multiples of `hop_size` from the first sample; there is
/// no centering, and frames that run past the end of the signal read zeros.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransformConfig {
    /// Samples per analysis frame (also the FFT size).
    pub frame_size: usize,
    /// Samples between consecutive frame starts. Must be in `1..=frame_size`.
    pub hop_size: usize,
    /// Analysis and synthesis window.
    pub window: WindowType,
}

impl Default for TransformConfig {
    fn default() -> Self {
        let frame_size = 2048;
        Self {
            frame_size,
            hop_size: frame_size / 4,
            window: WindowType::Hann,
        }
    }
}

impl TransformConfig {
    /// Build a config, rejecting invalid sizes up front.
    pub fn new(frame_size: usize, hop_size: usize, window: WindowType) -> crate::Result<Self> {
        let config = Self {
            frame_size,
            hop_size,
            window,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check the size constraints: both sizes positive, hop no larger than
    /// the frame.
    pub fn validate(&self) -> crate::Result<()> {
        if self.frame_size == 0 {
            return Err(crate::Error::InvalidSize {
                name: "frame_size",
                value: 0,
                reason: "must be > 0",
            });
        }
        if self.hop_size == 0 {
            return Err(crate::Error::InvalidSize {
                name: "hop_size",
                value: 0,
                reason: "must be > 0",
            });
        }
        if self.hop_size > self.frame_size {
            return Err(crate::Error::InvalidSize {
                name: "hop_size",
                value: self.hop_size,
                reason: "must not exceed frame_size",
            });
        }
        Ok(())
    }

    /// Number of frequency bins in the one-sided spectrum.
    pub fn n_bins(&self) -> usize {
        self.frame_size / 2 + 1
    }

    /// Number of frames the forward transform produces for `n_samples`
    /// of input. Every sample is covered by at least one frame; the last
    /// frames are zero-padded past the signal end.
    pub fn frame_count(&self, n_samples: usize) -> usize {
        n_samples.div_ceil(self.hop_size)
    }

    /// Length of the signal the inverse transform naturally produces for
    /// `n_frames` frames.
    pub fn output_len(&self, n_frames: usize) -> usize {
        if n_frames == 0 {
            return 0;
        }
        (n_frames - 1) * self.hop_size + self.frame_size
    }
}

#[inline]
fn analyze_frame(
    frame: usize,
    y: &[f32],
    window: &[f32],
    fft: &FftPlan,
    hop_size: usize,
    frame_size: usize,
    n_bins: usize,
) -> Vec<Complex32> {
    let start = frame * hop_size;
    let mut buffer = vec![Complex32::new(0.0, 0.0); frame_size];
    for i in 0..frame_size {
        // Positions past the signal end read as zeros.
        let sample = y.get(start + i).copied().unwrap_or(0.0);
        buffer[i].re = sample * window[i];
    }
    fft.forward(&mut buffer);
    buffer.truncate(n_bins);
    buffer
}

/// Compute the forward short-time Fourier transform.
///
/// # Arguments
/// * `y` - Input signal (mono samples)
/// * `config` - Transform configuration
///
/// # Returns
/// Complex spectrogram of shape (n_bins, n_frames) where
/// `n_bins = frame_size/2 + 1` and `n_frames = ceil(len / hop_size)`.
///
/// # Errors
/// Returns an error if the signal is empty or non-finite, or if the
/// config sizes are invalid.
pub fn forward(y: &[f32], config: &TransformConfig) -> crate::Result<Array2<Complex32>> {
    crate::utils::valid_audio(y)?;
    config.validate()?;

    let window = window::get_window(config.window, config.frame_size);
    let n_frames = config.frame_count(y.len());
    let n_bins = config.n_bins();
    let fft = FftPlan::new(config.frame_size);

    let frame_results: Vec<Vec<Complex32>> = {
        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;
            (0..n_frames)
                .into_par_iter()
                .map(|frame| {
                    analyze_frame(
                        frame,
                        y,
                        &window,
                        &fft,
                        config.hop_size,
                        config.frame_size,
                        n_bins,
                    )
                })
                .collect()
        }
        #[cfg(not(feature = "parallel"))]
        {
            (0..n_frames)
                .map(|frame| {
                    analyze_frame(
                        frame,
                        y,
                        &window,
                        &fft,
                        config.hop_size,
                        config.frame_size,
                        n_bins,
                    )
                })
                .collect()
        }
    };

    let mut spectrogram = Array2::<Complex32>::zeros((n_bins, n_frames));
    for (frame, result) in frame_results.iter().enumerate() {
        for (f, &val) in result.iter().enumerate() {
            spectrogram[(f, frame)] = val;
        }
    }

    Ok(spectrogram)
}

/// Reconstruct a time-domain signal from a complex spectrogram by
/// windowed overlap-add.
///
/// Each synthesized frame is weighted by the window, accumulated at its
/// frame start, and the result is normalized by the accumulated squared
/// window energy per position. Positions whose accumulated energy is
/// below 1e-8 are left at zero; for the usual windows that is only the
/// very first and last few samples.
///
/// # Arguments
/// * `spectrogram` - Complex spectrogram (n_bins x n_frames)
/// * `config` - Transform configuration (must match the forward transform)
/// * `length` - Optional exact output length (truncates or zero-extends);
///   `None` yields `(n_frames - 1) * hop_size + frame_size` samples
///
/// # Errors
/// Returns an error if the spectrogram is empty, or a shape mismatch if
/// its bin count does not agree with `config.frame_size`.
pub fn inverse(
    spectrogram: &Array2<Complex32>,
    config: &TransformConfig,
    length: Option<usize>,
) -> crate::Result<Vec<f32>> {
    config.validate()?;

    let n_bins = spectrogram.shape().first().copied().unwrap_or(0);
    let n_frames = spectrogram.shape().get(1).copied().unwrap_or(0);
    if n_bins == 0 || n_frames == 0 {
        return Err(crate::Error::InvalidSize {
            name: "spectrogram",
            value: 0,
            reason: "spectrogram must be non-empty",
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

    let frame_size = config.frame_size;
    let window = window::get_window(config.window, frame_size);

    let mut y = vec![0.0f32; config.output_len(n_frames)];
    let mut window_sums = vec![0.0f32; y.len()];
    let fft = FftPlan::new(frame_size);

    for frame in 0..n_frames {
        let start = frame * config.hop_size;
        let mut buffer = vec![Complex32::new(0.0, 0.0); frame_size];

        // One-sided spectrum back to a full frame via Hermitian symmetry.
        for f in 0..n_bins {
            buffer[f] = spectrogram[(f, frame)];
        }
        for f in 1..n_bins {
            let mirror = frame_size - f;
            // Skip the self-conjugate Nyquist bin of even frame sizes.
            if mirror > frame_size / 2 {
                buffer[mirror] = spectrogram[(f, frame)].conj();
            }
        }

        fft.inverse(&mut buffer);

        for i in 0..frame_size {
            let w = window[i];
            let idx = start + i;
            y[idx] += buffer[i].re * w;
            window_sums[idx] += w * w;
        }
    }

    for i in 0..y.len() {
        if window_sums[i] > 1e-8 {
            y[i] /= window_sums[i];
        }
    }

    if let Some(len) = length {
        y.resize(len, 0.0);
    }
    Ok(y)
}

/// Elementwise magnitude of a complex spectrogram.
pub fn magnitude(spectrogram: &Array2<Complex32>) -> Array2<f32> {
    spectrogram.mapv(|v| v.norm())
}

/// Separate a complex spectrogram into magnitude and unit-phase parts.
///
/// Bins with zero magnitude get zero phase, so
/// `magnitude * phase == spectrogram` holds everywhere.
pub fn magphase(spectrogram: &Array2<Complex32>) -> (Array2<f32>, Array2<Complex32>) {
    let shape = spectrogram.raw_dim();
    let mut magnitude = Array2::<f32>::zeros(shape);
    let mut phase = Array2::<Complex32>::zeros(shape);

    for ((idx, val), mag) in spectrogram.indexed_iter().zip(magnitude.iter_mut()) {
        let v = *val;
        let m = v.norm();
        *mag = m;
        if m > 0.0 {
            phase[idx] = v / m;
        } else {
            phase[idx] = Complex32::new(0.0, 0.0);
        }
    }

    (magnitude, phase)
}
