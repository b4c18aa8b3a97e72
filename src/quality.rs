//! Wideband objective speech quality scoring.
//!
//! Scores a degraded signal against a clean reference with a PESQ-style
//! perceptual model: both signals are quantized to 16-bit range, aligned
//! to a common listening level, analyzed in short Hann-windowed frames,
//! integrated into Bark-scale critical bands, mapped through a
//! hearing-threshold-referenced loudness transform, and compared as
//! symmetric and asymmetric loudness disturbances. The aggregated
//! disturbances map to a mean-opinion-score style value in
//! [1.0, 4.5], with identical inputs scoring exactly 4.5.
//!
//! The model is native to this crate; it follows the published P.862
//! structure but is not calibrated against ITU reference scores.

use crate::fft;
use crate::window;

/// Fixed analysis rate for wideband scoring.
pub const TARGET_SAMPLE_RATE: u32 = 16_000;

/// Analysis frame of 32 ms at the target rate, advanced by half a frame.
const FRAME_SIZE: usize = 512;
const HOP_SIZE: usize = 256;

/// Critical bands spanning the wideband range, equal-width in Bark.
const N_BANDS: usize = 49;
const BAND_FMIN: f32 = 50.0;

/// Frames more than 40 dB below the loudest frame are treated as silence.
const ACTIVE_RANGE: f32 = 1e-4;

/// Active-speech mean-square level both signals are aligned to,
/// in quantized (i16) units; about -36 dBFS.
const TARGET_ACTIVE_MS: f32 = 2.5e5;

/// Zwicker-law compression exponent.
const GAMMA: f32 = 0.23;

/// Stabilizer for the band power ratio in the asymmetry factor.
const ASYM_OFFSET: f32 = 50.0;

/// Scale from per-frame band disturbances to the MOS mapping domain.
const D_SCALE: f32 = 25.0;
const A_SCALE: f32 = 25.0;

/// Frames per aggregation chunk; 20 frames is about a third of a second.
const CHUNK_FRAMES: usize = 20;

const SCORE_MAX: f32 = 4.5;
const SCORE_MIN: f32 = 1.0;

/// Quantize samples to 16-bit integer range.
///
/// Scales by 32767 and truncates toward zero; values outside [-1, 1]
/// saturate at the i16 bounds.
pub fn quantize(x: &[f32]) -> Vec<i16> {
    x.iter().map(|&v| (v * 32767.0) as i16).collect()
}

/// Convert frequency in Hz to the Bark critical-band rate scale
/// (Traunmüller's formula).
pub fn hz_to_bark(hz: f32) -> f32 {
    26.81 * hz / (1960.0 + hz) - 0.53
}

/// Convert Bark critical-band rate back to Hz.
///
/// Inverse of [`hz_to_bark`].
pub fn bark_to_hz(bark: f32) -> f32 {
    1960.0 * (bark + 0.53) / (26.28 - bark)
}

/// Band edges equally spaced on the Bark scale.
///
/// Returns `n_bands + 1` edge frequencies in Hz from `fmin` to `fmax`.
pub fn bark_band_edges(n_bands: usize, fmin: f32, fmax: f32) -> Vec<f32> {
    if n_bands == 0 {
        return Vec::new();
    }
    let bark_min = hz_to_bark(fmin.max(0.0));
    let bark_max = hz_to_bark(fmax.max(fmin));
    let step = (bark_max - bark_min) / n_bands as f32;
    (0..=n_bands)
        .map(|i| bark_to_hz(bark_min + step * i as f32))
        .collect()
}

/// Absolute hearing threshold in dB (Terhardt's approximation).
pub fn hearing_threshold_db(hz: f32) -> f32 {
    let khz = (hz / 1000.0).max(0.02);
    3.64 * khz.powf(-0.8) - 6.5 * (-0.6 * (khz - 3.3).powi(2)).exp() + 1e-3 * khz.powi(4)
}

struct BandMap {
    /// Half-open bin ranges per band.
    ranges: Vec<(usize, usize)>,
    /// Hearing threshold as linear power per band.
    thresholds: Vec<f32>,
}

impl BandMap {
    fn new() -> Self {
        let nyquist = TARGET_SAMPLE_RATE as f32 / 2.0;
        let edges = bark_band_edges(N_BANDS, BAND_FMIN, nyquist);
        let bin_hz = TARGET_SAMPLE_RATE as f32 / FRAME_SIZE as f32;
        let n_bins = FRAME_SIZE / 2 + 1;

        let mut ranges = Vec::with_capacity(N_BANDS);
        let mut thresholds = Vec::with_capacity(N_BANDS);
        for b in 0..N_BANDS {
            let lo = ((edges[b] / bin_hz).ceil() as usize).min(n_bins);
            let mut hi = ((edges[b + 1] / bin_hz).ceil() as usize).min(n_bins);
            // Narrow low bands still cover at least one bin.
            if hi <= lo && lo < n_bins {
                hi = lo + 1;
            }
            ranges.push((lo, hi.max(lo)));

            let center_bark = (hz_to_bark(edges[b]) + hz_to_bark(edges[b + 1])) * 0.5;
            let center_hz = bark_to_hz(center_bark);
            thresholds.push(10.0f32.powf(hearing_threshold_db(center_hz) / 10.0));
        }
        Self { ranges, thresholds }
    }
}

/// Mean-square power of each analysis frame.
fn frame_mean_square(x: &[f32], n_frames: usize) -> Vec<f32> {
    (0..n_frames)
        .map(|f| {
            let start = f * HOP_SIZE;
            let mut acc = 0.0f64;
            for i in 0..FRAME_SIZE {
                let v = x[start + i] as f64;
                acc += v * v;
            }
            (acc / FRAME_SIZE as f64) as f32
        })
        .collect()
}

fn active_mask(frame_ms: &[f32]) -> Vec<bool> {
    let max_ms = frame_ms.iter().copied().fold(0.0f32, f32::max);
    let threshold = max_ms * ACTIVE_RANGE;
    frame_ms.iter().map(|&p| p > threshold).collect()
}

/// Gain aligning a signal's active-frame power to the target level.
fn alignment_gain(frame_ms: &[f32]) -> f32 {
    let active = active_mask(frame_ms);
    let mut acc = 0.0f64;
    let mut count = 0usize;
    for (ms, keep) in frame_ms.iter().zip(active.iter()) {
        if *keep {
            acc += *ms as f64;
            count += 1;
        }
    }
    if count == 0 || acc <= 0.0 {
        return 1.0;
    }
    (TARGET_ACTIVE_MS as f64 / (acc / count as f64)).sqrt() as f32
}

/// Windowed power spectrum of one frame, integrated into Bark bands.
fn band_powers(x: &[f32], start: usize, gain: f32, win: &[f32], bands: &BandMap) -> Vec<f32> {
    let frame: Vec<f32> = (0..FRAME_SIZE)
        .map(|i| x[start + i] * gain * win[i])
        .collect();
    let spectrum = fft::rfft(&frame);

    let norm = 2.0 / (FRAME_SIZE as f64 * FRAME_SIZE as f64);
    bands
        .ranges
        .iter()
        .map(|&(lo, hi)| {
            let mut acc = 0.0f64;
            for bin in &spectrum[lo..hi] {
                acc += bin.norm_sqr() as f64;
            }
            (acc * norm) as f32
        })
        .collect()
}

/// Zwicker-law loudness per band, zero at and below the hearing threshold.
fn band_loudness(powers: &[f32], bands: &BandMap) -> Vec<f32> {
    powers
        .iter()
        .zip(bands.thresholds.iter())
        .map(|(&p, &t)| {
            let l = (2.0 * t).powf(GAMMA) * ((0.5 + 0.5 * p / t).powf(GAMMA) - 1.0);
            l.max(0.0)
        })
        .collect()
}

/// Symmetric and asymmetric loudness disturbance of one frame.
///
/// A quarter of the smaller loudness is forgiven per band (masking
/// allowance); bands where the degraded signal adds clearly audible
/// energy are weighted by the asymmetry factor, capped at 12.
fn frame_disturbance(
    loud_ref: &[f32],
    loud_deg: &[f32],
    pow_ref: &[f32],
    pow_deg: &[f32],
) -> (f32, f32) {
    let n = loud_ref.len();
    let mut sym_acc = 0.0f64;
    let mut asym_acc = 0.0f64;
    for b in 0..n {
        let diff = (loud_deg[b] - loud_ref[b]).abs();
        let allowance = 0.25 * loud_ref[b].min(loud_deg[b]);
        let dd = (diff - allowance).max(0.0);
        sym_acc += (dd * dd) as f64;

        let ratio = ((pow_deg[b] + ASYM_OFFSET) / (pow_ref[b] + ASYM_OFFSET)).powf(1.2);
        let factor = if ratio < 3.0 { 0.0 } else { ratio.min(12.0) };
        asym_acc += (dd * factor) as f64;
    }
    let sym = ((sym_acc / n as f64).sqrt() as f32) * D_SCALE;
    let asym = ((asym_acc / n as f64) as f32) * A_SCALE;
    (sym, asym)
}

fn lp_mean(values: &[f32], p: f32) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    let acc: f64 = values.iter().map(|&v| (v.abs() as f64).powf(p as f64)).sum();
    ((acc / values.len() as f64).powf(1.0 / p as f64)) as f32
}

/// L6 within short chunks, L2 across chunks.
fn aggregate(frames: &[f32]) -> f32 {
    if frames.is_empty() {
        return 0.0;
    }
    let chunk_means: Vec<f32> = frames
        .chunks(CHUNK_FRAMES)
        .map(|chunk| lp_mean(chunk, 6.0))
        .collect();
    lp_mean(&chunk_means, 2.0)
}

/// Score a degraded signal against a clean reference.
///
/// Both signals must be mono at 16 kHz (see [`TARGET_SAMPLE_RATE`]) and
/// the same length; the loader can resample on the way in. The result is
/// a wideband MOS-style value in [1.0, 4.5] where identical inputs score
/// 4.5 and added degradation lowers the score.
///
/// # Errors
/// * `InvalidParameter` for any rate other than 16 kHz
/// * `EmptyAudio` / `NonFiniteAudio` for degenerate sample data
/// * `Scoring` when the pair cannot be compared: mismatched lengths,
///   input shorter than one analysis frame, or a silent signal
///
/// # Example
/// ```
/// use glimpse::{io, quality};
///
/// let clean = io::tone(440.0, 16000, 0.5);
/// let score = quality::score(16000, &clean, &clean).unwrap();
/// assert!(score > 4.49);
/// ```
pub fn score(sample_rate: u32, reference: &[f32], degraded: &[f32]) -> crate::Result<f32> {
    if sample_rate != TARGET_SAMPLE_RATE {
        return Err(crate::Error::InvalidParameter {
            name: "sample_rate",
            value: sample_rate.to_string(),
            reason: format!("wideband scoring runs at {TARGET_SAMPLE_RATE} Hz"),
        });
    }
    crate::utils::valid_audio(reference)?;
    crate::utils::valid_audio(degraded)?;
    if reference.len() != degraded.len() {
        return Err(crate::Error::Scoring(format!(
            "length mismatch: reference has {} samples, degraded has {}",
            reference.len(),
            degraded.len()
        )));
    }
    if reference.len() < FRAME_SIZE {
        return Err(crate::Error::Scoring(format!(
            "input too short: {} samples, need at least {FRAME_SIZE}",
            reference.len()
        )));
    }

    // The perceptual model operates on the 16-bit quantized pair.
    let ref_q: Vec<f32> = quantize(reference).iter().map(|&v| v as f32).collect();
    let deg_q: Vec<f32> = quantize(degraded).iter().map(|&v| v as f32).collect();

    if ref_q.iter().all(|&v| v == 0.0) {
        return Err(crate::Error::Scoring(
            "no utterances: reference signal is silent".to_string(),
        ));
    }
    if deg_q.iter().all(|&v| v == 0.0) {
        return Err(crate::Error::Scoring(
            "no utterances: degraded signal is silent".to_string(),
        ));
    }

    let n_frames = (ref_q.len() - FRAME_SIZE) / HOP_SIZE + 1;
    let ref_ms = frame_mean_square(&ref_q, n_frames);
    let deg_ms = frame_mean_square(&deg_q, n_frames);

    // Each signal is aligned to the target level by its own active frames.
    let gain_ref = alignment_gain(&ref_ms);
    let gain_deg = alignment_gain(&deg_ms);

    // Disturbance is aggregated over reference-side speech activity only.
    let active = active_mask(&ref_ms);

    let win = window::hann(FRAME_SIZE);
    let bands = BandMap::new();

    let mut sym_frames = Vec::new();
    let mut asym_frames = Vec::new();
    for f in 0..n_frames {
        if !active[f] {
            continue;
        }
        let start = f * HOP_SIZE;
        let pow_ref = band_powers(&ref_q, start, gain_ref, &win, &bands);
        let pow_deg = band_powers(&deg_q, start, gain_deg, &win, &bands);
        let loud_ref = band_loudness(&pow_ref, &bands);
        let loud_deg = band_loudness(&pow_deg, &bands);

        let (sym, asym) = frame_disturbance(&loud_ref, &loud_deg, &pow_ref, &pow_deg);
        sym_frames.push(sym);
        asym_frames.push(asym);
    }

    if sym_frames.is_empty() {
        return Err(crate::Error::Scoring(
            "no utterances: no active frames in reference signal".to_string(),
        ));
    }

    let d_sym = aggregate(&sym_frames);
    let d_asym = aggregate(&asym_frames);

    let raw = SCORE_MAX - 0.1 * d_sym - 0.0309 * d_asym;
    Ok(raw.clamp(SCORE_MIN, SCORE_MAX))
}
