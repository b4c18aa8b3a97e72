/// Mean squared error between two signals.
///
/// Compares up to the shorter length; returns 0.0 if either is empty.
pub fn mse(a: &[f32], b: &[f32]) -> f32 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let n = a.len().min(b.len());
    let mut acc = 0.0f32;
    for i in 0..n {
        let d = a[i] - b[i];
        acc += d * d;
    }
    acc / n as f32
}

/// Validate audio data.
///
/// Checks that the audio data satisfies the following conditions:
/// - Data is not empty
/// - All samples are finite (no NaN or Inf)
///
/// # Example
/// ```
/// use glimpse::utils::valid_audio;
///
/// let y = vec![0.0, 0.5, -0.5, 0.0];
/// assert!(valid_audio(&y).is_ok());
///
/// let empty: Vec<f32> = vec![];
/// assert!(valid_audio(&empty).is_err());
/// ```
pub fn valid_audio(y: &[f32]) -> crate::Result<()> {
    if y.is_empty() {
        return Err(crate::Error::EmptyAudio);
    }

    if !y.iter().all(|&v| v.is_finite()) {
        return Err(crate::Error::NonFiniteAudio);
    }

    Ok(())
}
