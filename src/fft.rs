use num_complex::Complex32;
use realfft::RealFftPlanner;
use rustfft::{Fft, FftPlanner};
use std::sync::Arc;

/// Cached forward/inverse complex FFT plans of a fixed size.
///
/// One plan pair is built per transform call and reused across all frames,
/// which is where the planning cost matters.
///
/// # Example
/// ```
/// use glimpse::fft::FftPlan;
/// use num_complex::Complex32;
///
/// let plan = FftPlan::new(512);
/// let mut buffer = vec![Complex32::new(1.0, 0.0); 512];
/// plan.forward(&mut buffer);
/// plan.inverse(&mut buffer);
/// ```
pub struct FftPlan {
    forward: Arc<dyn Fft<f32>>,
    inverse: Arc<dyn Fft<f32>>,
    len: usize,
}

impl FftPlan {
    /// Create a plan pair for FFTs of size `len`.
    pub fn new(len: usize) -> Self {
        let mut planner = FftPlanner::new();
        let forward = planner.plan_fft_forward(len);
        let inverse = planner.plan_fft_inverse(len);
        Self {
            forward,
            inverse,
            len,
        }
    }

    /// Forward FFT in-place.
    pub fn forward(&self, buffer: &mut [Complex32]) {
        self.forward.process(buffer);
    }

    /// Inverse FFT in-place, scaled by 1/len so that forward followed by
    /// inverse is the identity.
    pub fn inverse(&self, buffer: &mut [Complex32]) {
        self.inverse.process(buffer);
        let scale = 1.0 / self.len as f32;
        for v in buffer.iter_mut() {
            *v *= scale;
        }
    }
}

#[cfg(feature = "parallel")]
const _: () = {
    fn _assert_send_sync<T: Send + Sync>() {}
    fn _check() {
        _assert_send_sync::<FftPlan>();
    }
};

/// Real-to-complex FFT of a real-valued input.
///
/// Returns the non-redundant half of the spectrum, length
/// `input.len() / 2 + 1`.
///
/// # Example
/// ```
/// use glimpse::fft::rfft;
///
/// let frame = vec![1.0f32; 1024];
/// let spectrum = rfft(&frame);
/// assert_eq!(spectrum.len(), 513);
/// ```
pub fn rfft(input: &[f32]) -> Vec<Complex32> {
    if input.is_empty() {
        return Vec::new();
    }
    let len = input.len();
    let mut planner = RealFftPlanner::<f32>::new();
    let r2c = planner.plan_fft_forward(len);
    let mut in_buf = input.to_vec();
    let mut out_buf = r2c.make_output_vec();
    let _ = r2c.process(&mut in_buf, &mut out_buf);
    out_buf
}
