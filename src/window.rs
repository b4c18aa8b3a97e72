/// Compute a periodic Hann (raised cosine) window.
///
/// The default analysis window for the spectral transform: good frequency
/// resolution, moderate leakage, and well-behaved overlap-add energy at
/// hop sizes up to half the frame.
///
/// # Arguments
/// * `n` - Window length
///
/// # Returns
/// Hann window of length `n`
pub fn hann(n: usize) -> Vec<f32> {
    if n == 0 {
        return Vec::new();
    }
    if n == 1 {
        return vec![1.0];
    }
    let m = n as f32;
    (0..n)
        .map(|i| 0.5 - 0.5 * (2.0 * std::f32::consts::PI * i as f32 / m).cos())
        .collect()
}

/// Compute a Hamming window.
pub fn hamming(n: usize) -> Vec<f32> {
    if n == 0 {
        return Vec::new();
    }
    if n == 1 {
        return vec![1.0];
    }
    let m = n as f32;
    (0..n)
        .map(|i| 0.54 - 0.46 * (2.0 * std::f32::consts::PI * i as f32 / m).cos())
        .collect()
}

/// Compute a Blackman window.
pub fn blackman(n: usize) -> Vec<f32> {
    if n == 0 {
        return Vec::new();
    }
    if n == 1 {
        return vec![1.0];
    }
    let m = n as f32;
    (0..n)
        .map(|i| {
            let a = 2.0 * std::f32::consts::PI * i as f32 / m;
            0.42 - 0.5 * a.cos() + 0.08 * (2.0 * a).cos()
        })
        .collect()
}

/// Compute a Bartlett (triangular) window.
pub fn bartlett(n: usize) -> Vec<f32> {
    if n == 0 {
        return Vec::new();
    }
    if n == 1 {
        return vec![1.0];
    }
    let m = n as f32;
    (0..n)
        .map(|i| 1.0 - ((i as f32 - m / 2.0).abs() / (m / 2.0)))
        .collect()
}

/// Named window function for transform configs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowType {
    Hann,
    Hamming,
    Blackman,
    Bartlett,
}

impl WindowType {
    /// Parse a window type from a string.
    ///
    /// # Arguments
    /// * `name` - Window name (case-insensitive)
    ///
    /// # Returns
    /// Some(WindowType) if recognized, None otherwise
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "hann" | "hanning" => Some(WindowType::Hann),
            "hamming" => Some(WindowType::Hamming),
            "blackman" => Some(WindowType::Blackman),
            "bartlett" | "triangle" => Some(WindowType::Bartlett),
            _ => None,
        }
    }

    /// Lowercase canonical name, the inverse of [`WindowType::parse`].
    pub fn name(&self) -> &'static str {
        match self {
            WindowType::Hann => "hann",
            WindowType::Hamming => "hamming",
            WindowType::Blackman => "blackman",
            WindowType::Bartlett => "bartlett",
        }
    }
}

/// Get a window of the specified type and length.
///
/// # Example
/// ```
/// use glimpse::window::{get_window, WindowType};
///
/// let w = get_window(WindowType::Hann, 512);
/// assert_eq!(w.len(), 512);
/// ```
pub fn get_window(window: WindowType, n: usize) -> Vec<f32> {
    match window {
        WindowType::Hann => hann(n),
        WindowType::Hamming => hamming(n),
        WindowType::Blackman => blackman(n),
        WindowType::Bartlett => bartlett(n),
    }
}

/// Get a window from a string specification.
///
/// Returns `None` if the name is not recognized.
pub fn get_window_from_str(name: &str, n: usize) -> Option<Vec<f32>> {
    WindowType::parse(name).map(|wtype| get_window(wtype, n))
}
