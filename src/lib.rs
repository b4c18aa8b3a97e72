//! Phase reconstruction and speech quality scoring for Rust.
//!
//! Glimpse rebuilds listenable waveforms from magnitude-only spectrograms
//! and scores the results against clean references. It covers the full
//! pipeline from audio I/O through the spectral transforms, iterative
//! phase reconstruction, perceptual scoring, and batch reporting.
//!
//! # Features
//!
//! - **Spectral transforms** — forward/inverse short-time analysis with
//!   windowed overlap-add resynthesis
//! - **Phase reconstruction** — damped Griffin-Lim iteration from random
//!   phases, seedable for reproducible output
//! - **Quality scoring** — wideband PESQ-style perceptual score on a
//!   [1.0, 4.5] scale, built on Bark-band loudness disturbance
//! - **Batch processing** — manifest-driven reconstruction and scoring
//!   runs with per-item failure capture and CSV reports
//! - **Audio I/O** — decoding via symphonia (WAV, MP3, FLAC, OGG, ...),
//!   mono mixdown, sinc resampling, 16-bit WAV output
//!
//! # Quick Start
//!
//! ```rust
//! use glimpse::{io, reconstruct, transform};
//! use glimpse::reconstruct::ReconstructionParams;
//! use glimpse::transform::TransformConfig;
//!
//! // Generate a 440 Hz tone (half a second at 16 kHz)
//! let signal = io::tone(440.0, 16000, 0.5);
//!
//! // Forward transform, keep only the magnitudes
//! let config = TransformConfig::default();
//! let spectrogram = transform::forward(&signal, &config).unwrap();
//! let magnitude = transform::magnitude(&spectrogram);
//!
//! // Rebuild a waveform with reconstructed phases
//! let params = ReconstructionParams::default();
//! let restored =
//!     reconstruct::reconstruct_with_seed(&magnitude, &config, &params, Some(signal.len()), 42)
//!         .unwrap();
//! assert_eq!(restored.len(), signal.len());
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`io`] | Audio I/O, resampling, signal generators (`tone`, `chirp`, `noise`) |
//! | [`transform`] | Forward/inverse short-time spectral transform |
//! | [`reconstruct`] | Damped Griffin-Lim phase reconstruction |
//! | [`quality`] | Wideband perceptual quality scoring |
//! | [`batch`] | Manifest-driven batch runs and CSV reports |
//! | [`window`] | Window functions (Hann, Hamming, Blackman, Bartlett) |
//! | [`fft`] | FFT plans shared by the transforms |
//! | [`utils`] | Validation and small numeric helpers |
//!
//! # Error Handling
//!
//! All fallible operations return [`Result<T>`], which is an alias for
//! `std::result::Result<T, Error>`. The [`Error`] enum covers invalid
//! parameters, empty audio, shape mismatches, scoring failures, and I/O
//! failures.
//!
//! # Safety
//!
//! This crate uses `#![forbid(unsafe_code)]` — no unsafe Rust anywhere.
//!
//! # Feature Flags
//!
//! | Flag | Description |
//! |------|-------------|
//! | `cli` | The `glimpse` command-line binary (default) |
//! | `parallel` | Rayon-parallel frame analysis and batch dispatch |

#![forbid(unsafe_code)]

pub mod error;
pub use error::{Error, Result};

pub mod batch;
pub mod fft;
pub mod io;
pub mod quality;
pub mod reconstruct;
pub mod transform;
pub mod utils;
pub mod window;
