use hound::{SampleFormat, WavSpec, WavWriter};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};
use std::path::Path;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

#[derive(Debug, thiserror::Error)]
pub enum AudioError {
    #[error("hound error: {0}")]
    Hound(#[from] hound::Error),
    #[error("symphonia error: {0}")]
    Symphonia(SymphoniaError),
    #[error("no audio track found")]
    NoAudioTrack,
    #[error("unsupported number of channels")]
    UnsupportedChannels,
    #[error("resampling error: {0}")]
    Resample(String),
}

impl From<SymphoniaError> for AudioError {
    fn from(err: SymphoniaError) -> Self {
        Self::Symphonia(err)
    }
}

/// Load an audio file as mono samples.
///
/// Decodes any format symphonia understands (WAV, MP3, FLAC, OGG, ...),
/// averages the channels down to mono, and resamples to `target_sr` when
/// one is given.
///
/// # Arguments
/// * `path` - Path to the audio file
/// * `target_sr` - Target sample rate (None to keep the file's rate)
///
/// # Returns
/// Tuple of (samples, sample_rate)
///
/// # Example
/// ```no_run
/// use glimpse::io;
///
/// // Load at the file's native rate
/// let (y, sr) = io::load("speech.wav", None).unwrap();
///
/// // Load resampled to 16 kHz for scoring
/// let (y, sr) = io::load("speech.mp3", Some(16000)).unwrap();
/// assert_eq!(sr, 16000);
/// ```
pub fn load<P: AsRef<Path>>(path: P, target_sr: Option<u32>) -> Result<(Vec<f32>, u32), AudioError> {
    let path_ref = path.as_ref();
    let mut hint = Hint::new();
    if let Some(ext) = path_ref.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let file = std::fs::File::open(path_ref).map_err(SymphoniaError::IoError)?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());
    let probed = symphonia::default::get_probe().format(
        &hint,
        mss,
        &FormatOptions::default(),
        &MetadataOptions::default(),
    )?;

    let mut format = probed.format;
    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.sample_rate.is_some())
        .ok_or(AudioError::NoAudioTrack)?
        .clone();

    let sample_rate = track.codec_params.sample_rate.unwrap_or(0);
    let channels = track
        .codec_params
        .channels
        .map(|c| c.count())
        .unwrap_or(0);
    if channels == 0 || sample_rate == 0 {
        return Err(AudioError::UnsupportedChannels);
    }

    let mut decoder =
        symphonia::default::get_codecs().make(&track.codec_params, &DecoderOptions::default())?;

    let mut samples: Vec<f32> = Vec::new();
    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::ResetRequired) => {
                decoder.reset();
                continue;
            }
            Err(SymphoniaError::IoError(_)) => break,
            Err(e) => return Err(e.into()),
        };

        if packet.track_id() != track.id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(audio) => audio,
            Err(SymphoniaError::IoError(_)) => break,
            Err(SymphoniaError::DecodeError(_)) => continue,
            Err(e) => return Err(e.into()),
        };

        let mut sb = SampleBuffer::<f32>::new(decoded.capacity() as u64, *decoded.spec());
        sb.copy_interleaved_ref(decoded);
        samples.extend_from_slice(sb.samples());
    }

    // Mix interleaved channels down to mono.
    let frames = samples.len() / channels;
    let mut mono = Vec::with_capacity(frames);
    if channels == 1 {
        mono = samples;
        mono.truncate(frames);
    } else {
        for frame in 0..frames {
            let mut acc = 0.0f32;
            for ch in 0..channels {
                acc += samples[frame * channels + ch];
            }
            mono.push(acc / channels as f32);
        }
    }

    if let Some(target) = target_sr
        && target != sample_rate
    {
        let resampled = resample(&mono, sample_rate, target)?;
        return Ok((resampled, target));
    }

    Ok((mono, sample_rate))
}

/// Resample a mono signal with a windowed-sinc interpolator.
pub fn resample(y: &[f32], src_sr: u32, dst_sr: u32) -> Result<Vec<f32>, AudioError> {
    if src_sr == dst_sr {
        return Ok(y.to_vec());
    }
    if src_sr == 0 || dst_sr == 0 {
        return Err(AudioError::Resample("sample rate must be non-zero".to_string()));
    }
    if y.is_empty() {
        return Ok(Vec::new());
    }

    let gcd = gcd_u32(src_sr, dst_sr);
    let ratio_in = src_sr / gcd;
    let ratio_out = dst_sr / gcd;
    let resample_ratio = ratio_out as f64 / ratio_in as f64;

    let chunk_size = 1024usize;
    let params = SincInterpolationParameters {
        sinc_len: 256,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    };
    let mut resampler = SincFixedIn::<f32>::new(resample_ratio, 2.0, params, chunk_size, 1)
        .map_err(|e| AudioError::Resample(e.to_string()))?;

    let mut output: Vec<f32> = Vec::new();
    let mut offset = 0usize;
    while offset < y.len() {
        let end = (offset + chunk_size).min(y.len());
        // The fixed-input resampler needs full chunks; zero-pad the tail.
        let mut buf = vec![0.0f32; chunk_size];
        buf[..end - offset].copy_from_slice(&y[offset..end]);

        let chunk_out = resampler
            .process(&[buf], None)
            .map_err(|e| AudioError::Resample(e.to_string()))?;
        output.extend_from_slice(&chunk_out[0]);
        offset = end;
    }

    let expected = ((y.len() as f64) * (dst_sr as f64) / (src_sr as f64)).round() as usize;
    if output.len() > expected {
        output.truncate(expected);
    }
    Ok(output)
}

fn gcd_u32(mut a: u32, mut b: u32) -> u32 {
    while b != 0 {
        let r = a % b;
        a = b;
        b = r;
    }
    a
}

/// Generate a pure tone.
pub fn tone(frequency: f32, sr: u32, duration: f32) -> Vec<f32> {
    let n_samples = (duration * sr as f32) as usize;
    let angular_freq = 2.0 * std::f32::consts::PI * frequency / sr as f32;
    (0..n_samples)
        .map(|i| (angular_freq * i as f32).sin())
        .collect()
}

/// Generate a linear chirp from `f0` to `f1` Hz.
pub fn chirp(f0: f32, f1: f32, sr: u32, duration: f32) -> Vec<f32> {
    let n_samples = (duration * sr as f32) as usize;
    let k = (f1 - f0) / duration;
    (0..n_samples)
        .map(|i| {
            let t = i as f32 / sr as f32;
            let phase = 2.0 * std::f32::consts::PI * (f0 * t + 0.5 * k * t * t);
            phase.sin()
        })
        .collect()
}

/// Generate seeded uniform white noise in `[-amplitude, amplitude]`.
pub fn noise(n_samples: usize, amplitude: f32, seed: u64) -> Vec<f32> {
    use rand::Rng;

    let mut rng = StdRng::seed_from_u64(seed);
    (0..n_samples)
        .map(|_| rng.gen_range(-amplitude..=amplitude))
        .collect()
}

/// Save mono samples to a 16-bit PCM WAV file.
///
/// Missing parent directories are created. Samples are clipped to
/// [-1.0, 1.0] and quantized to 16-bit.
///
/// # Errors
/// Returns `crate::Error::Audio` if the file cannot be written
pub fn save_wav<P: AsRef<Path>>(path: P, y: &[f32], sample_rate: u32) -> crate::Result<()> {
    let path_ref = path.as_ref();
    if let Some(parent) = path_ref.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }

    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut writer = WavWriter::create(path_ref, spec).map_err(AudioError::Hound)?;
    for &sample in y {
        let s = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
        writer.write_sample(s).map_err(AudioError::Hound)?;
    }
    writer.finalize().map_err(AudioError::Hound)?;
    Ok(())
}
