use glimpse::quality;
use glimpse::transform::{self, TransformConfig};
use glimpse::window::WindowType;
use ndarray::Array2;
use num_complex::Complex32;
use proptest::prelude::*;

proptest! {
    #[test]
    fn forward_inverse_roundtrip_prop(len in 512usize..4096) {
        let config = TransformConfig::new(256, 64, WindowType::Hann).unwrap();

        let y: Vec<f32> = (0..len).map(|i| ((i as f32) * 0.01).sin()).collect();
        let s = transform::forward(&y, &config).unwrap();
        let y_rec = transform::inverse(&s, &config, Some(y.len())).unwrap();
        prop_assert_eq!(y_rec.len(), y.len());

        let mut mse = 0.0f32;
        for i in 0..y.len() {
            let d = y[i] - y_rec[i];
            mse += d * d;
        }
        mse /= y.len() as f32;
        prop_assert!(mse < 1e-3);
    }

    #[test]
    fn frame_count_matches_shape(len in 1usize..5000, hop_exp in 5u32..9) {
        let hop = 1usize << hop_exp;
        let frame = hop * 4;
        let config = TransformConfig::new(frame, hop, WindowType::Hann).unwrap();

        let y: Vec<f32> = (0..len).map(|i| ((i as f32) * 0.05).cos()).collect();
        let s = transform::forward(&y, &config).unwrap();
        prop_assert_eq!(s.shape()[0], frame / 2 + 1);
        prop_assert_eq!(s.shape()[1], len.div_ceil(hop));
    }

    #[test]
    fn inverse_natural_length_prop(n_frames in 1usize..12, hop_exp in 5u32..8) {
        let hop = 1usize << hop_exp;
        let frame = hop * 4;
        let config = TransformConfig::new(frame, hop, WindowType::Hann).unwrap();

        let spectrogram = Array2::<Complex32>::zeros((frame / 2 + 1, n_frames));
        let y = transform::inverse(&spectrogram, &config, None).unwrap();
        prop_assert_eq!(y.len(), (n_frames - 1) * hop + frame);
    }

    #[test]
    fn quantize_saturates_and_keeps_sign(v in proptest::collection::vec(-4.0f32..4.0, 1..64)) {
        let q = quality::quantize(&v);
        prop_assert_eq!(q.len(), v.len());
        for (sample, quantized) in v.iter().zip(q.iter()) {
            if *sample >= 1.0 {
                prop_assert_eq!(*quantized, i16::MAX);
            } else if *sample <= -1.0 {
                prop_assert!(*quantized <= -32767);
            } else if sample.abs() >= 2.0 / 32767.0 {
                prop_assert_eq!(quantized.signum() as f32, sample.signum());
            }
        }
    }

    #[test]
    fn bark_scale_is_monotone(hz in 20.0f32..7900.0) {
        let bark = quality::hz_to_bark(hz);
        let bark_up = quality::hz_to_bark(hz + 50.0);
        prop_assert!(bark_up > bark);
        prop_assert!((quality::bark_to_hz(bark) - hz).abs() < 1.0);
    }
}
