//! Scoring behavior: bounds, self-comparison, degradation ordering, failures.

use glimpse::quality::{self, TARGET_SAMPLE_RATE};
use glimpse::{Error, io};

fn add(a: &[f32], b: &[f32]) -> Vec<f32> {
    a.iter().zip(b.iter()).map(|(x, y)| x + y).collect()
}

#[test]
fn identical_signals_score_max() {
    let signal = io::tone(440.0, TARGET_SAMPLE_RATE, 0.6);
    let score = quality::score(TARGET_SAMPLE_RATE, &signal, &signal).unwrap();
    assert!((score - 4.5).abs() < 1e-3, "self score {score}");

    let sweep = io::chirp(100.0, 4000.0, TARGET_SAMPLE_RATE, 0.6);
    let score = quality::score(TARGET_SAMPLE_RATE, &sweep, &sweep).unwrap();
    assert!((score - 4.5).abs() < 1e-3, "self score {score}");
}

#[test]
fn score_stays_in_bounds() {
    let reference = io::tone(440.0, TARGET_SAMPLE_RATE, 0.6);
    // A grossly unrelated degraded signal still maps into [1.0, 4.5].
    let unrelated = io::noise(reference.len(), 0.8, 11);
    let score = quality::score(TARGET_SAMPLE_RATE, &reference, &unrelated).unwrap();
    assert!((1.0..=4.5).contains(&score), "score {score}");
}

#[test]
fn heavier_noise_scores_lower() {
    let reference = io::chirp(200.0, 3000.0, TARGET_SAMPLE_RATE, 0.6);
    let light = add(&reference, &io::noise(reference.len(), 0.01, 3));
    let heavy = add(&reference, &io::noise(reference.len(), 0.3, 3));

    let score_light = quality::score(TARGET_SAMPLE_RATE, &reference, &light).unwrap();
    let score_heavy = quality::score(TARGET_SAMPLE_RATE, &reference, &heavy).unwrap();
    assert!(
        score_light > score_heavy,
        "light {score_light} vs heavy {score_heavy}"
    );
    assert!(score_light > 2.0, "light noise scored {score_light}");
}

#[test]
fn small_noise_beats_floor() {
    let reference = io::tone(440.0, TARGET_SAMPLE_RATE, 0.6);
    let degraded = add(&reference, &io::noise(reference.len(), 0.005, 21));
    let score = quality::score(TARGET_SAMPLE_RATE, &reference, &degraded).unwrap();
    assert!(score > 3.0, "barely degraded pair scored {score}");
}

#[test]
fn wrong_rate_is_invalid_config() {
    let signal = io::tone(440.0, 8000, 0.5);
    let err = quality::score(8000, &signal, &signal).unwrap_err();
    assert!(matches!(err, Error::InvalidParameter { .. }));

    let signal = io::tone(440.0, 48000, 0.5);
    let err = quality::score(48000, &signal, &signal).unwrap_err();
    assert!(matches!(err, Error::InvalidParameter { .. }));
}

#[test]
fn mismatched_lengths_fail_scoring() {
    let a = io::tone(440.0, TARGET_SAMPLE_RATE, 0.5);
    let b = io::tone(440.0, TARGET_SAMPLE_RATE, 0.45);
    let err = quality::score(TARGET_SAMPLE_RATE, &a, &b).unwrap_err();
    match err {
        Error::Scoring(reason) => assert!(reason.contains("length"), "reason: {reason}"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn silent_inputs_fail_scoring() {
    let silence = vec![0.0f32; 9600];
    let signal = io::tone(440.0, TARGET_SAMPLE_RATE, 0.6);

    for (reference, degraded) in [(&silence, &signal), (&signal, &silence)] {
        let err = quality::score(TARGET_SAMPLE_RATE, reference, degraded).unwrap_err();
        assert!(matches!(err, Error::Scoring(_)));
    }
}

#[test]
fn degenerate_samples_are_rejected() {
    let good = io::tone(440.0, TARGET_SAMPLE_RATE, 0.5);
    let mut bad = good.clone();
    bad[100] = f32::NAN;

    assert!(matches!(
        quality::score(TARGET_SAMPLE_RATE, &bad, &good),
        Err(Error::NonFiniteAudio)
    ));
    assert!(matches!(
        quality::score(TARGET_SAMPLE_RATE, &good, &[]),
        Err(Error::EmptyAudio)
    ));
}

#[test]
fn level_difference_alone_scores_high() {
    // Scoring aligns levels, so a clean copy at half gain stays close
    // to the top of the scale.
    let reference = io::tone(440.0, TARGET_SAMPLE_RATE, 0.6);
    let quieter: Vec<f32> = reference.iter().map(|&v| v * 0.5).collect();
    let score = quality::score(TARGET_SAMPLE_RATE, &reference, &quieter).unwrap();
    assert!(score > 4.0, "half-gain copy scored {score}");
}
