//! End-to-end checks of the FCP pipeline on synthetic signals.

use std::f64::consts::PI;
use std::sync::Arc;

use fcp_analysis::{
    AnalysisConfig, Analyzer, EnergyGate, GlobalAggregator, PitchTracker, Severity,
    VoicedSegmenter, WindowScanner, YinTracker, hann_symmetric,
};

const FS: u32 = 44100;

/// Sum of sinusoids `(freq_hz, amplitude)` lasting `seconds`.
fn tones(parts: &[(f64, f64)], seconds: f64) -> Vec<f32> {
    let n = (seconds * FS as f64) as usize;
    (0..n)
        .map(|i| {
            let t = i as f64 / FS as f64;
            parts
                .iter()
                .map(|&(f, a)| a * (2.0 * PI * f * t).sin())
                .sum::<f64>() as f32
        })
        .collect()
}

/// LTAS level of a bin-centered sinusoid of amplitude `amp`.
fn expected_tone_level(amp: f64) -> f64 {
    let cfg = AnalysisConfig::default();
    let window_sum: f64 = hann_symmetric(cfg.frame_samples()).iter().sum();
    20.0 * (amp * window_sum / 2.0).log10()
}

fn energy_gate() -> Arc<dyn PitchTracker> {
    Arc::new(EnergyGate::new(0.01, 0.01))
}

fn scanner() -> WindowScanner {
    WindowScanner::new(energy_gate(), &AnalysisConfig::default()).unwrap()
}

#[test]
fn test_formant_cluster_dominates() {
    let audio = tones(&[(500.0, 0.5), (3000.0, 1.0), (6000.0, 0.3)], 2.0);
    let windows: Vec<_> = scanner().scan(&audio).collect();
    assert_eq!(windows.len(), 11);

    let expected = expected_tone_level(1.0);
    for w in &windows {
        assert!(w.result.fcp > 10.0, "fcp = {}", w.result.fcp);
        assert!(matches!(w.severity(), Severity::Orange | Severity::Red));
        assert!(
            (w.result.lmax_2_4 - expected).abs() < 0.5,
            "lmax_2_4 = {}, expected {}",
            w.result.lmax_2_4,
            expected
        );
    }
}

#[test]
fn test_low_tone_is_blue() {
    let audio = tones(&[(500.0, 1.0)], 2.0);
    let windows: Vec<_> = scanner().scan(&audio).collect();
    assert!(!windows.is_empty());
    for w in &windows {
        assert!(w.result.fcp <= 0.0, "fcp = {}", w.result.fcp);
        assert_eq!(w.severity(), Severity::Blue);
        assert!(w.result.lmax_0_2 > w.result.lmax_2_4 + 60.0);
    }
}

#[test]
fn test_band_levels_follow_injected_amplitudes() {
    let audio = tones(&[(500.0, 1.0), (3000.0, 0.3), (6000.0, 0.1)], 1.0);
    let w = scanner().analyze_window(&audio, 0.0).unwrap();

    assert!((w.result.lmax_0_2 - expected_tone_level(1.0)).abs() < 0.5);
    assert!((w.result.lmax_2_4 - expected_tone_level(0.3)).abs() < 0.5);
    assert!((w.result.lmax_5_8 - expected_tone_level(0.1)).abs() < 0.5);
    assert!((w.result.delta_0_2_to_2_5() - 20.0 * 0.3f64.log10()).abs() < 1.0);
}

#[test]
fn test_short_burst_in_silence() {
    let mut audio = vec![0.0f32; 5 * FS as usize];
    audio.extend(tones(&[(500.0, 0.5), (3000.0, 0.5)], 0.1));
    audio.extend(vec![0.0f32; 5 * FS as usize]);

    let cfg = AnalysisConfig::default();
    let pooled = GlobalAggregator::new(energy_gate(), &cfg)
        .unwrap()
        .aggregate(&audio);
    assert!(pooled.fcp.is_nan());
    assert!(pooled.lmax_0_2.is_nan());
    assert!(pooled.lmax_2_4.is_nan());

    let windows: Vec<_> = scanner().scan(&audio).collect();
    assert!(windows.len() < 20);
    for w in &windows {
        assert!(w.start_sec <= 5.1 && w.end_sec >= 5.0, "{}..{}", w.start_sec, w.end_sec);
    }
}

#[test]
fn test_voiced_concat_is_recognized_as_voiced() {
    let cfg = AnalysisConfig::default();
    let seg = VoicedSegmenter::new(energy_gate(), &cfg);

    let burst = tones(&[(220.0, 0.4), (2500.0, 0.2)], 1.0);
    let mut audio = Vec::new();
    for _ in 0..3 {
        audio.extend(vec![0.0f32; FS as usize / 2]);
        audio.extend_from_slice(&burst);
    }
    audio.extend(vec![0.0f32; FS as usize / 2]);

    let voiced = seg.extract_voiced_concat(&audio);
    assert!(voiced.len() > 3 * FS as usize - 2000);

    let coverage = seg.classify(&voiced).coverage();
    assert!(coverage >= 0.99, "coverage = {coverage}");
}

#[test]
fn test_voiced_concat_is_recognized_as_voiced_by_yin() {
    let cfg = AnalysisConfig::default();
    let seg = VoicedSegmenter::new(Arc::new(YinTracker::new(cfg.pitch.clone())), &cfg);

    let burst = tones(&[(220.0, 0.4), (2500.0, 0.2)], 1.0);
    let mut audio = Vec::new();
    for _ in 0..3 {
        audio.extend(vec![0.0f32; FS as usize / 2]);
        audio.extend_from_slice(&burst);
    }
    audio.extend(vec![0.0f32; FS as usize / 2]);

    let voiced = seg.extract_voiced_concat(&audio);
    assert!(voiced.len() > 3 * FS as usize - 4000, "len = {}", voiced.len());

    // The joins between bursts break the phase of the voice.
    let coverage = seg.classify(&voiced).coverage();
    assert!(coverage >= 0.99, "coverage = {coverage}");
}

#[test]
fn test_recording_summary_with_yin() {
    let cfg = AnalysisConfig::default();
    let analyzer = Analyzer::new(&cfg).unwrap();

    let mut audio = tones(&[(500.0, 0.5), (3000.0, 1.0), (6000.0, 0.3)], 1.5);
    audio.extend(vec![0.0f32; FS as usize / 2]);
    let report = analyzer.analyze_recording(&audio);

    assert!(!report.windows.is_empty());
    assert!(report.summary.mean_windowed_fcp > 10.0);
    assert!(report.summary.pooled_fcp > 10.0);
    assert_eq!(Severity::classify(report.summary.pooled_fcp), Severity::Red);
}

#[test]
fn test_yin_ignores_noise_floor() {
    let cfg = AnalysisConfig::default();
    let yin = YinTracker::new(cfg.pitch.clone());

    // Deterministic low-level pseudo-noise under a loud tone.
    let mut state = 0x2545_f491u32;
    let mut audio = tones(&[(200.0, 0.8)], 0.5);
    for _ in 0..FS / 2 {
        state ^= state << 13;
        state ^= state >> 17;
        state ^= state << 5;
        audio.push((state as f32 / u32::MAX as f32 - 0.5) * 0.01);
    }

    let frames = yin.track(&audio, FS);
    let tail_voiced = frames[60..].iter().filter(|f| f.is_voiced()).count();
    assert_eq!(tail_voiced, 0);
}
