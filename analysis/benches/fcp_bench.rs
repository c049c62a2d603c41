use std::sync::Arc;

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use fcp_analysis::{
    AnalysisConfig, BandReducer, EnergyGate, FcpExtractor, PitchTracker, SpectralAverager,
    WindowScanner, YinTracker,
};

fn make_voice_like(n_samples: usize, sample_rate: u32) -> Vec<f32> {
    (0..n_samples)
        .map(|i| {
            let t = i as f64 / sample_rate as f64;
            let s = 0.5 * (2.0 * std::f64::consts::PI * 180.0 * t).sin()
                + 0.3 * (2.0 * std::f64::consts::PI * 2900.0 * t).sin()
                + 0.1 * (2.0 * std::f64::consts::PI * 6100.0 * t).sin();
            s as f32
        })
        .collect()
}

fn bench_ltas_1s(c: &mut Criterion) {
    let cfg = AnalysisConfig::default();
    let avg = SpectralAverager::new(&cfg).unwrap();
    let audio = make_voice_like(44100, 44100);

    c.bench_function("fcp_ltas_1s", |b| {
        b.iter(|| {
            let _ = black_box(avg.analyze(black_box(&audio)));
        });
    });
}

fn bench_extract(c: &mut Criterion) {
    let cfg = AnalysisConfig::default();
    let avg = SpectralAverager::new(&cfg).unwrap();
    let banded = BandReducer::new(cfg.bandwidth).reduce(&avg.analyze(&make_voice_like(44100, 44100)));
    let extractor = FcpExtractor::new();

    c.bench_function("fcp_extract", |b| {
        b.iter(|| {
            let _ = black_box(extractor.extract(black_box(&banded)));
        });
    });
}

fn bench_yin_1s(c: &mut Criterion) {
    let yin = YinTracker::default();
    let audio = make_voice_like(44100, 44100);

    c.bench_function("fcp_yin_1s", |b| {
        b.iter(|| {
            let _ = black_box(yin.track(black_box(&audio), 44100));
        });
    });
}

fn bench_window_tick(c: &mut Criterion) {
    let cfg = AnalysisConfig::default();
    let yin = WindowScanner::new(Arc::new(YinTracker::new(cfg.pitch.clone())), &cfg).unwrap();
    let gate = WindowScanner::new(Arc::new(EnergyGate::new(0.01, 0.01)), &cfg).unwrap();
    let audio = make_voice_like(44100, 44100);

    c.bench_function("fcp_window_tick_yin", |b| {
        b.iter(|| {
            let _ = black_box(yin.analyze_window(black_box(&audio), 0.0));
        });
    });
    c.bench_function("fcp_window_tick_energy_gate", |b| {
        b.iter(|| {
            let _ = black_box(gate.analyze_window(black_box(&audio), 0.0));
        });
    });
}

fn bench_offline_scan_10s(c: &mut Criterion) {
    let cfg = AnalysisConfig::default();
    let scanner = WindowScanner::new(Arc::new(EnergyGate::new(0.01, 0.01)), &cfg).unwrap();
    let audio = make_voice_like(441000, 44100);

    let mut group = c.benchmark_group("fcp_offline");
    group.sample_size(10);
    group.bench_function("scan_10s_energy_gate", |b| {
        b.iter(|| {
            let _ = black_box(scanner.scan(black_box(&audio)).count());
        });
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_ltas_1s,
    bench_extract,
    bench_yin_1s,
    bench_window_tick,
    bench_offline_scan_10s
);
criterion_main!(benches);
