//! YIN fundamental frequency estimator.

use std::sync::Arc;

use parking_lot::Mutex;
use realfft::num_complex::Complex;
use realfft::{ComplexToReal, RealFftPlanner, RealToComplex};

use super::{PitchFrame, PitchTracker, frame_grid};
use crate::config::{PitchConfig, seconds_to_samples};

/// YIN pitch tracker (de Cheveigné & Kawahara, 2002).
///
/// For every frame the squared difference function is computed from an
/// FFT cross-correlation, normalized by its cumulative mean, and the first
/// lag whose normalized value dips under the absolute threshold is refined
/// by parabolic interpolation.
///
/// Frames whose local peak is below `silence_threshold` times the signal
/// peak, or that have no dip under the threshold, are unvoiced. A short run
/// of the latter between two voiced frames (a phase break where voiced
/// segments were joined, say) is bridged, see `max_gap_frames`.
pub struct YinTracker {
    config: PitchConfig,
    plans: Mutex<Option<Plans>>,
}

#[derive(Clone)]
struct Plans {
    len: usize,
    forward: Arc<dyn RealToComplex<f64>>,
    inverse: Arc<dyn ComplexToReal<f64>>,
}

struct Lags {
    min: usize,
    max: usize,
}

impl YinTracker {
    pub fn new(config: PitchConfig) -> Self {
        Self {
            config,
            plans: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &PitchConfig {
        &self.config
    }

    /// Returns FFT plans of length `len`, reusing the last ones if the
    /// length matches.
    fn plan(&self, len: usize) -> (Arc<dyn RealToComplex<f64>>, Arc<dyn ComplexToReal<f64>>) {
        let mut cached = self.plans.lock();
        let plans = match cached.as_ref() {
            Some(p) if p.len == len => p.clone(),
            _ => {
                let mut planner = RealFftPlanner::<f64>::new();
                let p = Plans {
                    len,
                    forward: planner.plan_fft_forward(len),
                    inverse: planner.plan_fft_inverse(len),
                };
                *cached = Some(p.clone());
                p
            }
        };
        (plans.forward, plans.inverse)
    }

    fn lags(&self, sample_rate: u32) -> Lags {
        let fs = sample_rate as f64;
        let min = ((fs / self.config.ceiling_hz).floor() as usize).max(2);
        let max = ((fs / self.config.floor_hz).ceil() as usize).max(min + 2);
        Lags { min, max }
    }
}

impl Default for YinTracker {
    fn default() -> Self {
        Self::new(PitchConfig::default())
    }
}

impl std::fmt::Debug for YinTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YinTracker")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl PitchTracker for YinTracker {
    fn track(&self, audio: &[f32], sample_rate: u32) -> Vec<PitchFrame> {
        let step = seconds_to_samples(self.config.step_sec, sample_rate);
        let grid: Vec<(usize, f64)> = frame_grid(audio.len(), step, sample_rate).collect();

        let lags = self.lags(sample_rate);
        // Integration window of one longest period, plus the largest lag.
        let width = lags.max;
        let seg_len = width + lags.max;

        let peak = audio.iter().fold(0.0f32, |m, s| m.max(s.abs())) as f64;
        if audio.len() < seg_len || peak <= 0.0 {
            return grid.into_iter().map(|(_, t)| PitchFrame::unvoiced(t)).collect();
        }

        let n_fft = seg_len.next_power_of_two();
        let (r2c, c2r) = self.plan(n_fft);
        let mut work = Workspace {
            x_in: r2c.make_input_vec(),
            a_in: r2c.make_input_vec(),
            x_spec: r2c.make_output_vec(),
            a_spec: r2c.make_output_vec(),
            corr: c2r.make_output_vec(),
            energy: vec![0.0; seg_len + 1],
            diff: vec![0.0; lags.max + 1],
            r2c,
            c2r,
        };

        let silence = self.config.silence_threshold * peak;
        let mut frames = Vec::with_capacity(grid.len());
        let mut silent = Vec::with_capacity(grid.len());
        for (start, time) in grid {
            let center = start + step / 2;
            let s = center.saturating_sub(seg_len / 2).min(audio.len() - seg_len);
            let seg = &audio[s..s + seg_len];

            let local_peak = seg.iter().fold(0.0f32, |m, v| m.max(v.abs())) as f64;
            silent.push(local_peak < silence);
            if local_peak < silence {
                frames.push(PitchFrame::unvoiced(time));
                continue;
            }

            let f0 = work
                .difference(seg, width)
                .then(|| self.pick(&mut work.diff, &lags, sample_rate))
                .flatten();
            frames.push(match f0 {
                Some(f0) => PitchFrame::voiced(time, f0),
                None => PitchFrame::unvoiced(time),
            });
        }

        bridge_gaps(&mut frames, &silent, self.config.max_gap_frames);

        let voiced = frames.iter().filter(|f| f.is_voiced()).count();
        tracing::trace!(frames = frames.len(), voiced, "yin: tracked");
        frames
    }
}

impl YinTracker {
    /// Turns the difference function into its cumulative mean normalized
    /// form in place and returns the refined F0, if any.
    fn pick(&self, d: &mut [f64], lags: &Lags, sample_rate: u32) -> Option<f64> {
        let mut running = 0.0;
        d[0] = 1.0;
        for tau in 1..d.len() {
            running += d[tau];
            d[tau] = if running > 0.0 {
                d[tau] * tau as f64 / running
            } else {
                1.0
            };
        }

        let mut tau = lags.min;
        let found = loop {
            if tau > lags.max {
                break None;
            }
            if d[tau] < self.config.yin_threshold {
                while tau < lags.max && d[tau + 1] < d[tau] {
                    tau += 1;
                }
                break Some(tau);
            }
            tau += 1;
        }?;

        let mut period = found as f64;
        if found > 0 && found < lags.max {
            let (a, b, c) = (d[found - 1], d[found], d[found + 1]);
            let denom = a - 2.0 * b + c;
            if denom.abs() > 1e-12 {
                period += (0.5 * (a - c) / denom).clamp(-1.0, 1.0);
            }
        }

        Some(sample_rate as f64 / period)
    }
}

/// Gives every run of at most `max_gap` unvoiced, non-silent frames that
/// sits between two voiced frames an F0 interpolated from its neighbours.
fn bridge_gaps(frames: &mut [PitchFrame], silent: &[bool], max_gap: usize) {
    let mut i = 0;
    while i < frames.len() {
        if frames[i].is_voiced() {
            i += 1;
            continue;
        }
        let start = i;
        while i < frames.len() && !frames[i].is_voiced() {
            i += 1;
        }
        let end = i;
        if start == 0 || end == frames.len() || end - start > max_gap {
            continue;
        }
        if silent[start..end].iter().any(|&s| s) {
            continue;
        }

        let (before, after) = (frames[start - 1].f0, frames[end].f0);
        let span = (end - start + 1) as f64;
        for (k, frame) in frames[start..end].iter_mut().enumerate() {
            frame.f0 = before + (after - before) * (k + 1) as f64 / span;
        }
    }
}

struct Workspace {
    r2c: Arc<dyn RealToComplex<f64>>,
    c2r: Arc<dyn ComplexToReal<f64>>,
    x_in: Vec<f64>,
    a_in: Vec<f64>,
    x_spec: Vec<Complex<f64>>,
    a_spec: Vec<Complex<f64>>,
    corr: Vec<f64>,
    energy: Vec<f64>,
    diff: Vec<f64>,
}

impl Workspace {
    /// Fills `diff[tau] = sum_{j<width} (x[j] - x[j+tau])^2` for every lag.
    /// Returns false if an FFT fails.
    fn difference(&mut self, seg: &[f32], width: usize) -> bool {
        let n = self.x_in.len();

        self.x_in.fill(0.0);
        self.a_in.fill(0.0);
        for (dst, &s) in self.x_in.iter_mut().zip(seg) {
            *dst = s as f64;
        }
        self.a_in[..width].copy_from_slice(&self.x_in[..width]);

        self.energy[0] = 0.0;
        for (i, &s) in seg.iter().enumerate() {
            self.energy[i + 1] = self.energy[i] + (s as f64) * (s as f64);
        }

        if self.r2c.process(&mut self.x_in, &mut self.x_spec).is_err()
            || self.r2c.process(&mut self.a_in, &mut self.a_spec).is_err()
        {
            return false;
        }

        // Cross-correlation of the integration window against the segment.
        for (x, a) in self.x_spec.iter_mut().zip(&self.a_spec) {
            *x = a.conj() * *x;
        }
        if let Some(first) = self.x_spec.first_mut() {
            first.im = 0.0;
        }
        if let Some(last) = self.x_spec.last_mut() {
            last.im = 0.0;
        }
        if self.c2r.process(&mut self.x_spec, &mut self.corr).is_err() {
            return false;
        }

        let scale = 1.0 / n as f64;
        let e0 = self.energy[width];
        for (tau, d) in self.diff.iter_mut().enumerate() {
            let e_tau = self.energy[tau + width] - self.energy[tau];
            *d = (e0 + e_tau - 2.0 * self.corr[tau] * scale).max(0.0);
        }
        true
    }
}
