//! Pitch tracking.
//!
//! A [`PitchTracker`] turns audio into a sequence of [`PitchFrame`]s at a
//! fixed time step, with `f0 > 0` for voiced frames and `0` for unvoiced
//! ones. The voiced segmenter only relies on that contract, so any tracker
//! can be plugged in:
//!
//! - [`YinTracker`]: autocorrelation-style F0 estimator used in production
//! - [`EnergyGate`]: deterministic RMS gate, useful for synthetic signals

mod yin;

pub use yin::YinTracker;

use crate::config::seconds_to_samples;

/// One pitch frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PitchFrame {
    /// Frame center in seconds from the start of the analyzed audio.
    pub time: f64,
    /// Fundamental frequency in Hz, or 0 when unvoiced.
    pub f0: f64,
}

impl PitchFrame {
    pub fn voiced(time: f64, f0: f64) -> Self {
        Self { time, f0 }
    }

    pub fn unvoiced(time: f64) -> Self {
        Self { time, f0: 0.0 }
    }

    pub fn is_voiced(&self) -> bool {
        self.f0 > 0.0
    }
}

/// Estimates the fundamental frequency over time.
pub trait PitchTracker: Send + Sync {
    /// Returns pitch frames in ascending time order.
    fn track(&self, audio: &[f32], sample_rate: u32) -> Vec<PitchFrame>;
}

impl<T: PitchTracker + ?Sized> PitchTracker for std::sync::Arc<T> {
    fn track(&self, audio: &[f32], sample_rate: u32) -> Vec<PitchFrame> {
        (**self).track(audio, sample_rate)
    }
}

impl<T: PitchTracker + ?Sized> PitchTracker for Box<T> {
    fn track(&self, audio: &[f32], sample_rate: u32) -> Vec<PitchFrame> {
        (**self).track(audio, sample_rate)
    }
}

/// Splits `len` samples into consecutive frames of `step` samples and yields
/// `(frame_start, frame_center_seconds)` for each complete frame.
pub(crate) fn frame_grid(
    len: usize,
    step: usize,
    sample_rate: u32,
) -> impl Iterator<Item = (usize, f64)> {
    let count = if step == 0 { 0 } else { len / step };
    (0..count).map(move |i| {
        let start = i * step;
        let center = start as f64 + step as f64 / 2.0;
        (start, center / sample_rate as f64)
    })
}

/// Marks a frame voiced when its RMS reaches a fixed threshold.
///
/// Voiced frames report `f0` as a constant. The frame grid is the same as
/// [`YinTracker`]'s, so the two are interchangeable.
///
/// # Example
///
/// ```
/// use fcp_analysis::{EnergyGate, PitchTracker};
///
/// let gate = EnergyGate::new(0.01, 0.05);
/// let mut audio = vec![0.0f32; 1000];
/// audio[500..].fill(0.5);
/// let frames = gate.track(&audio, 1000);
/// assert_eq!(frames.len(), 100);
/// assert!(!frames[0].is_voiced());
/// assert!(frames[99].is_voiced());
/// ```
#[derive(Debug, Clone)]
pub struct EnergyGate {
    step_sec: f64,
    threshold: f64,
    f0: f64,
}

impl EnergyGate {
    pub fn new(step_sec: f64, threshold: f64) -> Self {
        Self {
            step_sec,
            threshold,
            f0: 100.0,
        }
    }

    /// Sets the constant fundamental reported for voiced frames.
    pub fn with_f0(mut self, f0: f64) -> Self {
        self.f0 = f0;
        self
    }
}

impl PitchTracker for EnergyGate {
    fn track(&self, audio: &[f32], sample_rate: u32) -> Vec<PitchFrame> {
        let step = seconds_to_samples(self.step_sec, sample_rate);
        frame_grid(audio.len(), step, sample_rate)
            .map(|(start, time)| {
                let frame = &audio[start..start + step];
                if rms(frame) >= self.threshold {
                    PitchFrame::voiced(time, self.f0)
                } else {
                    PitchFrame::unvoiced(time)
                }
            })
            .collect()
    }
}

pub(crate) fn rms(frame: &[f32]) -> f64 {
    if frame.is_empty() {
        return 0.0;
    }
    let sum: f64 = frame.iter().map(|&s| (s as f64) * (s as f64)).sum();
    (sum / frame.len() as f64).sqrt()
}
