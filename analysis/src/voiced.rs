//! Voiced/unvoiced segmentation.

use std::ops::Range;
use std::sync::Arc;

use crate::config::{AnalysisConfig, seconds_to_samples};
use crate::pitch::{PitchFrame, PitchTracker};

/// Per-sample voiced flags, aligned with the audio they were computed from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VoicedMask {
    flags: Vec<bool>,
}

impl VoicedMask {
    /// An all-unvoiced mask of `len` samples.
    pub fn unvoiced(len: usize) -> Self {
        Self {
            flags: vec![false; len],
        }
    }

    pub fn from_flags(flags: Vec<bool>) -> Self {
        Self { flags }
    }

    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    pub fn as_slice(&self) -> &[bool] {
        &self.flags
    }

    /// Returns false for indices past the end.
    pub fn is_voiced(&self, index: usize) -> bool {
        self.flags.get(index).copied().unwrap_or(false)
    }

    /// Number of voiced samples in `range`, clipped to the mask.
    pub fn voiced_in(&self, range: Range<usize>) -> usize {
        let end = range.end.min(self.flags.len());
        let start = range.start.min(end);
        self.flags[start..end].iter().filter(|&&v| v).count()
    }

    pub fn voiced_count(&self) -> usize {
        self.voiced_in(0..self.flags.len())
    }

    /// Fraction of voiced samples, 0 for an empty mask.
    pub fn coverage(&self) -> f64 {
        if self.flags.is_empty() {
            return 0.0;
        }
        self.voiced_count() as f64 / self.flags.len() as f64
    }

    /// Maximal runs of voiced samples.
    pub fn runs(&self) -> Vec<Range<usize>> {
        let mut runs = Vec::new();
        let mut start = None;
        for (i, &v) in self.flags.iter().enumerate() {
            match (v, start) {
                (true, None) => start = Some(i),
                (false, Some(s)) => {
                    runs.push(s..i);
                    start = None;
                }
                _ => {}
            }
        }
        if let Some(s) = start {
            runs.push(s..self.flags.len());
        }
        runs
    }

    fn fill(&mut self, range: Range<usize>) {
        let end = range.end.min(self.flags.len());
        let start = range.start.min(end);
        self.flags[start..end].fill(true);
    }

    /// Grows every voiced run by `margin` samples on both sides.
    ///
    /// Equivalent to `margin` iterations of binary dilation with a 3-sample
    /// structuring element and unvoiced borders.
    fn dilate(&mut self, margin: usize) {
        if margin == 0 {
            return;
        }
        for run in self.runs() {
            self.fill(run.start.saturating_sub(margin)..run.end.saturating_add(margin));
        }
    }
}

/// Splits audio into voiced and unvoiced regions using a [`PitchTracker`].
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use fcp_analysis::{AnalysisConfig, EnergyGate, VoicedSegmenter};
///
/// let cfg = AnalysisConfig::default();
/// let seg = VoicedSegmenter::new(Arc::new(EnergyGate::new(0.01, 0.01)), &cfg);
///
/// let mut audio = vec![0.0f32; 44100];
/// audio[..22050].fill(0.5);
/// let mask = seg.classify(&audio);
/// assert!(mask.is_voiced(1000));
/// assert!(!mask.is_voiced(40000));
/// ```
#[derive(Clone)]
pub struct VoicedSegmenter {
    tracker: Arc<dyn PitchTracker>,
    sample_rate: u32,
    half_window: usize,
    dilation: usize,
    min_run_sec: f64,
}

impl VoicedSegmenter {
    pub fn new(tracker: Arc<dyn PitchTracker>, config: &AnalysisConfig) -> Self {
        Self {
            tracker,
            sample_rate: config.sample_rate,
            half_window: config.voiced_half_window_samples(),
            dilation: config.dilation_margin,
            min_run_sec: config.min_voiced_run_sec,
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Runs the pitch tracker over `audio`.
    pub fn track(&self, audio: &[f32]) -> Vec<PitchFrame> {
        self.tracker.track(audio, self.sample_rate)
    }

    /// Classifies every sample of `audio` as voiced or unvoiced.
    ///
    /// Returns an all-unvoiced mask for empty or pitchless audio.
    pub fn classify(&self, audio: &[f32]) -> VoicedMask {
        if audio.is_empty() {
            return VoicedMask::default();
        }
        let frames = self.track(audio);
        self.mask_from_frames(&frames, audio.len())
    }

    /// Builds a mask of `len` samples from pitch frames.
    ///
    /// Each voiced frame at time `t` marks `[t*fs - w, t*fs + w)`, then every
    /// voiced span is grown by the dilation margin.
    pub fn mask_from_frames(&self, frames: &[PitchFrame], len: usize) -> VoicedMask {
        let mut mask = VoicedMask::unvoiced(len);
        let fs = self.sample_rate as f64;
        for frame in frames.iter().filter(|f| f.is_voiced()) {
            if !(frame.time >= 0.0) {
                continue;
            }
            let idx = (frame.time * fs) as usize;
            if idx >= len {
                continue;
            }
            mask.fill(idx.saturating_sub(self.half_window)..idx + self.half_window);
        }
        mask.dilate(self.dilation);
        mask
    }

    /// Sample ranges of the voiced runs that last at least the minimum run
    /// duration.
    ///
    /// A run starts at its first voiced frame and ends at the first
    /// following unvoiced frame. A run still open at the last frame ends at
    /// the end of the audio.
    pub fn voiced_runs(&self, frames: &[PitchFrame], len: usize) -> Vec<Range<usize>> {
        let fs = self.sample_rate as f64;
        let end_of_audio = len as f64 / fs;
        let to_sample = |t: f64| ((t.max(0.0) * fs) as usize).min(len);

        let mut runs = Vec::new();
        let mut open: Option<f64> = None;
        let close = |t0: f64, t1: f64, runs: &mut Vec<Range<usize>>| {
            if t1 - t0 + 1e-9 >= self.min_run_sec {
                let range = to_sample(t0)..to_sample(t1);
                if !range.is_empty() {
                    runs.push(range);
                }
            }
        };

        for frame in frames {
            match (frame.is_voiced(), open) {
                (true, None) => open = Some(frame.time),
                (false, Some(t0)) => {
                    close(t0, frame.time, &mut runs);
                    open = None;
                }
                _ => {}
            }
        }
        if let Some(t0) = open {
            close(t0, end_of_audio, &mut runs);
        }
        runs
    }

    /// Concatenates the qualifying voiced runs of `audio`, dropping the
    /// unvoiced gaps between them.
    pub fn extract_voiced_concat(&self, audio: &[f32]) -> Vec<f32> {
        if audio.is_empty() {
            return Vec::new();
        }
        let frames = self.track(audio);
        let runs = self.voiced_runs(&frames, audio.len());
        let total: usize = runs.iter().map(|r| r.len()).sum();

        let mut out = Vec::with_capacity(total);
        for run in &runs {
            out.extend_from_slice(&audio[run.clone()]);
        }
        tracing::debug!(
            runs = runs.len(),
            voiced_sec = total as f64 / self.sample_rate as f64,
            "voiced: concatenated"
        );
        out
    }

    /// Minimum run length in samples, for callers sizing buffers.
    pub fn min_run_samples(&self) -> usize {
        seconds_to_samples(self.min_run_sec, self.sample_rate)
    }
}

impl std::fmt::Debug for VoicedSegmenter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VoicedSegmenter")
            .field("sample_rate", &self.sample_rate)
            .field("half_window", &self.half_window)
            .field("dilation", &self.dilation)
            .field("min_run_sec", &self.min_run_sec)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pitch::EnergyGate;

    fn segmenter() -> VoicedSegmenter {
        let cfg = AnalysisConfig::default();
        VoicedSegmenter::new(Arc::new(EnergyGate::new(0.01, 0.01)), &cfg)
    }

    fn frames(times_voiced: &[(f64, bool)]) -> Vec<PitchFrame> {
        times_voiced
            .iter()
            .map(|&(t, v)| {
                if v {
                    PitchFrame::voiced(t, 120.0)
                } else {
                    PitchFrame::unvoiced(t)
                }
            })
            .collect()
    }

    #[test]
    fn test_mask_marks_half_window_and_dilation() {
        let seg = segmenter();
        let f = frames(&[(0.5, true)]);
        let mask = seg.mask_from_frames(&f, 44100);

        // idx = 22050, half window 220, dilation 10
        assert_eq!(mask.runs(), vec![(22050 - 230)..(22050 + 230)]);
        assert_eq!(mask.voiced_count(), 460);
    }

    #[test]
    fn test_mask_clips_at_edges() {
        let seg = segmenter();
        let f = frames(&[(0.001, true), (0.999, true), (2.0, true)]);
        let mask = seg.mask_from_frames(&f, 44100);
        let runs = mask.runs();
        assert_eq!(runs.first().map(|r| r.start), Some(0));
        assert_eq!(runs.last().map(|r| r.end), Some(44100));
        assert_eq!(runs.len(), 2);
    }

    #[test]
    fn test_mask_merges_adjacent_frames() {
        let seg = segmenter();
        let f: Vec<_> = (0..10).map(|i| PitchFrame::voiced(0.1 + i as f64 * 0.01, 100.0)).collect();
        let mask = seg.mask_from_frames(&f, 44100);
        assert_eq!(mask.runs().len(), 1);
    }

    #[test]
    fn test_classify_empty_audio() {
        let mask = segmenter().classify(&[]);
        assert!(mask.is_empty());
        assert_eq!(mask.coverage(), 0.0);
    }

    #[test]
    fn test_classify_silence() {
        let mask = segmenter().classify(&vec![0.0; 4410]);
        assert_eq!(mask.len(), 4410);
        assert_eq!(mask.voiced_count(), 0);
    }

    #[test]
    fn test_voiced_runs_interior_and_trailing() {
        let seg = segmenter();
        // Voiced 0.10-0.20 (interior), 0.30-0.32 (too short), 0.50-end.
        let mut f = Vec::new();
        for i in 0..60 {
            let t = i as f64 * 0.01;
            let v = (10..20).contains(&i) || (30..32).contains(&i) || i >= 50;
            f.push(if v { PitchFrame::voiced(t, 100.0) } else { PitchFrame::unvoiced(t) });
        }
        let runs = seg.voiced_runs(&f, 44100);
        assert_eq!(runs, vec![4410..8820, 22050..44100]);
    }

    #[test]
    fn test_voiced_runs_exact_minimum_kept() {
        let seg = segmenter();
        let f = frames(&[(0.10, true), (0.15, false)]);
        assert_eq!(seg.voiced_runs(&f, 44100).len(), 1);

        let f = frames(&[(0.10, true), (0.14, false)]);
        assert!(seg.voiced_runs(&f, 44100).is_empty());
    }

    #[test]
    fn test_extract_voiced_concat_drops_silence() {
        let seg = segmenter();
        let mut audio = vec![0.0f32; 44100];
        audio[..13230].fill(0.5);
        audio[30870..].fill(-0.5);

        let voiced = seg.extract_voiced_concat(&audio);
        // Both runs survive; the gap is dropped. A run ends at the center of
        // the first unvoiced frame, so up to half a frame of silence remains.
        assert_eq!(voiced.len(), 13230 + 13010);
        let silent = voiced.iter().filter(|&&s| s == 0.0).count();
        assert!(silent <= 221, "silent = {silent}");
    }

    #[test]
    fn test_extract_voiced_concat_silence_is_empty() {
        assert!(segmenter().extract_voiced_concat(&vec![0.0; 44100]).is_empty());
        assert!(segmenter().extract_voiced_concat(&[]).is_empty());
    }

    #[test]
    fn test_voiced_in_clips() {
        let mask = VoicedMask::from_flags(vec![true, false, true]);
        assert_eq!(mask.voiced_in(0..10), 2);
        assert_eq!(mask.voiced_in(5..10), 0);
        assert!(!mask.is_voiced(7));
    }
}
