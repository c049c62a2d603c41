//! Sliding-window FCP scan.

use std::iter::FusedIterator;
use std::sync::Arc;

use crate::band::BandReducer;
use crate::config::AnalysisConfig;
use crate::error::ConfigError;
use crate::extract::FcpExtractor;
use crate::pitch::PitchTracker;
use crate::spectrum::SpectralAverager;
use crate::types::WindowResult;
use crate::voiced::VoicedSegmenter;

/// Computes one [`WindowResult`] per analysis window.
///
/// Each window is segmented into voiced and unvoiced samples, averaged over
/// its voiced frames, reduced to bands and passed to the extractor. Windows
/// whose banded spectrum is empty or entirely NaN yield nothing.
#[derive(Debug, Clone)]
pub struct WindowScanner {
    segmenter: VoicedSegmenter,
    averager: SpectralAverager,
    reducer: BandReducer,
    extractor: FcpExtractor,
    window: usize,
    hop: usize,
    sample_rate: u32,
}

impl WindowScanner {
    pub fn new(tracker: Arc<dyn PitchTracker>, config: &AnalysisConfig) -> Result<Self, ConfigError> {
        let averager = SpectralAverager::new(config)?;
        Ok(Self {
            segmenter: VoicedSegmenter::new(tracker, config),
            averager,
            reducer: BandReducer::new(config.bandwidth),
            extractor: FcpExtractor::new(),
            window: config.window_samples(),
            hop: config.window_hop_samples(),
            sample_rate: config.sample_rate,
        })
    }

    /// Window length in samples.
    pub fn window_len(&self) -> usize {
        self.window
    }

    /// Window hop in samples.
    pub fn hop_len(&self) -> usize {
        self.hop
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of window positions in `len` samples, including windows
    /// that end up omitted.
    pub fn window_count(&self, len: usize) -> usize {
        if len < self.window {
            0
        } else {
            (len - self.window) / self.hop + 1
        }
    }

    /// Analyzes a single window that starts `start_sec` seconds into the
    /// recording.
    ///
    /// Returns `None` when no frame of the window is voiced enough to
    /// produce a spectrum.
    pub fn analyze_window(&self, window: &[f32], start_sec: f64) -> Option<WindowResult> {
        let mask = self.segmenter.classify(window);
        let spectrum = self.averager.analyze_voiced(window, &mask);
        let banded = self.reducer.reduce(&spectrum);
        if banded.is_empty() || banded.all_nan() {
            tracing::trace!(start_sec, coverage = mask.coverage(), "scan: window omitted");
            return None;
        }

        let result = self.extractor.extract(&banded);
        Some(WindowResult {
            start_sec,
            end_sec: start_sec + window.len() as f64 / self.sample_rate as f64,
            result,
            spectrum: banded,
        })
    }

    /// Returns a lazy iterator over the windows of `audio`.
    ///
    /// Nothing is computed until the iterator is advanced. Calling `scan`
    /// again starts over from the beginning.
    ///
    /// # Example
    ///
    /// ```
    /// use std::sync::Arc;
    /// use fcp_analysis::{AnalysisConfig, EnergyGate, WindowScanner};
    ///
    /// let scanner = WindowScanner::new(
    ///     Arc::new(EnergyGate::new(0.01, 0.01)),
    ///     &AnalysisConfig::default(),
    /// ).unwrap();
    ///
    /// // Silence never produces a window.
    /// assert_eq!(scanner.scan(&vec![0.0; 88200]).count(), 0);
    /// ```
    pub fn scan<'a>(&'a self, audio: &'a [f32]) -> Scan<'a> {
        Scan {
            scanner: self,
            audio,
            next_start: 0,
        }
    }
}

/// Iterator returned by [`WindowScanner::scan`].
#[derive(Debug, Clone)]
pub struct Scan<'a> {
    scanner: &'a WindowScanner,
    audio: &'a [f32],
    next_start: usize,
}

impl Scan<'_> {
    /// Sample offset of the next window to analyze.
    pub fn position(&self) -> usize {
        self.next_start
    }

    fn remaining_positions(&self) -> usize {
        let len = self.audio.len().saturating_sub(self.next_start);
        self.scanner.window_count(len)
    }
}

impl Iterator for Scan<'_> {
    type Item = WindowResult;

    fn next(&mut self) -> Option<WindowResult> {
        let window = self.scanner.window;
        let fs = self.scanner.sample_rate as f64;
        while self.next_start + window <= self.audio.len() {
            let start = self.next_start;
            self.next_start += self.scanner.hop;
            let frame = &self.audio[start..start + window];
            if let Some(result) = self.scanner.analyze_window(frame, start as f64 / fs) {
                return Some(result);
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.remaining_positions()))
    }
}

impl FusedIterator for Scan<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pitch::EnergyGate;
    use std::f64::consts::PI;

    fn scanner() -> WindowScanner {
        WindowScanner::new(Arc::new(EnergyGate::new(0.01, 0.01)), &AnalysisConfig::default()).unwrap()
    }

    fn tone(freq: f64, amp: f64, n: usize) -> Vec<f32> {
        (0..n)
            .map(|i| (amp * (2.0 * PI * freq * i as f64 / 44100.0).sin()) as f32)
            .collect()
    }

    #[test]
    fn test_window_count() {
        let s = scanner();
        assert_eq!(s.window_count(44099), 0);
        assert_eq!(s.window_count(44100), 1);
        assert_eq!(s.window_count(44100 + 4409), 1);
        assert_eq!(s.window_count(88200), 11);
    }

    #[test]
    fn test_short_audio_yields_nothing() {
        assert_eq!(scanner().scan(&tone(500.0, 0.5, 44099)).count(), 0);
    }

    #[test]
    fn test_windows_are_ordered_and_aligned() {
        let s = scanner();
        let audio = tone(500.0, 0.5, 66150);
        let windows: Vec<_> = s.scan(&audio).collect();
        assert_eq!(windows.len(), 6);
        for (i, w) in windows.iter().enumerate() {
            assert!((w.start_sec - i as f64 * 0.1).abs() < 1e-9);
            assert!((w.end_sec - w.start_sec - 1.0).abs() < 1e-9);
            assert!(w.result.fcp.is_finite());
        }
    }

    #[test]
    fn test_unvoiced_windows_omitted() {
        let s = scanner();
        let mut audio = vec![0.0f32; 88200];
        audio.extend(tone(500.0, 0.5, 44100));
        let windows: Vec<_> = s.scan(&audio).collect();

        assert!(!windows.is_empty());
        assert!(windows.len() < s.window_count(audio.len()));
        // Windows entirely inside the silent prefix never appear.
        assert!(windows.iter().all(|w| w.end_sec > 2.0));
    }

    #[test]
    fn test_scan_is_restartable() {
        let s = scanner();
        let audio = tone(500.0, 0.5, 52920);
        let mut first = s.scan(&audio);
        let a = first.next().unwrap();
        assert_eq!(first.position(), 4410);

        let again: Vec<_> = s.scan(&audio).collect();
        assert_eq!(again[0], a);
        assert_eq!(again.len(), 3);
    }

    #[test]
    fn test_size_hint_upper_bound() {
        let s = scanner();
        let audio = vec![0.0f32; 88200];
        assert_eq!(s.scan(&audio).size_hint(), (0, Some(11)));
    }

    #[test]
    fn test_analyze_window_offsets_times() {
        let s = scanner();
        let w = s.analyze_window(&tone(500.0, 0.5, 44100), 12.5).unwrap();
        assert_eq!(w.start_sec, 12.5);
        assert_eq!(w.end_sec, 13.5);
        assert!(s.analyze_window(&vec![0.0; 44100], 0.0).is_none());
    }
}
