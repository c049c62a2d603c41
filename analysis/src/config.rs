//! Analysis parameters.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Pitch tracking parameters used by [`YinTracker`](crate::YinTracker).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PitchConfig {
    /// Time step between pitch frames in seconds.
    pub step_sec: f64,
    /// Lowest detectable fundamental in Hz.
    pub floor_hz: f64,
    /// Highest detectable fundamental in Hz.
    pub ceiling_hz: f64,
    /// YIN absolute threshold on the normalized difference function.
    pub yin_threshold: f64,
    /// Frames quieter than this fraction of the signal peak are unvoiced.
    pub silence_threshold: f64,
    /// Longest run of non-silent unvoiced frames between two voiced frames
    /// that is bridged with an interpolated F0.
    pub max_gap_frames: usize,
}

impl Default for PitchConfig {
    fn default() -> Self {
        Self {
            step_sec: 0.01,
            floor_hz: 75.0,
            ceiling_hz: 600.0,
            yin_threshold: 0.15,
            silence_threshold: 0.03,
            max_gap_frames: 3,
        }
    }
}

/// Parameters of the FCP pipeline.
///
/// Every duration is expressed in seconds and converted to a sample count
/// with [`seconds_to_samples`] against `sample_rate`.
///
/// # Example
///
/// ```
/// use fcp_analysis::AnalysisConfig;
///
/// let cfg = AnalysisConfig::default();
/// assert_eq!(cfg.frame_samples(), 1764);
/// assert_eq!(cfg.frame_hop_samples(), 441);
/// assert_eq!(cfg.window_samples(), 44100);
/// assert_eq!(cfg.window_hop_samples(), 4410);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Sample rate in Hz of all audio handed to the pipeline.
    pub sample_rate: u32,
    /// Analysis window length (also the live ring buffer length).
    pub buffer_seconds: f64,
    /// Window hop of the offline scan and period of the live tick.
    pub update_interval: f64,
    /// Band width in Hz used by the band reducer.
    pub bandwidth: f64,
    /// LTAS frame length.
    pub win_len_sec: f64,
    /// LTAS frame hop.
    pub hop_len_sec: f64,
    /// Voiced runs shorter than this are discarded during concatenation.
    pub min_voiced_run_sec: f64,
    /// Minimum concatenated voiced audio for a pooled result.
    pub min_voiced_total_sec: f64,
    /// Minimum voiced fraction of an LTAS frame for it to be averaged.
    pub voiced_frame_inclusion_threshold: f64,
    /// Half width of the span marked voiced around each voiced pitch frame.
    pub voiced_half_window_sec: f64,
    /// Extra samples added on both sides of every voiced span.
    pub dilation_margin: usize,
    pub pitch: PitchConfig,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            buffer_seconds: 1.0,
            update_interval: 0.1,
            bandwidth: 350.0,
            win_len_sec: 0.04,
            hop_len_sec: 0.01,
            min_voiced_run_sec: 0.05,
            min_voiced_total_sec: 0.2,
            voiced_frame_inclusion_threshold: 0.5,
            voiced_half_window_sec: 0.005,
            dilation_margin: 10,
            pitch: PitchConfig::default(),
        }
    }
}

/// Converts a duration to a whole number of samples, truncating.
///
/// A tiny epsilon absorbs representation error so that e.g. `0.29 * 100`
/// yields 29 rather than 28.
pub fn seconds_to_samples(seconds: f64, sample_rate: u32) -> usize {
    if !(seconds > 0.0) {
        return 0;
    }
    (seconds * sample_rate as f64 + 1e-9).floor() as usize
}

impl AnalysisConfig {
    /// Returns a copy of the defaults at a different sample rate.
    pub fn with_sample_rate(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            ..Self::default()
        }
    }

    /// Analysis window length in samples.
    pub fn window_samples(&self) -> usize {
        seconds_to_samples(self.buffer_seconds, self.sample_rate)
    }

    /// Offline window hop in samples.
    pub fn window_hop_samples(&self) -> usize {
        seconds_to_samples(self.update_interval, self.sample_rate)
    }

    /// LTAS frame length in samples.
    pub fn frame_samples(&self) -> usize {
        seconds_to_samples(self.win_len_sec, self.sample_rate)
    }

    /// LTAS frame hop in samples.
    pub fn frame_hop_samples(&self) -> usize {
        seconds_to_samples(self.hop_len_sec, self.sample_rate)
    }

    /// Half width in samples of the span marked around a voiced pitch frame.
    pub fn voiced_half_window_samples(&self) -> usize {
        seconds_to_samples(self.voiced_half_window_sec, self.sample_rate)
    }

    /// Minimum concatenated voiced length in samples.
    pub fn min_voiced_total_samples(&self) -> usize {
        seconds_to_samples(self.min_voiced_total_sec, self.sample_rate)
    }

    /// Checks that every parameter yields a usable pipeline.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sample_rate == 0 {
            return Err(ConfigError::invalid("sample_rate", "must be positive"));
        }
        if !(self.bandwidth > 0.0) {
            return Err(ConfigError::invalid("bandwidth", "must be positive"));
        }
        if self.frame_samples() < 2 {
            return Err(ConfigError::invalid(
                "win_len_sec",
                format!("{} s is shorter than 2 samples", self.win_len_sec),
            ));
        }
        if self.frame_hop_samples() == 0 {
            return Err(ConfigError::invalid("hop_len_sec", "must be at least one sample"));
        }
        if self.window_samples() < self.frame_samples() {
            return Err(ConfigError::invalid(
                "buffer_seconds",
                "window must hold at least one LTAS frame",
            ));
        }
        if self.frame_hop_samples() > self.frame_samples() {
            return Err(ConfigError::invalid("hop_len_sec", "must not exceed win_len_sec"));
        }
        if self.window_hop_samples() == 0 {
            return Err(ConfigError::invalid(
                "update_interval",
                "must be at least one sample",
            ));
        }
        if self.window_hop_samples() > self.window_samples() {
            return Err(ConfigError::invalid(
                "update_interval",
                "must not exceed buffer_seconds",
            ));
        }
        if !(0.0..=1.0).contains(&self.voiced_frame_inclusion_threshold) {
            return Err(ConfigError::invalid(
                "voiced_frame_inclusion_threshold",
                "must be within [0, 1]",
            ));
        }
        if self.min_voiced_run_sec < 0.0 || self.min_voiced_total_sec < 0.0 {
            return Err(ConfigError::invalid(
                "min_voiced_run_sec",
                "voiced durations must not be negative",
            ));
        }
        let p = &self.pitch;
        if seconds_to_samples(p.step_sec, self.sample_rate) == 0 {
            return Err(ConfigError::invalid("pitch.step_sec", "must be at least one sample"));
        }
        if !(p.floor_hz > 0.0) || !(p.ceiling_hz > p.floor_hz) {
            return Err(ConfigError::invalid(
                "pitch.floor_hz",
                format!(
                    "need 0 < floor < ceiling, got floor={} ceiling={}",
                    p.floor_hz, p.ceiling_hz
                ),
            ));
        }
        if p.ceiling_hz * 2.0 > self.sample_rate as f64 {
            return Err(ConfigError::invalid(
                "pitch.ceiling_hz",
                "must be below the Nyquist frequency",
            ));
        }
        Ok(())
    }
}
