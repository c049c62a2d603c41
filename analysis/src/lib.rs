//! Formant cluster prominence (FCP) analysis.
//!
//! FCP measures how far the strongest 2-4 kHz band of a voice's long-term
//! average spectrum rises above the spectral trend between 1 and 5 kHz.
//!
//! # Pipeline
//!
//! ```text
//! audio ──► VoicedSegmenter ──► SpectralAverager ──► BandReducer ──► FcpExtractor
//!            (pitch tracker)     (Hann + real FFT)    (max per bin)    (bands, trend, FCP)
//! ```
//!
//! - [`WindowScanner`] runs the pipeline on sliding windows, with voiced
//!   masking, and is also used for each live tick
//! - [`GlobalAggregator`] runs it once on the concatenated voiced audio
//! - [`Analyzer`] combines both for a whole recording
//!
//! Undetermined values are NaN. The `try_*` methods report the reason as
//! an [`AnalysisError`] instead.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use fcp_analysis::{AnalysisConfig, EnergyGate, Severity, WindowScanner};
//!
//! let scanner = WindowScanner::new(
//!     Arc::new(EnergyGate::new(0.01, 0.01)),
//!     &AnalysisConfig::default(),
//! ).unwrap();
//!
//! let audio: Vec<f32> = (0..44100)
//!     .map(|i| (2.0 * std::f64::consts::PI * 500.0 * i as f64 / 44100.0).sin() as f32)
//!     .collect();
//! let result = scanner.analyze_window(&audio, 0.0).unwrap();
//! assert_eq!(result.severity(), Severity::Blue);
//! ```

mod analyzer;
mod band;
mod config;
mod error;
mod extract;
mod global;
pub mod pitch;
mod scan;
mod severity;
mod spectrum;
mod summary;
mod types;
mod voiced;

pub use analyzer::{Analyzer, RecordingAnalysis};
pub use band::BandReducer;
pub use config::{AnalysisConfig, PitchConfig, seconds_to_samples};
pub use error::{AnalysisError, ConfigError};
pub use extract::{
    BAND_0_2, BAND_2_5, BAND_5_8, Band, FcpExtractor, PEAK_BAND, TREND_RANGE, Trend, band_max,
    fit_trend, peak_in,
};
pub use global::{GlobalAggregator, PooledResult};
pub use pitch::{EnergyGate, PitchFrame, PitchTracker, YinTracker};
pub use scan::{Scan, WindowScanner};
pub use severity::Severity;
pub use spectrum::{MAGNITUDE_FLOOR, SpectralAverager, hann_symmetric};
pub use summary::{FieldMeans, SeverityCounts, Summary, nan_mean};
pub use types::{BandedSpectrum, FcpResult, Spectrum, WindowResult};
pub use voiced::{VoicedMask, VoicedSegmenter};
