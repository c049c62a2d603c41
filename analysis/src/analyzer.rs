//! Offline analysis of a whole recording.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::AnalysisConfig;
use crate::error::ConfigError;
use crate::global::GlobalAggregator;
use crate::pitch::{PitchTracker, YinTracker};
use crate::scan::WindowScanner;
use crate::summary::Summary;
use crate::types::WindowResult;

/// Windowed results and pooled summary of one recording.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingAnalysis {
    pub duration_sec: f64,
    pub windows: Vec<WindowResult>,
    pub summary: Summary,
}

/// Bundles the window scanner and the global aggregator around one pitch
/// tracker and configuration.
///
/// # Example
///
/// ```
/// use fcp_analysis::{AnalysisConfig, Analyzer};
///
/// let analyzer = Analyzer::new(&AnalysisConfig::default()).unwrap();
/// let report = analyzer.analyze_recording(&vec![0.0; 22050]);
/// assert!(report.windows.is_empty());
/// assert!(report.summary.pooled_fcp.is_nan());
/// ```
#[derive(Debug, Clone)]
pub struct Analyzer {
    config: AnalysisConfig,
    scanner: WindowScanner,
    aggregator: GlobalAggregator,
}

impl Analyzer {
    /// Creates an analyzer using the YIN tracker configured by
    /// `config.pitch`.
    pub fn new(config: &AnalysisConfig) -> Result<Self, ConfigError> {
        Self::with_tracker(Arc::new(YinTracker::new(config.pitch.clone())), config)
    }

    /// Creates an analyzer with a custom pitch tracker.
    pub fn with_tracker(
        tracker: Arc<dyn PitchTracker>,
        config: &AnalysisConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config: config.clone(),
            scanner: WindowScanner::new(Arc::clone(&tracker), config)?,
            aggregator: GlobalAggregator::new(tracker, config)?,
        })
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn scanner(&self) -> &WindowScanner {
        &self.scanner
    }

    pub fn aggregator(&self) -> &GlobalAggregator {
        &self.aggregator
    }

    /// Scans every window and computes the pooled result.
    pub fn analyze_recording(&self, audio: &[f32]) -> RecordingAnalysis {
        let duration_sec = audio.len() as f64 / self.config.sample_rate as f64;
        let windows: Vec<WindowResult> = self.scanner.scan(audio).collect();
        let pooled = self.aggregator.aggregate(audio);
        let summary = Summary::new(&windows, pooled);

        tracing::info!(
            duration_sec,
            windows = windows.len(),
            omitted = self.scanner.window_count(audio.len()) - windows.len(),
            mean_fcp = summary.mean_windowed_fcp,
            pooled_fcp = summary.pooled_fcp,
            "analysis: recording done"
        );
        RecordingAnalysis {
            duration_sec,
            windows,
            summary,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pitch::EnergyGate;

    #[test]
    fn test_invalid_config_rejected() {
        let cfg = AnalysisConfig {
            bandwidth: -1.0,
            ..Default::default()
        };
        assert!(Analyzer::new(&cfg).is_err());
    }

    #[test]
    fn test_analyze_recording_counts() {
        let analyzer = Analyzer::with_tracker(
            Arc::new(EnergyGate::new(0.01, 0.01)),
            &AnalysisConfig::default(),
        )
        .unwrap();
        let audio: Vec<f32> = (0..66150)
            .map(|i| (0.5 * (2.0 * std::f64::consts::PI * 500.0 * i as f64 / 44100.0).sin()) as f32)
            .collect();
        let report = analyzer.analyze_recording(&audio);

        assert_eq!(report.windows.len(), 6);
        assert_eq!(report.summary.window_count, 6);
        assert!(report.summary.pooled_fcp.is_finite());
        assert!((report.duration_sec - 1.5).abs() < 1e-12);
    }
}
