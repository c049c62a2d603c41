//! Tabular reports of analysis results.

use fcp_analysis::{FcpResult, FieldMeans, Severity, SeverityCounts, Summary, WindowResult};
use serde::Serialize;

/// Rounds to 0.01 dB; undetermined values become `None`.
fn db(v: f64) -> Option<f64> {
    v.is_finite().then(|| (v * 100.0).round() / 100.0)
}

/// Band levels, FCP and deltas of one result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Levels {
    pub lmax_0_2: Option<f64>,
    pub lmax_2_5: Option<f64>,
    pub lmax_5_8: Option<f64>,
    pub lmax_2_4: Option<f64>,
    pub fcp: Option<f64>,
    pub trend_at_peak: Option<f64>,
    pub delta_0_2_to_2_5: Option<f64>,
    pub delta_2_5_to_5_8: Option<f64>,
    pub delta_0_2_to_5_8: Option<f64>,
}

impl From<&FcpResult> for Levels {
    fn from(r: &FcpResult) -> Self {
        Self {
            lmax_0_2: db(r.lmax_0_2),
            lmax_2_5: db(r.lmax_2_5),
            lmax_5_8: db(r.lmax_5_8),
            lmax_2_4: db(r.lmax_2_4),
            fcp: db(r.fcp),
            trend_at_peak: db(r.trend_at_peak),
            delta_0_2_to_2_5: db(r.delta_0_2_to_2_5()),
            delta_2_5_to_5_8: db(r.delta_2_5_to_5_8()),
            delta_0_2_to_5_8: db(r.delta_0_2_to_5_8()),
        }
    }
}

impl From<&FieldMeans> for Levels {
    fn from(m: &FieldMeans) -> Self {
        Self {
            lmax_0_2: db(m.lmax_0_2),
            lmax_2_5: db(m.lmax_2_5),
            lmax_5_8: db(m.lmax_5_8),
            lmax_2_4: db(m.lmax_2_4),
            fcp: db(m.fcp),
            trend_at_peak: db(m.trend_at_peak),
            delta_0_2_to_2_5: db(m.delta_0_2_to_2_5),
            delta_2_5_to_5_8: db(m.delta_2_5_to_5_8),
            delta_0_2_to_5_8: db(m.delta_0_2_to_5_8),
        }
    }
}

/// One analyzed window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WindowRow {
    pub start_sec: f64,
    pub end_sec: f64,
    #[serde(flatten)]
    pub levels: Levels,
    pub severity: Severity,
    pub range: &'static str,
}

impl From<&WindowResult> for WindowRow {
    fn from(w: &WindowResult) -> Self {
        let severity = w.severity();
        Self {
            start_sec: (w.start_sec * 1000.0).round() / 1000.0,
            end_sec: (w.end_sec * 1000.0).round() / 1000.0,
            levels: Levels::from(&w.result),
            severity,
            range: severity.label(),
        }
    }
}

/// Report of an offline recording or a live run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub source: String,
    pub duration_sec: f64,
    pub windows: Vec<WindowRow>,
    /// NaN-skipping means over `windows`.
    pub means: Levels,
    /// Mean of the per-window FCP values.
    pub mean_windowed_fcp: Option<f64>,
    pub mean_severity: Severity,
    /// FCP of the pooled voiced audio; absent for live runs.
    pub pooled_fcp: Option<f64>,
    pub pooled_severity: Severity,
    pub severities: SeverityCounts,
}

impl Report {
    pub fn new(
        source: impl Into<String>,
        duration_sec: f64,
        windows: &[WindowResult],
        summary: &Summary,
    ) -> Self {
        Self {
            source: source.into(),
            duration_sec: (duration_sec * 1000.0).round() / 1000.0,
            windows: windows.iter().map(WindowRow::from).collect(),
            means: Levels::from(&summary.means),
            mean_windowed_fcp: db(summary.mean_windowed_fcp),
            mean_severity: summary.mean_severity,
            pooled_fcp: db(summary.pooled_fcp),
            pooled_severity: Severity::classify(summary.pooled_fcp),
            severities: summary.severities,
        }
    }
}
