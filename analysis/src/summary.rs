//! Aggregate statistics over window results.

use serde::{Deserialize, Serialize};

use crate::severity::Severity;
use crate::types::{FcpResult, WindowResult};

/// Mean of the non-NaN values, or NaN when there are none.
pub fn nan_mean(values: impl IntoIterator<Item = f64>) -> f64 {
    let (sum, n) = values
        .into_iter()
        .filter(|v| !v.is_nan())
        .fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if n == 0 { f64::NAN } else { sum / n as f64 }
}

/// NaN-skipping mean of every FCP field and band delta.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FieldMeans {
    pub lmax_0_2: f64,
    pub lmax_2_5: f64,
    pub lmax_5_8: f64,
    pub lmax_2_4: f64,
    pub fcp: f64,
    pub trend_at_peak: f64,
    pub delta_0_2_to_2_5: f64,
    pub delta_2_5_to_5_8: f64,
    pub delta_0_2_to_5_8: f64,
}

impl FieldMeans {
    pub fn from_results<'a, I>(results: I) -> Self
    where
        I: IntoIterator<Item = &'a FcpResult>,
        I::IntoIter: Clone,
    {
        let it = results.into_iter();
        let mean = |f: fn(&FcpResult) -> f64| nan_mean(it.clone().map(f));
        Self {
            lmax_0_2: mean(|r| r.lmax_0_2),
            lmax_2_5: mean(|r| r.lmax_2_5),
            lmax_5_8: mean(|r| r.lmax_5_8),
            lmax_2_4: mean(|r| r.lmax_2_4),
            fcp: mean(|r| r.fcp),
            trend_at_peak: mean(|r| r.trend_at_peak),
            delta_0_2_to_2_5: mean(|r| r.delta_0_2_to_2_5()),
            delta_2_5_to_5_8: mean(|r| r.delta_2_5_to_5_8()),
            delta_0_2_to_5_8: mean(|r| r.delta_0_2_to_5_8()),
        }
    }
}

/// Count of windows per severity bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityCounts {
    pub blue: usize,
    pub green: usize,
    pub orange: usize,
    pub red: usize,
    pub undetermined: usize,
}

impl SeverityCounts {
    pub fn add(&mut self, severity: Severity) {
        match severity {
            Severity::Blue => self.blue += 1,
            Severity::Green => self.green += 1,
            Severity::Orange => self.orange += 1,
            Severity::Red => self.red += 1,
            Severity::Undetermined => self.undetermined += 1,
        }
    }

    pub fn get(&self, severity: Severity) -> usize {
        match severity {
            Severity::Blue => self.blue,
            Severity::Green => self.green,
            Severity::Orange => self.orange,
            Severity::Red => self.red,
            Severity::Undetermined => self.undetermined,
        }
    }
}

/// Summary of a recording or live session.
///
/// `mean_windowed_fcp` averages the per-window FCPs, `pooled_fcp` is the
/// FCP of the concatenated voiced audio. The two generally differ.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub window_count: usize,
    pub determined_count: usize,
    pub mean_windowed_fcp: f64,
    pub mean_severity: Severity,
    pub pooled_fcp: f64,
    pub pooled: FcpResult,
    pub means: FieldMeans,
    pub severities: SeverityCounts,
}

impl Summary {
    /// Summarizes window results and a pooled result.
    pub fn new(windows: &[WindowResult], pooled: FcpResult) -> Self {
        let means = FieldMeans::from_results(windows.iter().map(|w| &w.result));
        let mut severities = SeverityCounts::default();
        for w in windows {
            severities.add(w.severity());
        }
        Self {
            window_count: windows.len(),
            determined_count: windows.iter().filter(|w| w.result.is_determined()).count(),
            mean_windowed_fcp: means.fcp,
            mean_severity: Severity::classify(means.fcp),
            pooled_fcp: pooled.fcp,
            pooled,
            means,
            severities,
        }
    }

    /// Summarizes window results alone, as for a live session where no
    /// pooled analysis exists.
    pub fn from_windows(windows: &[WindowResult]) -> Self {
        Self::new(windows, FcpResult::undetermined())
    }
}
