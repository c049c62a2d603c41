//! Severity buckets for FCP values.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Severity bucket of an FCP value.
///
/// The four determined buckets are ordered from least to most prominent.
/// NaN maps to [`Severity::Undetermined`], which is unordered against them:
/// the order is partial, like that of the FCP values it comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// FCP below 5 dB, including negative values.
    Blue,
    /// 5 to 10 dB.
    Green,
    /// 10 to 15 dB.
    Orange,
    /// 15 dB and above.
    Red,
    Undetermined,
}

impl Severity {
    /// Determined buckets in ascending order, as shown in a legend.
    pub const LEGEND: [Severity; 4] = [
        Severity::Blue,
        Severity::Green,
        Severity::Orange,
        Severity::Red,
    ];

    /// Maps an FCP value in dB to its bucket.
    ///
    /// # Example
    ///
    /// ```
    /// use fcp_analysis::Severity;
    ///
    /// assert_eq!(Severity::classify(-3.0), Severity::Blue);
    /// assert_eq!(Severity::classify(10.0), Severity::Orange);
    /// assert_eq!(Severity::classify(f64::NAN), Severity::Undetermined);
    /// ```
    pub fn classify(fcp: f64) -> Self {
        if fcp.is_nan() {
            Severity::Undetermined
        } else if fcp < 5.0 {
            Severity::Blue
        } else if fcp < 10.0 {
            Severity::Green
        } else if fcp < 15.0 {
            Severity::Orange
        } else {
            Severity::Red
        }
    }

    /// Human readable range of the bucket.
    pub fn label(&self) -> &'static str {
        match self {
            Severity::Blue => "0–5 dB",
            Severity::Green => "5–10 dB",
            Severity::Orange => "10–15 dB",
            Severity::Red => "15+ dB",
            Severity::Undetermined => "undetermined",
        }
    }

    /// Display color as a hex RGB string.
    pub fn color(&self) -> &'static str {
        match self {
            Severity::Blue => "#1f77b4",
            Severity::Green => "#2ca02c",
            Severity::Orange => "#ff7f0e",
            Severity::Red => "#d62728",
            Severity::Undetermined => "#808080",
        }
    }

    pub fn is_determined(&self) -> bool {
        !matches!(self, Severity::Undetermined)
    }

    /// Position in [`Severity::LEGEND`], `None` when undetermined.
    pub fn rank(&self) -> Option<usize> {
        match self {
            Severity::Blue => Some(0),
            Severity::Green => Some(1),
            Severity::Orange => Some(2),
            Severity::Red => Some(3),
            Severity::Undetermined => None,
        }
    }
}

impl PartialOrd for Severity {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self.rank(), other.rank()) {
            (Some(a), Some(b)) => Some(a.cmp(&b)),
            (None, None) => Some(Ordering::Equal),
            _ => None,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Blue => write!(f, "blue"),
            Severity::Green => write!(f, "green"),
            Severity::Orange => write!(f, "orange"),
            Severity::Red => write!(f, "red"),
            Severity::Undetermined => write!(f, "undetermined"),
        }
    }
}
