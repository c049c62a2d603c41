//! Spectra and analysis results.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;
use crate::severity::Severity;

/// A long-term average spectrum in dB.
///
/// Frequencies are strictly ascending and `freqs.len() == values.len()`,
/// both when built with [`Spectrum::new`] and when deserialized.
/// An empty spectrum means no frame qualified for averaging.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawSpectrum")]
pub struct Spectrum {
    freqs: Vec<f64>,
    values: Vec<f64>,
}

#[derive(Deserialize)]
struct RawSpectrum {
    freqs: Vec<f64>,
    values: Vec<f64>,
}

impl TryFrom<RawSpectrum> for Spectrum {
    type Error = AnalysisError;

    fn try_from(raw: RawSpectrum) -> Result<Self, Self::Error> {
        Spectrum::new(raw.freqs, raw.values)
    }
}

impl Spectrum {
    /// Builds a spectrum from parallel frequency (Hz) and level (dB) arrays.
    pub fn new(freqs: Vec<f64>, values: Vec<f64>) -> Result<Self, AnalysisError> {
        if freqs.len() != values.len() {
            return Err(AnalysisError::LengthMismatch {
                freqs: freqs.len(),
                values: values.len(),
            });
        }
        // NaN fails the comparison too.
        if let Some(i) = freqs.windows(2).position(|w| w[0].partial_cmp(&w[1]) != Some(Ordering::Less)) {
            return Err(AnalysisError::UnorderedFrequencies { index: i + 1 });
        }
        Ok(Self { freqs, values })
    }

    /// Returns an empty spectrum.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn freqs(&self) -> &[f64] {
        &self.freqs
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.freqs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.freqs.is_empty()
    }

    /// Iterates `(frequency, level)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.freqs.iter().copied().zip(self.values.iter().copied())
    }

    /// Returns the highest frequency, or `None` for an empty spectrum.
    pub fn max_freq(&self) -> Option<f64> {
        self.freqs.iter().copied().filter(|f| f.is_finite()).reduce(f64::max)
    }
}

/// A spectrum reduced to fixed-width frequency bins.
///
/// Bin `k` covers `[k * bandwidth, (k + 1) * bandwidth)` and is represented
/// by its center frequency. Bins that received no spectral point hold NaN.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BandedSpectrum {
    pub bandwidth: f64,
    pub centers: Vec<f64>,
    pub values: Vec<f64>,
}

impl BandedSpectrum {
    pub fn len(&self) -> usize {
        self.centers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.centers.is_empty()
    }

    /// Returns true when no bin holds a finite level.
    pub fn all_nan(&self) -> bool {
        !self.values.iter().any(|v| v.is_finite())
    }

    /// Iterates `(center, level)` pairs in ascending frequency order.
    pub fn iter(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.centers.iter().copied().zip(self.values.iter().copied())
    }
}

/// Band levels, trend and FCP of one analysis.
///
/// Every field is NaN when it could not be determined.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FcpResult {
    /// Max banded level in [0, 2000) Hz.
    pub lmax_0_2: f64,
    /// Max banded level in [2000, 5000) Hz.
    pub lmax_2_5: f64,
    /// Max banded level in [5000, 8000) Hz.
    pub lmax_5_8: f64,
    /// Peak banded level in [2000, 4000) Hz.
    pub lmax_2_4: f64,
    /// Peak level above the 1-5 kHz trend line, in dB.
    pub fcp: f64,
    /// Trend line value at the peak frequency.
    pub trend_at_peak: f64,
}

impl Default for FcpResult {
    fn default() -> Self {
        Self::undetermined()
    }
}

impl FcpResult {
    /// A result with every field NaN.
    pub const fn undetermined() -> Self {
        Self {
            lmax_0_2: f64::NAN,
            lmax_2_5: f64::NAN,
            lmax_5_8: f64::NAN,
            lmax_2_4: f64::NAN,
            fcp: f64::NAN,
            trend_at_peak: f64::NAN,
        }
    }

    /// Returns true if the FCP value itself is finite.
    pub fn is_determined(&self) -> bool {
        self.fcp.is_finite()
    }

    /// `lmax_2_5 - lmax_0_2`
    pub fn delta_0_2_to_2_5(&self) -> f64 {
        self.lmax_2_5 - self.lmax_0_2
    }

    /// `lmax_5_8 - lmax_2_5`
    pub fn delta_2_5_to_5_8(&self) -> f64 {
        self.lmax_5_8 - self.lmax_2_5
    }

    /// `lmax_5_8 - lmax_0_2`
    pub fn delta_0_2_to_5_8(&self) -> f64 {
        self.lmax_5_8 - self.lmax_0_2
    }

    pub fn severity(&self) -> Severity {
        Severity::classify(self.fcp)
    }
}

/// The result of one analysis window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowResult {
    pub start_sec: f64,
    pub end_sec: f64,
    #[serde(flatten)]
    pub result: FcpResult,
    pub spectrum: BandedSpectrum,
}

impl WindowResult {
    /// Center time of the window in seconds.
    pub fn center_sec(&self) -> f64 {
        0.5 * (self.start_sec + self.end_sec)
    }

    pub fn severity(&self) -> Severity {
        self.result.severity()
    }
}
