//! FCP extraction from a banded spectrum.

use crate::error::AnalysisError;
use crate::types::{BandedSpectrum, FcpResult};

/// A half-open frequency band `[low_hz, high_hz)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Band {
    pub low_hz: f64,
    pub high_hz: f64,
}

impl Band {
    pub const fn new(low_hz: f64, high_hz: f64) -> Self {
        Self { low_hz, high_hz }
    }

    pub fn contains(&self, freq: f64) -> bool {
        freq >= self.low_hz && freq < self.high_hz
    }
}

pub const BAND_0_2: Band = Band::new(0.0, 2000.0);
pub const BAND_2_5: Band = Band::new(2000.0, 5000.0);
pub const BAND_5_8: Band = Band::new(5000.0, 8000.0);
/// Band searched for the formant cluster peak.
pub const PEAK_BAND: Band = Band::new(2000.0, 4000.0);
/// Closed range `[1000, 5000]` Hz of bin centers used for the trend fit.
pub const TREND_RANGE: (f64, f64) = (1000.0, 5000.0);

/// A least-squares line `level = slope * freq + intercept`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Trend {
    pub slope: f64,
    pub intercept: f64,
}

impl Trend {
    pub fn at(&self, freq: f64) -> f64 {
        self.slope * freq + self.intercept
    }
}

/// Computes band maxima, the 1-5 kHz trend line and the FCP of a banded
/// spectrum.
///
/// NaN bins are skipped everywhere. A band without finite bins yields a NaN
/// maximum, and the FCP is NaN when the peak band is empty or fewer than two
/// distinct trend frequencies remain.
#[derive(Debug, Clone, Copy, Default)]
pub struct FcpExtractor;

impl FcpExtractor {
    pub fn new() -> Self {
        Self
    }

    pub fn extract(&self, banded: &BandedSpectrum) -> FcpResult {
        let peak = peak_in(banded, PEAK_BAND);
        let trend = fit_trend(banded).ok();

        let (lmax_2_4, fcp, trend_at_peak) = match (peak, trend) {
            (Some((freq, level)), Some(trend)) => {
                let at_peak = trend.at(freq);
                (level, level - at_peak, at_peak)
            }
            (Some((_, level)), None) => (level, f64::NAN, f64::NAN),
            (None, _) => (f64::NAN, f64::NAN, f64::NAN),
        };

        FcpResult {
            lmax_0_2: band_max(banded, BAND_0_2),
            lmax_2_5: band_max(banded, BAND_2_5),
            lmax_5_8: band_max(banded, BAND_5_8),
            lmax_2_4,
            fcp,
            trend_at_peak,
        }
    }

    /// Like [`extract`](Self::extract), failing instead of returning a NaN
    /// FCP.
    pub fn try_extract(&self, banded: &BandedSpectrum) -> Result<FcpResult, AnalysisError> {
        if peak_in(banded, PEAK_BAND).is_none() {
            return Err(AnalysisError::EmptyBand {
                low_hz: PEAK_BAND.low_hz,
                high_hz: PEAK_BAND.high_hz,
            });
        }
        fit_trend(banded)?;
        Ok(self.extract(banded))
    }
}

/// Maximum finite level among bins whose center lies in `band`.
pub fn band_max(banded: &BandedSpectrum, band: Band) -> f64 {
    banded
        .iter()
        .filter(|(c, v)| band.contains(*c) && !v.is_nan())
        .map(|(_, v)| v)
        .reduce(f64::max)
        .unwrap_or(f64::NAN)
}

/// `(center, level)` of the highest finite bin in `band`. Ties resolve to
/// the lowest frequency.
pub fn peak_in(banded: &BandedSpectrum, band: Band) -> Option<(f64, f64)> {
    banded
        .iter()
        .filter(|(c, v)| band.contains(*c) && !v.is_nan())
        .fold(None, |best, (c, v)| match best {
            Some((bc, bv)) if v < bv || (v == bv && c > bc) => Some((bc, bv)),
            _ => Some((c, v)),
        })
}

/// Ordinary least squares fit over finite bins with centers in
/// [`TREND_RANGE`].
pub fn fit_trend(banded: &BandedSpectrum) -> Result<Trend, AnalysisError> {
    let (lo, hi) = TREND_RANGE;
    let points: Vec<(f64, f64)> = banded
        .iter()
        .filter(|(c, v)| *c >= lo && *c <= hi && v.is_finite())
        .collect();

    let distinct = {
        let mut xs: Vec<f64> = points.iter().map(|p| p.0).collect();
        xs.sort_by(f64::total_cmp);
        xs.dedup();
        xs.len()
    };
    if distinct < 2 {
        return Err(AnalysisError::DegenerateTrendFit { points: distinct });
    }

    let n = points.len() as f64;
    let mean_x = points.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = points.iter().map(|p| p.1).sum::<f64>() / n;
    let (sxx, sxy) = points.iter().fold((0.0, 0.0), |(sxx, sxy), (x, y)| {
        let dx = x - mean_x;
        (sxx + dx * dx, sxy + dx * (y - mean_y))
    });
    if !(sxx > 0.0) {
        return Err(AnalysisError::DegenerateTrendFit { points: distinct });
    }

    let slope = sxy / sxx;
    Ok(Trend {
        slope,
        intercept: mean_y - slope * mean_x,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::band::BandReducer;

    const BW: f64 = 350.0;

    /// Banded spectrum with 350 Hz bins up to ~11 kHz, levels from `f`.
    fn banded(f: impl Fn(f64) -> f64) -> BandedSpectrum {
        let r = BandReducer::new(BW);
        let centers: Vec<f64> = (0..32).map(|k| r.bin_center(k)).collect();
        let values = centers.iter().map(|&c| f(c)).collect();
        BandedSpectrum {
            bandwidth: BW,
            centers,
            values,
        }
    }

    #[test]
    fn test_flat_spectrum_has_zero_fcp() {
        let r = FcpExtractor::new().extract(&banded(|_| 40.0));
        assert_eq!(r.lmax_0_2, 40.0);
        assert_eq!(r.lmax_2_4, 40.0);
        assert!(r.fcp.abs() < 1e-9);
        assert!((r.trend_at_peak - 40.0).abs() < 1e-9);
    }

    #[test]
    fn test_linear_spectrum_has_zero_fcp() {
        let r = FcpExtractor::new().extract(&banded(|c| 80.0 - 0.01 * c));
        assert!(r.fcp.abs() < 1e-9, "fcp = {}", r.fcp);
        // Descending line: peak at the lowest center in [2000, 4000)
        assert!((r.lmax_2_4 - (80.0 - 0.01 * 2275.0)).abs() < 1e-9);
    }

    #[test]
    fn test_bump_above_trend() {
        let b = banded(|c| if (c - 2975.0).abs() < 1.0 { 30.0 } else { 10.0 });
        let r = FcpExtractor::new().extract(&b);
        assert_eq!(r.lmax_2_4, 30.0);
        // 11 trend points, one of them at 30: mean 11.82, slope ~0
        assert!(r.fcp > 15.0 && r.fcp < 20.0, "fcp = {}", r.fcp);
        assert_eq!(r.severity(), crate::Severity::Red);
    }

    #[test]
    fn test_fcp_is_peak_minus_trend() {
        let b = banded(|c| (c / 100.0).sin() * 5.0 + 50.0 - c / 1000.0);
        let r = FcpExtractor::new().extract(&b);
        assert!((r.fcp - (r.lmax_2_4 - r.trend_at_peak)).abs() < 1e-12);
    }

    #[test]
    fn test_peak_ties_pick_lowest_frequency() {
        let b = banded(|c| if c > 2000.0 && c < 4000.0 { 20.0 } else { 0.0 });
        let (freq, level) = peak_in(&b, PEAK_BAND).unwrap();
        assert_eq!(freq, 2275.0);
        assert_eq!(level, 20.0);
    }

    #[test]
    fn test_band_membership_uses_centers() {
        // Center 1925 is in [0, 2000); center 2275 is the first in [2000, 5000)
        let b = banded(|c| if (c - 1925.0).abs() < 1.0 { 99.0 } else { 0.0 });
        let r = FcpExtractor::new().extract(&b);
        assert_eq!(r.lmax_0_2, 99.0);
        assert_eq!(r.lmax_2_5, 0.0);
    }

    fn bits(r: &FcpResult) -> [u64; 6] {
        [r.lmax_0_2, r.lmax_2_5, r.lmax_5_8, r.lmax_2_4, r.fcp, r.trend_at_peak].map(f64::to_bits)
    }

    #[test]
    fn test_extract_is_pure() {
        let extractor = FcpExtractor::new();
        let inputs = [
            banded(|c| (c / 170.0).cos() * 7.0 + 45.0 - c / 900.0),
            // NaN bins in the peak band and an empty 5-8 kHz band.
            banded(|c| if (2600.0..3300.0).contains(&c) || c >= 5000.0 { f64::NAN } else { 30.0 - c / 500.0 }),
            // Degenerate trend: every field past the band maxima is NaN.
            banded(|c| if (c - 2275.0).abs() < 1.0 { 10.0 } else { f64::NAN }),
        ];
        for b in &inputs {
            let first = extractor.extract(b);
            let second = extractor.extract(b);
            assert_eq!(bits(&first), bits(&second));
            assert_eq!(bits(&first), bits(&FcpExtractor::new().extract(b)));
        }
        assert!(extractor.extract(&inputs[1]).lmax_5_8.is_nan());
        assert!(extractor.extract(&inputs[2]).fcp.is_nan());
    }

    #[test]
    fn test_nan_bins_skipped() {
        let b = banded(|c| if c > 3000.0 && c < 3500.0 { f64::NAN } else { 20.0 });
        let r = FcpExtractor::new().extract(&b);
        assert!(r.fcp.abs() < 1e-9);
        assert_eq!(r.lmax_2_4, 20.0);
    }

    #[test]
    fn test_empty_peak_band() {
        let b = banded(|c| if (2000.0..4000.0).contains(&c) { f64::NAN } else { 20.0 });
        let r = FcpExtractor::new().extract(&b);
        assert!(r.lmax_2_4.is_nan());
        assert!(r.fcp.is_nan());
        assert_eq!(r.lmax_0_2, 20.0);
        assert!(matches!(
            FcpExtractor::new().try_extract(&b),
            Err(AnalysisError::EmptyBand { .. })
        ));
    }

    #[test]
    fn test_degenerate_trend() {
        // Only the 2275 Hz bin is finite in [1000, 5000].
        let b = banded(|c| if (c - 2275.0).abs() < 1.0 || c > 6000.0 { 10.0 } else { f64::NAN });
        let r = FcpExtractor::new().extract(&b);
        assert_eq!(r.lmax_2_4, 10.0);
        assert!(r.fcp.is_nan());
        assert!(r.trend_at_peak.is_nan());
        assert_eq!(
            FcpExtractor::new().try_extract(&b),
            Err(AnalysisError::DegenerateTrendFit { points: 1 })
        );
    }

    #[test]
    fn test_narrow_spectrum_leaves_high_band_nan() {
        let b = BandedSpectrum {
            bandwidth: BW,
            centers: (0..12).map(|k| (k as f64 + 0.5) * BW).collect(),
            values: vec![10.0; 12],
        };
        let r = FcpExtractor::new().extract(&b);
        assert!(r.lmax_5_8.is_nan());
        assert!(r.fcp.is_finite());
        assert!(FcpExtractor::new().try_extract(&b).is_ok());
    }

    #[test]
    fn test_empty_banded() {
        let r = FcpExtractor::new().extract(&BandedSpectrum::default());
        assert!(r.lmax_0_2.is_nan());
        assert!(r.fcp.is_nan());
    }
}
