//! Fixed-width band reduction.

use crate::types::{BandedSpectrum, Spectrum};

/// Reduces a spectrum to fixed-width bins by taking the maximum level of
/// the points falling in each bin.
///
/// Bins cover `[k * bw, (k + 1) * bw)` for `k = 0..=floor(max_freq / bw)`,
/// so every point of the input, including the Nyquist bin, lands in
/// exactly one bin. Bins without a finite point are NaN.
///
/// # Example
///
/// ```
/// use fcp_analysis::{BandReducer, Spectrum};
///
/// let s = Spectrum::new(vec![0.0, 100.0, 200.0, 300.0], vec![1.0, 5.0, 2.0, 3.0]).unwrap();
/// let b = BandReducer::new(200.0).reduce(&s);
/// assert_eq!(b.centers, vec![100.0, 300.0]);
/// assert_eq!(b.values, vec![5.0, 3.0]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandReducer {
    bandwidth: f64,
}

impl BandReducer {
    pub fn new(bandwidth: f64) -> Self {
        Self { bandwidth }
    }

    pub fn bandwidth(&self) -> f64 {
        self.bandwidth
    }

    /// Index of the bin holding `freq`, or `None` for negative or
    /// non-finite frequencies.
    pub fn bin_index(&self, freq: f64) -> Option<usize> {
        if !freq.is_finite() || freq < 0.0 || !(self.bandwidth > 0.0) {
            return None;
        }
        Some((freq / self.bandwidth).floor() as usize)
    }

    /// `[low, high)` edges of bin `k`.
    pub fn bin_edges(&self, k: usize) -> (f64, f64) {
        (k as f64 * self.bandwidth, (k + 1) as f64 * self.bandwidth)
    }

    /// Center frequency of bin `k`.
    pub fn bin_center(&self, k: usize) -> f64 {
        (k as f64 + 0.5) * self.bandwidth
    }

    pub fn reduce(&self, spectrum: &Spectrum) -> BandedSpectrum {
        let empty = BandedSpectrum {
            bandwidth: self.bandwidth,
            ..Default::default()
        };
        let Some(count) = spectrum
            .max_freq()
            .and_then(|f| self.bin_index(f))
            .map(|k| k + 1)
        else {
            return empty;
        };

        let mut values = vec![f64::NAN; count];
        for (freq, level) in spectrum.iter() {
            if level.is_nan() {
                continue;
            }
            let Some(k) = self.bin_index(freq) else {
                continue;
            };
            let slot = &mut values[k];
            if slot.is_nan() || level > *slot {
                *slot = level;
            }
        }

        BandedSpectrum {
            bandwidth: self.bandwidth,
            centers: (0..count).map(|k| self.bin_center(k)).collect(),
            values,
        }
    }
}
