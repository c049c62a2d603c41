//! Long-term average spectrum (LTAS).

use std::f64::consts::PI;
use std::sync::Arc;

use realfft::{RealFftPlanner, RealToComplex};

use crate::config::AnalysisConfig;
use crate::error::{AnalysisError, ConfigError};
use crate::types::Spectrum;
use crate::voiced::VoicedMask;

/// Added to every magnitude before taking the logarithm.
pub const MAGNITUDE_FLOOR: f64 = 1e-12;

/// Averages short-time dB spectra over a signal.
///
/// The signal is cut into frames of `win_len_sec` advanced by `hop_len_sec`
/// (trailing samples that don't fill a frame are ignored). Each frame is
/// multiplied by a symmetric Hann window and transformed with a real FFT;
/// the magnitude is converted to `20 * log10(|X| + 1e-12)` and the dB
/// values are averaged arithmetically across frames.
///
/// Bin `k` lies at `k * fs / frame_len` Hz, from 0 up to Nyquist.
///
/// # Example
///
/// ```
/// use fcp_analysis::{AnalysisConfig, SpectralAverager};
///
/// let avg = SpectralAverager::new(&AnalysisConfig::default()).unwrap();
/// let audio: Vec<f32> = (0..4410)
///     .map(|i| (2.0 * std::f64::consts::PI * 1000.0 * i as f64 / 44100.0).sin() as f32)
///     .collect();
/// let ltas = avg.analyze(&audio);
/// assert_eq!(ltas.len(), 883);
/// assert_eq!(ltas.freqs()[40], 1000.0);
/// ```
#[derive(Clone)]
pub struct SpectralAverager {
    fft: Arc<dyn RealToComplex<f64>>,
    window: Vec<f64>,
    hop: usize,
    sample_rate: u32,
    inclusion_threshold: f64,
}

impl SpectralAverager {
    pub fn new(config: &AnalysisConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let frame_len = config.frame_samples();
        let fft = RealFftPlanner::<f64>::new().plan_fft_forward(frame_len);
        Ok(Self {
            fft,
            window: hann_symmetric(frame_len),
            hop: config.frame_hop_samples(),
            sample_rate: config.sample_rate,
            inclusion_threshold: config.voiced_frame_inclusion_threshold,
        })
    }

    /// Frame length in samples.
    pub fn frame_len(&self) -> usize {
        self.window.len()
    }

    pub fn hop(&self) -> usize {
        self.hop
    }

    /// Averages every frame of `audio`.
    ///
    /// Returns an empty spectrum when `audio` is shorter than one frame.
    pub fn analyze(&self, audio: &[f32]) -> Spectrum {
        self.average(audio, None)
    }

    /// Averages only the frames whose voiced fraction reaches the inclusion
    /// threshold.
    ///
    /// Mask positions past its end count as unvoiced. Returns an empty
    /// spectrum when no frame qualifies.
    pub fn analyze_voiced(&self, audio: &[f32], mask: &VoicedMask) -> Spectrum {
        self.average(audio, Some(mask))
    }

    /// Like [`analyze`](Self::analyze), failing when the signal is too
    /// short for a single frame.
    pub fn try_analyze(&self, audio: &[f32]) -> Result<Spectrum, AnalysisError> {
        if audio.len() < self.frame_len() {
            return Err(AnalysisError::InsufficientSignal {
                samples: audio.len(),
                needed: self.frame_len(),
            });
        }
        Ok(self.analyze(audio))
    }

    fn average(&self, audio: &[f32], mask: Option<&VoicedMask>) -> Spectrum {
        let n = self.frame_len();
        if audio.len() < n {
            return Spectrum::empty();
        }

        let mut input = self.fft.make_input_vec();
        let mut output = self.fft.make_output_vec();
        let mut scratch = self.fft.make_scratch_vec();
        let mut sum = vec![0.0f64; output.len()];
        let min_voiced = self.inclusion_threshold * n as f64;

        let mut frames = 0usize;
        let mut skipped = 0usize;
        for start in (0..=audio.len() - n).step_by(self.hop) {
            if let Some(mask) = mask {
                if (mask.voiced_in(start..start + n) as f64) < min_voiced {
                    skipped += 1;
                    continue;
                }
            }

            for ((dst, &s), &w) in input.iter_mut().zip(&audio[start..start + n]).zip(&self.window) {
                *dst = s as f64 * w;
            }
            if let Err(e) = self
                .fft
                .process_with_scratch(&mut input, &mut output, &mut scratch)
            {
                tracing::warn!(error = %e, "spectrum: fft failed, skipping frame");
                continue;
            }
            for (acc, c) in sum.iter_mut().zip(&output) {
                *acc += 20.0 * (c.norm() + MAGNITUDE_FLOOR).log10();
            }
            frames += 1;
        }

        tracing::trace!(frames, skipped, "spectrum: averaged");
        if frames == 0 {
            return Spectrum::empty();
        }

        let scale = 1.0 / frames as f64;
        let bin_hz = self.sample_rate as f64 / n as f64;
        let freqs = (0..sum.len()).map(|k| k as f64 * bin_hz).collect();
        let values = sum.into_iter().map(|v| v * scale).collect();
        Spectrum::new(freqs, values).unwrap_or_default()
    }
}

impl std::fmt::Debug for SpectralAverager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpectralAverager")
            .field("frame_len", &self.frame_len())
            .field("hop", &self.hop)
            .field("sample_rate", &self.sample_rate)
            .finish_non_exhaustive()
    }
}

/// Symmetric Hann window: `0.5 - 0.5 * cos(2*pi*i / (n - 1))`.
pub fn hann_symmetric(n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![1.0],
        _ => {
            let denom = (n - 1) as f64;
            (0..n)
                .map(|i| 0.5 - 0.5 * (2.0 * PI * i as f64 / denom).cos())
                .collect()
        }
    }
}
