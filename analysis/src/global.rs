//! Pooled FCP over all voiced audio of a recording.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::band::BandReducer;
use crate::config::AnalysisConfig;
use crate::error::{AnalysisError, ConfigError};
use crate::extract::FcpExtractor;
use crate::pitch::PitchTracker;
use crate::spectrum::SpectralAverager;
use crate::types::{BandedSpectrum, FcpResult};
use crate::voiced::VoicedSegmenter;

/// Pooled analysis of a whole recording.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PooledResult {
    /// Seconds of voiced audio that went into the spectrum.
    pub voiced_sec: f64,
    #[serde(flatten)]
    pub result: FcpResult,
    pub spectrum: BandedSpectrum,
}

/// Computes a single FCP over the concatenation of every sufficiently long
/// voiced run.
///
/// Unlike [`WindowScanner`](crate::WindowScanner), the concatenated audio
/// is averaged without a voiced mask: the unvoiced parts are already gone.
#[derive(Debug, Clone)]
pub struct GlobalAggregator {
    segmenter: VoicedSegmenter,
    averager: SpectralAverager,
    reducer: BandReducer,
    extractor: FcpExtractor,
    min_total: usize,
    sample_rate: u32,
}

impl GlobalAggregator {
    pub fn new(tracker: Arc<dyn PitchTracker>, config: &AnalysisConfig) -> Result<Self, ConfigError> {
        let averager = SpectralAverager::new(config)?;
        Ok(Self {
            segmenter: VoicedSegmenter::new(tracker, config),
            averager,
            reducer: BandReducer::new(config.bandwidth),
            extractor: FcpExtractor::new(),
            min_total: config.min_voiced_total_samples(),
            sample_rate: config.sample_rate,
        })
    }

    /// Returns the pooled result, or an all-NaN result when the recording
    /// holds less voiced audio than the configured minimum.
    pub fn aggregate(&self, audio: &[f32]) -> FcpResult {
        match self.pool(audio) {
            Ok(pooled) => pooled.result,
            Err(e) => {
                tracing::debug!(error = %e, "global: undetermined");
                FcpResult::undetermined()
            }
        }
    }

    /// Like [`aggregate`](Self::aggregate), reporting why the FCP could not
    /// be determined.
    pub fn try_aggregate(&self, audio: &[f32]) -> Result<PooledResult, AnalysisError> {
        let pooled = self.pool(audio)?;
        self.extractor.try_extract(&pooled.spectrum)?;
        Ok(pooled)
    }

    /// Runs the pooled pipeline, failing only for insufficient voiced audio.
    pub fn pool(&self, audio: &[f32]) -> Result<PooledResult, AnalysisError> {
        let voiced = self.segmenter.extract_voiced_concat(audio);
        let fs = self.sample_rate as f64;
        if voiced.len() < self.min_total {
            return Err(AnalysisError::InsufficientVoicedData {
                seconds: voiced.len() as f64 / fs,
                needed: self.min_total as f64 / fs,
            });
        }

        let spectrum = self.reducer.reduce(&self.averager.analyze(&voiced));
        let result = self.extractor.extract(&spectrum);
        tracing::debug!(
            voiced_sec = voiced.len() as f64 / fs,
            fcp = result.fcp,
            "global: pooled"
        );
        Ok(PooledResult {
            voiced_sec: voiced.len() as f64 / fs,
            result,
            spectrum,
        })
    }
}
