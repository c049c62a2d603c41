use thiserror::Error;

/// Reasons an FCP value could not be determined.
///
/// The NaN-returning analysis functions encode these outcomes as NaN
/// scalars or omitted windows. The `try_*` variants return them explicitly.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    #[error("insufficient signal: need at least {needed} samples, got {samples}")]
    InsufficientSignal { samples: usize, needed: usize },

    #[error("insufficient voiced data: {seconds:.3}s voiced, need {needed:.3}s")]
    InsufficientVoicedData { seconds: f64, needed: f64 },

    #[error("degenerate trend fit: {points} distinct trend point(s), need 2")]
    DegenerateTrendFit { points: usize },

    #[error("no spectral points in band [{low_hz}, {high_hz}) Hz")]
    EmptyBand { low_hz: f64, high_hz: f64 },

    #[error("spectrum length mismatch: {freqs} frequencies, {values} values")]
    LengthMismatch { freqs: usize, values: usize },

    #[error("spectrum frequencies not strictly ascending at index {index}")]
    UnorderedFrequencies { index: usize },
}

/// Invalid analysis configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl ConfigError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analysis_error_display() {
        let err = AnalysisError::InsufficientVoicedData {
            seconds: 0.1,
            needed: 0.2,
        };
        assert_eq!(
            err.to_string(),
            "insufficient voiced data: 0.100s voiced, need 0.200s"
        );

        let err = AnalysisError::EmptyBand {
            low_hz: 2000.0,
            high_hz: 4000.0,
        };
        assert!(err.to_string().contains("[2000, 4000)"));
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::invalid("bandwidth", "must be positive");
        assert_eq!(err.to_string(), "invalid bandwidth: must be positive");
    }
}
