use thiserror::Error;

use crate::devices::Direction;

/// Errors from device access, streams and audio files.
///
/// Every variant is returned synchronously, before any stream callback is
/// armed.
#[derive(Debug, Error)]
pub enum AudioError {
    #[error("no {0} device available")]
    NoDevice(Direction),

    #[error("{direction} device not found: {name}")]
    DeviceNotFound { direction: Direction, name: String },

    #[error("device {device} cannot {direction} at {sample_rate} Hz")]
    UnsupportedConfig {
        device: String,
        direction: Direction,
        sample_rate: u32,
    },

    #[error("unsupported sample format: {0}")]
    UnsupportedSampleFormat(String),

    #[error("enumerate devices: {0}")]
    Devices(#[from] cpal::DevicesError),

    #[error("device name: {0}")]
    DeviceName(#[from] cpal::DeviceNameError),

    #[error("query stream configs: {0}")]
    StreamConfigs(#[from] cpal::SupportedStreamConfigsError),

    #[error("build stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[error("start stream: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),

    #[error("pause stream: {0}")]
    PauseStream(#[from] cpal::PauseStreamError),

    #[error("wav: {0}")]
    Wav(#[from] hound::Error),

    #[error("unsupported wav encoding: {0}")]
    UnsupportedWav(String),

    #[error("resample: {0}")]
    Resample(String),
}

impl From<rubato::ResamplerConstructionError> for AudioError {
    fn from(e: rubato::ResamplerConstructionError) -> Self {
        AudioError::Resample(e.to_string())
    }
}

impl From<rubato::ResampleError> for AudioError {
    fn from(e: rubato::ResampleError) -> Self {
        AudioError::Resample(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            AudioError::NoDevice(Direction::Input).to_string(),
            "no input device available"
        );
        let err = AudioError::DeviceNotFound {
            direction: Direction::Output,
            name: "USB DAC".into(),
        };
        assert_eq!(err.to_string(), "output device not found: USB DAC");

        let err = AudioError::UnsupportedConfig {
            device: "mic".into(),
            direction: Direction::Input,
            sample_rate: 44100,
        };
        assert_eq!(err.to_string(), "device mic cannot input at 44100 Hz");
    }
}
