//! Device discovery and stream configuration.

use std::fmt;

use cpal::traits::{DeviceTrait, HostTrait};
use serde::{Deserialize, Serialize};

use crate::error::AudioError;

/// Stream direction of a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Input,
    Output,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Input => write!(f, "input"),
            Direction::Output => write!(f, "output"),
        }
    }
}

/// Information about an audio device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub name: String,
    pub max_input_channels: u16,
    pub max_output_channels: u16,
    pub is_default_input: bool,
    pub is_default_output: bool,
}

impl DeviceInfo {
    /// Reports whether the device has at least one channel in `direction`.
    pub fn supports(&self, direction: Direction) -> bool {
        match direction {
            Direction::Input => self.max_input_channels > 0,
            Direction::Output => self.max_output_channels > 0,
        }
    }

    pub fn is_default(&self, direction: Direction) -> bool {
        match direction {
            Direction::Input => self.is_default_input,
            Direction::Output => self.is_default_output,
        }
    }
}

/// Lists the devices of the default host.
///
/// Default devices come first, the rest keep host order.
pub fn list_devices() -> Result<Vec<DeviceInfo>, AudioError> {
    let host = cpal::default_host();
    let default_input = host.default_input_device().and_then(|d| d.name().ok());
    let default_output = host.default_output_device().and_then(|d| d.name().ok());

    let mut devices = Vec::new();
    for device in host.devices()? {
        let name = match device.name() {
            Ok(name) => name,
            Err(e) => {
                tracing::debug!("skipping device without a name: {e}");
                continue;
            }
        };
        let max_input_channels = device
            .supported_input_configs()
            .map(|configs| configs.map(|c| c.channels()).max().unwrap_or(0))
            .unwrap_or(0);
        let max_output_channels = device
            .supported_output_configs()
            .map(|configs| configs.map(|c| c.channels()).max().unwrap_or(0))
            .unwrap_or(0);

        devices.push(DeviceInfo {
            is_default_input: default_input.as_deref() == Some(name.as_str()),
            is_default_output: default_output.as_deref() == Some(name.as_str()),
            name,
            max_input_channels,
            max_output_channels,
        });
    }

    sort_defaults_first(&mut devices);
    Ok(devices)
}

fn sort_defaults_first(devices: &mut [DeviceInfo]) {
    devices.sort_by_key(|d| !(d.is_default_input || d.is_default_output));
}

/// Resolves a device by exact name, or the host default when `name` is `None`.
pub fn find_device(direction: Direction, name: Option<&str>) -> Result<cpal::Device, AudioError> {
    let host = cpal::default_host();
    let Some(name) = name else {
        let device = match direction {
            Direction::Input => host.default_input_device(),
            Direction::Output => host.default_output_device(),
        };
        return device.ok_or(AudioError::NoDevice(direction));
    };

    let devices = match direction {
        Direction::Input => host.input_devices()?.collect::<Vec<_>>(),
        Direction::Output => host.output_devices()?.collect::<Vec<_>>(),
    };
    for device in devices {
        if device.name().is_ok_and(|n| n == name) {
            return Ok(device);
        }
    }
    Err(AudioError::DeviceNotFound {
        direction,
        name: name.to_string(),
    })
}

/// Display name of a device, or `"unknown"`.
pub fn device_name(device: &cpal::Device) -> String {
    device.name().unwrap_or_else(|_| "unknown".to_string())
}

/// Picks a stream config at exactly `sample_rate`, preferring `f32` samples.
///
/// The analysis works at one fixed rate, so a device that cannot run at it
/// is rejected rather than silently resampled.
pub fn choose_config(
    device: &cpal::Device,
    direction: Direction,
    sample_rate: u32,
) -> Result<cpal::SupportedStreamConfig, AudioError> {
    let ranges: Vec<cpal::SupportedStreamConfigRange> = match direction {
        Direction::Input => device.supported_input_configs()?.collect(),
        Direction::Output => device.supported_output_configs()?.collect(),
    };

    let mut best: Option<cpal::SupportedStreamConfig> = None;
    let mut best_score = i32::MIN;
    for range in ranges {
        if sample_rate < range.min_sample_rate().0 || sample_rate > range.max_sample_rate().0 {
            continue;
        }
        let cfg = range.with_sample_rate(cpal::SampleRate(sample_rate));

        let mut score = 0;
        if cfg.sample_format() == cpal::SampleFormat::F32 {
            score += 2;
        }
        // Fewer channels means less to discard in the callback.
        if cfg.channels() == 1 {
            score += 1;
        }
        if score > best_score {
            best_score = score;
            best = Some(cfg);
        }
    }

    best.ok_or_else(|| AudioError::UnsupportedConfig {
        device: device_name(device),
        direction,
        sample_rate,
    })
}

pub(crate) fn stream_error(err: cpal::StreamError) {
    tracing::error!("audio stream error: {err}");
}
