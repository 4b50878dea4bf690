//! Microphone capture using cpal
//!
//! Feeds channel 0 of an input device into a `SampleProducer`

use super::buffer::SampleProducer;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, FromSample, Sample, SampleFormat, SizedSample, Stream, StreamConfig};
use thiserror::Error;
use tracing::{error, info, warn};

#[derive(Error, Debug)]
pub enum AudioError {
    #[error("No audio input device found")]
    NoDevice,

    #[error("Failed to get device name: {0}")]
    DeviceName(String),

    #[error("Failed to get default config: {0}")]
    DefaultConfig(String),

    #[error("Unsupported sample format: {0}")]
    UnsupportedFormat(String),

    #[error("Failed to build stream: {0}")]
    BuildStream(String),

    #[error("Failed to play stream: {0}")]
    PlayStream(String),
}

/// Audio input device information
#[derive(Debug, Clone)]
pub struct AudioDeviceInfo {
    pub name: String,
    pub sample_rate: u32,
    pub channels: u16,
}

/// Running (or paused) microphone stream
pub struct AudioCapture {
    stream: Stream,
    device_info: AudioDeviceInfo,
}

impl AudioCapture {
    /// Capture from the host's default input device
    pub fn from_default_device(producer: SampleProducer) -> Result<Self, AudioError> {
        let host = cpal::default_host();
        let device = host.default_input_device().ok_or_else(|| {
            warn!("No microphone devices found");
            AudioError::NoDevice
        })?;

        Self::from_device(device, producer)
    }

    /// Capture from a specific device at its default configuration
    ///
    /// The stream is created paused; call `start`.
    pub fn from_device(device: Device, producer: SampleProducer) -> Result<Self, AudioError> {
        let name = device
            .name()
            .map_err(|e| AudioError::DeviceName(e.to_string()))?;

        let config = device
            .default_input_config()
            .map_err(|e| AudioError::DefaultConfig(e.to_string()))?;

        let device_info = AudioDeviceInfo {
            name,
            sample_rate: config.sample_rate().0,
            channels: config.channels(),
        };

        let sample_format = config.sample_format();
        let stream_config: StreamConfig = config.into();

        let stream = match sample_format {
            SampleFormat::F32 => build_stream::<f32>(&device, &stream_config, producer),
            SampleFormat::I16 => build_stream::<i16>(&device, &stream_config, producer),
            SampleFormat::U16 => build_stream::<u16>(&device, &stream_config, producer),
            SampleFormat::I32 => build_stream::<i32>(&device, &stream_config, producer),
            other => Err(AudioError::UnsupportedFormat(format!("{other:?}"))),
        }?;

        Ok(Self {
            stream,
            device_info,
        })
    }

    /// Start capturing audio
    pub fn start(&self) -> Result<(), AudioError> {
        self.stream
            .play()
            .map_err(|e| AudioError::PlayStream(e.to_string()))?;
        info!(device = %self.device_info.name, sample_rate = self.device_info.sample_rate, "Microphone started");
        Ok(())
    }

    /// Pause audio capture
    pub fn pause(&self) -> Result<(), AudioError> {
        self.stream
            .pause()
            .map_err(|e| AudioError::PlayStream(e.to_string()))?;
        info!(device = %self.device_info.name, "Microphone stopped");
        Ok(())
    }

    /// Get device information
    pub fn device_info(&self) -> &AudioDeviceInfo {
        &self.device_info
    }
}

/// Build an input stream converting `T` samples to mono f32
fn build_stream<T>(
    device: &Device,
    config: &StreamConfig,
    mut producer: SampleProducer,
) -> Result<Stream, AudioError>
where
    T: SizedSample,
    f32: FromSample<T>,
{
    let channels = usize::from(config.channels).max(1);

    device
        .build_input_stream(
            config,
            move |data: &[T], _: &cpal::InputCallbackInfo| {
                // Channel 0 only; no downmix
                for frame in data.chunks(channels) {
                    producer.push(f32::from_sample(frame[0]));
                }
            },
            move |err| {
                error!(error = %err, "Audio input error");
            },
            None,
        )
        .map_err(|e| AudioError::BuildStream(e.to_string()))
}

/// List available audio input devices
pub fn list_input_devices() -> Result<Vec<AudioDeviceInfo>, AudioError> {
    let host = cpal::default_host();
    let mut devices = Vec::new();

    let device_iter = host
        .input_devices()
        .map_err(|e| AudioError::DeviceName(e.to_string()))?;

    for device in device_iter {
        if let Ok(name) = device.name() {
            if let Ok(config) = device.default_input_config() {
                devices.push(AudioDeviceInfo {
                    name,
                    sample_rate: config.sample_rate().0,
                    channels: config.channels(),
                });
            }
        }
    }

    Ok(devices)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_devices() {
        // Just ensure it doesn't crash on machines without audio hardware
        let _ = list_input_devices();
    }
}
