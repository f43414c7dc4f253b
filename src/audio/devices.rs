use cpal::traits::{DeviceTrait, HostTrait};
use cpal::{BufferSize, Device, Host, StreamConfig};

use crate::error::{Error, Result};

/// Picks the input device whose name contains `name`, or the host default.
pub fn get_input_device(host: &Host, name: Option<&str>) -> Result<Device> {
    let Some(name) = name else {
        return host
            .default_input_device()
            .ok_or_else(|| Error::DeviceNotFound("default input".to_string()));
    };

    for device in host.input_devices()? {
        if let Ok(device_name) = device.name() {
            if device_name.contains(name) {
                return Ok(device);
            }
        }
    }

    Err(Error::DeviceNotFound(name.to_string()))
}

/// Names of all input devices, with the default one flagged.
pub fn list_input_devices(host: &Host) -> Result<Vec<(String, bool)>> {
    let default_name = host.default_input_device().and_then(|d| d.name().ok());

    let mut devices = Vec::new();
    for device in host.input_devices()? {
        if let Ok(name) = device.name() {
            let is_default = default_name.as_deref() == Some(name.as_str());
            devices.push((name, is_default));
        }
    }

    Ok(devices)
}

pub fn create_stream_config(channels: u16, sample_rate: u32) -> StreamConfig {
    StreamConfig {
        channels,
        sample_rate: cpal::SampleRate(sample_rate),
        buffer_size: BufferSize::Default,
    }
}
