//! Capture/playback device lookup by opaque identifier (§6 "Edge command
//! surface": "capture device identifier (opaque string passed to the OS
//! audio layer via `cpal`'s device enumeration)").

use cpal::traits::{DeviceTrait, HostTrait};

use crate::error::EdgeError;

/// `"default"` selects the host's default device; anything else is matched
/// against each device's `cpal` name.
pub fn find_input(id: &str) -> Result<cpal::Device, EdgeError> {
    let host = cpal::default_host();
    if id == "default" {
        return host
            .default_input_device()
            .ok_or_else(|| EdgeError::Device("no default input device".into()));
    }
    find_by_name(host.input_devices()?, id)
}

pub fn find_output(id: &str) -> Result<cpal::Device, EdgeError> {
    let host = cpal::default_host();
    if id == "default" {
        return host
            .default_output_device()
            .ok_or_else(|| EdgeError::Device("no default output device".into()));
    }
    find_by_name(host.output_devices()?, id)
}

fn find_by_name(
    devices: impl Iterator<Item = cpal::Device>,
    id: &str,
) -> Result<cpal::Device, EdgeError> {
    devices
        .into_iter()
        .find(|d| d.name().map(|n| n == id).unwrap_or(false))
        .ok_or_else(|| EdgeError::Device(format!("no device named {id:?}")))
}
