// Gestion des devices audio CPAL

use cpal::traits::{DeviceTrait, HostTrait};
use cpal::{Device, Host};

use crate::midi::device::best_port_match;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AudioDeviceInfo {
    pub id: String,
    pub name: String,
    pub is_default: bool,
}

pub struct AudioDeviceManager {
    host: Host,
}

impl AudioDeviceManager {
    pub fn new() -> Self {
        Self {
            host: cpal::default_host(),
        }
    }

    /// Tous les périphériques de sortie, le défaut marqué
    pub fn list_output_devices(&self) -> Vec<AudioDeviceInfo> {
        let default_name = self
            .host
            .default_output_device()
            .and_then(|d| d.name().ok())
            .unwrap_or_default();

        let Ok(output_devices) = self.host.output_devices() else {
            log::warn!("Could not enumerate audio output devices");
            return Vec::new();
        };

        output_devices
            .filter_map(|device| device.name().ok())
            .enumerate()
            .map(|(index, name)| AudioDeviceInfo {
                id: format!("audio_out_{}", index),
                is_default: name == default_name,
                name,
            })
            .collect()
    }

    pub fn default_output_device(&self) -> Option<Device> {
        self.host.default_output_device()
    }

    /// Output device matched by name, case-insensitively (exact name first, then substring)
    pub fn output_device_by_name(&self, query: &str) -> Option<Device> {
        let devices: Vec<(String, Device)> = self
            .host
            .output_devices()
            .ok()?
            .filter_map(|device| device.name().ok().map(|name| (name, device)))
            .collect();

        let names: Vec<String> = devices.iter().map(|(name, _)| name.clone()).collect();
        let index = best_port_match(&names, query)?;
        devices.into_iter().nth(index).map(|(_, device)| device)
    }
}

impl Default for AudioDeviceManager {
    fn default() -> Self {
        Self::new()
    }
}
