// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//
use std::time::Duration;

use duration_string::DurationString;
use serde::Deserialize;

use super::error::ConfigError;

const DEFAULT_DEVICE: &str = "default";
const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(10);
const DEFAULT_VOLUME: i32 = 100;
const DEFAULT_PAN: i32 = 0;

/// A YAML representation of the audio configuration.
#[derive(Deserialize, Clone, Debug, Default)]
pub struct Audio {
    /// The output device. Names starting with "mock" select the mock device,
    /// "default" the host's default output.
    device: Option<String>,

    /// How often the driver ticks every track, e.g. "10ms".
    tick_interval: Option<String>,

    /// Initial volume, 0..100.
    volume: Option<i32>,

    /// Initial pan, -100..100.
    pan: Option<i32>,

    /// Priority (0-99) of the driver thread. Left alone when unset.
    driver_priority: Option<u8>,
}

impl Audio {
    /// New will create a new Audio configuration.
    pub fn new(device: &str) -> Audio {
        Audio {
            device: Some(device.to_string()),
            ..Default::default()
        }
    }

    /// Returns the device from the configuration.
    pub fn device(&self) -> &str {
        self.device.as_deref().unwrap_or(DEFAULT_DEVICE)
    }

    pub fn with_device(mut self, device: &str) -> Audio {
        self.device = Some(device.to_string());
        self
    }

    /// Returns the driver tick interval (default: 10ms).
    pub fn tick_interval(&self) -> Result<Duration, ConfigError> {
        match &self.tick_interval {
            Some(interval) => DurationString::from_string(interval.clone())
                .map(Into::into)
                .map_err(|e| ConfigError::Duration {
                    value: interval.clone(),
                    reason: e.to_string(),
                }),
            None => Ok(DEFAULT_TICK_INTERVAL),
        }
    }

    /// Returns the initial volume (default: 100).
    pub fn volume(&self) -> i32 {
        self.volume.unwrap_or(DEFAULT_VOLUME)
    }

    pub fn with_volume(mut self, volume: i32) -> Audio {
        self.volume = Some(volume);
        self
    }

    /// Returns the initial pan (default: 0).
    pub fn pan(&self) -> i32 {
        self.pan.unwrap_or(DEFAULT_PAN)
    }

    pub fn with_pan(mut self, pan: i32) -> Audio {
        self.pan = Some(pan);
        self
    }

    pub fn driver_priority(&self) -> Option<u8> {
        self.driver_priority
    }

    /// Checks every setting is in range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_range("volume", self.volume(), 0, 100)?;
        check_range("pan", self.pan(), -100, 100)?;
        if let Some(priority) = self.driver_priority {
            check_range("driver_priority", priority.into(), 0, 99)?;
        }
        if self.tick_interval()?.is_zero() {
            return Err(ConfigError::Duration {
                value: self.tick_interval.clone().unwrap_or_default(),
                reason: "tick interval must be positive".to_string(),
            });
        }
        Ok(())
    }
}

fn check_range(field: &'static str, value: i32, min: i32, max: i32) -> Result<(), ConfigError> {
    if value < min || value > max {
        return Err(ConfigError::OutOfRange {
            field,
            value: value.into(),
            min: min.into(),
            max: max.into(),
        });
    }
    Ok(())
}
