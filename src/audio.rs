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
use std::{error::Error, fmt, sync::Arc};

use crate::config;

pub mod buffer;
pub mod cpal;
pub mod decoder;
pub mod error;
pub mod format;
pub mod mock;
pub mod ring;
pub mod signal;
pub mod volume;

pub use buffer::{BufferDesc, BufferLock, HardwareBuffer, LockFlags, LockedRegion, Span};
pub use error::{DecodeError, HardwareError};
pub use format::WaveFormat;
pub use signal::Signal;

/// An output device capable of creating hardware playback buffers.
pub trait Device: fmt::Display + Send + Sync {
    /// The name the device was looked up by.
    fn name(&self) -> &str;

    /// Creates a stopped, silent buffer. The device keeps its own reference to
    /// the buffer for as long as it plays from it.
    fn create_buffer(&self, desc: BufferDesc) -> Result<Arc<dyn HardwareBuffer>, HardwareError>;
}

/// Lists devices known to cpal.
pub fn list_devices() -> Result<Vec<Box<dyn Device>>, Box<dyn Error>> {
    Ok(cpal::Device::list()?
        .into_iter()
        .map(|device| {
            let device: Box<dyn Device> = Box::new(device);
            device
        })
        .collect())
}

/// Gets the device named in the given configuration. Names starting with
/// "mock" select a mock device driven by a real-time clock.
pub fn get_device(config: &config::Audio) -> Result<Arc<dyn Device>, Box<dyn Error>> {
    let device = config.device();
    if device.starts_with("mock") {
        return Ok(Arc::new(mock::Device::realtime(device)));
    };

    Ok(Arc::new(cpal::Device::get(device)?))
}
