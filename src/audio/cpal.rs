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
use std::{
    error::Error,
    fmt,
    sync::{Arc, Weak},
    thread,
    time::Duration,
};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use tracing::{error, info, span, Level};

use super::buffer::{BufferDesc, HardwareBuffer};
use super::error::HardwareError;
use super::ring::RingBuffer;

/// How often an output thread checks whether its buffer has been released.
const RELEASE_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// A small wrapper around a cpal::Device. Every buffer created through it gets
/// its own output stream.
pub struct Device {
    /// The name of the device.
    name: String,
    /// The maximum number of channels the device supports.
    max_channels: u16,
    /// The host ID of the device.
    host_id: cpal::HostId,
    /// The underlying cpal device.
    device: cpal::Device,
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (Channels={}) ({})",
            self.name,
            self.max_channels,
            self.host_id.name()
        )
    }
}

impl Device {
    /// Lists cpal devices with at least one output channel.
    pub fn list() -> Result<Vec<Device>, Box<dyn Error>> {
        // Suppress noisy output here.
        let _shh_stdout = shh::stdout()?;
        let _shh_stderr = shh::stderr()?;

        let mut devices: Vec<Device> = Vec::new();
        for host_id in cpal::available_hosts() {
            let host_devices = match cpal::host_from_id(host_id)?.devices() {
                Ok(host_devices) => host_devices,
                Err(e) => {
                    error!(
                        err = e.to_string(),
                        host = host_id.name(),
                        "Unable to list devices for host"
                    );
                    continue;
                }
            };

            for device in host_devices {
                let output_configs = match device.supported_output_configs() {
                    Ok(output_configs) => output_configs,
                    Err(_) => continue,
                };
                let max_channels = output_configs
                    .map(|config| config.channels())
                    .max()
                    .unwrap_or(0);

                if max_channels > 0 {
                    devices.push(Device {
                        name: device.name()?,
                        max_channels,
                        host_id,
                        device,
                    })
                }
            }
        }

        devices.sort_by_key(|device| device.name.to_string());
        Ok(devices)
    }

    /// Gets the cpal device with the given name. "default" selects the
    /// default output device of the default host.
    pub fn get(name: &str) -> Result<Device, Box<dyn Error>> {
        if name == "default" {
            let host = cpal::default_host();
            let device = host
                .default_output_device()
                .ok_or("no default output device")?;
            let max_channels = device.default_output_config()?.channels();
            return Ok(Device {
                name: device.name()?,
                max_channels,
                host_id: host.id(),
                device,
            });
        }

        Device::list()?
            .into_iter()
            .find(|device| device.name.trim() == name)
            .ok_or_else(|| format!("no device found with name {}", name).into())
    }
}

impl super::Device for Device {
    fn name(&self) -> &str {
        &self.name
    }

    fn create_buffer(&self, desc: BufferDesc) -> Result<Arc<dyn HardwareBuffer>, HardwareError> {
        let span = span!(Level::INFO, "create buffer (cpal)");
        let _enter = span.enter();

        info!(
            device = %self.name,
            format = %desc.format,
            capacity = desc.capacity,
            "Creating buffer."
        );
        let ring = Arc::new(RingBuffer::new(desc)?);
        start_output_thread(self.device.clone(), ring.clone())?;
        Ok(ring)
    }
}

/// Builds an output stream that renders from the ring, running on the
/// device's default configuration.
fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    ring: Arc<RingBuffer>,
) -> Result<cpal::Stream, cpal::BuildStreamError>
where
    T: cpal::SizedSample + cpal::FromSample<f32>,
{
    let channels = config.channels as usize;
    let rate = config.sample_rate;
    let mut scratch: Vec<f32> = Vec::new();
    device.build_output_stream(
        config,
        move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
            scratch.resize(data.len(), 0.0);
            ring.render(&mut scratch, channels, rate);
            for (dst, &src) in data.iter_mut().zip(scratch.iter()) {
                *dst = T::from_sample(src);
            }
        },
        |err| error!("CPAL output stream error: {}", err),
        None,
    )
}

/// Starts the thread that owns the output stream for a ring. cpal streams are
/// not Send on every platform, so the stream is created and dropped on this
/// thread. The thread exits once the stream callback holds the last
/// reference to the ring.
fn start_output_thread(device: cpal::Device, ring: Arc<RingBuffer>) -> Result<(), HardwareError> {
    let (ready_tx, ready_rx) = crossbeam_channel::bounded::<Result<(), String>>(1);
    let watch: Weak<RingBuffer> = Arc::downgrade(&ring);

    thread::spawn(move || {
        let stream = match open_stream(&device, ring) {
            Ok(stream) => stream,
            Err(e) => {
                let _ = ready_tx.send(Err(e));
                return;
            }
        };
        let _ = ready_tx.send(Ok(()));
        info!("CPAL output stream started");

        // Keep the stream alive until the engine lets go of the buffer.
        while watch.strong_count() > 1 {
            thread::sleep(RELEASE_POLL_INTERVAL);
        }
        drop(stream);
        info!("CPAL output stream closed");
    });

    match ready_rx.recv() {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(HardwareError::Stream(e)),
        Err(_) => Err(HardwareError::Stream(
            "output thread exited before starting".to_string(),
        )),
    }
}

fn open_stream(device: &cpal::Device, ring: Arc<RingBuffer>) -> Result<cpal::Stream, String> {
    let supported = device
        .default_output_config()
        .map_err(|e| e.to_string())?;
    let config = supported.config();

    let stream = match supported.sample_format() {
        cpal::SampleFormat::F32 => build_stream::<f32>(device, &config, ring),
        cpal::SampleFormat::I16 => build_stream::<i16>(device, &config, ring),
        cpal::SampleFormat::I32 => build_stream::<i32>(device, &config, ring),
        cpal::SampleFormat::U16 => build_stream::<u16>(device, &config, ring),
        format => return Err(format!("unsupported output sample format {:?}", format)),
    }
    .map_err(|e| e.to_string())?;

    stream.play().map_err(|e| e.to_string())?;
    Ok(stream)
}
