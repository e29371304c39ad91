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
    fmt,
    sync::{Arc, Weak},
    thread,
    time::{Duration, Instant},
};

use crossbeam_channel::{select, Sender};
use parking_lot::Mutex;
use tracing::{debug, info};

use super::buffer::{BufferDesc, HardwareBuffer};
use super::error::HardwareError;
use super::ring::RingBuffer;

/// How often the real-time clock moves the play cursors of its buffers.
const CLOCK_TICK: Duration = Duration::from_millis(5);

/// A mock device. Its buffers only play when the clock is advanced, either by
/// hand or by a background clock thread running in real time.
pub struct Device {
    name: String,
    buffers: Arc<Mutex<Vec<Weak<RingBuffer>>>>,
    clock: Option<Clock>,
}

struct Clock {
    stop_tx: Sender<()>,
    handle: Option<thread::JoinHandle<()>>,
}

impl Device {
    /// Gets a mock device whose clock is advanced with [Device::advance].
    pub fn get(name: &str) -> Device {
        Device {
            name: name.to_string(),
            buffers: Arc::new(Mutex::new(Vec::new())),
            clock: None,
        }
    }

    /// Gets a mock device whose buffers play back in real time.
    pub fn realtime(name: &str) -> Device {
        let mut device = Device::get(name);
        let (stop_tx, stop_rx) = crossbeam_channel::bounded::<()>(1);
        let buffers = device.buffers.clone();

        let handle = thread::spawn(move || {
            let ticker = crossbeam_channel::tick(CLOCK_TICK);
            let mut last = Instant::now();
            loop {
                select! {
                    recv(stop_rx) -> _ => break,
                    recv(ticker) -> tick => {
                        let now = tick.unwrap_or_else(|_| Instant::now());
                        advance_all(&buffers, now.saturating_duration_since(last));
                        last = now;
                    }
                }
            }
            debug!("Mock clock stopped.");
        });

        device.clock = Some(Clock {
            stop_tx,
            handle: Some(handle),
        });
        device
    }

    /// Plays `elapsed` worth of audio on every live buffer.
    pub fn advance(&self, elapsed: Duration) {
        advance_all(&self.buffers, elapsed);
    }

    /// The buffers created by this device that are still alive, oldest first.
    pub fn buffers(&self) -> Vec<Arc<RingBuffer>> {
        self.buffers
            .lock()
            .iter()
            .filter_map(|buffer| buffer.upgrade())
            .collect()
    }

    /// The most recently created live buffer.
    pub fn last_buffer(&self) -> Option<Arc<RingBuffer>> {
        self.buffers().pop()
    }
}

fn advance_all(buffers: &Mutex<Vec<Weak<RingBuffer>>>, elapsed: Duration) {
    let live: Vec<Arc<RingBuffer>> = {
        let mut buffers = buffers.lock();
        buffers.retain(|buffer| buffer.strong_count() > 0);
        buffers.iter().filter_map(|buffer| buffer.upgrade()).collect()
    };

    for buffer in live {
        let format = buffer.format();
        let frequency = buffer.frequency().unwrap_or(format.sample_rate);
        let frames = (elapsed.as_secs_f64() * frequency as f64) as usize;
        buffer.advance(frames * format.block_align());
    }
}

impl super::Device for Device {
    fn name(&self) -> &str {
        &self.name
    }

    fn create_buffer(&self, desc: BufferDesc) -> Result<Arc<dyn HardwareBuffer>, HardwareError> {
        info!(
            device = %self.name,
            format = %desc.format,
            capacity = desc.capacity,
            "Creating buffer (mock)."
        );
        let buffer = Arc::new(RingBuffer::new(desc)?);
        self.buffers.lock().push(Arc::downgrade(&buffer));
        Ok(buffer)
    }
}

impl Drop for Device {
    fn drop(&mut self) {
        if let Some(mut clock) = self.clock.take() {
            let _ = clock.stop_tx.send(());
            if let Some(handle) = clock.handle.take() {
                let _ = handle.join();
            }
        }
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (Mock)", self.name)
    }
}
