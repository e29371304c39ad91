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
//! The background thread that ticks the audio system at a fixed rate.

use std::{
    sync::Arc,
    thread,
    time::{Duration, Instant},
};

use crossbeam_channel::{Sender, TryRecvError};
use tracing::{debug, info, span, Level};

use crate::system::AudioSystem;

mod priority;

/// Drives [AudioSystem::update] from a dedicated thread until stopped or
/// dropped.
pub struct Driver {
    stop_tx: Sender<()>,
    handle: Option<thread::JoinHandle<()>>,
}

impl Driver {
    /// Starts ticking `system` every `tick`. With a priority the driver
    /// thread is raised to it (0-99) before the first tick.
    pub fn start(system: Arc<AudioSystem>, tick: Duration, priority: Option<u8>) -> Driver {
        let (stop_tx, stop_rx) = crossbeam_channel::bounded::<()>(1);

        let handle = thread::spawn(move || {
            let span = span!(Level::INFO, "driver");
            let _enter = span.enter();

            if let Some(priority) = priority {
                priority::raise_current_thread(priority, priority::rt_driver_enabled());
            }
            info!(tick = ?tick, "Driver started.");

            let mut next = Instant::now();
            loop {
                match stop_rx.try_recv() {
                    Ok(()) | Err(TryRecvError::Disconnected) => break,
                    Err(TryRecvError::Empty) => {}
                }

                system.update();

                next += tick;
                let now = Instant::now();
                if next < now {
                    // Fell behind; don't try to catch up with a burst of ticks.
                    next = now;
                }
                spin_sleep::sleep(next - now);
            }
            debug!("Driver stopped.");
        });

        Driver {
            stop_tx,
            handle: Some(handle),
        }
    }

    /// Stops the driver thread and waits for it to exit.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = self.stop_tx.try_send(());
            if handle.join().is_err() {
                tracing::error!("Driver thread panicked.");
            }
        }
    }
}

impl Drop for Driver {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod test {
    use std::time::Duration;

    use crate::audio::decoder::MemoryDecoder;
    use crate::testutil::{eventually, ramp, small_format, MockSystem};
    use crate::track::{Track, TrackState};

    use super::*;

    #[test]
    fn test_driver_refills_tracks() {
        let mock = MockSystem::new();
        let track = Track::from_decoder(
            &mock.system,
            Box::new(MemoryDecoder::new(small_format(), ramp(1500))),
            "ramp",
        )
        .unwrap();
        let buffer = mock.device.last_buffer().unwrap();

        let driver = Driver::start(mock.system.clone(), Duration::from_millis(1), None);
        eventually(
            || buffer.contents()[2000..3000].iter().any(|b| *b != 0),
            "driver never refilled the second half",
        );

        track.play().unwrap();
        mock.device.advance(Duration::from_secs(1));
        eventually(
            || track.state() == TrackState::Stopped,
            "driver never noticed the end of the stream",
        );
        driver.stop();
    }

    #[test]
    fn test_drop_stops_driver() {
        let mock = MockSystem::new();
        let driver = Driver::start(mock.system.clone(), Duration::from_millis(1), None);
        drop(driver);
        // Only the test holds the system once the thread has exited.
        assert_eq!(Arc::strong_count(&mock.system), 1);
    }
}
