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
use std::sync::Arc;

use tracing::{debug, info, span, Level};

use crate::audio::Device;
use crate::registry::TrackRegistry;

mod error_channel;

pub use error_channel::{ErrorChannel, ErrorLog};

/// The audio subsystem: the output device, the registry of live streaming
/// tracks, and the channel non-fatal errors are reported on. Tracks and
/// sounds are created against a system handle rather than any global state.
pub struct AudioSystem {
    device: Arc<dyn Device>,
    registry: TrackRegistry,
    errors: Arc<dyn ErrorChannel>,
}

impl AudioSystem {
    /// Initializes an audio system on the given device.
    pub fn init(device: Arc<dyn Device>, errors: Arc<dyn ErrorChannel>) -> Arc<AudioSystem> {
        info!(device = %device, "Initializing audio system.");
        Arc::new(AudioSystem {
            device,
            registry: TrackRegistry::new(),
            errors,
        })
    }

    /// Initializes an audio system that reports errors to an [ErrorLog].
    pub fn with_device(device: Arc<dyn Device>) -> Arc<AudioSystem> {
        AudioSystem::init(device, Arc::new(ErrorLog::new()))
    }

    pub fn device(&self) -> &Arc<dyn Device> {
        &self.device
    }

    pub fn registry(&self) -> &TrackRegistry {
        &self.registry
    }

    /// Reports a non-fatal error.
    pub fn post_error(&self, message: &str) {
        self.errors.post_error(message);
    }

    /// Runs one refill tick on every live track. Returns the number of tracks
    /// ticked.
    pub fn update(&self) -> usize {
        let tracks = self.registry.live();
        for track in tracks.iter() {
            track.update();
        }
        tracks.len()
    }

    /// Stops every live track and closes the registry. Tracks created
    /// afterwards fail to open.
    pub fn shutdown(&self) {
        let span = span!(Level::INFO, "audio system shutdown");
        let _enter = span.enter();

        let tracks = self.registry.shutdown();
        info!(tracks = tracks.len(), "Stopping live tracks.");
        for track in tracks {
            debug!(track = track.name(), "Stopping track.");
            // Tracks post their own stop failures.
            let _ = track.stop();
        }
    }
}
