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
    collections::BTreeMap,
    fmt,
    sync::{Arc, Weak},
};

use parking_lot::Mutex;
use tracing::debug;

use crate::error::Error;
use crate::track::TrackInner;

/// The identity under which a track is known to the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TrackId(u64);

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "track-{}", self.0)
    }
}

/// Every live streaming track of an audio system. The registry only holds
/// weak references; tracks unregister themselves when their last handle is
/// released.
pub struct TrackRegistry {
    state: Mutex<RegistryState>,
}

struct RegistryState {
    next_id: u64,
    tracks: BTreeMap<TrackId, Weak<TrackInner>>,
    open: bool,
}

impl TrackRegistry {
    pub(crate) fn new() -> TrackRegistry {
        TrackRegistry {
            state: Mutex::new(RegistryState {
                next_id: 1,
                tracks: BTreeMap::new(),
                open: true,
            }),
        }
    }

    /// Registers a track, returning its id. Fails once the registry has
    /// been shut down.
    pub(crate) fn register(&self, track: Weak<TrackInner>) -> Result<TrackId, Error> {
        let mut state = self.state.lock();
        if !state.open {
            return Err(Error::SystemShutdown);
        }

        let id = TrackId(state.next_id);
        state.next_id += 1;
        state.tracks.insert(id, track);
        debug!(%id, "Registered track.");
        Ok(id)
    }

    /// Removes a track. Returns false if the id was not registered.
    pub fn unregister(&self, id: TrackId) -> bool {
        let removed = self.state.lock().tracks.remove(&id).is_some();
        if removed {
            debug!(%id, "Unregistered track.");
        }
        removed
    }

    pub fn contains(&self, id: TrackId) -> bool {
        self.state.lock().tracks.contains_key(&id)
    }

    /// Registered ids in registration order.
    pub fn ids(&self) -> Vec<TrackId> {
        self.state.lock().tracks.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.state.lock().tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_open(&self) -> bool {
        self.state.lock().open
    }

    /// Strong references to every live track. The registry lock is released
    /// before the caller touches any of them, so a track torn down while in
    /// use can unregister itself without deadlocking.
    pub(crate) fn live(&self) -> Vec<Arc<TrackInner>> {
        self.state
            .lock()
            .tracks
            .values()
            .filter_map(|track| track.upgrade())
            .collect()
    }

    /// Closes the registry and hands back the tracks that were still live.
    pub(crate) fn shutdown(&self) -> Vec<Arc<TrackInner>> {
        let mut state = self.state.lock();
        state.open = false;
        let tracks = std::mem::take(&mut state.tracks);
        tracks.values().filter_map(|track| track.upgrade()).collect()
    }
}
