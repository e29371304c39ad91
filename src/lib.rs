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
//! Streaming music and one-shot sound playback over circular hardware
//! buffers.
//!
//! An [AudioSystem] owns the output device and every open [Track]. Tracks
//! decode their stream a second at a time into a two second circular buffer,
//! refilling whichever half the play cursor has just left whenever the
//! [Driver] ticks the system. [Sound]s are decoded up front and played
//! straight from memory.

pub mod audio;
pub mod config;
pub mod driver;
pub mod error;
pub mod registry;
pub mod sound;
pub mod system;
pub mod track;
pub mod util;

#[cfg(test)]
mod testutil;

pub use driver::Driver;
pub use error::Error;
pub use registry::{TrackId, TrackRegistry};
pub use sound::Sound;
pub use system::{AudioSystem, ErrorChannel, ErrorLog};
pub use track::{Tick, Track, TrackState};
