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

//! Streamed music playback.
//!
//! A track decodes its stream into a circular hardware buffer two seconds
//! long. The buffer raises one signal when the play cursor wraps and another
//! when it crosses the midpoint; each tick the track polls both and refills
//! the half the cursor has just left, so a full second of audio is always
//! queued ahead of playback no matter how long the stream is.

use std::{
    fmt,
    path::Path,
    sync::{Arc, OnceLock},
};

use parking_lot::Mutex;
use tracing::{debug, info, span, warn, Level};

use crate::audio::buffer::{BufferDesc, HardwareBuffer, Notification};
use crate::audio::decoder::{self, Decoder};
use crate::audio::format::WaveFormat;
use crate::audio::signal::Signal;
use crate::audio::volume;
use crate::error::Error;
use crate::registry::TrackId;
use crate::system::AudioSystem;

mod commit;
mod pull;
mod refill;

pub use commit::CommitError;
pub use refill::{RefillRequest, SIGNAL_MIDPOINT, SIGNAL_WRAP};


/// Where a track is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackState {
    /// Halted with the buffer cleared and the decoder rewound.
    Stopped,
    Playing,
    /// Halted with the buffer and decoder left where they were.
    Paused,
}

impl fmt::Display for TrackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match self {
            TrackState::Stopped => "stopped",
            TrackState::Playing => "playing",
            TrackState::Paused => "paused",
        };
        write!(f, "{}", state)
    }
}

/// The outcome of one refill tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// Neither signal was raised.
    Idle,
    /// Decoded audio was written into the buffer.
    Refilled {
        offset: usize,
        len: usize,
        /// Bytes that came from the decoder; the rest is silence.
        decoded: usize,
    },
    /// The stream ran out and the track stopped.
    Exhausted,
    /// Decoding or the buffer transaction failed. The failure has been
    /// posted to the error channel.
    Failed,
}

/// A handle to a streaming music track. Clones share the same track; the
/// track is torn down when the last handle is released or dropped.
#[derive(Clone)]
pub struct Track {
    inner: Arc<TrackInner>,
}

pub(crate) struct TrackInner {
    name: String,
    id: OnceLock<TrackId>,
    format: WaveFormat,
    system: Arc<AudioSystem>,
    stream: Mutex<Stream>,
}

struct Stream {
    decoder: Box<dyn Decoder>,
    buffer: Arc<dyn HardwareBuffer>,
    signals: [Arc<Signal>; 2],
    /// One second of audio in bytes; the buffer holds two of these.
    half: usize,
    state: TrackState,
    /// Whether the buffer holds audio from the current decoder position.
    /// Cleared by a reset, which leaves only silence behind.
    primed: bool,
    scratch: Vec<i16>,
}

impl Track {
    /// Opens the compressed audio file at `path` for streaming.
    pub fn open<P: AsRef<Path>>(system: &Arc<AudioSystem>, path: P) -> Result<Track, Error> {
        let path = path.as_ref();
        let decoder = decoder::open(path)?;
        Track::from_decoder(system, decoder, crate::util::filename_display(path))
    }

    /// Creates a track streaming from the given decoder. Allocates the
    /// hardware buffer, primes its first half and registers the track.
    pub fn from_decoder(
        system: &Arc<AudioSystem>,
        decoder: Box<dyn Decoder>,
        name: &str,
    ) -> Result<Track, Error> {
        let span = span!(Level::INFO, "open track");
        let _enter = span.enter();

        let format = decoder.format();
        let half = format.avg_bytes_per_sec();
        let signals = [Arc::new(Signal::new()), Arc::new(Signal::new())];
        let buffer = system.device().create_buffer(BufferDesc {
            format,
            capacity: half * 2,
            notifications: vec![
                Notification {
                    offset: 0,
                    signal: signals[SIGNAL_WRAP].clone(),
                },
                Notification {
                    offset: half,
                    signal: signals[SIGNAL_MIDPOINT].clone(),
                },
            ],
        })?;

        let inner = Arc::new(TrackInner {
            name: name.to_string(),
            id: OnceLock::new(),
            format,
            system: system.clone(),
            stream: Mutex::new(Stream {
                decoder,
                buffer,
                signals,
                half,
                state: TrackState::Stopped,
                primed: false,
                scratch: Vec::with_capacity(half / 2),
            }),
        });

        let _ = inner.prime(&mut inner.stream.lock());

        let id = system.registry().register(Arc::downgrade(&inner))?;
        let _ = inner.id.set(id);

        info!(
            track = name,
            %id,
            format = %format,
            "Opened track."
        );
        Ok(Track { inner })
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// The id under which the track is registered.
    pub fn id(&self) -> Option<TrackId> {
        self.inner.id.get().copied()
    }

    pub fn format(&self) -> WaveFormat {
        self.inner.format
    }

    pub fn state(&self) -> TrackState {
        self.inner.stream.lock().state
    }

    /// Runs one refill tick. Never blocks on the hardware.
    pub fn update(&self) -> Tick {
        self.inner.update()
    }

    /// Starts or resumes looping playback over the circular buffer.
    pub fn play(&self) -> Result<(), Error> {
        let mut stream = self.inner.stream.lock();
        if !stream.primed {
            let tick = self.inner.prime(&mut stream);
            if !matches!(tick, Tick::Refilled { .. }) {
                debug!(track = %self.inner.name, ?tick, "Nothing to play.");
                return Ok(());
            }
        }
        stream.buffer.play(true)?;
        stream.state = TrackState::Playing;
        debug!(track = %self.inner.name, "Playing track.");
        Ok(())
    }

    /// Halts playback, keeping the position.
    pub fn pause(&self) -> Result<(), Error> {
        let mut stream = self.inner.stream.lock();
        stream.buffer.stop()?;
        stream.state = TrackState::Paused;
        Ok(())
    }

    /// Halts playback and rewinds to the start of the stream.
    pub fn stop(&self) -> Result<(), Error> {
        self.inner.stop()
    }

    /// Rewinds the buffer and decoder to the start and silences the buffer.
    /// Failures are posted to the error channel.
    pub fn reset_position(&self) {
        self.inner.reset_position(&mut self.inner.stream.lock());
    }

    pub fn is_playing(&self) -> Result<bool, Error> {
        Ok(self.inner.stream.lock().buffer.status()?.playing)
    }

    /// Sets the volume on a 0..100 scale.
    pub fn set_volume(&self, volume: i32) -> Result<(), Error> {
        let stream = self.inner.stream.lock();
        stream
            .buffer
            .set_volume(volume::volume_to_hundredths_db(volume))?;
        Ok(())
    }

    /// The volume on a 0..100 scale.
    pub fn volume(&self) -> Result<i32, Error> {
        let stream = self.inner.stream.lock();
        Ok(volume::hundredths_db_to_volume(stream.buffer.volume()?))
    }

    /// Sets the pan on a -100 (left) ..100 (right) scale.
    pub fn set_pan(&self, pan: i32) -> Result<(), Error> {
        let stream = self.inner.stream.lock();
        stream.buffer.set_pan(volume::pan_to_hardware(pan))?;
        Ok(())
    }

    pub fn pan(&self) -> Result<i32, Error> {
        let stream = self.inner.stream.lock();
        Ok(volume::hardware_to_pan(stream.buffer.pan()?))
    }

    /// Releases this handle. Returns true if it was the last one and the
    /// track has been torn down.
    pub fn release(self) -> bool {
        match Arc::into_inner(self.inner) {
            Some(inner) => {
                drop(inner);
                true
            }
            None => false,
        }
    }

    /// The hardware buffer the track streams into.
    pub fn buffer(&self) -> Arc<dyn HardwareBuffer> {
        self.inner.stream.lock().buffer.clone()
    }
}

impl fmt::Debug for Track {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Track")
            .field("name", &self.inner.name)
            .field("id", &self.inner.id.get())
            .field("format", &self.inner.format)
            .finish()
    }
}

impl TrackInner {
    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn update(&self) -> Tick {
        let mut stream = self.stream.lock();
        match refill::poll(&stream.signals, stream.half) {
            Some(request) => self.pull_samples(&mut stream, request.offset, request.len, false),
            None => Tick::Idle,
        }
    }

    pub(crate) fn stop(&self) -> Result<(), Error> {
        let mut stream = self.stream.lock();
        self.stop_stream(&mut stream)
    }

    /// Fills the first half of the buffer and queues the second, so playback
    /// starts on real audio and the first tick tops up the rest.
    fn prime(&self, stream: &mut Stream) -> Tick {
        let half = stream.half;
        let tick = self.pull_samples(stream, 0, half, true);
        if let Tick::Refilled { .. } = tick {
            stream.primed = true;
            stream.signals[SIGNAL_WRAP].set();
        }
        tick
    }

    /// Decodes `len` bytes and commits them at `offset`. An exhausted stream
    /// stops the track instead.
    fn pull_samples(&self, stream: &mut Stream, offset: usize, len: usize, init_cursors: bool) -> Tick {
        let Stream {
            decoder, scratch, ..
        } = &mut *stream;
        let block = match pull::pull(decoder.as_mut(), len, scratch) {
            Ok(block) => block,
            Err(e) => {
                self.system
                    .post_error(&format!("Failed to decode {}: {}", self.name, e));
                return Tick::Failed;
            }
        };

        if block.is_exhausted() {
            debug!(track = %self.name, "Stream exhausted, stopping.");
            // Failures are already posted.
            let _ = self.stop_stream(stream);
            return Tick::Exhausted;
        }

        match commit::commit(stream.buffer.as_ref(), offset, block.bytes(), init_cursors) {
            Ok(_) => Tick::Refilled {
                offset,
                len,
                decoded: block.produced(),
            },
            Err(e) => {
                self.system.post_error(&format!("{} ({})", e, self.name));
                Tick::Failed
            }
        }
    }

    /// Halts the buffer and rewinds. The rewind runs even when the buffer
    /// refuses to stop; that failure is posted and returned afterwards.
    fn stop_stream(&self, stream: &mut Stream) -> Result<(), Error> {
        let stopped = stream.buffer.stop();
        if let Err(e) = &stopped {
            self.system
                .post_error(&format!("Failed to stop {}: {}", self.name, e));
        }
        stream.state = TrackState::Stopped;
        self.reset_position(stream);
        stopped.map_err(Error::from)
    }

    fn reset_position(&self, stream: &mut Stream) {
        stream.primed = false;

        if let Err(e) = stream.buffer.set_position(0) {
            self.system
                .post_error(&format!("Failed to rewind {}: {}", self.name, e));
        }
        if let Err(e) = stream.decoder.reset() {
            self.system
                .post_error(&format!("Failed to rewind decoder for {}: {}", self.name, e));
        }
        for signal in stream.signals.iter() {
            signal.reset();
        }
        if let Err(e) = commit::clear(stream.buffer.as_ref()) {
            self.system.post_error(&format!("{} ({})", e, self.name));
        }
    }
}

impl Drop for TrackInner {
    fn drop(&mut self) {
        let stream = self.stream.get_mut();
        if let Err(e) = stream.buffer.stop() {
            warn!(track = %self.name, err = %e, "Failed to stop buffer on release.");
        }
        for signal in stream.signals.iter() {
            signal.reset();
        }
        if let Some(id) = self.id.get() {
            self.system.registry().unregister(*id);
        }
        debug!(track = %self.name, "Released track.");
    }
}
