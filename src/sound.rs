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
//! One-shot sounds, decoded fully into memory and written to a buffer once.

use std::{
    fmt,
    path::Path,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use tracing::{debug, info};

use crate::audio::buffer::{BufferDesc, BufferLock, HardwareBuffer, LockFlags};
use crate::audio::decoder::{self, Decoder};
use crate::audio::error::DecodeError;
use crate::audio::format::WaveFormat;
use crate::audio::volume;
use crate::error::Error;
use crate::system::AudioSystem;

/// A handle to a fully loaded sound. Clones share the same sound.
#[derive(Clone)]
pub struct Sound {
    inner: Arc<SoundInner>,
}

struct SoundInner {
    name: String,
    buffer: Arc<dyn HardwareBuffer>,
    data: Vec<u8>,
    looping: AtomicBool,
}

impl Sound {
    /// Decodes the file at `path` into memory.
    pub fn load<P: AsRef<Path>>(system: &AudioSystem, path: P) -> Result<Sound, Error> {
        let path = path.as_ref();
        let mut decoder = decoder::open(path)?;
        Sound::from_decoder(system, decoder.as_mut(), crate::util::filename_display(path))
    }

    /// Decodes everything the decoder has left and writes it into a buffer
    /// sized to fit.
    pub fn from_decoder(
        system: &AudioSystem,
        decoder: &mut dyn Decoder,
        name: &str,
    ) -> Result<Sound, Error> {
        let format = decoder.format();
        let samples = decoder::decode_all(decoder)?;
        let data: Vec<u8> = samples
            .iter()
            .flat_map(|sample| sample.to_le_bytes())
            .collect();
        let data_len = data.len() - data.len() % format.block_align();
        if data_len == 0 {
            return Err(DecodeError::Unsupported(format!("{} contains no audio", name)).into());
        }

        let buffer = system.device().create_buffer(BufferDesc {
            format,
            capacity: data_len,
            notifications: vec![],
        })?;

        let lock = BufferLock::acquire(buffer.as_ref(), 0, 0, LockFlags::ENTIRE_BUFFER)?;
        lock.write(&data[..data_len])?;
        lock.release()?;

        info!(
            sound = name,
            format = %format,
            bytes = data_len,
            "Loaded sound."
        );
        Ok(Sound {
            inner: Arc::new(SoundInner {
                name: name.to_string(),
                buffer,
                data,
                looping: AtomicBool::new(false),
            }),
        })
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn format(&self) -> WaveFormat {
        self.inner.buffer.format()
    }

    /// Plays from the current position, looping if the loop flag is set.
    pub fn play(&self) -> Result<(), Error> {
        self.inner.buffer.play(self.is_looping())?;
        debug!(sound = %self.inner.name, looping = self.is_looping(), "Playing sound.");
        Ok(())
    }

    pub fn pause(&self) -> Result<(), Error> {
        self.inner.buffer.stop()?;
        Ok(())
    }

    /// Pauses and rewinds to the start.
    pub fn stop(&self) -> Result<(), Error> {
        self.pause()?;
        self.set_position(0)
    }

    /// Sets the volume on a 0..100 scale, mapped linearly onto the hardware
    /// range.
    pub fn set_volume(&self, volume: i32) -> Result<(), Error> {
        self.inner
            .buffer
            .set_volume(volume::linear_volume_to_hundredths_db(volume))?;
        Ok(())
    }

    pub fn volume(&self) -> Result<i32, Error> {
        Ok(volume::hundredths_db_to_linear_volume(
            self.inner.buffer.volume()?,
        ))
    }

    /// Sets the pan on a -100 (left) ..100 (right) scale.
    pub fn set_pan(&self, pan: i32) -> Result<(), Error> {
        self.inner.buffer.set_pan(volume::pan_to_hardware(pan))?;
        Ok(())
    }

    pub fn pan(&self) -> Result<i32, Error> {
        Ok(volume::hardware_to_pan(self.inner.buffer.pan()?))
    }

    /// Sets the playback rate in Hz. Zero restores the original rate.
    pub fn set_frequency(&self, hz: u32) -> Result<(), Error> {
        self.inner.buffer.set_frequency(hz)?;
        Ok(())
    }

    pub fn frequency(&self) -> Result<u32, Error> {
        Ok(self.inner.buffer.frequency()?)
    }

    pub fn is_playing(&self) -> Result<bool, Error> {
        Ok(self.inner.buffer.status()?.playing)
    }

    /// The play cursor in bytes.
    pub fn position(&self) -> Result<usize, Error> {
        Ok(self.inner.buffer.position()?)
    }

    pub fn set_position(&self, offset: usize) -> Result<(), Error> {
        self.inner.buffer.set_position(offset)?;
        Ok(())
    }

    /// Sets the loop flag. A playing sound restarts so the flag applies
    /// right away.
    pub fn set_loop(&self, looping: bool) -> Result<(), Error> {
        self.inner.looping.store(looping, Ordering::Relaxed);
        if self.is_playing()? {
            self.pause()?;
            self.play()?;
        }
        Ok(())
    }

    pub fn is_looping(&self) -> bool {
        self.inner.looping.load(Ordering::Relaxed)
    }

    /// The decoded PCM, little endian.
    pub fn data(&self) -> &[u8] {
        &self.inner.data
    }

    /// Releases this handle. Returns true if it was the last one.
    pub fn release(self) -> bool {
        Arc::into_inner(self.inner).is_some()
    }
}

impl fmt::Debug for Sound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sound")
            .field("name", &self.inner.name)
            .field("bytes", &self.inner.data.len())
            .field("looping", &self.is_looping())
            .finish()
    }
}

impl Drop for SoundInner {
    fn drop(&mut self) {
        let _ = self.buffer.stop();
        debug!(sound = %self.name, "Released sound.");
    }
}
