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
use std::{fmt, sync::Arc};

use tracing::warn;

use super::error::HardwareError;
use super::format::WaveFormat;
use super::signal::Signal;

/// A contiguous writable region of a locked buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub offset: usize,
    pub len: usize,
}

impl Span {
    pub fn new(offset: usize, len: usize) -> Span {
        Span { offset, len }
    }

    /// One past the last byte of the span.
    pub fn end(&self) -> usize {
        self.offset + self.len
    }
}

/// The result of locking a circular buffer. A lock that runs past the
/// physical end of the buffer wraps to offset 0, so there are one or two
/// spans; an empty region has none.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LockedRegion {
    spans: [Option<Span>; 2],
}

impl LockedRegion {
    /// Splits `len` bytes at `offset` of a buffer of `capacity` bytes into
    /// the spans a hardware lock hands out.
    pub fn wrapping(offset: usize, len: usize, capacity: usize) -> LockedRegion {
        if len == 0 {
            return LockedRegion::default();
        }

        let first = len.min(capacity - offset);
        let second = len - first;
        LockedRegion {
            spans: [
                Some(Span::new(offset, first)),
                (second > 0).then(|| Span::new(0, second)),
            ],
        }
    }

    /// The spans in write order.
    pub fn spans(&self) -> impl Iterator<Item = Span> + '_ {
        self.spans.iter().flatten().copied()
    }

    pub fn first(&self) -> Option<Span> {
        self.spans[0]
    }

    pub fn second(&self) -> Option<Span> {
        self.spans[1]
    }

    /// Total writable bytes across both spans.
    pub fn len(&self) -> usize {
        self.spans().map(|span| span.len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the region wrapped around the end of the buffer.
    pub fn is_wrapped(&self) -> bool {
        self.spans[1].is_some()
    }
}

/// Options for [HardwareBuffer::lock].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LockFlags {
    /// Ignore offset and length and lock the entire buffer.
    pub entire_buffer: bool,
}

impl LockFlags {
    pub const NONE: LockFlags = LockFlags {
        entire_buffer: false,
    };
    pub const ENTIRE_BUFFER: LockFlags = LockFlags {
        entire_buffer: true,
    };
}

/// Passed to [HardwareBuffer::set_frequency] to restore the format's rate.
pub const FREQUENCY_ORIGINAL: u32 = 0;
/// Slowest playback rate a buffer accepts.
pub const FREQUENCY_MIN: u32 = 100;
/// Fastest playback rate a buffer accepts.
pub const FREQUENCY_MAX: u32 = 200_000;

/// Playback state reported by [HardwareBuffer::status].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BufferStatus {
    pub playing: bool,
    pub looping: bool,
}

/// A point in the buffer at which the hardware raises a signal once the play
/// cursor reaches it.
#[derive(Debug, Clone)]
pub struct Notification {
    pub offset: usize,
    pub signal: Arc<Signal>,
}

/// Describes a buffer to be created by an output device.
#[derive(Debug, Clone)]
pub struct BufferDesc {
    pub format: WaveFormat,
    /// Capacity in bytes. Must be a multiple of the format's block alignment.
    pub capacity: usize,
    pub notifications: Vec<Notification>,
}

/// A playback buffer owned by an output device. The device keeps its own
/// reference for as long as it plays from the buffer, so handles are always
/// shared through an `Arc`.
pub trait HardwareBuffer: fmt::Debug + Send + Sync {
    /// The PCM layout of the buffer.
    fn format(&self) -> WaveFormat;

    /// Size of the buffer in bytes.
    fn capacity(&self) -> usize;

    /// Locks `len` bytes starting at `offset` for writing. Only one lock may
    /// be outstanding at a time.
    fn lock(&self, offset: usize, len: usize, flags: LockFlags)
        -> Result<LockedRegion, HardwareError>;

    /// Copies `data` to the start of a span of the current lock.
    fn write(&self, span: Span, data: &[u8]) -> Result<(), HardwareError>;

    /// Zero-fills a span of the current lock.
    fn zero(&self, span: Span) -> Result<(), HardwareError>;

    /// Releases the current lock.
    fn unlock(&self, region: LockedRegion) -> Result<(), HardwareError>;

    /// Starts playback from the current position.
    fn play(&self, looping: bool) -> Result<(), HardwareError>;

    /// Halts playback, keeping the current position.
    fn stop(&self) -> Result<(), HardwareError>;

    fn status(&self) -> Result<BufferStatus, HardwareError>;

    /// Sets the attenuation in hundredths of a decibel.
    fn set_volume(&self, hundredths_db: i32) -> Result<(), HardwareError>;

    fn volume(&self) -> Result<i32, HardwareError>;

    /// Sets the pan in hardware units (`PAN_LEFT..=PAN_RIGHT`).
    fn set_pan(&self, pan: i32) -> Result<(), HardwareError>;

    fn pan(&self) -> Result<i32, HardwareError>;

    /// Sets the playback rate in frames per second. Zero restores the rate of
    /// the buffer's format.
    fn set_frequency(&self, hz: u32) -> Result<(), HardwareError>;

    fn frequency(&self) -> Result<u32, HardwareError>;

    /// Moves the play cursor to the given byte offset.
    fn set_position(&self, offset: usize) -> Result<(), HardwareError>;

    fn position(&self) -> Result<usize, HardwareError>;
}

/// A scoped lock on a hardware buffer. Dropping the guard without calling
/// [BufferLock::release] still unlocks the buffer, so every exit path is
/// covered; the explicit release exists to surface unlock failures.
pub struct BufferLock<'a> {
    buffer: &'a dyn HardwareBuffer,
    region: LockedRegion,
    released: bool,
}

impl<'a> BufferLock<'a> {
    /// Locks the given range of the buffer.
    pub fn acquire(
        buffer: &'a dyn HardwareBuffer,
        offset: usize,
        len: usize,
        flags: LockFlags,
    ) -> Result<BufferLock<'a>, HardwareError> {
        let region = buffer.lock(offset, len, flags)?;
        Ok(BufferLock {
            buffer,
            region,
            released: false,
        })
    }

    pub fn region(&self) -> &LockedRegion {
        &self.region
    }

    /// Zero-fills every span of the lock.
    pub fn zero(&self) -> Result<(), HardwareError> {
        for span in self.region.spans() {
            self.buffer.zero(span)?;
        }
        Ok(())
    }

    /// Copies `data` across the spans in order: the first span gets the head
    /// of the data, the second whatever remains. Returns the number of bytes
    /// written.
    pub fn write(&self, data: &[u8]) -> Result<usize, HardwareError> {
        let mut remaining = data;
        let mut written = 0;
        for span in self.region.spans() {
            if remaining.is_empty() {
                break;
            }
            let count = span.len.min(remaining.len());
            self.buffer.write(span, &remaining[..count])?;
            remaining = &remaining[count..];
            written += count;
        }
        Ok(written)
    }

    /// Unlocks the buffer, reporting any failure.
    pub fn release(mut self) -> Result<(), HardwareError> {
        self.released = true;
        self.buffer.unlock(self.region)
    }
}

impl Drop for BufferLock<'_> {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        if let Err(e) = self.buffer.unlock(self.region) {
            warn!(err = %e, "Failed to unlock buffer on early exit");
        }
    }
}
