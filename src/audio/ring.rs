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
    sync::atomic::{AtomicBool, Ordering},
};

use parking_lot::Mutex;

use super::buffer::{
    BufferDesc, BufferStatus, HardwareBuffer, LockFlags, LockedRegion, Notification, Span,
    FREQUENCY_MAX, FREQUENCY_MIN, FREQUENCY_ORIGINAL,
};
use super::error::HardwareError;
use super::format::WaveFormat;
use super::volume::{gain, pan_gains, PAN_CENTER, PAN_LEFT, PAN_RIGHT, VOLUME_MAX, VOLUME_MIN};

/// The circular PCM buffer behind every output device. The engine writes to
/// it through lock transactions while the device side (a cpal callback or the
/// mock clock) consumes it from the play cursor, raising notifications as the
/// cursor passes their offsets.
pub struct RingBuffer {
    format: WaveFormat,
    capacity: usize,
    notifications: Vec<Notification>,
    state: Mutex<RingState>,
    faults: Faults,
}

struct RingState {
    data: Vec<u8>,
    lock: Option<LockedRegion>,
    /// Play cursor in bytes, always frame aligned.
    position: usize,
    /// Sub-frame progress when playing at a rate other than the format's.
    fraction: f64,
    playing: bool,
    looping: bool,
    volume: i32,
    pan: i32,
    frequency: u32,
}

/// One-shot failures armed by tests and the mock device.
#[derive(Default)]
struct Faults {
    lock: AtomicBool,
    unlock: AtomicBool,
    stop: AtomicBool,
}

impl RingBuffer {
    /// Creates a silent, stopped buffer.
    pub fn new(desc: BufferDesc) -> Result<RingBuffer, HardwareError> {
        let block_align = desc.format.block_align();
        if desc.capacity == 0 || desc.capacity % block_align != 0 {
            return Err(HardwareError::Device(format!(
                "buffer capacity {} is not a positive multiple of {}",
                desc.capacity, block_align
            )));
        }
        if let Some(notification) = desc
            .notifications
            .iter()
            .find(|notification| notification.offset >= desc.capacity)
        {
            return Err(HardwareError::OutOfRange {
                offset: notification.offset,
                len: 0,
                capacity: desc.capacity,
            });
        }

        Ok(RingBuffer {
            format: desc.format,
            capacity: desc.capacity,
            notifications: desc.notifications,
            state: Mutex::new(RingState {
                data: vec![0; desc.capacity],
                lock: None,
                position: 0,
                fraction: 0.0,
                playing: false,
                looping: false,
                volume: VOLUME_MAX,
                pan: PAN_CENTER,
                frequency: desc.format.sample_rate,
            }),
            faults: Faults::default(),
        })
    }

    /// Makes the next call to lock fail.
    pub fn fail_next_lock(&self) {
        self.faults.lock.store(true, Ordering::Relaxed);
    }

    /// Makes the next call to unlock fail. The lock is still released.
    pub fn fail_next_unlock(&self) {
        self.faults.unlock.store(true, Ordering::Relaxed);
    }

    /// Makes the next call to stop fail without halting playback.
    pub fn fail_next_stop(&self) {
        self.faults.stop.store(true, Ordering::Relaxed);
    }

    /// A copy of the buffer's bytes.
    pub fn contents(&self) -> Vec<u8> {
        self.state.lock().data.clone()
    }

    /// Whether a lock transaction is in flight.
    pub fn is_locked(&self) -> bool {
        self.state.lock().lock.is_some()
    }

    /// Moves the play cursor forward by `bytes` as if the hardware had played
    /// them. Does nothing while stopped.
    pub fn advance(&self, bytes: usize) {
        let bytes = bytes - bytes % self.format.block_align();
        let mut state = self.state.lock();
        self.move_cursor(&mut state, bytes);
    }

    /// Renders interleaved f32 frames for an output stream with
    /// `out_channels` channels running at `out_rate`, advancing the play
    /// cursor. Rate conversion is nearest-frame. Output past the end of a
    /// non-looping buffer, or while stopped, is silence.
    pub fn render(&self, out: &mut [f32], out_channels: usize, out_rate: u32) {
        let out_channels = out_channels.max(1);
        let channels = self.format.channels as usize;
        let block_align = self.format.block_align();
        let mut state = self.state.lock();

        let volume = gain(state.volume);
        let (left, right) = if channels == 2 || out_channels >= 2 {
            pan_gains(state.pan)
        } else {
            (1.0, 1.0)
        };
        let step = state.frequency as f64 / out_rate.max(1) as f64;

        for frame in out.chunks_mut(out_channels) {
            if !state.playing {
                frame.fill(0.0);
                continue;
            }

            let base = state.position;
            for (channel, sample) in frame.iter_mut().enumerate() {
                let source = if channel < channels {
                    channel
                } else if channels == 1 && channel < 2 {
                    0
                } else {
                    *sample = 0.0;
                    continue;
                };
                let at = base + source * 2;
                let value = i16::from_le_bytes([state.data[at], state.data[at + 1]]);
                let pan = match channel {
                    0 => left,
                    1 => right,
                    _ => 1.0,
                };
                *sample = value as f32 / 32768.0 * volume * pan;
            }

            state.fraction += step;
            let whole = state.fraction.floor();
            state.fraction -= whole;
            self.move_cursor(&mut state, whole as usize * block_align);
        }
    }

    fn move_cursor(&self, state: &mut RingState, bytes: usize) {
        if !state.playing || bytes == 0 {
            return;
        }

        let start = state.position;
        let mut end = start + bytes;
        if !state.looping {
            end = end.min(self.capacity);
        }

        for notification in &self.notifications {
            let mut at = notification.offset;
            if at <= start {
                at += self.capacity;
            }
            if at <= end {
                notification.signal.set();
            }
        }

        if !state.looping && end >= self.capacity {
            state.playing = false;
            state.position = 0;
            state.fraction = 0.0;
        } else {
            state.position = end % self.capacity;
        }
    }

    fn check_span(state: &RingState, span: Span, len: usize) -> Result<(), HardwareError> {
        let region = state.lock.as_ref().ok_or(HardwareError::NotLocked)?;
        if len > span.len || !region.spans().any(|locked| locked == span) {
            return Err(HardwareError::SpanMismatch {
                offset: span.offset,
                len: span.len,
            });
        }
        Ok(())
    }
}

impl fmt::Debug for RingBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RingBuffer")
            .field("format", &self.format)
            .field("capacity", &self.capacity)
            .field("notifications", &self.notifications.len())
            .finish()
    }
}

impl HardwareBuffer for RingBuffer {
    fn format(&self) -> WaveFormat {
        self.format
    }

    fn capacity(&self) -> usize {
        self.capacity
    }

    fn lock(
        &self,
        offset: usize,
        len: usize,
        flags: LockFlags,
    ) -> Result<LockedRegion, HardwareError> {
        if self.faults.lock.swap(false, Ordering::Relaxed) {
            return Err(HardwareError::Injected("lock"));
        }

        let mut state = self.state.lock();
        if let Some(current) = state.lock {
            let first = current.first().unwrap_or(Span::new(0, 0));
            return Err(HardwareError::AlreadyLocked {
                offset: first.offset,
                len: current.len(),
            });
        }

        let (offset, len) = if flags.entire_buffer {
            (0, self.capacity)
        } else {
            (offset, len)
        };
        if offset >= self.capacity || len > self.capacity {
            return Err(HardwareError::OutOfRange {
                offset,
                len,
                capacity: self.capacity,
            });
        }

        let region = LockedRegion::wrapping(offset, len, self.capacity);
        state.lock = Some(region);
        Ok(region)
    }

    fn write(&self, span: Span, data: &[u8]) -> Result<(), HardwareError> {
        let mut state = self.state.lock();
        Self::check_span(&state, span, data.len())?;
        state.data[span.offset..span.offset + data.len()].copy_from_slice(data);
        Ok(())
    }

    fn zero(&self, span: Span) -> Result<(), HardwareError> {
        let mut state = self.state.lock();
        Self::check_span(&state, span, span.len)?;
        state.data[span.offset..span.end()].fill(0);
        Ok(())
    }

    fn unlock(&self, region: LockedRegion) -> Result<(), HardwareError> {
        let mut state = self.state.lock();
        match state.lock {
            Some(current) if current == region => state.lock = None,
            Some(_) => {
                let first = region.first().unwrap_or(Span::new(0, 0));
                return Err(HardwareError::SpanMismatch {
                    offset: first.offset,
                    len: region.len(),
                });
            }
            None => return Err(HardwareError::NotLocked),
        }

        if self.faults.unlock.swap(false, Ordering::Relaxed) {
            return Err(HardwareError::Injected("unlock"));
        }
        Ok(())
    }

    fn play(&self, looping: bool) -> Result<(), HardwareError> {
        let mut state = self.state.lock();
        state.playing = true;
        state.looping = looping;
        Ok(())
    }

    fn stop(&self) -> Result<(), HardwareError> {
        if self.faults.stop.swap(false, Ordering::Relaxed) {
            return Err(HardwareError::Injected("stop"));
        }
        self.state.lock().playing = false;
        Ok(())
    }

    fn status(&self) -> Result<BufferStatus, HardwareError> {
        let state = self.state.lock();
        Ok(BufferStatus {
            playing: state.playing,
            looping: state.playing && state.looping,
        })
    }

    fn set_volume(&self, hundredths_db: i32) -> Result<(), HardwareError> {
        self.state.lock().volume = hundredths_db.clamp(VOLUME_MIN, VOLUME_MAX);
        Ok(())
    }

    fn volume(&self) -> Result<i32, HardwareError> {
        Ok(self.state.lock().volume)
    }

    fn set_pan(&self, pan: i32) -> Result<(), HardwareError> {
        self.state.lock().pan = pan.clamp(PAN_LEFT, PAN_RIGHT);
        Ok(())
    }

    fn pan(&self) -> Result<i32, HardwareError> {
        Ok(self.state.lock().pan)
    }

    fn set_frequency(&self, hz: u32) -> Result<(), HardwareError> {
        self.state.lock().frequency = if hz == FREQUENCY_ORIGINAL {
            self.format.sample_rate
        } else {
            hz.clamp(FREQUENCY_MIN, FREQUENCY_MAX)
        };
        Ok(())
    }

    fn frequency(&self) -> Result<u32, HardwareError> {
        Ok(self.state.lock().frequency)
    }

    fn set_position(&self, offset: usize) -> Result<(), HardwareError> {
        if offset >= self.capacity {
            return Err(HardwareError::OutOfRange {
                offset,
                len: 0,
                capacity: self.capacity,
            });
        }
        let mut state = self.state.lock();
        state.position = offset - offset % self.format.block_align();
        state.fraction = 0.0;
        Ok(())
    }

    fn position(&self) -> Result<usize, HardwareError> {
        Ok(self.state.lock().position)
    }
}

#[cfg(test)]
mod test {
    use std::sync::Arc;

    use super::*;
    use crate::audio::signal::Signal;

    fn mono_buffer(capacity: usize) -> (RingBuffer, Arc<Signal>, Arc<Signal>) {
        let wrap = Arc::new(Signal::new());
        let midpoint = Arc::new(Signal::new());
        let buffer = RingBuffer::new(BufferDesc {
            format: WaveFormat::new(1, 2000).unwrap(),
            capacity,
            notifications: vec![
                Notification {
                    offset: 0,
                    signal: wrap.clone(),
                },
                Notification {
                    offset: capacity / 2,
                    signal: midpoint.clone(),
                },
            ],
        })
        .unwrap();
        (buffer, wrap, midpoint)
    }

    #[test]
    fn test_new_rejects_bad_layouts() {
        let format = WaveFormat::new(2, 2000).unwrap();
        assert!(RingBuffer::new(BufferDesc {
            format,
            capacity: 0,
            notifications: vec![],
        })
        .is_err());
        assert!(RingBuffer::new(BufferDesc {
            format,
            capacity: 6,
            notifications: vec![],
        })
        .is_err());
        assert!(RingBuffer::new(BufferDesc {
            format,
            capacity: 8,
            notifications: vec![],
        })
        .is_ok());
        assert!(RingBuffer::new(BufferDesc {
            format,
            capacity: 7,
            notifications: vec![],
        })
        .is_err());
        assert!(RingBuffer::new(BufferDesc {
            format,
            capacity: 8,
            notifications: vec![Notification {
                offset: 8,
                signal: Arc::new(Signal::new()),
            }],
        })
        .is_err());
    }

    #[test]
    fn test_single_outstanding_lock() {
        let (buffer, _, _) = mono_buffer(8000);
        let region = buffer.lock(0, 4000, LockFlags::NONE).unwrap();
        assert!(buffer.is_locked());
        assert!(matches!(
            buffer.lock(4000, 4000, LockFlags::NONE),
            Err(HardwareError::AlreadyLocked { .. })
        ));
        buffer.unlock(region).unwrap();
        assert!(!buffer.is_locked());
        assert!(matches!(
            buffer.unlock(region),
            Err(HardwareError::NotLocked)
        ));
    }

    #[test]
    fn test_lock_out_of_range() {
        let (buffer, _, _) = mono_buffer(8000);
        assert!(matches!(
            buffer.lock(8000, 10, LockFlags::NONE),
            Err(HardwareError::OutOfRange { .. })
        ));
        assert!(matches!(
            buffer.lock(0, 8002, LockFlags::NONE),
            Err(HardwareError::OutOfRange { .. })
        ));
        assert!(!buffer.is_locked());
    }

    #[test]
    fn test_lock_entire_buffer_ignores_range() {
        let (buffer, _, _) = mono_buffer(8000);
        let region = buffer.lock(1234, 0, LockFlags::ENTIRE_BUFFER).unwrap();
        assert_eq!(region.first(), Some(Span::new(0, 8000)));
        assert_eq!(region.second(), None);
    }

    #[test]
    fn test_write_wrapped_region() {
        let (buffer, _, _) = mono_buffer(8);
        let region = buffer.lock(6, 4, LockFlags::NONE).unwrap();
        let first = region.first().unwrap();
        let second = region.second().unwrap();
        buffer.write(first, &[1, 2]).unwrap();
        buffer.write(second, &[3, 4]).unwrap();
        buffer.unlock(region).unwrap();
        assert_eq!(buffer.contents(), vec![3, 4, 0, 0, 0, 0, 1, 2]);
    }

    #[test]
    fn test_write_requires_lock() {
        let (buffer, _, _) = mono_buffer(8);
        assert!(matches!(
            buffer.write(Span::new(0, 2), &[1, 2]),
            Err(HardwareError::NotLocked)
        ));

        let region = buffer.lock(0, 4, LockFlags::NONE).unwrap();
        assert!(matches!(
            buffer.write(Span::new(4, 4), &[1, 2]),
            Err(HardwareError::SpanMismatch { .. })
        ));
        assert!(matches!(
            buffer.write(Span::new(0, 4), &[1, 2, 3, 4, 5]),
            Err(HardwareError::SpanMismatch { .. })
        ));
        buffer.unlock(region).unwrap();
    }

    #[test]
    fn test_injected_failures() {
        let (buffer, _, _) = mono_buffer(8);
        buffer.fail_next_lock();
        assert!(matches!(
            buffer.lock(0, 4, LockFlags::NONE),
            Err(HardwareError::Injected("lock"))
        ));

        let region = buffer.lock(0, 4, LockFlags::NONE).unwrap();
        buffer.fail_next_unlock();
        assert!(matches!(
            buffer.unlock(region),
            Err(HardwareError::Injected("unlock"))
        ));
        assert!(!buffer.is_locked());

        buffer.play(true).unwrap();
        buffer.fail_next_stop();
        assert!(matches!(buffer.stop(), Err(HardwareError::Injected("stop"))));
        assert!(buffer.status().unwrap().playing);
        buffer.stop().unwrap();
        assert!(!buffer.status().unwrap().playing);
    }

    #[test]
    fn test_advance_fires_notifications() {
        let (buffer, wrap, midpoint) = mono_buffer(8000);

        // Stopped buffers don't move.
        buffer.advance(5000);
        assert_eq!(buffer.position().unwrap(), 0);
        assert!(!midpoint.is_set());

        buffer.play(true).unwrap();
        buffer.advance(3998);
        assert!(!midpoint.is_set());
        buffer.advance(2);
        assert!(midpoint.poll_and_clear());
        assert!(!wrap.is_set());

        buffer.advance(4000);
        assert!(wrap.poll_and_clear());
        assert!(!midpoint.is_set());
        assert_eq!(buffer.position().unwrap(), 0);

        buffer.advance(6000);
        assert!(midpoint.poll_and_clear());
        assert_eq!(buffer.position().unwrap(), 6000);
    }

    #[test]
    fn test_non_looping_stops_at_end() {
        let (buffer, wrap, _) = mono_buffer(8000);
        buffer.play(false).unwrap();
        buffer.advance(10000);
        assert!(!buffer.status().unwrap().playing);
        assert_eq!(buffer.position().unwrap(), 0);
        assert!(wrap.is_set());
    }

    #[test]
    fn test_render_mono_to_stereo() {
        let (buffer, _, _) = mono_buffer(8);
        let region = buffer.lock(0, 8, LockFlags::ENTIRE_BUFFER).unwrap();
        let samples: Vec<u8> = [16384i16, -16384, 0, 8192]
            .iter()
            .flat_map(|s| s.to_le_bytes())
            .collect();
        buffer.write(region.first().unwrap(), &samples).unwrap();
        buffer.unlock(region).unwrap();
        buffer.play(true).unwrap();

        let mut out = vec![0.0f32; 4];
        buffer.render(&mut out, 2, 2000);
        assert_eq!(out, vec![0.5, 0.5, -0.5, -0.5]);
        assert_eq!(buffer.position().unwrap(), 4);
    }

    #[test]
    fn test_render_silent_when_stopped() {
        let (buffer, _, _) = mono_buffer(8);
        let region = buffer.lock(0, 8, LockFlags::ENTIRE_BUFFER).unwrap();
        buffer.write(region.first().unwrap(), &[0xff; 8]).unwrap();
        buffer.unlock(region).unwrap();

        let mut out = vec![1.0f32; 4];
        buffer.render(&mut out, 1, 2000);
        assert_eq!(out, vec![0.0; 4]);
    }

    #[test]
    fn test_render_double_frequency_skips_frames() {
        let (buffer, _, _) = mono_buffer(16);
        buffer.set_frequency(4000).unwrap();
        buffer.play(true).unwrap();

        let mut out = vec![0.0f32; 2];
        buffer.render(&mut out, 1, 2000);
        assert_eq!(buffer.position().unwrap(), 8);
    }

    #[test]
    fn test_frequency_original_and_clamp() {
        let (buffer, _, _) = mono_buffer(8);
        buffer.set_frequency(44100).unwrap();
        assert_eq!(buffer.frequency().unwrap(), 44100);
        buffer.set_frequency(FREQUENCY_ORIGINAL).unwrap();
        assert_eq!(buffer.frequency().unwrap(), 2000);
        buffer.set_frequency(1).unwrap();
        assert_eq!(buffer.frequency().unwrap(), FREQUENCY_MIN);
    }

    #[test]
    fn test_volume_and_pan_clamp() {
        let (buffer, _, _) = mono_buffer(8);
        buffer.set_volume(-20000).unwrap();
        assert_eq!(buffer.volume().unwrap(), VOLUME_MIN);
        buffer.set_volume(100).unwrap();
        assert_eq!(buffer.volume().unwrap(), VOLUME_MAX);
        buffer.set_pan(20000).unwrap();
        assert_eq!(buffer.pan().unwrap(), PAN_RIGHT);
    }

    #[test]
    fn test_set_position() {
        let (buffer, _, _) = mono_buffer(8000);
        buffer.set_position(1001).unwrap();
        assert_eq!(buffer.position().unwrap(), 1000);
        assert!(buffer.set_position(8000).is_err());
    }
}
