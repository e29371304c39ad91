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

use std::{fmt, time::Duration};

use super::error::DecodeError;

/// Size of a single PCM sample handed to hardware buffers, in bytes.
pub const BYTES_PER_SAMPLE: usize = 2;

/// The PCM layout of a hardware buffer. Everything the engine writes is
/// interleaved signed 16-bit little-endian.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaveFormat {
    /// Number of interleaved channels.
    pub channels: u16,
    /// Frames per second.
    pub sample_rate: u32,
}

impl WaveFormat {
    /// Creates a new WaveFormat.
    pub fn new(channels: u16, sample_rate: u32) -> Result<Self, DecodeError> {
        if channels == 0 {
            return Err(DecodeError::Unsupported(
                "channel count must be greater than 0".to_string(),
            ));
        }
        if sample_rate == 0 {
            return Err(DecodeError::Unsupported(
                "sample rate must be greater than 0".to_string(),
            ));
        }

        Ok(WaveFormat {
            channels,
            sample_rate,
        })
    }

    /// Bits in a single sample.
    pub fn bits_per_sample(&self) -> u16 {
        (BYTES_PER_SAMPLE * 8) as u16
    }

    /// Bytes in one frame (one sample for every channel).
    pub fn block_align(&self) -> usize {
        self.channels as usize * BYTES_PER_SAMPLE
    }

    /// Bytes consumed by one second of playback.
    pub fn avg_bytes_per_sec(&self) -> usize {
        self.sample_rate as usize * self.block_align()
    }

    /// The playback time represented by the given number of bytes.
    pub fn duration_of(&self, bytes: usize) -> Duration {
        Duration::from_secs_f64(bytes as f64 / self.avg_bytes_per_sec() as f64)
    }
}

impl fmt::Display for WaveFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}Hz, {} channel(s), {}-bit",
            self.sample_rate,
            self.channels,
            self.bits_per_sample()
        )
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_wave_format_new() {
        let format = WaveFormat::new(2, 44100).unwrap();
        assert_eq!(format.channels, 2);
        assert_eq!(format.sample_rate, 44100);
        assert_eq!(format.bits_per_sample(), 16);
    }

    #[test]
    fn test_wave_format_new_invalid() {
        assert!(WaveFormat::new(0, 44100).is_err());
        assert!(WaveFormat::new(2, 0).is_err());
    }

    #[test]
    fn test_byte_rates() {
        let mono = WaveFormat::new(1, 2000).unwrap();
        assert_eq!(mono.block_align(), 2);
        assert_eq!(mono.avg_bytes_per_sec(), 4000);

        let stereo = WaveFormat::new(2, 48000).unwrap();
        assert_eq!(stereo.block_align(), 4);
        assert_eq!(stereo.avg_bytes_per_sec(), 192000);
    }

    #[test]
    fn test_duration_of() {
        let format = WaveFormat::new(1, 2000).unwrap();
        assert_eq!(format.duration_of(8000), Duration::from_secs(2));
        assert_eq!(format.duration_of(2000), Duration::from_millis(500));
    }

    #[test]
    fn test_display() {
        let format = WaveFormat::new(2, 44100).unwrap();
        assert_eq!(format!("{}", format), "44100Hz, 2 channel(s), 16-bit");
    }
}
