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
use std::{path::Path, time::Duration};

use super::error::DecodeError;
use super::format::WaveFormat;

pub mod memory;
pub mod file;

pub use memory::MemoryDecoder;
pub use file::SymphoniaDecoder;

/// A stateful streaming decoder over a compressed audio resource, producing
/// interleaved signed 16-bit PCM.
pub trait Decoder: Send {
    /// The PCM layout of the decoded stream.
    fn format(&self) -> WaveFormat;

    /// Decodes up to `max_samples` interleaved samples, appending them to
    /// `out`. Returns the number of samples appended; fewer than requested
    /// means the stream is ending, zero means it is exhausted.
    fn decode(&mut self, max_samples: usize, out: &mut Vec<i16>) -> Result<usize, DecodeError>;

    /// Rewinds the stream to its first sample.
    fn reset(&mut self) -> Result<(), DecodeError>;

    /// The total playback time of the stream, if known.
    fn duration(&self) -> Option<Duration>;
}

/// Opens the given file for streaming decode.
pub fn open<P: AsRef<Path>>(path: P) -> Result<Box<dyn Decoder>, DecodeError> {
    Ok(Box::new(SymphoniaDecoder::open(path)?))
}

/// Decodes everything left in the stream.
pub fn decode_all(decoder: &mut dyn Decoder) -> Result<Vec<i16>, DecodeError> {
    const CHUNK_SAMPLES: usize = 16384;

    let mut samples = Vec::new();
    while decoder.decode(CHUNK_SAMPLES, &mut samples)? > 0 {}
    Ok(samples)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_decode_all() {
        let format = WaveFormat::new(1, 2000).unwrap();
        let samples: Vec<i16> = (0..40000).map(|i| (i % 300) as i16).collect();
        let mut decoder = MemoryDecoder::new(format, samples.clone());
        assert_eq!(decode_all(&mut decoder).unwrap(), samples);
        assert!(decode_all(&mut decoder).unwrap().is_empty());
    }
}
