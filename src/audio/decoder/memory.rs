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
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use super::Decoder;
use crate::audio::error::DecodeError;
use crate::audio::format::WaveFormat;

/// A decoder over PCM already held in memory. Useful for procedurally
/// generated audio and for driving tracks in tests.
pub struct MemoryDecoder {
    format: WaveFormat,
    samples: Arc<Vec<i16>>,
    probe: MemoryDecoderProbe,
}

/// A shared view of a [MemoryDecoder]'s read state that stays valid after
/// the decoder has been handed off to a track.
#[derive(Clone, Default)]
pub struct MemoryDecoderProbe {
    position: Arc<AtomicUsize>,
    resets: Arc<AtomicUsize>,
    decodes: Arc<AtomicUsize>,
}

impl MemoryDecoderProbe {
    /// The index of the next sample to be decoded.
    pub fn position(&self) -> usize {
        self.position.load(Ordering::Relaxed)
    }

    /// How many times the decoder has been rewound.
    pub fn resets(&self) -> usize {
        self.resets.load(Ordering::Relaxed)
    }

    /// How many decode calls have been made.
    pub fn decodes(&self) -> usize {
        self.decodes.load(Ordering::Relaxed)
    }
}

impl MemoryDecoder {
    /// Creates a decoder over interleaved samples in the given format.
    pub fn new(format: WaveFormat, samples: Vec<i16>) -> MemoryDecoder {
        MemoryDecoder {
            format,
            samples: Arc::new(samples),
            probe: MemoryDecoderProbe::default(),
        }
    }

    pub fn probe(&self) -> MemoryDecoderProbe {
        self.probe.clone()
    }
}

impl Decoder for MemoryDecoder {
    fn format(&self) -> WaveFormat {
        self.format
    }

    fn decode(&mut self, max_samples: usize, out: &mut Vec<i16>) -> Result<usize, DecodeError> {
        self.probe.decodes.fetch_add(1, Ordering::Relaxed);

        let position = self.probe.position();
        let end = (position + max_samples).min(self.samples.len());
        out.extend_from_slice(&self.samples[position..end]);
        self.probe.position.store(end, Ordering::Relaxed);
        Ok(end - position)
    }

    fn reset(&mut self) -> Result<(), DecodeError> {
        self.probe.position.store(0, Ordering::Relaxed);
        self.probe.resets.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn duration(&self) -> Option<Duration> {
        Some(
            self.format
                .duration_of(self.samples.len() * crate::audio::format::BYTES_PER_SAMPLE),
        )
    }
}

#[cfg(test)]
mod test {
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_memory_decoder() {
        let format = WaveFormat::new(1, 2000).unwrap();
        let mut decoder = MemoryDecoder::new(format, vec![1, 2, 3, 4, 5]);
        let probe = decoder.probe();
        let mut out = Vec::new();

        assert_eq!(decoder.decode(3, &mut out).unwrap(), 3);
        assert_eq!(out, vec![1, 2, 3]);
        assert_eq!(probe.position(), 3);

        assert_eq!(decoder.decode(3, &mut out).unwrap(), 2);
        assert_eq!(out, vec![1, 2, 3, 4, 5]);
        assert_eq!(decoder.decode(3, &mut out).unwrap(), 0);
        assert_eq!(probe.decodes(), 3);

        decoder.reset().unwrap();
        assert_eq!(probe.position(), 0);
        assert_eq!(probe.resets(), 1);
        out.clear();
        assert_eq!(decoder.decode(2, &mut out).unwrap(), 2);
        assert_eq!(out, vec![1, 2]);
    }

    #[test]
    fn test_memory_decoder_duration() {
        let format = WaveFormat::new(2, 1000).unwrap();
        let decoder = MemoryDecoder::new(format, vec![0; 4000]);
        assert_eq!(decoder.duration(), Some(Duration::from_secs(2)));
    }
}
