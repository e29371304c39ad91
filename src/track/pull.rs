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
use crate::audio::decoder::Decoder;
use crate::audio::error::DecodeError;
use crate::audio::format::BYTES_PER_SAMPLE;

/// Little-endian PCM pulled from a decoder, padded with silence up to the
/// requested size.
#[derive(Debug)]
pub struct PcmBlock {
    bytes: Vec<u8>,
    produced: usize,
}

impl PcmBlock {
    /// The padded bytes. Empty when the stream is exhausted.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// How many of the bytes came from the decoder.
    pub fn produced(&self) -> usize {
        self.produced
    }

    pub fn is_exhausted(&self) -> bool {
        self.produced == 0
    }
}

/// Decodes up to `requested_bytes` of PCM. A short decode is padded with
/// zeros so the block never carries stale data past the end of the stream.
/// `scratch` is reused between calls to avoid reallocating sample storage.
pub fn pull(
    decoder: &mut dyn Decoder,
    requested_bytes: usize,
    scratch: &mut Vec<i16>,
) -> Result<PcmBlock, DecodeError> {
    scratch.clear();
    let samples = decoder.decode(requested_bytes / BYTES_PER_SAMPLE, scratch)?;

    let mut bytes = Vec::with_capacity(requested_bytes);
    for sample in &scratch[..samples] {
        bytes.extend_from_slice(&sample.to_le_bytes());
    }
    let produced = bytes.len();
    if produced > 0 {
        bytes.resize(requested_bytes, 0);
    }

    Ok(PcmBlock { bytes, produced })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::audio::decoder::MemoryDecoder;
    use crate::audio::format::WaveFormat;

    fn decoder(samples: Vec<i16>) -> MemoryDecoder {
        MemoryDecoder::new(WaveFormat::new(1, 2000).unwrap(), samples)
    }

    #[test]
    fn test_full_pull() {
        let mut decoder = decoder(vec![1, -2, 3, 4]);
        let mut scratch = Vec::new();
        let block = pull(&mut decoder, 6, &mut scratch).unwrap();
        assert_eq!(block.produced(), 6);
        assert_eq!(block.bytes(), &[1, 0, 0xfe, 0xff, 3, 0]);
    }

    #[test]
    fn test_short_pull_is_zero_padded() {
        let mut decoder = decoder(vec![0x0101; 3]);
        let mut scratch = Vec::new();
        let block = pull(&mut decoder, 16, &mut scratch).unwrap();
        assert_eq!(block.produced(), 6);
        assert_eq!(block.bytes().len(), 16);
        assert!(block.bytes()[..6].iter().all(|&b| b == 1));
        assert!(block.bytes()[6..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_exhausted_pull() {
        let mut decoder = decoder(vec![]);
        let mut scratch = Vec::new();
        let block = pull(&mut decoder, 16, &mut scratch).unwrap();
        assert!(block.is_exhausted());
        assert!(block.bytes().is_empty());
    }

    #[test]
    fn test_scratch_is_reused() {
        let mut decoder = decoder(vec![7; 8]);
        let mut scratch = vec![99; 100];
        let block = pull(&mut decoder, 8, &mut scratch).unwrap();
        assert_eq!(block.bytes(), &[7, 0, 7, 0, 7, 0, 7, 0]);
        assert_eq!(scratch.len(), 4);
    }
}
