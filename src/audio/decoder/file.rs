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
    fs::File,
    path::{Path, PathBuf},
    time::Duration,
};

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader, Packet, SeekMode, SeekTo};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::default::{get_codecs, get_probe};
use tracing::{debug, warn};

use super::Decoder;
use crate::audio::error::DecodeError;
use crate::audio::format::WaveFormat;

/// Streams 16-bit PCM out of any container/codec symphonia can read. Ogg
/// Vorbis is the expected input; WAV, FLAC and friends work as well.
pub struct SymphoniaDecoder {
    path: PathBuf,
    format_reader: Box<dyn FormatReader>,
    decoder: Box<dyn symphonia::core::codecs::Decoder>,
    track_id: u32,
    format: WaveFormat,
    duration: Option<Duration>,
    // Samples from the last decoded packet not yet handed out.
    pending: Vec<i16>,
    pending_position: usize,
    finished: bool,
}

impl SymphoniaDecoder {
    /// Opens the given file and prepares it for decoding.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<SymphoniaDecoder, DecodeError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| DecodeError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mss = MediaSourceStream::new(Box::new(file), Default::default());

        let mut hint = Hint::new();
        if let Some(extension) = path.extension().and_then(|ext| ext.to_str()) {
            hint.with_extension(extension);
        }

        let meta_opts: MetadataOptions = Default::default();
        let fmt_opts: FormatOptions = Default::default();
        let probed = get_probe()
            .format(&hint, mss, &fmt_opts, &meta_opts)
            .map_err(|e| DecodeError::Unsupported(format!("'{}': {}", path.display(), e)))?;
        let format_reader = probed.format;

        let track = format_reader
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(|| DecodeError::Unsupported("no audio track found".to_string()))?;
        let track_id = track.id;
        let params = track.codec_params.clone();

        let sample_rate = params
            .sample_rate
            .ok_or_else(|| DecodeError::Unsupported("sample rate not specified".to_string()))?;
        let duration = params
            .n_frames
            .map(|frames| Duration::from_secs_f64(frames as f64 / sample_rate as f64));

        let decoder_opts: DecoderOptions = Default::default();
        let decoder = get_codecs()
            .make(&params, &decoder_opts)
            .map_err(|e| DecodeError::Unsupported(format!("'{}': {}", path.display(), e)))?;

        let mut source = SymphoniaDecoder {
            path: path.to_path_buf(),
            format_reader,
            decoder,
            track_id,
            // Replaced below once the channel count is known.
            format: WaveFormat::new(1, sample_rate)?,
            duration,
            pending: Vec::new(),
            pending_position: 0,
            finished: false,
        };

        // Some containers leave the channel layout to the codec; decode the
        // first packet to find out and keep its samples for the first read.
        let channels = match params.channels {
            Some(channels) => channels.count() as u16,
            None => match source.next_packet_samples()? {
                Some(channels) => channels,
                None => {
                    return Err(DecodeError::Unsupported(
                        "channels not specified".to_string(),
                    ))
                }
            },
        };
        source.format = WaveFormat::new(channels, sample_rate)?;

        debug!(
            path = %path.display(),
            format = %source.format,
            "Opened audio stream."
        );
        Ok(source)
    }

    fn read_next_packet(&mut self) -> Result<Option<Packet>, DecodeError> {
        loop {
            match self.format_reader.next_packet() {
                Ok(packet) if packet.track_id() == self.track_id => return Ok(Some(packet)),
                Ok(_) => continue,
                Err(SymphoniaError::ResetRequired) => {
                    self.decoder.reset();
                    continue;
                }
                Err(SymphoniaError::IoError(e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    return Ok(None)
                }
                Err(e) => return Err(DecodeError::Audio(e)),
            }
        }
    }

    /// Decodes the next packet into the pending buffer. Returns the channel
    /// count of the decoded audio, or None at the end of the stream.
    fn next_packet_samples(&mut self) -> Result<Option<u16>, DecodeError> {
        loop {
            let packet = match self.read_next_packet()? {
                Some(packet) => packet,
                None => return Ok(None),
            };

            let decoded = match self.decoder.decode(&packet) {
                Ok(decoded) => decoded,
                // Corrupt packets are skipped rather than ending the stream.
                Err(SymphoniaError::DecodeError(e)) => {
                    warn!(path = %self.path.display(), err = e, "Skipping undecodable packet");
                    continue;
                }
                Err(e) => return Err(DecodeError::Audio(e)),
            };

            // Header packets decode to no frames.
            if decoded.frames() == 0 {
                continue;
            }

            let spec = *decoded.spec();
            let mut samples = SampleBuffer::<i16>::new(decoded.capacity() as u64, spec);
            samples.copy_interleaved_ref(decoded);

            self.pending.clear();
            self.pending.extend_from_slice(samples.samples());
            self.pending_position = 0;
            return Ok(Some(spec.channels.count() as u16));
        }
    }
}

impl Decoder for SymphoniaDecoder {
    fn format(&self) -> WaveFormat {
        self.format
    }

    fn decode(&mut self, max_samples: usize, out: &mut Vec<i16>) -> Result<usize, DecodeError> {
        let mut produced = 0;
        while produced < max_samples {
            if self.pending_position >= self.pending.len() {
                if self.finished || self.next_packet_samples()?.is_none() {
                    self.finished = true;
                    break;
                }
            }

            let available = &self.pending[self.pending_position..];
            let count = available.len().min(max_samples - produced);
            out.extend_from_slice(&available[..count]);
            self.pending_position += count;
            produced += count;
        }
        Ok(produced)
    }

    fn reset(&mut self) -> Result<(), DecodeError> {
        let seek_to = SeekTo::TimeStamp {
            ts: 0,
            track_id: self.track_id,
        };
        match self.format_reader.seek(SeekMode::Accurate, seek_to) {
            Ok(_) => {
                self.decoder.reset();
                self.pending.clear();
                self.pending_position = 0;
                self.finished = false;
            }
            Err(e) => {
                // Not every container can seek; starting over always works.
                debug!(path = %self.path.display(), err = %e, "Seek failed, reopening stream");
                *self = SymphoniaDecoder::open(self.path.clone())?;
            }
        }
        Ok(())
    }

    fn duration(&self) -> Option<Duration> {
        self.duration
    }
}

#[cfg(test)]
mod test {
    use std::time::Duration;

    use super::*;
    use crate::testutil::write_wav;

    #[test]
    fn test_open_missing_file() {
        let result = SymphoniaDecoder::open("/definitely/not/here.ogg");
        assert!(matches!(result, Err(DecodeError::Io { .. })));
    }

    #[test]
    fn test_decode_wav() {
        let dir = tempfile::tempdir().unwrap();
        let samples: Vec<i16> = (0..4000).map(|i| (i % 1000) as i16 - 500).collect();
        let path = write_wav(dir.path(), "tone.wav", 2, 2000, &samples);

        let mut decoder = SymphoniaDecoder::open(&path).unwrap();
        assert_eq!(decoder.format(), WaveFormat::new(2, 2000).unwrap());
        assert_eq!(decoder.duration(), Some(Duration::from_secs(1)));

        let mut out = Vec::new();
        assert_eq!(decoder.decode(1000, &mut out).unwrap(), 1000);
        assert_eq!(out[..], samples[..1000]);

        while decoder.decode(1000, &mut out).unwrap() > 0 {}
        assert_eq!(out, samples);
        assert_eq!(decoder.decode(1000, &mut out).unwrap(), 0);
    }

    #[test]
    fn test_reset_rewinds() {
        let dir = tempfile::tempdir().unwrap();
        let samples: Vec<i16> = (0..3000).map(|i| i as i16).collect();
        let path = write_wav(dir.path(), "ramp.wav", 1, 1000, &samples);

        let mut decoder = SymphoniaDecoder::open(&path).unwrap();
        let mut out = Vec::new();
        while decoder.decode(512, &mut out).unwrap() > 0 {}
        assert_eq!(out.len(), samples.len());

        decoder.reset().unwrap();
        let mut again = Vec::new();
        assert_eq!(decoder.decode(10, &mut again).unwrap(), 10);
        assert_eq!(again, samples[..10].to_vec());
    }
}
