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
    path::{Path, PathBuf},
    sync::Arc,
    thread,
    time::{Duration, Instant},
};

use hound::{SampleFormat, WavSpec, WavWriter};

use crate::audio::format::WaveFormat;
use crate::audio::mock;
use crate::system::{AudioSystem, ErrorLog};

/// Wait for the given predicate to return true or fail.
#[inline]
pub fn eventually<F>(predicate: F, error_msg: &str)
where
    F: Fn() -> bool,
{
    let start = Instant::now();
    let tick = Duration::from_millis(10);
    let timeout = Duration::from_secs(3);

    loop {
        if start.elapsed() > timeout {
            panic!("{}", error_msg);
        }
        if predicate() {
            return;
        }
        thread::sleep(tick);
    }
}

/// Writes interleaved 16-bit samples to a wav file in `dir`.
pub fn write_wav(
    dir: &Path,
    name: &str,
    channels: u16,
    sample_rate: u32,
    samples: &[i16],
) -> PathBuf {
    let path = dir.join(name);
    let mut writer = WavWriter::create(
        &path,
        WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        },
    )
    .expect("unable to create wav");
    for sample in samples {
        writer.write_sample(*sample).expect("unable to write sample");
    }
    writer.finalize().expect("unable to finalize wav");
    path
}

/// A ramp that never repeats a value within 32768 samples, so any misplaced
/// block shows up in a comparison.
pub fn ramp(len: usize) -> Vec<i16> {
    (0..len).map(|i| (i % 32768) as i16).collect()
}

/// The little endian bytes of the given samples.
pub fn bytes_of(samples: &[i16]) -> Vec<u8> {
    samples.iter().flat_map(|sample| sample.to_le_bytes()).collect()
}

/// A 1kHz mono format: one second is 2000 bytes and the streaming buffer 4000.
pub fn small_format() -> WaveFormat {
    WaveFormat::new(1, 1000).expect("valid format")
}

/// An audio system on a manually clocked mock device.
pub struct MockSystem {
    pub device: Arc<mock::Device>,
    pub errors: Arc<ErrorLog>,
    pub system: Arc<AudioSystem>,
}

impl MockSystem {
    pub fn new() -> MockSystem {
        let device = Arc::new(mock::Device::get("mock-device"));
        let errors = Arc::new(ErrorLog::new());
        let system = AudioSystem::init(device.clone(), errors.clone());
        MockSystem {
            device,
            errors,
            system,
        }
    }
}
