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
use std::path::PathBuf;

/// Errors raised by a hardware playback buffer. None of these are fatal to the
/// process; the engine reports them and carries on with the next tick.
#[derive(Debug, thiserror::Error)]
pub enum HardwareError {
    #[error("buffer is already locked at offset {offset} ({len} bytes)")]
    AlreadyLocked { offset: usize, len: usize },

    #[error("lock of {len} bytes at offset {offset} is outside a {capacity} byte buffer")]
    OutOfRange {
        offset: usize,
        len: usize,
        capacity: usize,
    },

    #[error("buffer is not locked")]
    NotLocked,

    #[error("span at offset {offset} ({len} bytes) is not part of the current lock")]
    SpanMismatch { offset: usize, len: usize },

    #[error("injected failure: {0}")]
    Injected(&'static str),

    #[error("device error: {0}")]
    Device(String),

    #[error("output stream error: {0}")]
    Stream(String),
}

/// Errors raised while opening or decoding a compressed audio resource.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("audio file error: {0}")]
    Audio(#[from] symphonia::core::errors::Error),

    #[error("unsupported audio: {0}")]
    Unsupported(String),
}
