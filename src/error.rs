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

use crate::audio::error::{DecodeError, HardwareError};
use crate::config::error::ConfigError;

/// Errors surfaced to callers of the playback API.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unable to open {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("decode error: {0}")]
    Decode(DecodeError),

    #[error("hardware error: {0}")]
    Hardware(#[from] HardwareError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("the audio system has been shut down")]
    SystemShutdown,
}

impl From<DecodeError> for Error {
    fn from(e: DecodeError) -> Self {
        match e {
            DecodeError::Io { path, source } => Error::Io { path, source },
            e => Error::Decode(e),
        }
    }
}
