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
use std::path::Path;

use config::{Config, Environment, File};

pub mod audio;
pub mod error;

pub use audio::Audio;

use self::error::ConfigError;

/// Prefix of the environment variables that override file settings, e.g.
/// TRACKSTREAM_DEVICE or TRACKSTREAM_TICK_INTERVAL.
const ENV_PREFIX: &str = "TRACKSTREAM";

/// Loads the audio configuration from an optional YAML file, then applies any
/// TRACKSTREAM_* environment overrides.
pub fn load(path: Option<&Path>) -> Result<Audio, ConfigError> {
    let mut builder = Config::builder();
    if let Some(path) = path {
        builder = builder.add_source(File::from(path));
    }
    let audio = builder
        .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
        .build()?
        .try_deserialize::<Audio>()?;
    audio.validate()?;
    Ok(audio)
}

#[cfg(test)]
mod test {
    use std::{fs, time::Duration};

    use super::*;

    #[test]
    fn test_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audio.yaml");
        fs::write(
            &path,
            r#"
            device: mock-device
            tick_interval: 20ms
            volume: 80
            pan: -30
            "#,
        )
        .unwrap();

        let audio = load(Some(&path)).unwrap();
        assert_eq!(audio.device(), "mock-device");
        assert_eq!(audio.tick_interval().unwrap(), Duration::from_millis(20));
        assert_eq!(audio.volume(), 80);
        assert_eq!(audio.pan(), -30);
        assert_eq!(audio.driver_priority(), None);
    }

    #[test]
    fn test_load_missing_file() {
        let result = load(Some(Path::new("/definitely/not/here.yaml")));
        assert!(matches!(result, Err(ConfigError::Load(_))));
    }

    #[test]
    fn test_load_rejects_out_of_range() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audio.yaml");
        fs::write(&path, "volume: 150\n").unwrap();

        let result = load(Some(&path));
        assert!(matches!(
            result,
            Err(ConfigError::OutOfRange { field: "volume", .. })
        ));
    }
}
