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
use std::error::Error;
use std::path::PathBuf;
use std::time::Duration;

use clap::{crate_version, Args, Parser, Subcommand};
use tracing::info;

use trackstream::audio::{self, decoder};
use trackstream::config;
use trackstream::util::duration_minutes_seconds;
use trackstream::{AudioSystem, Driver, Sound, Track, TrackState};

/// How often the CLI checks whether playback has finished.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Parser)]
#[clap(
    author = "Michael Wilson",
    version = crate_version!(),
    about = "Streams music and plays sounds through circular hardware buffers."
)]
struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct Output {
    /// The audio config file (YAML).
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// The device to play through. Overrides the config file.
    #[arg(short, long)]
    device: Option<String>,
    /// Volume, 0..100. Overrides the config file.
    #[arg(short, long)]
    volume: Option<i32>,
    /// Pan, -100 (left) ..100 (right). Overrides the config file.
    #[arg(short, long, allow_negative_numbers = true)]
    pan: Option<i32>,
}

#[derive(Subcommand)]
enum Commands {
    /// Lists the available audio output devices.
    Devices {},
    /// Prints the PCM format and length of an audio file.
    Info {
        /// The audio file.
        path: PathBuf,
    },
    /// Streams an audio file as music until it ends.
    Play {
        /// The audio file.
        path: PathBuf,
        #[command(flatten)]
        output: Output,
    },
    /// Loads an audio file into memory and plays it once.
    Sound {
        /// The audio file.
        path: PathBuf,
        #[command(flatten)]
        output: Output,
        /// Loop the sound until interrupted.
        #[arg(short, long = "loop")]
        looping: bool,
    },
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Devices {} => {
            let devices = audio::list_devices()?;

            if devices.is_empty() {
                println!("No devices found.");
                return Ok(());
            }

            println!("Devices:");
            for device in devices {
                println!("- {}", device);
            }
        }
        Commands::Info { path } => {
            let decoder = decoder::open(&path)?;
            let format = decoder.format();
            println!("{}:", path.display());
            println!("  Format: {}", format);
            println!("  Bytes per second: {}", format.avg_bytes_per_sec());
            println!("  Duration: {}", duration_minutes_seconds(decoder.duration()));
        }
        Commands::Play { path, output } => {
            let config = output.load()?;
            let system = AudioSystem::with_device(audio::get_device(&config)?);
            let driver = Driver::start(
                system.clone(),
                config.tick_interval()?,
                config.driver_priority(),
            );

            let track = Track::open(&system, &path)?;
            track.set_volume(config.volume())?;
            track.set_pan(config.pan())?;
            info!(track = track.name(), format = %track.format(), "Streaming.");
            track.play()?;

            while track.state() == TrackState::Playing {
                std::thread::sleep(POLL_INTERVAL);
            }

            track.release();
            driver.stop();
            system.shutdown();
        }
        Commands::Sound {
            path,
            output,
            looping,
        } => {
            let config = output.load()?;
            let system = AudioSystem::with_device(audio::get_device(&config)?);

            let sound = Sound::load(&system, &path)?;
            sound.set_volume(config.volume())?;
            sound.set_pan(config.pan())?;
            sound.set_loop(looping)?;
            sound.play()?;

            while sound.is_playing()? {
                std::thread::sleep(POLL_INTERVAL);
            }
            sound.release();
        }
    }

    Ok(())
}

impl Output {
    /// Loads the config file, then applies the command line overrides.
    fn load(&self) -> Result<config::Audio, Box<dyn Error>> {
        let mut config = config::load(self.config.as_deref())?;
        if let Some(device) = &self.device {
            config = config.with_device(device);
        }
        if let Some(volume) = self.volume {
            config = config.with_volume(volume);
        }
        if let Some(pan) = self.pan {
            config = config.with_pan(pan);
        }
        config.validate()?;
        Ok(config)
    }
}
