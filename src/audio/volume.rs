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

//! Conversions between the logical volume/pan scales exposed to game code and
//! the hundredths-of-a-decibel units hardware buffers work in.

/// Quietest hardware volume (-100 dB).
pub const VOLUME_MIN: i32 = -10000;
/// Loudest hardware volume (no attenuation).
pub const VOLUME_MAX: i32 = 0;
/// Hardware pan fully to the left.
pub const PAN_LEFT: i32 = -10000;
/// Hardware pan fully to the right.
pub const PAN_RIGHT: i32 = 10000;
/// Hardware pan with both channels at full level.
pub const PAN_CENTER: i32 = 0;

/// Linearly maps `value` from the range `[from_min, from_max]` onto `[min, max]`.
pub fn scale_between(value: f32, min: f32, max: f32, from_min: f32, from_max: f32) -> f32 {
    (max - min) * (value - from_min) / (from_max - from_min) + min
}

/// Maps a logical 0..100 volume onto a logarithmic hardware attenuation.
/// Out of range volumes are clamped.
pub fn volume_to_hundredths_db(volume: i32) -> i32 {
    let volume = volume.clamp(0, 100);
    let attenuation = 1.0 / 1024.0 + volume as f64 / 100.0 * 1023.0 / 1024.0;
    let db = 10.0 * attenuation.log10() / 2f64.log10();
    (db * 100.0) as i32
}

/// Inverse of [volume_to_hundredths_db], floored to the logical scale.
pub fn hundredths_db_to_volume(hundredths_db: i32) -> i32 {
    let volume = 10f32.powf((hundredths_db as f32 / 100.0) * 2f32.log10() / 10.0) * 100.0;
    volume.floor() as i32
}

/// Maps a logical 0..100 volume linearly onto the hardware range. Used by
/// one-shot sounds.
pub fn linear_volume_to_hundredths_db(volume: i32) -> i32 {
    scale_between(
        volume as f32,
        VOLUME_MIN as f32,
        VOLUME_MAX as f32,
        0.0,
        100.0,
    ) as i32
}

/// Inverse of [linear_volume_to_hundredths_db].
pub fn hundredths_db_to_linear_volume(hundredths_db: i32) -> i32 {
    scale_between(
        hundredths_db as f32,
        0.0,
        100.0,
        VOLUME_MIN as f32,
        VOLUME_MAX as f32,
    ) as i32
}

/// Maps a logical -100..100 pan onto the hardware pan range.
pub fn pan_to_hardware(pan: i32) -> i32 {
    scale_between(pan as f32, PAN_LEFT as f32, PAN_RIGHT as f32, -100.0, 100.0) as i32
}

/// Inverse of [pan_to_hardware].
pub fn hardware_to_pan(pan: i32) -> i32 {
    scale_between(pan as f32, -100.0, 100.0, PAN_LEFT as f32, PAN_RIGHT as f32) as i32
}

/// Converts an attenuation in hundredths of a decibel into a linear gain.
pub fn gain(hundredths_db: i32) -> f32 {
    10f32.powf(hundredths_db as f32 / 2000.0)
}

/// Per-channel gains for a stereo pair at the given hardware pan. Panning
/// attenuates the opposite channel, leaving the favoured one at full level.
pub fn pan_gains(pan: i32) -> (f32, f32) {
    let pan = pan.clamp(PAN_LEFT, PAN_RIGHT);
    if pan < PAN_CENTER {
        (1.0, gain(pan))
    } else {
        (gain(-pan), 1.0)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_volume_to_hundredths_db() {
        assert_eq!(volume_to_hundredths_db(100), 0);
        assert_eq!(volume_to_hundredths_db(0), -10000);
        assert_eq!(volume_to_hundredths_db(50), -998);
    }

    #[test]
    fn test_volume_out_of_range_is_clamped() {
        assert_eq!(volume_to_hundredths_db(-1), -10000);
        assert_eq!(volume_to_hundredths_db(i32::MIN), -10000);
        assert_eq!(volume_to_hundredths_db(150), 0);
    }

    #[test]
    fn test_volume_round_trip() {
        for volume in [0, 50, 100] {
            let restored = hundredths_db_to_volume(volume_to_hundredths_db(volume));
            assert!(
                (restored - volume).abs() <= 1,
                "volume {} came back as {}",
                volume,
                restored
            );
        }
    }

    #[test]
    fn test_volume_is_monotonic() {
        let mut last = i32::MIN;
        for volume in 0..=100 {
            let db = volume_to_hundredths_db(volume);
            assert!(db >= last);
            last = db;
        }
    }

    #[test]
    fn test_linear_volume() {
        assert_eq!(linear_volume_to_hundredths_db(0), VOLUME_MIN);
        assert_eq!(linear_volume_to_hundredths_db(50), -5000);
        assert_eq!(linear_volume_to_hundredths_db(100), VOLUME_MAX);
        assert_eq!(hundredths_db_to_linear_volume(-5000), 50);
        assert_eq!(hundredths_db_to_linear_volume(VOLUME_MAX), 100);
    }

    #[test]
    fn test_pan() {
        assert_eq!(pan_to_hardware(-100), PAN_LEFT);
        assert_eq!(pan_to_hardware(0), PAN_CENTER);
        assert_eq!(pan_to_hardware(100), PAN_RIGHT);
        assert_eq!(pan_to_hardware(25), 2500);
        assert_eq!(hardware_to_pan(PAN_LEFT), -100);
        assert_eq!(hardware_to_pan(-2500), -25);
        assert_eq!(hardware_to_pan(PAN_RIGHT), 100);
    }

    #[test]
    fn test_pan_gains() {
        assert_eq!(pan_gains(PAN_CENTER), (1.0, 1.0));

        let (left, right) = pan_gains(PAN_LEFT);
        assert_eq!(left, 1.0);
        assert!(right < 0.0001);

        let (left, right) = pan_gains(PAN_RIGHT);
        assert!(left < 0.0001);
        assert_eq!(right, 1.0);
    }

    #[test]
    fn test_gain() {
        assert_eq!(gain(0), 1.0);
        assert!((gain(-2000) - 0.1).abs() < 1e-6);
    }
}
