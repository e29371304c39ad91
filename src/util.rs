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
use std::time::Duration;

/// The file name of a path for log and error messages.
pub fn filename_display(path: &Path) -> &str {
    path.file_name()
        .and_then(|f| f.to_str())
        .unwrap_or("unreadable file name")
}

/// Outputs the given duration in a minutes:seconds format, or "unknown" for
/// streams that do not report a length.
pub fn duration_minutes_seconds(duration: Option<Duration>) -> String {
    match duration {
        Some(duration) => {
            let minutes = duration.as_secs() / 60;
            let secs = duration.as_secs() % 60;
            format!("{}:{:02}", minutes, secs)
        }
        None => "unknown".to_string(),
    }
}

#[cfg(test)]
mod test {
    use std::path::Path;
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_duration_minutes_strings() {
        let cases = [(0, "0:00"), (5, "0:05"), (60, "1:00"), (125, "2:05"), (3606, "60:06")];
        for (secs, expected) in cases {
            assert_eq!(expected, duration_minutes_seconds(Some(Duration::from_secs(secs))));
        }
        assert_eq!("unknown", duration_minutes_seconds(None));
    }

    #[test]
    fn test_filename_display() {
        assert_eq!(filename_display(Path::new("music/level1.ogg")), "level1.ogg");
        assert_eq!(filename_display(Path::new("/")), "unreadable file name");
    }
}
