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
use thread_priority::{set_current_thread_priority, ThreadPriority, ThreadPriorityValue};
use tracing::{info, warn};

pub(crate) fn env_flag(name: &str) -> bool {
    std::env::var(name)
        .ok()
        .map(|v| {
            v == "1"
                || v.eq_ignore_ascii_case("true")
                || v.eq_ignore_ascii_case("yes")
                || v.eq_ignore_ascii_case("on")
        })
        .unwrap_or(false)
}

/// Returns whether the driver thread may ask for RT (SCHED_FIFO) scheduling.
/// Opt out with TRACKSTREAM_DISABLE_RT_DRIVER=1.
pub fn rt_driver_enabled() -> bool {
    !env_flag("TRACKSTREAM_DISABLE_RT_DRIVER")
}

/// Raises the calling thread to the given priority (0-99). Failures are
/// logged and otherwise ignored; the driver still runs at normal priority.
pub fn raise_current_thread(priority: u8, rt: bool) {
    let value = match ThreadPriorityValue::try_from(priority) {
        Ok(value) => value,
        Err(e) => {
            warn!(priority, error = ?e, "Invalid driver thread priority");
            return;
        }
    };
    let tp = ThreadPriority::Crossplatform(value);
    if let Err(e) = set_current_thread_priority(tp) {
        warn!(priority, error = ?e, "Failed to set driver thread priority");
    }

    #[cfg(unix)]
    if rt {
        use thread_priority::unix::{
            set_thread_priority_and_policy, thread_native_id, RealtimeThreadSchedulePolicy,
            ThreadSchedulePolicy,
        };
        match set_thread_priority_and_policy(
            thread_native_id(),
            tp,
            ThreadSchedulePolicy::Realtime(RealtimeThreadSchedulePolicy::Fifo),
        ) {
            Ok(()) => info!(priority, "Enabled RT SCHED_FIFO for driver thread"),
            Err(e) => warn!(error = %e, "Failed to set RT SCHED_FIFO for driver thread"),
        }
    }
    #[cfg(not(unix))]
    let _ = rt;
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_env_flag() {
        std::env::set_var("TRACKSTREAM_TEST_FLAG_ON", "Yes");
        std::env::set_var("TRACKSTREAM_TEST_FLAG_OFF", "0");
        assert!(env_flag("TRACKSTREAM_TEST_FLAG_ON"));
        assert!(!env_flag("TRACKSTREAM_TEST_FLAG_OFF"));
        assert!(!env_flag("TRACKSTREAM_TEST_FLAG_UNSET"));
    }
}
