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
use std::collections::VecDeque;

use parking_lot::Mutex;
use tracing::error;

/// Number of recent messages an [ErrorLog] keeps around.
const DEFAULT_HISTORY: usize = 64;

/// Where the engine reports non-fatal failures. Posting never fails and never
/// blocks for long; the engine carries on afterwards.
pub trait ErrorChannel: Send + Sync {
    fn post_error(&self, message: &str);
}

/// The default error channel: logs every message and remembers the most
/// recent ones.
pub struct ErrorLog {
    history: Mutex<VecDeque<String>>,
    capacity: usize,
}

impl ErrorLog {
    pub fn new() -> ErrorLog {
        ErrorLog::with_capacity(DEFAULT_HISTORY)
    }

    pub fn with_capacity(capacity: usize) -> ErrorLog {
        ErrorLog {
            history: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    /// The most recent messages, oldest first.
    pub fn recent(&self) -> Vec<String> {
        self.history.lock().iter().cloned().collect()
    }

    pub fn clear(&self) {
        self.history.lock().clear();
    }
}

impl Default for ErrorLog {
    fn default() -> Self {
        ErrorLog::new()
    }
}

impl ErrorChannel for ErrorLog {
    fn post_error(&self, message: &str) {
        error!(err = message, "Audio error");

        if self.capacity == 0 {
            return;
        }
        let mut history = self.history.lock();
        if history.len() == self.capacity {
            history.pop_front();
        }
        history.push_back(message.to_string());
    }
}
