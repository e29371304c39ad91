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
use std::sync::atomic::{AtomicBool, Ordering};

/// A binary, auto-resetting notification set by the hardware side when the
/// play cursor crosses a buffer offset, and consumed by the engine with a
/// non-blocking poll.
#[derive(Debug, Default)]
pub struct Signal {
    set: AtomicBool,
}

impl Signal {
    /// Creates a new unset signal.
    pub fn new() -> Signal {
        Signal {
            set: AtomicBool::new(false),
        }
    }

    /// Raises the signal. Raising an already raised signal is a no-op.
    pub fn set(&self) {
        self.set.store(true, Ordering::Release);
    }

    /// Returns whether the signal was raised, clearing it in the same step.
    pub fn poll_and_clear(&self) -> bool {
        self.set.swap(false, Ordering::AcqRel)
    }

    /// Clears the signal without consuming it.
    pub fn reset(&self) {
        self.set.store(false, Ordering::Release);
    }

    /// Returns whether the signal is currently raised without clearing it.
    pub fn is_set(&self) -> bool {
        self.set.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod test {
    use std::{sync::Arc, thread};

    use super::Signal;

    #[test]
    fn test_poll_and_clear() {
        let signal = Signal::new();
        assert!(!signal.poll_and_clear());

        signal.set();
        assert!(signal.is_set());
        assert!(signal.poll_and_clear());
        assert!(!signal.poll_and_clear());
        assert!(!signal.is_set());
    }

    #[test]
    fn test_set_is_edge_not_count() {
        let signal = Signal::new();
        signal.set();
        signal.set();
        assert!(signal.poll_and_clear());
        assert!(!signal.poll_and_clear());
    }

    #[test]
    fn test_reset() {
        let signal = Signal::new();
        signal.set();
        signal.reset();
        assert!(!signal.is_set());
        assert!(!signal.poll_and_clear());
    }

    #[test]
    fn test_set_from_another_thread() {
        let signal = Arc::new(Signal::new());
        let remote = signal.clone();
        thread::spawn(move || remote.set()).join().unwrap();
        assert!(signal.poll_and_clear());
    }
}
