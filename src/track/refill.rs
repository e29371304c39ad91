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
use std::sync::Arc;

use crate::audio::signal::Signal;

/// Index of the signal raised when the play cursor wraps to the start of the
/// buffer.
pub const SIGNAL_WRAP: usize = 0;
/// Index of the signal raised when the play cursor crosses the midpoint.
pub const SIGNAL_MIDPOINT: usize = 1;

/// Where and how much to refill after a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefillRequest {
    pub offset: usize,
    pub len: usize,
}

/// Polls both refill signals without blocking and decides which half of the
/// buffer to refill. A wrap refills the second half, a midpoint crossing the
/// first. Only one signal is consumed per poll; if both were raised the
/// other is left for the next tick.
pub fn poll(signals: &[Arc<Signal>; 2], half: usize) -> Option<RefillRequest> {
    if signals[SIGNAL_WRAP].poll_and_clear() {
        Some(RefillRequest {
            offset: half,
            len: half,
        })
    } else if signals[SIGNAL_MIDPOINT].poll_and_clear() {
        Some(RefillRequest {
            offset: 0,
            len: half,
        })
    } else {
        None
    }
}
