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
use crate::audio::buffer::{BufferLock, HardwareBuffer, LockFlags, LockedRegion};
use crate::audio::error::HardwareError;

/// A failed buffer transaction. The lock is always released before one of
/// these is returned.
#[derive(Debug, thiserror::Error)]
pub enum CommitError {
    #[error("failed to lock music buffer: {0}")]
    Lock(HardwareError),

    #[error("failed to write music buffer: {0}")]
    Write(HardwareError),

    #[error("failed to unlock music buffer: {0}")]
    Unlock(HardwareError),
}

/// Writes `data` into the buffer starting at `offset`, wrapping at the end
/// of the buffer. With `init_cursors`, every locked span is zeroed before the
/// data is copied in.
pub fn commit(
    buffer: &dyn HardwareBuffer,
    offset: usize,
    data: &[u8],
    init_cursors: bool,
) -> Result<LockedRegion, CommitError> {
    let lock =
        BufferLock::acquire(buffer, offset, data.len(), LockFlags::NONE).map_err(CommitError::Lock)?;

    if init_cursors {
        lock.zero().map_err(CommitError::Write)?;
    }
    lock.write(data).map_err(CommitError::Write)?;

    let region = *lock.region();
    lock.release().map_err(CommitError::Unlock)?;
    Ok(region)
}

/// Zero-fills the entire buffer in one transaction.
pub fn clear(buffer: &dyn HardwareBuffer) -> Result<(), CommitError> {
    let lock =
        BufferLock::acquire(buffer, 0, 0, LockFlags::ENTIRE_BUFFER).map_err(CommitError::Lock)?;
    lock.zero().map_err(CommitError::Write)?;
    lock.release().map_err(CommitError::Unlock)
}

#[cfg(test)]
mod test {
    use crate::audio::buffer::{BufferDesc, HardwareBuffer, Span};
    use crate::audio::format::WaveFormat;
    use crate::audio::ring::RingBuffer;

    use super::*;

    fn buffer(capacity: usize) -> RingBuffer {
        RingBuffer::new(BufferDesc {
            format: WaveFormat::new(1, 2000).unwrap(),
            capacity,
            notifications: vec![],
        })
        .unwrap()
    }

    #[test]
    fn test_commit_single_span() {
        let buffer = buffer(8);
        let region = commit(&buffer, 2, &[1, 2, 3, 4], false).unwrap();
        assert_eq!(region.first(), Some(Span::new(2, 4)));
        assert_eq!(buffer.contents(), vec![0, 0, 1, 2, 3, 4, 0, 0]);
        assert!(!buffer.is_locked());
    }

    #[test]
    fn test_commit_wrapped_split_at_first_span() {
        let buffer = buffer(8);
        let data = [1, 2, 3, 4, 5, 6];
        let region = commit(&buffer, 4, &data, false).unwrap();

        let first = region.first().unwrap();
        let second = region.second().unwrap();
        assert_eq!(first.len + second.len, data.len());

        let contents = buffer.contents();
        assert_eq!(&contents[first.offset..first.end()], &data[..first.len]);
        assert_eq!(&contents[second.offset..second.end()], &data[first.len..]);
    }

    #[test]
    fn test_lock_failure_leaves_buffer_untouched() {
        let buffer = buffer(8);
        commit(&buffer, 0, &[9; 8], false).unwrap();

        buffer.fail_next_lock();
        let result = commit(&buffer, 0, &[1; 4], false);
        assert!(matches!(result, Err(CommitError::Lock(_))));
        assert_eq!(buffer.contents(), vec![9; 8]);
        assert!(!buffer.is_locked());
    }

    #[test]
    fn test_unlock_failure_is_reported() {
        let buffer = buffer(8);
        buffer.fail_next_unlock();
        let result = commit(&buffer, 0, &[1; 4], false);
        assert!(matches!(result, Err(CommitError::Unlock(_))));
        assert!(!buffer.is_locked());

        // The next transaction goes through.
        commit(&buffer, 4, &[2; 4], false).unwrap();
        assert_eq!(buffer.contents(), vec![1, 1, 1, 1, 2, 2, 2, 2]);
    }

    #[test]
    fn test_commit_on_held_buffer_fails() {
        let buffer = buffer(8);
        let held = buffer.lock(0, 2, LockFlags::NONE).unwrap();
        assert!(matches!(
            commit(&buffer, 0, &[1; 2], false),
            Err(CommitError::Lock(HardwareError::AlreadyLocked { .. }))
        ));
        buffer.unlock(held).unwrap();
        assert!(!buffer.is_locked());
    }

    #[test]
    fn test_clear() {
        let buffer = buffer(8);
        commit(&buffer, 6, &[5; 4], false).unwrap();
        clear(&buffer).unwrap();
        assert_eq!(buffer.contents(), vec![0; 8]);
        assert!(!buffer.is_locked());
    }
}
