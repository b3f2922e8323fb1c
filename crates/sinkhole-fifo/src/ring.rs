//! The ring log store: append, ranged reads and catch-up tails.

use tracing::debug;

use crate::cursor::CursorPosition;
use crate::layout::{self, HeapSegment};
use crate::FifoError;

/// One retained log line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    /// Id assigned at append time.
    pub sequence_id: u64,
    /// Epoch seconds.
    pub timestamp: i64,
    /// Message text (lossy if a concurrent write tore it).
    pub message: String,
}

/// Result of a catch-up read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TailPage {
    /// Entries from the resolved start position to the newest one.
    pub entries: Vec<LogEntry>,
    /// Store's `next_id` when the read started.
    pub next_id: u64,
}

/// Fixed-capacity circular log over any byte buffer holding the segment layout.
///
/// Readers only need `B: AsRef<[u8]>`; appending needs `AsMut<[u8]>` and a
/// `&mut` borrow, which keeps a single writer per handle.
#[derive(Debug)]
pub struct Ring<B> {
    buf: B,
    capacity: u32,
}

impl Ring<HeapSegment> {
    /// Heap-backed ring for single-process use and tests.
    pub fn in_memory(capacity: u32) -> crate::Result<Self> {
        layout::check_capacity(capacity)?;
        Self::create(HeapSegment::zeroed(layout::segment_len(capacity)), capacity)
    }
}

impl<B: AsRef<[u8]>> Ring<B> {
    /// Attach to an already formatted buffer.
    pub fn open(buf: B) -> crate::Result<Self> {
        let capacity = layout::decode_header(buf.as_ref())?;
        Ok(Self { buf, capacity })
    }

    /// Number of slots.
    pub const fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Backing buffer.
    pub const fn buffer(&self) -> &B {
        &self.buf
    }

    /// Id the next appended entry will receive.
    pub fn next_id(&self) -> u64 {
        layout::load_next_id(self.buf.as_ref())
    }

    /// True once a writer has replaced the segment behind this handle, or its
    /// header no longer describes the capacity this handle was opened with.
    ///
    /// A stale ring still serves what it held; callers that follow the log
    /// should reopen the segment path.
    pub fn is_stale(&self) -> bool {
        let buf = self.buf.as_ref();
        layout::is_retired(buf) || layout::header_capacity(buf) != self.capacity
    }

    /// Number of entries currently retained.
    pub fn len(&self) -> u32 {
        self.next_id().min(u64::from(self.capacity)) as u32
    }

    /// True when nothing has been appended yet.
    pub fn is_empty(&self) -> bool {
        self.next_id() == 0
    }

    /// Entries at positions `[start, end)`, oldest first.
    ///
    /// Stops early at the first never-written slot. Each call starts over.
    pub fn read_range(&self, start: u32, end: u32) -> Entries<'_> {
        self.entries_at(self.next_id(), start, end)
    }

    /// Catch-up read for a client whose next unseen id is `requested_id`.
    ///
    /// `None` returns everything currently retained.
    pub fn tail(&self, requested_id: Option<u64>) -> TailPage {
        let next_id = self.next_id();
        let start = match requested_id {
            Some(requested) => {
                let position = CursorPosition::classify(next_id, requested, self.capacity);
                debug!(requested, next_id, ?position, "resolved fifo cursor");
                position.start_slot(self.capacity)
            }
            None => 0,
        };

        TailPage {
            entries: self.entries_at(next_id, start, self.capacity).collect(),
            next_id,
        }
    }

    /// Most recently appended entry.
    pub fn newest(&self) -> Option<LogEntry> {
        let next_id = self.next_id();
        let id = next_id.checked_sub(1)?;
        let raw = layout::read_slot(self.buf.as_ref(), (id % u64::from(self.capacity)) as u32);
        (raw.timestamp != 0).then(|| LogEntry {
            sequence_id: raw.sequence_id,
            timestamp: raw.timestamp,
            message: String::from_utf8_lossy(raw.message).into_owned(),
        })
    }

    fn entries_at(&self, next_id: u64, start: u32, end: u32) -> Entries<'_> {
        let buf = self.buf.as_ref();
        // Slot offsets are only trusted while the header agrees with the
        // capacity this handle validated against its buffer length.
        let end = if layout::header_capacity(buf) == self.capacity {
            end.min(self.capacity)
        } else {
            start
        };
        Entries {
            buf,
            capacity: self.capacity,
            next_id,
            position: start,
            end,
        }
    }
}

impl<B: AsRef<[u8]> + AsMut<[u8]>> Ring<B> {
    /// Format `buf` as an empty ring of `capacity` slots.
    pub fn create(mut buf: B, capacity: u32) -> crate::Result<Self> {
        layout::format(buf.as_mut(), capacity)?;
        Ok(Self { buf, capacity })
    }

    /// Append one line.
    ///
    /// Writes slot `next_id mod capacity`, then publishes `next_id + 1`.
    /// Messages longer than a slot are truncated.
    pub fn append(&mut self, timestamp: i64, message: &str) -> crate::Result<()> {
        if timestamp <= 0 {
            return Err(FifoError::InvalidTimestamp(timestamp));
        }
        let id = self.next_id();
        let slot = (id % u64::from(self.capacity)) as u32;
        let message = layout::truncate_message(message);

        let buf = self.buf.as_mut();
        layout::write_slot(buf, slot, id, timestamp, message.as_bytes());
        layout::store_next_id(buf, id + 1);
        Ok(())
    }
}

/// Iterator returned by [`Ring::read_range`].
#[derive(Debug, Clone)]
pub struct Entries<'a> {
    buf: &'a [u8],
    capacity: u32,
    next_id: u64,
    position: u32,
    end: u32,
}

impl Entries<'_> {
    /// Physical slot holding logical position `position`.
    fn physical(&self, position: u32) -> u32 {
        let capacity = u64::from(self.capacity);
        if self.next_id >= capacity {
            ((self.next_id + u64::from(position)) % capacity) as u32
        } else {
            position
        }
    }
}

impl Iterator for Entries<'_> {
    type Item = LogEntry;

    fn next(&mut self) -> Option<LogEntry> {
        if self.position >= self.end {
            return None;
        }
        let raw = layout::read_slot(self.buf, self.physical(self.position));
        if raw.timestamp == 0 {
            // Never written: nothing after this either.
            self.position = self.end;
            return None;
        }
        self.position += 1;
        Some(LogEntry {
            sequence_id: raw.sequence_id,
            timestamp: raw.timestamp,
            message: String::from_utf8_lossy(raw.message).into_owned(),
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some((self.end.saturating_sub(self.position)) as usize))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::MAX_MESSAGE_LEN;

    fn filled(capacity: u32, timestamps: &[i64]) -> Ring<HeapSegment> {
        let mut ring = Ring::in_memory(capacity).unwrap();
        for &ts in timestamps {
            ring.append(ts, &format!("line {ts}")).unwrap();
        }
        ring
    }

    fn ids(page: &TailPage) -> Vec<u64> {
        page.entries.iter().map(|e| e.sequence_id).collect()
    }

    #[test]
    fn test_append_ordering() {
        let ring = filled(4, &[10, 11, 12, 13, 14, 15]);
        assert_eq!(ring.next_id(), 6);
        let newest = ring.newest().unwrap();
        assert_eq!(newest.sequence_id, 5);
        assert_eq!(newest.timestamp, 15);
        // Physical slot (n - 1) mod capacity holds the newest entry.
        assert_eq!(layout::read_slot(ring.buf.as_ref(), 1).sequence_id, 5);
    }

    #[test]
    fn test_fresh_ring_is_empty() {
        let ring = Ring::in_memory(3).unwrap();
        assert!(ring.is_empty());
        assert_eq!(ring.len(), 0);
        assert!(ring.newest().is_none());
        let page = ring.tail(None);
        assert!(page.entries.is_empty());
        assert_eq!(page.next_id, 0);
    }

    #[test]
    fn test_rejects_sentinel_timestamp() {
        let mut ring = Ring::in_memory(3).unwrap();
        assert!(matches!(ring.append(0, "x"), Err(FifoError::InvalidTimestamp(0))));
        assert!(ring.append(-5, "x").is_err());
        assert_eq!(ring.next_id(), 0);
    }

    #[test]
    fn test_capacity_five_scenario() {
        let ring = filled(5, &[1, 2, 3, 4, 5, 6, 7]);
        assert_eq!(ring.next_id(), 7);

        let page = ring.tail(Some(2));
        assert_eq!(ids(&page), vec![2, 3, 4, 5, 6]);
        let timestamps: Vec<i64> = page.entries.iter().map(|e| e.timestamp).collect();
        assert_eq!(timestamps, vec![3, 4, 5, 6, 7]);

        // Evicted cursor gets the full buffer.
        let page = ring.tail(Some(1));
        assert_eq!(ids(&page), vec![2, 3, 4, 5, 6]);

        let page = ring.tail(Some(5));
        assert_eq!(ids(&page), vec![5, 6]);
    }

    #[test]
    fn test_partial_ring_stops_at_sentinel() {
        let ring = filled(8, &[100, 101, 102]);
        let page = ring.tail(None);
        assert_eq!(ids(&page), vec![0, 1, 2]);
        assert_eq!(page.next_id, 3);

        let page = ring.tail(Some(1));
        assert_eq!(ids(&page), vec![1, 2]);
    }

    #[test]
    fn test_caught_up_round_trip() {
        let ring = filled(4, &[1, 2, 3, 4, 5, 6]);
        let first = ring.tail(None);
        let again = ring.tail(Some(first.next_id));
        assert!(again.entries.is_empty());
        assert_eq!(again.next_id, first.next_id);
    }

    #[test]
    fn test_resume_after_more_appends() {
        let mut ring = filled(4, &[1, 2]);
        let page = ring.tail(None);
        assert_eq!(ids(&page), vec![0, 1]);

        ring.append(3, "three").unwrap();
        ring.append(4, "four").unwrap();
        ring.append(5, "five").unwrap();

        let page = ring.tail(Some(page.next_id));
        assert_eq!(ids(&page), vec![2, 3, 4]);
        assert_eq!(page.entries[2].message, "five");
        assert_eq!(page.next_id, 5);
    }

    #[test]
    fn test_read_range_is_restartable() {
        let ring = filled(3, &[1, 2, 3, 4]);
        let first: Vec<_> = ring.read_range(0, 3).collect();
        let second: Vec<_> = ring.read_range(0, 3).collect();
        assert_eq!(first, second);
        assert_eq!(first.len(), 3);
        assert_eq!(first[0].sequence_id, 1);
        assert!(ring.read_range(3, 3).next().is_none());
    }

    #[test]
    fn test_long_message_is_truncated() {
        let mut ring = Ring::in_memory(2).unwrap();
        ring.append(1, &"x".repeat(MAX_MESSAGE_LEN * 2)).unwrap();
        assert_eq!(ring.newest().unwrap().message.len(), MAX_MESSAGE_LEN);
    }

    #[test]
    fn test_open_existing_buffer() {
        let ring = filled(3, &[9, 10]);
        let reader = Ring::open(ring.buf.clone()).unwrap();
        assert_eq!(reader.capacity(), 3);
        assert_eq!(reader.next_id(), 2);
        assert_eq!(reader.tail(None).entries.len(), 2);
    }

    #[test]
    fn test_stale_when_retired_or_resized() {
        let mut ring = filled(3, &[1, 2]);
        assert!(!ring.is_stale());

        layout::retire(ring.buf.as_mut());
        assert!(ring.is_stale());
        // A replaced segment still serves what it held.
        assert_eq!(ring.tail(None).entries.len(), 2);

        let mut ring = filled(3, &[1, 2]);
        ring.buf.as_mut()[8..12].copy_from_slice(&1u32.to_le_bytes());
        assert!(ring.is_stale());
        let page = ring.tail(None);
        assert!(page.entries.is_empty());
        assert_eq!(page.next_id, 2);
    }

    #[test]
    fn test_in_memory_rejects_bad_capacity() {
        assert!(matches!(Ring::in_memory(0), Err(FifoError::InvalidCapacity(0))));
    }
}
