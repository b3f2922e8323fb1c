//! Cursor resolution: map a client's requested id to a start position.
//!
//! Positions are logical and age ordered: position `0` is the oldest entry
//! still retained and position `capacity - 1` is the newest once the ring has
//! wrapped. A read always runs from the start position to `capacity`.

/// Where a requested id falls relative to the retained history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorPosition {
    /// Client already has everything (or asked for the future).
    CaughtUp,
    /// Requested id has been overwritten; resend the whole buffer.
    Evicted,
    /// Ring is full, measured back from the newest entry.
    FromEnd(u32),
    /// Ring has not wrapped yet, position equals the id.
    FromStart(u32),
}

impl CursorPosition {
    /// Classify `requested_id` against the store state.
    ///
    /// The eviction test is a strict `<`: the oldest retained id
    /// (`next_id - capacity`) resolves to position `0` through the
    /// measure-from-the-end branch, not through eviction.
    #[must_use]
    pub fn classify(next_id: u64, requested_id: u64, capacity: u32) -> Self {
        let cap = u64::from(capacity);
        if requested_id >= next_id {
            Self::CaughtUp
        } else if next_id > cap && requested_id < next_id - cap {
            Self::Evicted
        } else if next_id >= cap {
            // next_id - requested_id <= capacity here, so this cannot underflow.
            Self::FromEnd(capacity - (next_id - requested_id) as u32)
        } else {
            // requested_id < next_id < capacity.
            Self::FromStart(requested_id as u32)
        }
    }

    /// Start position for a read over `[start, capacity)`.
    #[must_use]
    pub const fn start_slot(self, capacity: u32) -> u32 {
        match self {
            Self::CaughtUp => capacity,
            Self::Evicted => 0,
            Self::FromEnd(slot) | Self::FromStart(slot) => slot,
        }
    }
}

/// Compute the position to start reading from.
///
/// Returns `capacity` (an empty range) when the client is caught up and `0`
/// when its cursor has been evicted.
#[must_use]
pub fn resolve_start_slot(next_id: u64, requested_id: u64, capacity: u32) -> u32 {
    CursorPosition::classify(next_id, requested_id, capacity).start_slot(capacity)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_caught_up_returns_capacity() {
        for capacity in [1u32, 5, 10, 512] {
            for next_id in [0u64, 3, 10, 25, 1000] {
                for extra in 0..3 {
                    assert_eq!(resolve_start_slot(next_id, next_id + extra, capacity), capacity);
                }
            }
        }
    }

    #[test]
    fn test_not_wrapped_returns_requested_id() {
        let capacity = 10;
        for next_id in 0..=u64::from(capacity) {
            for requested in 0..next_id {
                assert_eq!(
                    resolve_start_slot(next_id, requested, capacity),
                    requested as u32
                );
            }
        }
    }

    #[test]
    fn test_evicted_serves_full_buffer() {
        assert_eq!(resolve_start_slot(25, 3, 10), 0);
        assert_eq!(resolve_start_slot(25, 14, 10), 0);
        assert_eq!(
            CursorPosition::classify(25, 3, 10),
            CursorPosition::Evicted
        );
    }

    #[test]
    fn test_measure_from_end() {
        assert_eq!(resolve_start_slot(25, 20, 10), 5);
        assert_eq!(resolve_start_slot(25, 24, 10), 9);
        // Oldest retained id is not evicted.
        assert_eq!(resolve_start_slot(25, 15, 10), 0);
        assert_eq!(
            CursorPosition::classify(25, 15, 10),
            CursorPosition::FromEnd(0)
        );
    }

    #[test]
    fn test_exactly_full_ring_measures_from_end() {
        // next_id == capacity: eviction is impossible, but the end branch applies.
        assert_eq!(resolve_start_slot(10, 0, 10), 0);
        assert_eq!(resolve_start_slot(10, 7, 10), 7);
        assert_eq!(
            CursorPosition::classify(10, 7, 10),
            CursorPosition::FromEnd(7)
        );
    }

    #[test]
    fn test_capacity_five_scenario() {
        // ids 0..6 appended, next_id = 7.
        assert_eq!(resolve_start_slot(7, 2, 5), 0);
        assert_eq!(CursorPosition::classify(7, 2, 5), CursorPosition::FromEnd(0));
        assert_eq!(resolve_start_slot(7, 1, 5), 0);
        assert_eq!(CursorPosition::classify(7, 1, 5), CursorPosition::Evicted);
        assert_eq!(resolve_start_slot(7, 6, 5), 4);
        assert_eq!(resolve_start_slot(7, 7, 5), 5);
    }

    #[test]
    fn test_empty_store() {
        assert_eq!(resolve_start_slot(0, 0, 4), 4);
        assert_eq!(CursorPosition::classify(0, 0, 4), CursorPosition::CaughtUp);
    }
}
