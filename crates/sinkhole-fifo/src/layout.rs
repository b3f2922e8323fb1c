//! Fixed binary layout of the FIFO segment.
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │ Header (64 bytes)                            │
//! │   magic "SHFO" | version | capacity |        │
//! │   slot size | next_id | state | reserved     │
//! ├──────────────────────────────────────────────┤
//! │ Slot[capacity] (256 bytes each)              │
//! │   sequence_id | timestamp | len | message    │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! All integers are little-endian. `next_id` and `state` are 8-byte aligned
//! and only ever accessed atomically; the segment base must therefore be
//! 8-byte aligned, which holds for page-aligned mappings and [`HeapSegment`].
//! A slot whose timestamp is `0` has never been written.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::FifoError;

/// Segment magic.
pub const MAGIC: [u8; 4] = *b"SHFO";

/// Layout version.
pub const VERSION: u32 = 1;

/// Header size in bytes.
pub const HEADER_SIZE: usize = 64;

/// Size of one slot record in bytes.
pub const SLOT_SIZE: usize = 256;

/// Bytes in front of the message inside a slot.
const SLOT_META: usize = 24;

/// Longest message a slot can hold, in bytes.
pub const MAX_MESSAGE_LEN: usize = SLOT_SIZE - SLOT_META;

/// Largest supported capacity.
pub const MAX_CAPACITY: u32 = 65_536;

// Header field offsets.
const OFF_VERSION: usize = 4;
const OFF_CAPACITY: usize = 8;
const OFF_SLOT_SIZE: usize = 12;
const OFF_NEXT_ID: usize = 16;
const OFF_STATE: usize = 24;

// Segment states.
const STATE_LIVE: u64 = 0;
const STATE_RETIRED: u64 = 1;

// Slot field offsets.
const SLOT_OFF_SEQ: usize = 0;
const SLOT_OFF_TS: usize = 8;
const SLOT_OFF_LEN: usize = 16;

/// Total segment size for a given capacity.
#[must_use]
pub const fn segment_len(capacity: u32) -> usize {
    HEADER_SIZE + capacity as usize * SLOT_SIZE
}

/// Validate a capacity value.
pub fn check_capacity(capacity: u32) -> crate::Result<u32> {
    if capacity == 0 || capacity > MAX_CAPACITY {
        return Err(FifoError::InvalidCapacity(capacity));
    }
    Ok(capacity)
}

fn check_aligned(buf: &[u8]) -> crate::Result<()> {
    if buf.as_ptr().align_offset(8) != 0 {
        return Err(FifoError::Corrupt("segment base is not 8-byte aligned".into()));
    }
    Ok(())
}

/// Write a fresh header and zero every slot.
pub fn format(buf: &mut [u8], capacity: u32) -> crate::Result<()> {
    check_capacity(capacity)?;
    check_aligned(buf)?;
    let len = segment_len(capacity);
    if buf.len() < len {
        return Err(FifoError::Corrupt(format!(
            "buffer of {} bytes cannot hold {capacity} slots ({len} bytes)",
            buf.len()
        )));
    }

    buf[..len].fill(0);
    buf[..4].copy_from_slice(&MAGIC);
    write_u32(buf, OFF_VERSION, VERSION);
    write_u32(buf, OFF_CAPACITY, capacity);
    write_u32(buf, OFF_SLOT_SIZE, SLOT_SIZE as u32);
    header_word_mut(buf, OFF_NEXT_ID).store(0, Ordering::Release);
    header_word_mut(buf, OFF_STATE).store(STATE_LIVE, Ordering::Release);
    Ok(())
}

/// True if `buf` starts with the segment magic.
#[must_use]
pub fn has_magic(buf: &[u8]) -> bool {
    buf.len() >= MAGIC.len() && buf[..MAGIC.len()] == MAGIC
}

/// Validate the header and return the stored capacity.
///
/// A foreign or damaged buffer is [`FifoError::Corrupt`]; a segment written
/// with another version or slot size is [`FifoError::Incompatible`].
pub fn decode_header(buf: &[u8]) -> crate::Result<u32> {
    if buf.len() < HEADER_SIZE {
        return Err(FifoError::Corrupt(format!(
            "segment of {} bytes is smaller than the header",
            buf.len()
        )));
    }
    if !has_magic(buf) {
        return Err(FifoError::Corrupt("bad magic".into()));
    }
    check_aligned(buf)?;
    let version = read_u32(buf, OFF_VERSION);
    if version != VERSION {
        return Err(FifoError::Incompatible(format!("unsupported version {version}")));
    }
    let slot_size = read_u32(buf, OFF_SLOT_SIZE) as usize;
    if slot_size != SLOT_SIZE {
        return Err(FifoError::Incompatible(format!("unexpected slot size {slot_size}")));
    }
    let capacity = read_u32(buf, OFF_CAPACITY);
    check_capacity(capacity).map_err(|_| FifoError::Corrupt(format!("capacity {capacity}")))?;
    if buf.len() < segment_len(capacity) {
        return Err(FifoError::Corrupt(format!(
            "segment truncated: {} bytes for {capacity} slots",
            buf.len()
        )));
    }
    Ok(capacity)
}

/// Capacity as currently stored in the header, without validation.
#[must_use]
pub fn header_capacity(buf: &[u8]) -> u32 {
    read_u32(buf, OFF_CAPACITY)
}

#[allow(unsafe_code)]
fn header_word(buf: &[u8], offset: usize) -> &AtomicU64 {
    let field = &buf[offset..offset + 8];
    assert_eq!(field.as_ptr().align_offset(8), 0, "unaligned header word");
    // SAFETY: `field` is 8 bytes, in bounds and 8-byte aligned (asserted
    // above). AtomicU64 has the size and alignment of u64 and accepts any bit
    // pattern. Through a shared borrow this word is only ever loaded.
    unsafe {
        &*field.as_ptr().cast::<AtomicU64>()
    }
}

#[allow(unsafe_code)]
fn header_word_mut(buf: &mut [u8], offset: usize) -> &AtomicU64 {
    let field = &mut buf[offset..offset + 8];
    assert_eq!(field.as_ptr().align_offset(8), 0, "unaligned header word");
    // SAFETY: as in `header_word`; the pointer comes from an exclusive borrow,
    // so storing through it is allowed.
    unsafe {
        &*field.as_mut_ptr().cast::<AtomicU64>()
    }
}

/// Load `next_id`.
///
/// Pairs with the release store in [`store_next_id`]: a reader that sees a
/// new id also sees the slot written before it.
#[must_use]
pub fn load_next_id(buf: &[u8]) -> u64 {
    u64::from_le(header_word(buf, OFF_NEXT_ID).load(Ordering::Acquire))
}

/// Publish `next_id` after the slot it covers has been written.
pub fn store_next_id(buf: &mut [u8], next_id: u64) {
    header_word_mut(buf, OFF_NEXT_ID).store(next_id.to_le(), Ordering::Release);
}

/// True once a writer has replaced this segment with a new file.
#[must_use]
pub fn is_retired(buf: &[u8]) -> bool {
    u64::from_le(header_word(buf, OFF_STATE).load(Ordering::Acquire)) == STATE_RETIRED
}

/// Mark the segment as replaced. Readers still mapping it should reopen.
pub fn retire(buf: &mut [u8]) {
    header_word_mut(buf, OFF_STATE).store(STATE_RETIRED.to_le(), Ordering::Release);
}

/// Heap buffer aligned for the header atomics, for single-process rings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeapSegment(Box<[u64]>);

impl HeapSegment {
    /// Zeroed buffer of at least `len` bytes.
    #[must_use]
    pub fn zeroed(len: usize) -> Self {
        Self(vec![0u64; len.div_ceil(8)].into_boxed_slice())
    }
}

impl AsRef<[u8]> for HeapSegment {
    #[allow(unsafe_code)]
    fn as_ref(&self) -> &[u8] {
        // SAFETY: u8 has no alignment or validity requirements and the byte
        // length covers exactly the words owned by the box.
        unsafe {
            std::slice::from_raw_parts(self.0.as_ptr().cast::<u8>(), self.0.len() * 8)
        }
    }
}

impl AsMut<[u8]> for HeapSegment {
    #[allow(unsafe_code)]
    fn as_mut(&mut self) -> &mut [u8] {
        // SAFETY: as in `as_ref`, through the unique borrow of the box.
        unsafe {
            std::slice::from_raw_parts_mut(self.0.as_mut_ptr().cast::<u8>(), self.0.len() * 8)
        }
    }
}

/// A slot as stored in the segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawSlot<'a> {
    /// Sequence id written with the entry.
    pub sequence_id: u64,
    /// Epoch seconds, `0` if the slot was never written.
    pub timestamp: i64,
    /// Message bytes (may be torn while a write is in flight).
    pub message: &'a [u8],
}

const fn slot_offset(slot: u32) -> usize {
    HEADER_SIZE + slot as usize * SLOT_SIZE
}

/// Read a physical slot.
#[must_use]
pub fn read_slot(buf: &[u8], slot: u32) -> RawSlot<'_> {
    let base = slot_offset(slot);
    let len = usize::from(read_u16(buf, base + SLOT_OFF_LEN)).min(MAX_MESSAGE_LEN);
    let start = base + SLOT_META;
    RawSlot {
        sequence_id: read_u64(buf, base + SLOT_OFF_SEQ),
        timestamp: read_u64(buf, base + SLOT_OFF_TS) as i64,
        message: &buf[start..start + len],
    }
}

/// Overwrite a physical slot. `message` must already fit.
pub fn write_slot(buf: &mut [u8], slot: u32, sequence_id: u64, timestamp: i64, message: &[u8]) {
    debug_assert!(message.len() <= MAX_MESSAGE_LEN);
    let base = slot_offset(slot);
    let start = base + SLOT_META;
    buf[start..start + message.len()].copy_from_slice(message);
    buf[start + message.len()..base + SLOT_SIZE].fill(0);
    write_u64(buf, base + SLOT_OFF_SEQ, sequence_id);
    write_u16(buf, base + SLOT_OFF_LEN, message.len() as u16);
    // Timestamp goes last: a non-zero timestamp marks the slot as written.
    write_u64(buf, base + SLOT_OFF_TS, timestamp as u64);
}

/// Cut `message` to at most [`MAX_MESSAGE_LEN`] bytes on a char boundary.
#[must_use]
pub fn truncate_message(message: &str) -> &str {
    if message.len() <= MAX_MESSAGE_LEN {
        return message;
    }
    let mut end = MAX_MESSAGE_LEN;
    while !message.is_char_boundary(end) {
        end -= 1;
    }
    &message[..end]
}

fn read_u16(buf: &[u8], offset: usize) -> u16 {
    let mut out = [0u8; 2];
    out.copy_from_slice(&buf[offset..offset + 2]);
    u16::from_le_bytes(out)
}

fn read_u32(buf: &[u8], offset: usize) -> u32 {
    let mut out = [0u8; 4];
    out.copy_from_slice(&buf[offset..offset + 4]);
    u32::from_le_bytes(out)
}

fn read_u64(buf: &[u8], offset: usize) -> u64 {
    let mut out = [0u8; 8];
    out.copy_from_slice(&buf[offset..offset + 8]);
    u64::from_le_bytes(out)
}

fn write_u16(buf: &mut [u8], offset: usize, value: u16) {
    buf[offset..offset + 2].copy_from_slice(&value.to_le_bytes());
}

fn write_u32(buf: &mut [u8], offset: usize, value: u32) {
    buf[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}

fn write_u64(buf: &mut [u8], offset: usize, value: u64) {
    buf[offset..offset + 8].copy_from_slice(&value.to_le_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;

    fn formatted(capacity: u32) -> HeapSegment {
        let mut buf = HeapSegment::zeroed(segment_len(capacity));
        format(buf.as_mut(), capacity).unwrap();
        buf
    }

    #[test]
    fn test_format_and_decode() {
        let mut buf = HeapSegment::zeroed(segment_len(8));
        buf.as_mut().fill(0xAA);
        format(buf.as_mut(), 8).unwrap();
        let buf = buf.as_ref();
        assert_eq!(decode_header(buf).unwrap(), 8);
        assert_eq!(load_next_id(buf), 0);
        assert!(!is_retired(buf));
        for slot in 0..8 {
            assert_eq!(read_slot(buf, slot).timestamp, 0);
        }
    }

    #[test]
    fn test_next_id_is_little_endian() {
        let mut buf = formatted(2);
        store_next_id(buf.as_mut(), 0x0102);
        assert_eq!(&buf.as_ref()[OFF_NEXT_ID..OFF_NEXT_ID + 3], &[0x02, 0x01, 0x00]);
        assert_eq!(load_next_id(buf.as_ref()), 0x0102);
    }

    #[test]
    fn test_retire_marks_segment() {
        let mut buf = formatted(2);
        retire(buf.as_mut());
        assert!(is_retired(buf.as_ref()));
        // Still a readable segment.
        assert_eq!(decode_header(buf.as_ref()).unwrap(), 2);
    }

    #[test]
    fn test_decode_rejects_bad_magic() {
        let mut buf = formatted(2);
        buf.as_mut()[0] = b'X';
        assert!(matches!(decode_header(buf.as_ref()), Err(FifoError::Corrupt(_))));
        assert!(!has_magic(buf.as_ref()));
    }

    #[test]
    fn test_decode_flags_other_versions_as_incompatible() {
        let mut buf = formatted(2);
        write_u32(buf.as_mut(), OFF_VERSION, VERSION + 1);
        assert!(matches!(decode_header(buf.as_ref()), Err(FifoError::Incompatible(_))));
    }

    #[test]
    fn test_decode_rejects_truncated_segment() {
        let buf = formatted(4);
        let short = &buf.as_ref()[..segment_len(3)];
        assert!(matches!(decode_header(short), Err(FifoError::Corrupt(_))));
    }

    #[test]
    fn test_rejects_unaligned_buffer() {
        let mut buf = HeapSegment::zeroed(segment_len(1) + 8);
        assert!(matches!(format(&mut buf.as_mut()[1..], 1), Err(FifoError::Corrupt(_))));

        let mut moved = HeapSegment::zeroed(segment_len(1) + 8);
        moved.as_mut()[1..5].copy_from_slice(&MAGIC);
        assert!(matches!(decode_header(&moved.as_ref()[1..]), Err(FifoError::Corrupt(_))));
    }

    #[test]
    fn test_format_rejects_small_buffer() {
        let mut buf = HeapSegment::zeroed(HEADER_SIZE);
        assert!(format(buf.as_mut(), 1).is_err());
    }

    #[test]
    fn test_capacity_bounds() {
        assert!(check_capacity(0).is_err());
        assert!(check_capacity(1).is_ok());
        assert!(check_capacity(MAX_CAPACITY).is_ok());
        assert!(check_capacity(MAX_CAPACITY + 1).is_err());
    }

    #[test]
    fn test_slot_write_read() {
        let mut buf = formatted(2);
        write_slot(buf.as_mut(), 1, 41, 1_700_000_000, b"query[A] example.com");
        let slot = read_slot(buf.as_ref(), 1);
        assert_eq!(slot.sequence_id, 41);
        assert_eq!(slot.timestamp, 1_700_000_000);
        assert_eq!(slot.message, b"query[A] example.com");

        // Shorter rewrite leaves no stale tail.
        write_slot(buf.as_mut(), 1, 43, 1_700_000_001, b"ok");
        assert_eq!(read_slot(buf.as_ref(), 1).message, b"ok");
    }

    #[test]
    fn test_truncate_message_respects_char_boundary() {
        let long = "é".repeat(MAX_MESSAGE_LEN);
        let cut = truncate_message(&long);
        assert!(cut.len() <= MAX_MESSAGE_LEN);
        assert!(cut.chars().all(|c| c == 'é'));

        assert_eq!(truncate_message("short"), "short");
    }
}
