//! sinkhole-fifo: shared-memory log ring with resumable tail reads.
//!
//! One process (the resolver) appends timestamped log lines into a
//! fixed-capacity ring that lives in a memory-mapped segment. Any number of
//! other processes map the same segment read-only and catch up from the last
//! id they saw.
//!
//! # Positions
//!
//! Entry ids grow forever. A read addresses the ring by position, where
//! position `0` is the oldest retained entry and the newest sits at
//! `len - 1`. [`resolve_start_slot`] turns a client's `nextID` into a start
//! position, and a read always continues to the end of the ring.
//!
//! ```rust,ignore
//! use sinkhole_fifo::{FifoReader, FifoWriter};
//!
//! let mut writer = FifoWriter::create("/dev/shm/sinkhole-fifo", 512)?;
//! writer.append(1_700_000_000, "query[A] example.com from 10.0.0.2")?;
//!
//! let reader = FifoReader::open("/dev/shm/sinkhole-fifo")?;
//! let page = reader.tail(None);
//! let later = reader.tail(Some(page.next_id));
//! ```

pub mod cursor;
mod error;
pub mod layer;
pub mod layout;
pub mod ring;
pub mod segment;
pub mod sink;
pub mod tail;

pub use cursor::{resolve_start_slot, CursorPosition};
pub use error::FifoError;
pub use layer::FifoLayer;
pub use layout::HeapSegment;
pub use ring::{Entries, LogEntry, Ring, TailPage};
pub use segment::{FifoReader, FifoWriter};
pub use sink::{LogSink, SharedWriter};
pub use tail::{serve_tail, Access, TailEntry, TailRequest, TailResponse};

/// Result type for FIFO operations.
pub type Result<T> = std::result::Result<T, FifoError>;
