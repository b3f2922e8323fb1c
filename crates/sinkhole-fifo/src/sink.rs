//! Append targets and a thread-shareable writer handle.

use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};

use crate::ring::Ring;
use crate::segment::FifoWriter;

/// Anything that accepts log lines.
pub trait LogSink: Send {
    /// Append one line stamped with `timestamp` (epoch seconds).
    fn append_line(&mut self, timestamp: i64, message: &str) -> crate::Result<()>;
}

impl<B> LogSink for Ring<B>
where
    B: AsRef<[u8]> + AsMut<[u8]> + Send,
{
    fn append_line(&mut self, timestamp: i64, message: &str) -> crate::Result<()> {
        self.append(timestamp, message)
    }
}

impl LogSink for FifoWriter {
    fn append_line(&mut self, timestamp: i64, message: &str) -> crate::Result<()> {
        self.append(timestamp, message)
    }
}

/// Cloneable handle that serializes appends from many threads into one sink.
#[derive(Debug)]
pub struct SharedWriter<S> {
    inner: Arc<Mutex<S>>,
}

impl<S> Clone for SharedWriter<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: LogSink> SharedWriter<S> {
    /// Wrap a sink.
    pub fn new(sink: S) -> Self {
        Self {
            inner: Arc::new(Mutex::new(sink)),
        }
    }

    /// Append one line.
    pub fn append(&self, timestamp: i64, message: &str) -> crate::Result<()> {
        self.inner.lock().append_line(timestamp, message)
    }

    /// Append one line stamped with the current time.
    pub fn append_now(&self, message: &str) -> crate::Result<()> {
        self.append(chrono::Utc::now().timestamp(), message)
    }

    /// Exclusive access to the sink, e.g. to read from it.
    pub fn lock(&self) -> MutexGuard<'_, S> {
        self.inner.lock()
    }
}
