//! `tracing` layer that mirrors log events into the ring.

use std::fmt::{self, Write as _};

use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer};

use crate::sink::{LogSink, SharedWriter};

/// Renders event fields as `message key=value ...`.
#[derive(Default)]
struct LineVisitor {
    message: String,
    fields: String,
}

impl Visit for LineVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            let _ = write!(self.message, "{value:?}");
        } else {
            let _ = write!(self.fields, " {}={value:?}", field.name());
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message.push_str(value);
        } else {
            let _ = write!(self.fields, " {}={value}", field.name());
        }
    }
}

/// Appends every enabled event at or above `min_level` to a FIFO sink.
///
/// Events emitted by this crate are skipped so that appending never logs
/// back into itself.
pub struct FifoLayer<K> {
    writer: SharedWriter<K>,
    min_level: Level,
}

impl<K: LogSink> FifoLayer<K> {
    /// Layer writing to `writer`, keeping `INFO` and above.
    pub const fn new(writer: SharedWriter<K>) -> Self {
        Self {
            writer,
            min_level: Level::INFO,
        }
    }

    /// Change the least severe level that is recorded.
    #[must_use]
    pub const fn with_min_level(mut self, level: Level) -> Self {
        self.min_level = level;
        self
    }
}

impl<S, K> Layer<S> for FifoLayer<K>
where
    S: Subscriber,
    K: LogSink + 'static,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        if *metadata.level() > self.min_level
            || metadata.target().starts_with(env!("CARGO_CRATE_NAME"))
        {
            return;
        }

        let mut visitor = LineVisitor::default();
        event.record(&mut visitor);

        let line = if *metadata.level() <= Level::WARN {
            format!("{}: {}{}", metadata.level(), visitor.message, visitor.fields)
        } else {
            format!("{}{}", visitor.message, visitor.fields)
        };
        // Nowhere to report a failed append from inside the subscriber.
        let _ = self.writer.append_now(&line);
    }
}
