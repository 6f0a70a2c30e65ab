//! Log sinks: where capability log lines end up.

use parking_lot::Mutex;
use tracing::Level;

/// Tracing target used by [`TracingSink`].
pub const LOG_TARGET: &str = "opkit::operation";

/// Accepts plain-text log lines.
pub trait LogSink: Send + Sync {
    fn write_line(&self, level: Level, line: &str);
}

/// Forwards lines to `tracing` under [`LOG_TARGET`].
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn write_line(&self, level: Level, line: &str) {
        match level {
            Level::ERROR => tracing::error!(target: LOG_TARGET, "{line}"),
            Level::WARN => tracing::warn!(target: LOG_TARGET, "{line}"),
            Level::INFO => tracing::info!(target: LOG_TARGET, "{line}"),
            Level::DEBUG => tracing::debug!(target: LOG_TARGET, "{line}"),
            _ => tracing::trace!(target: LOG_TARGET, "{line}"),
        }
    }
}

/// Keeps every line in memory. Useful for tests and diagnostics.
#[derive(Debug, Default)]
pub struct MemorySink {
    lines: Mutex<Vec<(Level, String)>>,
}

impl MemorySink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the captured lines.
    #[must_use]
    pub fn lines(&self) -> Vec<(Level, String)> {
        self.lines.lock().clone()
    }

    /// Removes and returns the captured lines.
    pub fn take(&self) -> Vec<(Level, String)> {
        std::mem::take(&mut *self.lines.lock())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.lock().is_empty()
    }
}

impl LogSink for MemorySink {
    fn write_line(&self, level: Level, line: &str) {
        self.lines.lock().push((level, line.to_string()));
    }
}
