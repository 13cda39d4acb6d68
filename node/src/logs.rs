//! In-memory log capture.
//!
//! The server keeps every formatted log line in memory so
//! `GET /projects/logs` can replay the session's history to the client.

use parking_lot::Mutex;
use std::io;
use std::sync::Arc;
use tracing_subscriber::fmt::MakeWriter;

/// Shared, append-only cache of formatted log lines.
#[derive(Clone, Debug, Default)]
pub struct LogCache {
    lines: Arc<Mutex<Vec<String>>>,
}

impl LogCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of every captured line, oldest first.
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }

    /// Serializes the captured lines as a JSON array.
    pub fn to_json(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(&self.lines())
    }

    fn push(&self, line: &str) {
        let trimmed = line.trim_end();
        if !trimmed.is_empty() {
            self.lines.lock().push(trimmed.to_string());
        }
    }
}

/// One write handle into the cache; each formatted event arrives as a
/// single write call.
pub struct LogCacheWriter {
    cache: LogCache,
}

impl io::Write for LogCacheWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.cache.push(&String::from_utf8_lossy(buf));
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogCache {
    type Writer = LogCacheWriter;

    fn make_writer(&'a self) -> Self::Writer {
        LogCacheWriter {
            cache: self.clone(),
        }
    }
}
