//! Log writer module
//!
//! Thread-safe line-oriented writing to stdout, stderr, a file, or any
//! `Write` implementation.

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::Path;
use std::sync::Mutex;

/// Thread-safe log writer
///
/// Each line is emitted with a single `write_all` while the lock is held,
/// so lines from concurrent requests never interleave.
pub struct LogWriter {
    sink: Mutex<Box<dyn Write + Send>>,
}

impl LogWriter {
    /// Write to standard output
    pub fn stdout() -> Self {
        Self::from_writer(io::stdout())
    }

    /// Write to standard error
    pub fn stderr() -> Self {
        Self::from_writer(io::stderr())
    }

    /// Append to a file, creating it and its parent directories if needed
    pub fn file(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self::from_writer(file))
    }

    pub fn from_writer(writer: impl Write + Send + 'static) -> Self {
        Self {
            sink: Mutex::new(Box::new(writer)),
        }
    }

    /// Write one line; a trailing newline is added.
    ///
    /// Failures are dropped: a log line that cannot be written must not
    /// affect the request that produced it.
    pub fn write_line(&self, message: &str) {
        let mut line = String::with_capacity(message.len() + 1);
        line.push_str(message);
        line.push('\n');

        let mut sink = match self.sink.lock() {
            Ok(sink) => sink,
            Err(poisoned) => poisoned.into_inner(),
        };
        let _ = sink.write_all(line.as_bytes());
        let _ = sink.flush();
    }
}

impl std::fmt::Debug for LogWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogWriter").finish_non_exhaustive()
    }
}
