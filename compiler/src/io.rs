//! Capabilities consumed from external collaborators. The core never opens
//! files or prints; the edges hand in implementations of these.

use std::io;

/// Receives one emitted file per module.
pub trait Sink {
    fn write(&mut self, name: &str, text: &str) -> io::Result<()>;
}

/// Loads input schema text by name.
pub trait Source {
    fn read(&self, name: &str) -> io::Result<String>;
}

/// User-visible diagnostics.
pub trait Logger {
    fn info(&mut self, message: &str);
    fn warn(&mut self, message: &str);
}

/// An in-memory sink, used by tests and by callers that post-process the
/// rendered source.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub files: Vec<(String, String)>,
}

impl Sink for MemorySink {
    fn write(&mut self, name: &str, text: &str) -> io::Result<()> {
        self.files.push((name.to_string(), text.to_string()));
        Ok(())
    }
}
