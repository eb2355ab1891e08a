/// Inheritable command configuration: error policy and output sink.
use std::cell::RefCell;
use std::fmt;
use std::io::{self, Write};
use std::rc::Rc;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// How a command surfaces parse and run failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorHandling {
    /// Return the error to the caller untouched.
    Report,
    /// Print the error (and usage for usage errors), then ask the host to exit.
    #[default]
    Terminate,
    /// Panic with the error.
    Panic,
}

impl fmt::Display for ErrorHandling {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Report => "report",
            Self::Terminate => "terminate",
            Self::Panic => "panic",
        })
    }
}

impl FromStr for ErrorHandling {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "report" | "continue" => Ok(Self::Report),
            "terminate" | "exit" => Ok(Self::Terminate),
            "panic" => Ok(Self::Panic),
            other => Err(format!("unknown error handling policy '{other}'")),
        }
    }
}

/// Shared append-only output stream.
///
/// Clones write to the same underlying writer, so a tree of commands can
/// share one sink.
#[derive(Clone)]
pub struct Sink(Rc<RefCell<dyn Write>>);

impl Sink {
    /// Wrap any writer.
    pub fn new(writer: impl Write + 'static) -> Self {
        Self(Rc::new(RefCell::new(writer)))
    }

    /// The process standard error stream.
    #[must_use]
    pub fn stderr() -> Self {
        Self::new(io::stderr())
    }
}

impl Default for Sink {
    fn default() -> Self {
        Self::stderr()
    }
}

impl fmt::Debug for Sink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Sink")
    }
}

impl Write for Sink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.0.borrow_mut().flush()
    }
}

/// Settings a child inherits from its parent when attached.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    pub error_handling: ErrorHandling,
    pub output: Sink,
}
