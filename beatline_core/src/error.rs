use std::fmt;

use thiserror::Error;

use crate::chart::Lane;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed or missing key-log data. Skipped and logged.
    Data,
    /// Missing sprite or sound for a lane/effect. Skipped and logged.
    Resource,
    /// A note judged twice, or another state that correct serialization rules out.
    /// Fatal to the session.
    Invariant,
    Io,
    Config,
}

impl ErrorKind {
    pub fn is_recoverable(self) -> bool {
        matches!(self, Self::Data | Self::Resource)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Data => "data",
            Self::Resource => "resource",
            Self::Invariant => "invariant",
            Self::Io => "io",
            Self::Config => "config",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Error, Clone)]
#[error("{kind} error: {message}{}", location_suffix(.line, .file))]
pub struct EngineError {
    pub kind: ErrorKind,
    pub message: String,

    pub lane: Option<Lane>,
    pub timestamp: Option<f64>,
    pub line: Option<usize>,
    pub file: Option<String>,
}

fn location_suffix(line: &Option<usize>, file: &Option<String>) -> String {
    match (file, line) {
        (Some(file), Some(line)) => format!(" ({file}:{line})"),
        (None, Some(line)) => format!(" (line {line})"),
        (Some(file), None) => format!(" ({file})"),
        (None, None) => String::new(),
    }
}

impl EngineError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            lane: None,
            timestamp: None,
            line: None,
            file: None,
        }
    }

    pub fn data(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Data, message)
    }

    pub fn resource(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Resource, message)
    }

    pub fn invariant(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Invariant, message)
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Config, message)
    }

    pub fn with_lane(mut self, lane: Lane) -> Self {
        self.lane = Some(lane);
        self
    }

    pub fn with_timestamp(mut self, timestamp: f64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn with_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }

    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }
}
