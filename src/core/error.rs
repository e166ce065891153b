use serde::Serialize;
use thiserror::Error;

/// Core error types for fwsync
#[derive(Debug, Error)]
pub enum Error {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The declarative task-list configuration could not be loaded or parsed.
    /// Fatal: aborts the run before any mutation is issued.
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// A chain or set listing could not be decoded into the expected shape
    #[error("Listing parse error for {subject}: {message}")]
    ListingParse { subject: String, message: String },

    /// A primitive operation against the filter subsystem returned non-zero
    #[error("Command '{command}' return non-zero code: {exit_code}")]
    CommandFailed {
        command: String,
        exit_code: i32,
        stderr: Option<String>,
    },

    /// Desired member could not be parsed as an address or network
    #[error("Invalid member '{member}': {message}")]
    InvalidMember { member: String, message: String },

    /// One or more task entries failed after their diagnostics were reported
    #[error("{0} task entry(ies) failed")]
    TasksFailed(usize),

    /// Internal logic error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    pub fn config(message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
        }
    }

    pub fn listing(subject: impl Into<String>, message: impl Into<String>) -> Self {
        Error::ListingParse {
            subject: subject.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Severity scale for diagnostics, following syslog numbering for the
/// levels this tool actually emits.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, strum::Display)]
#[serde(into = "u8")]
#[strum(serialize_all = "lowercase")]
pub enum Severity {
    Error = 3,
    Warning = 4,
}

impl From<Severity> for u8 {
    fn from(s: Severity) -> u8 {
        s as u8
    }
}

/// A machine-readable record of one failed or noteworthy operation.
///
/// Emitted as a single JSON line so downstream automation can consume the
/// run output. A failed primitive operation produces one diagnostic and the
/// run continues; nothing is retried or rolled back.
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    pub ts: chrono::DateTime<chrono::Utc>,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
            command: None,
            ts: chrono::Utc::now(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
            command: None,
            ts: chrono::Utc::now(),
        }
    }

    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = Some(command.into());
        self
    }

    /// Logs the diagnostic as a JSON line at a level matching its severity.
    pub fn emit(&self) {
        let line = serde_json::to_string(self).unwrap_or_else(|_| self.message.clone());
        match self.severity {
            Severity::Error => tracing::error!("{line}"),
            Severity::Warning => tracing::warn!("{line}"),
        }
    }
}

/// Builds the diagnostic for a failed primitive operation.
///
/// Only `CommandFailed` carries an offending command; other errors surface
/// with their display form alone.
pub fn operation_diagnostic(err: &Error) -> Diagnostic {
    match err {
        Error::CommandFailed { command, .. } => {
            Diagnostic::error(err.to_string()).with_command(command.clone())
        }
        _ => Diagnostic::error(err.to_string()),
    }
}
