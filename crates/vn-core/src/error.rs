use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::SourceLocation;

/// Coarse classification used by the session error boundary to decide
/// whether an error may be skipped with the "ignore" policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Unknown label or call/jump target.
    Resolution,
    /// The evaluator failed on a condition, expression or code block.
    Evaluation,
    /// Broken control structure: empty return stack, arity mismatch, loop guard.
    Structural,
    /// A statement that must only take effect once ran twice.
    Idempotency,
    /// A node was used outside of its lookup path.
    Usage,
    Io,
}

impl ErrorKind {
    pub fn is_recoverable(self) -> bool {
        matches!(self, Self::Resolution | Self::Evaluation)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Resolution => "resolution",
            Self::Evaluation => "evaluation",
            Self::Structural => "structural",
            Self::Idempotency => "idempotency",
            Self::Usage => "usage",
            Self::Io => "io",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
#[error("{code}: {message}")]
pub struct VnError {
    pub kind: ErrorKind,
    pub code: String,
    pub message: String,
    pub location: Option<SourceLocation>,
    pub statement: Option<String>,
}

impl VnError {
    pub fn new(kind: ErrorKind, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            code: code.into(),
            message: message.into(),
            location: None,
            statement: None,
        }
    }

    pub fn resolution(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Resolution, code, message)
    }

    pub fn evaluation(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Evaluation, code, message)
    }

    pub fn structural(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Structural, code, message)
    }

    pub fn usage(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Usage, code, message)
    }

    /// Attaches the failing statement's position, keeping any position that
    /// an inner statement already recorded.
    pub fn at(mut self, location: &SourceLocation, statement: &str) -> Self {
        if self.location.is_none() {
            self.location = Some(location.clone());
            self.statement = Some(statement.to_string());
        }
        self
    }

    /// Human readable report including file/line/statement context.
    pub fn describe(&self) -> String {
        match (&self.location, &self.statement) {
            (Some(location), Some(statement)) => format!(
                "{}:{} [{}] {}: {}",
                location.filename, location.line, statement, self.code, self.message
            ),
            (Some(location), None) => format!(
                "{}:{} {}: {}",
                location.filename, location.line, self.code, self.message
            ),
            _ => format!("{}: {}", self.code, self.message),
        }
    }
}
