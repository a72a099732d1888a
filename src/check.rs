use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of a single evaluated assertion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckOutcome {
    Passed,
    Failed,
}

/// An assertion recorded on a test, with the source location it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Check {
    pub message: String,
    pub file: String,
    pub line: u32,
    pub outcome: CheckOutcome,
}

impl Check {
    pub fn failed(message: impl Into<String>, file: impl Into<String>, line: u32) -> Self {
        Self {
            message: message.into(),
            file: file.into(),
            line,
            outcome: CheckOutcome::Failed,
        }
    }

    pub fn is_failure(&self) -> bool {
        self.outcome == CheckOutcome::Failed
    }

    /// `file:line`
    pub fn location(&self) -> String {
        format!("{}:{}", self.file, self.line)
    }
}

impl fmt::Display for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message.is_empty() {
            write!(f, "check failed at {}", self.location())
        } else {
            write!(f, "{} ({})", self.message, self.location())
        }
    }
}
