//! Trellis error taxonomy.
//!
//! Only a handful of failures ever leave a test as a Rust error. Assertion
//! failures and aborts are recorded on the test itself as checks, and
//! unexpected panics become an `Exception` result. What remains here are the
//! failures raised by actions, by context resolution and by report output.

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

use crate::context::DirectoryKind;

#[derive(Error, Diagnostic, Debug)]
pub enum TestError {
    /// No node on the path from a test to the root defines the directory.
    #[error("Configuration error: no {kind} directory is defined for this test or any of its ancestors")]
    #[diagnostic(
        code(trellis::config::undefined_directory),
        help("give the root context a value, e.g. with `TestContext::default()` or a --*-dir flag")
    )]
    Configuration { kind: DirectoryKind },

    /// A setup action could not do its job, e.g. a process failed to spawn.
    #[error("Execution error: {message}")]
    #[diagnostic(code(trellis::execution))]
    Execution {
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },

    /// A teardown action failed. Recorded, never fatal.
    #[error("Teardown error: {message}")]
    #[diagnostic(code(trellis::teardown))]
    Teardown {
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },

    #[error("I/O error on {}: {source}", path.display())]
    #[diagnostic(code(trellis::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Report error: {message}")]
    #[diagnostic(code(trellis::report))]
    Report {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
    },
}

impl TestError {
    pub fn execution(message: impl Into<String>) -> Self {
        TestError::Execution {
            message: message.into(),
            source: None,
        }
    }

    pub fn execution_io(message: impl Into<String>, source: std::io::Error) -> Self {
        TestError::Execution {
            message: message.into(),
            source: Some(source),
        }
    }

    pub fn teardown(message: impl Into<String>) -> Self {
        TestError::Teardown {
            message: message.into(),
            source: None,
        }
    }

    pub fn teardown_io(message: impl Into<String>, source: std::io::Error) -> Self {
        TestError::Teardown {
            message: message.into(),
            source: Some(source),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        TestError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn report(message: impl Into<String>) -> Self {
        TestError::Report {
            message: message.into(),
            source: None,
        }
    }

    /// True for the one error kind allowed to escape `run()`.
    pub fn is_configuration(&self) -> bool {
        matches!(self, TestError::Configuration { .. })
    }
}

impl From<serde_yaml::Error> for TestError {
    fn from(err: serde_yaml::Error) -> Self {
        TestError::Report {
            message: "invalid harness configuration file".to_string(),
            source: Some(Box::new(err)),
        }
    }
}

impl From<serde_json::Error> for TestError {
    fn from(err: serde_json::Error) -> Self {
        TestError::Report {
            message: "could not serialize the test summary".to_string(),
            source: Some(Box::new(err)),
        }
    }
}
