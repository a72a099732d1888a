//! Trellis: hierarchical test execution with setup/teardown actions, leak
//! detection and JUnit XML reporting.
//!
//! A test tree is made of [`TestCase`] leaves and [`TestSequence`]
//! composites, both driven through the [`TestNode`] trait. A
//! [`TestHarness`] owns the root of a test program's tree.

pub use crate::action::{
    FilesTeardownAction, FnSetupAction, FnTeardownAction, ProcessAction, ProcessMode, SetupAction,
    TeardownAction,
};
pub use crate::case::TestCase;
pub use crate::check::{Check, CheckOutcome};
pub use crate::context::{DirectoryKind, TestContext};
pub use crate::errors::TestError;
pub use crate::harness::{HarnessConfig, Summary, TestHarness};
pub use crate::node::TestNode;
pub use crate::number::TestNumber;
pub use crate::observer::{EventType, Observer, Observers};
pub use crate::result::{PassRate, TestResult};
pub use crate::sequence::TestSequence;
pub use crate::test::{Test, TestPhase};

pub mod action;
pub mod case;
pub mod check;
pub mod clock;
pub mod console;
pub mod context;
pub mod errors;
pub mod harness;
pub mod junit;
pub mod leak;
pub mod macros;
pub mod node;
pub mod number;
pub mod observer;
pub mod result;
pub mod sequence;
