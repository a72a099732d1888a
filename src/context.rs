//! Per-test directory context.
//!
//! Every test owns a `TestContext` giving it three directories: where its
//! input data lives, where reference (expected) files live and where it may
//! write output. A slot is either inherited from the enclosing sequence or
//! overridden on the test itself. Resolution is pure path arithmetic and
//! never touches the filesystem.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::errors::TestError;

pub const DEFAULT_TEST_DATA_DIRECTORY: &str = "data";
pub const DEFAULT_REFERENCE_DATA_DIRECTORY: &str = "reference";
pub const DEFAULT_OUTPUT_DIRECTORY: &str = "output";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DirectoryKind {
    TestData,
    ReferenceData,
    Output,
}

impl DirectoryKind {
    pub const ALL: [DirectoryKind; 3] = [
        DirectoryKind::TestData,
        DirectoryKind::ReferenceData,
        DirectoryKind::Output,
    ];
}

impl fmt::Display for DirectoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DirectoryKind::TestData => "test data",
            DirectoryKind::ReferenceData => "reference data",
            DirectoryKind::Output => "output",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Slot {
    Undefined,
    Inherited(PathBuf),
    Overridden(PathBuf),
}

impl Slot {
    fn value(&self) -> Option<&Path> {
        match self {
            Slot::Undefined => None,
            Slot::Inherited(path) | Slot::Overridden(path) => Some(path),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestContext {
    test_data: Slot,
    reference_data: Slot,
    output: Slot,
}

impl Default for TestContext {
    /// The root defaults. They count as inherited, so a test appended to a
    /// sequence picks up the sequence's directories instead.
    fn default() -> Self {
        Self {
            test_data: Slot::Inherited(PathBuf::from(DEFAULT_TEST_DATA_DIRECTORY)),
            reference_data: Slot::Inherited(PathBuf::from(DEFAULT_REFERENCE_DATA_DIRECTORY)),
            output: Slot::Inherited(PathBuf::from(DEFAULT_OUTPUT_DIRECTORY)),
        }
    }
}

impl TestContext {
    /// A context with nothing defined. Resolving any directory fails until a
    /// value is set or inherited.
    pub fn empty() -> Self {
        Self {
            test_data: Slot::Undefined,
            reference_data: Slot::Undefined,
            output: Slot::Undefined,
        }
    }

    /// Copy of `parent`'s resolved values, all marked inherited.
    pub fn inherit(parent: &TestContext) -> Self {
        let mut child = Self::empty();
        child.rebase(parent);
        child
    }

    fn slot(&self, kind: DirectoryKind) -> &Slot {
        match kind {
            DirectoryKind::TestData => &self.test_data,
            DirectoryKind::ReferenceData => &self.reference_data,
            DirectoryKind::Output => &self.output,
        }
    }

    fn slot_mut(&mut self, kind: DirectoryKind) -> &mut Slot {
        match kind {
            DirectoryKind::TestData => &mut self.test_data,
            DirectoryKind::ReferenceData => &mut self.reference_data,
            DirectoryKind::Output => &mut self.output,
        }
    }

    pub fn resolve(&self, kind: DirectoryKind) -> Result<&Path, TestError> {
        self.slot(kind)
            .value()
            .ok_or(TestError::Configuration { kind })
    }

    pub fn path(&self, kind: DirectoryKind, relative_name: impl AsRef<Path>) -> Result<PathBuf, TestError> {
        Ok(self.resolve(kind)?.join(relative_name))
    }

    /// Set an explicit value on this context only.
    pub fn override_directory(&mut self, kind: DirectoryKind, path: impl Into<PathBuf>) {
        *self.slot_mut(kind) = Slot::Overridden(path.into());
    }

    pub fn is_overridden(&self, kind: DirectoryKind) -> bool {
        matches!(self.slot(kind), Slot::Overridden(_))
    }

    /// Replace every slot not overridden here with `parent`'s value.
    pub fn rebase(&mut self, parent: &TestContext) {
        for kind in DirectoryKind::ALL {
            if self.is_overridden(kind) {
                continue;
            }
            *self.slot_mut(kind) = match parent.slot(kind).value() {
                Some(path) => Slot::Inherited(path.to_path_buf()),
                None => Slot::Undefined,
            };
        }
    }

    /// Fails with the first directory that cannot be resolved.
    pub fn validate(&self) -> Result<(), TestError> {
        for kind in DirectoryKind::ALL {
            self.resolve(kind)?;
        }
        Ok(())
    }

    pub fn test_data_directory(&self) -> Result<&Path, TestError> {
        self.resolve(DirectoryKind::TestData)
    }

    pub fn test_data_path(&self, relative_name: impl AsRef<Path>) -> Result<PathBuf, TestError> {
        self.path(DirectoryKind::TestData, relative_name)
    }

    pub fn set_test_data_directory(&mut self, path: impl Into<PathBuf>) {
        self.override_directory(DirectoryKind::TestData, path);
    }

    pub fn reference_data_directory(&self) -> Result<&Path, TestError> {
        self.resolve(DirectoryKind::ReferenceData)
    }

    pub fn reference_data_path(&self, relative_name: impl AsRef<Path>) -> Result<PathBuf, TestError> {
        self.path(DirectoryKind::ReferenceData, relative_name)
    }

    pub fn set_reference_data_directory(&mut self, path: impl Into<PathBuf>) {
        self.override_directory(DirectoryKind::ReferenceData, path);
    }

    pub fn output_directory(&self) -> Result<&Path, TestError> {
        self.resolve(DirectoryKind::Output)
    }

    pub fn output_path(&self, relative_name: impl AsRef<Path>) -> Result<PathBuf, TestError> {
        self.path(DirectoryKind::Output, relative_name)
    }

    pub fn set_output_directory(&mut self, path: impl Into<PathBuf>) {
        self.override_directory(DirectoryKind::Output, path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_context_has_root_values() {
        let ctx = TestContext::default();
        assert_eq!(ctx.test_data_directory().unwrap(), Path::new("data"));
        assert_eq!(ctx.reference_data_directory().unwrap(), Path::new("reference"));
        assert_eq!(ctx.output_directory().unwrap(), Path::new("output"));
        assert!(!ctx.is_overridden(DirectoryKind::Output));
    }

    #[test]
    fn empty_context_is_a_configuration_error() {
        let ctx = TestContext::empty();
        let err = ctx.output_directory().unwrap_err();
        assert!(matches!(
            err,
            TestError::Configuration {
                kind: DirectoryKind::Output
            }
        ));
        assert!(ctx.validate().is_err());
    }

    #[test]
    fn path_joins_the_relative_name() {
        let mut ctx = TestContext::default();
        ctx.set_test_data_directory("/srv/data");
        assert_eq!(
            ctx.test_data_path("input.txt").unwrap(),
            PathBuf::from("/srv/data/input.txt")
        );
        assert_eq!(
            ctx.reference_data_path("expected.txt").unwrap(),
            PathBuf::from("reference/expected.txt")
        );
    }

    #[test]
    fn child_override_does_not_leak_to_sibling() {
        let mut root = TestContext::default();
        root.set_output_directory("/out");

        let mut a = TestContext::inherit(&root);
        let b = TestContext::inherit(&root);
        a.set_output_directory("/A-out");

        assert_eq!(a.output_directory().unwrap(), Path::new("/A-out"));
        assert_eq!(b.output_directory().unwrap(), Path::new("/out"));
        assert_eq!(root.output_directory().unwrap(), Path::new("/out"));
    }

    #[test]
    fn rebase_keeps_overrides() {
        let mut parent = TestContext::default();
        parent.set_test_data_directory("/p/data");
        parent.set_output_directory("/p/out");

        let mut child = TestContext::default();
        child.set_output_directory("/c/out");
        child.rebase(&parent);

        assert_eq!(child.test_data_directory().unwrap(), Path::new("/p/data"));
        assert_eq!(child.output_directory().unwrap(), Path::new("/c/out"));
        assert!(!child.is_overridden(DirectoryKind::TestData));
    }

    #[test]
    fn rebase_onto_empty_parent_undefines_inherited_slots() {
        let mut child = TestContext::default();
        child.set_reference_data_directory("/ref");
        child.rebase(&TestContext::empty());

        assert!(child.test_data_directory().is_err());
        assert_eq!(child.reference_data_directory().unwrap(), Path::new("/ref"));
    }
}
