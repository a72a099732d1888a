//! Leaf tests.

use crate::errors::TestError;
use crate::node::TestNode;
use crate::result::TestResult;
use crate::test::{Body, Test};

// Kept for the life of the case: dropping the closure's captures inside the
// leak window would offset real leaks.
type BodyFn = Box<dyn FnMut(&mut Test)>;

enum CaseBody {
    Function(BodyFn),
    Fixed(TestResult),
}

impl Body for CaseBody {
    fn run(&mut self, test: &mut Test) -> Result<(), TestError> {
        match self {
            CaseBody::Function(function) => test.run_protected(|test| function(test)),
            CaseBody::Fixed(result) => test.set_result(*result),
        }
        Ok(())
    }
}

/// A test with a body and no children.
///
/// ```
/// use trellis::{TestCase, TestNode, TestResult};
///
/// let mut case = TestCase::new("addition", |test| {
///     trellis::fail_if_neq!(test, 1 + 1, 2);
///     trellis::pass!(test);
/// });
/// case.run().unwrap();
/// assert_eq!(case.result(), TestResult::Passed);
/// ```
pub struct TestCase {
    test: Test,
    body: CaseBody,
}

impl TestCase {
    pub fn new<F>(name: impl Into<String>, body: F) -> Self
    where
        F: FnMut(&mut Test) + 'static,
    {
        Self {
            test: Test::new(name),
            body: CaseBody::Function(Box::new(body)),
        }
    }

    /// A test whose outcome is known up front. Running it still goes through
    /// the whole lifecycle, actions and notifications included.
    pub fn with_result(name: impl Into<String>, result: TestResult) -> Self {
        let mut test = Test::new(name);
        if result == TestResult::Skipped {
            test.skip();
        }
        Self {
            test,
            body: CaseBody::Fixed(result),
        }
    }
}

impl TestNode for TestCase {
    fn test(&self) -> &Test {
        &self.test
    }

    fn test_mut(&mut self) -> &mut Test {
        &mut self.test
    }

    fn parts_mut(&mut self) -> (&mut Test, &mut [Box<dyn TestNode>]) {
        (&mut self.test, &mut [])
    }

    fn run(&mut self) -> Result<(), TestError> {
        self.test.execute(&mut self.body)
    }

    fn traverse(&self, visit: &mut dyn FnMut(&dyn TestNode)) {
        visit(self);
    }
}

impl std::fmt::Debug for TestCase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("TestCase").field(&self.test).finish()
    }
}
