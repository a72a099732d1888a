//! Composite tests.

use log::debug;

use crate::errors::TestError;
use crate::node::TestNode;
use crate::result::TestResult;
use crate::test::{Body, Test};

/// The body of a sequence: run every child, in order, whatever happens to
/// its siblings.
struct Children<'a>(&'a mut Vec<Box<dyn TestNode>>);

impl Body for Children<'_> {
    fn run(&mut self, test: &mut Test) -> Result<(), TestError> {
        for child in self.0.iter_mut() {
            child.test_mut().forward_observers_from(test);
            child.run()?;
        }
        test.set_result(TestResult::aggregate(
            self.0.iter().map(|child| child.result()),
        ));
        Ok(())
    }

    // Children of a skipped sequence are skipped too, so reports still list
    // them.
    fn skip(&mut self, test: &mut Test) -> Result<(), TestError> {
        for child in self.0.iter_mut() {
            child.skip();
            child.test_mut().forward_observers_from(test);
            child.run()?;
        }
        Ok(())
    }

    // Observer bookkeeping allocates; the children check themselves.
    fn leak_checked(&self) -> bool {
        false
    }
}

/// An ordered list of tests, itself a test.
///
/// Its result is the most severe of its own verdict and its children's.
/// A failing child never stops the ones after it.
pub struct TestSequence {
    test: Test,
    children: Vec<Box<dyn TestNode>>,
}

impl TestSequence {
    pub fn new(name: impl Into<String>) -> Self {
        let mut test = Test::new(name);
        test.mark_sequence();
        Self {
            test,
            children: Vec::new(),
        }
    }

    /// Add `child` as the last child. It is numbered after its siblings and
    /// picks up this sequence's context, except for what it overrides.
    pub fn append(&mut self, child: impl TestNode + 'static) -> &mut Self {
        self.append_boxed(Box::new(child))
    }

    pub fn append_boxed(&mut self, mut child: Box<dyn TestNode>) -> &mut Self {
        let number = self.test.number().child(self.children.len() as u32 + 1);
        child.attach(&self.test, number);
        debug!(
            "appended `{}` as test {} to `{}`",
            child.name(),
            child.number(),
            self.test.name()
        );
        self.children.push(child);
        self
    }

    /// Push this sequence's current context and instrumentation down to
    /// every descendant again, e.g. after the context changed.
    pub fn reattach_children(&mut self) {
        let (test, children) = self.parts_mut();
        for (index, child) in children.iter_mut().enumerate() {
            let number = test.number().child(index as u32 + 1);
            child.attach(test, number);
        }
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    pub fn child(&self, index: usize) -> Option<&dyn TestNode> {
        self.children.get(index).map(|child| child.as_ref())
    }

    pub fn child_mut(&mut self, index: usize) -> Option<&mut (dyn TestNode + 'static)> {
        self.children.get_mut(index).map(|child| child.as_mut())
    }
}

impl TestNode for TestSequence {
    fn test(&self) -> &Test {
        &self.test
    }

    fn test_mut(&mut self) -> &mut Test {
        &mut self.test
    }

    fn parts_mut(&mut self) -> (&mut Test, &mut [Box<dyn TestNode>]) {
        (&mut self.test, &mut self.children)
    }

    fn children(&self) -> &[Box<dyn TestNode>] {
        &self.children
    }

    fn run(&mut self) -> Result<(), TestError> {
        self.test.execute(&mut Children(&mut self.children))
    }

    fn traverse(&self, visit: &mut dyn FnMut(&dyn TestNode)) {
        visit(self);
        for child in &self.children {
            child.traverse(visit);
        }
    }
}

impl std::fmt::Debug for TestSequence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestSequence")
            .field("test", &self.test)
            .field("children", &self.children.len())
            .finish()
    }
}
