//! The contract shared by leaf tests and sequences.

use std::cell::RefCell;
use std::rc::Rc;

use crate::action::{SetupAction, TeardownAction};
use crate::clock::Clock;
use crate::errors::TestError;
use crate::leak::AllocationCounter;
use crate::number::TestNumber;
use crate::observer::Observer;
use crate::result::{PassRate, TestResult};
use crate::test::Test;

/// A node of a test tree: a [`TestCase`](crate::TestCase) or a
/// [`TestSequence`](crate::TestSequence).
pub trait TestNode {
    fn test(&self) -> &Test;

    fn test_mut(&mut self) -> &mut Test;

    /// Own state and children, borrowed together.
    fn parts_mut(&mut self) -> (&mut Test, &mut [Box<dyn TestNode>]);

    fn children(&self) -> &[Box<dyn TestNode>] {
        &[]
    }

    fn is_sequence(&self) -> bool {
        self.test().is_sequence()
    }

    /// Run the node once. Failures of any kind are recorded on the node;
    /// only a configuration error is returned.
    fn run(&mut self) -> Result<(), TestError>;

    /// Depth-first, pre-order walk over this node and all its descendants.
    fn traverse(&self, visit: &mut dyn FnMut(&dyn TestNode));

    fn name(&self) -> &str {
        self.test().name()
    }

    fn number(&self) -> &TestNumber {
        self.test().number()
    }

    fn result(&self) -> TestResult {
        self.test().result()
    }

    fn passed(&self) -> bool {
        self.test().passed()
    }

    fn skip(&mut self) {
        self.test_mut().skip();
    }

    fn pass_rate(&self) -> PassRate {
        if !self.is_sequence() {
            return PassRate::of(self.result());
        }
        let mut rate = PassRate::default();
        for child in self.children() {
            rate += child.pass_rate();
        }
        rate
    }

    fn add_setup_action(&mut self, action: Box<dyn SetupAction>) {
        self.test_mut().push_setup_action(action);
    }

    fn add_teardown_action(&mut self, action: Box<dyn TeardownAction>) {
        self.test_mut().push_teardown_action(action);
    }

    /// See [`Test::add_action`].
    fn add_action<A>(&mut self, action: A) -> Rc<RefCell<A>>
    where
        Self: Sized,
        A: SetupAction + TeardownAction + 'static,
    {
        self.test_mut().add_action(action)
    }

    fn add_observer(&mut self, observer: Rc<dyn Observer>) {
        self.test_mut().add_observer(observer);
    }

    /// Set the clock on this node and every descendant.
    fn set_clock(&mut self, clock: Rc<dyn Clock>) {
        let (test, children) = self.parts_mut();
        test.set_clock(Rc::clone(&clock));
        for child in children {
            child.set_clock(Rc::clone(&clock));
        }
    }

    /// Set the allocation counter on this node and every descendant.
    fn set_allocation_counter(&mut self, counter: Rc<dyn AllocationCounter>) {
        let (test, children) = self.parts_mut();
        test.set_allocation_counter(Rc::clone(&counter));
        for child in children {
            child.set_allocation_counter(Rc::clone(&counter));
        }
    }

    /// Place this node under `parent` as number `number`, renumbering and
    /// rebasing the whole subtree.
    fn attach(&mut self, parent: &Test, number: TestNumber) {
        let (test, children) = self.parts_mut();
        test.attach_to(parent, number);
        for (index, child) in children.iter_mut().enumerate() {
            let child_number = test.number().child(index as u32 + 1);
            child.attach(test, child_number);
        }
    }
}
