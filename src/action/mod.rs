//! Setup and teardown actions.
//!
//! Setup actions run in the order they were added, before the body. If one
//! fails the rest are skipped and the test ends as `Exception`; actions that
//! already succeeded are not rolled back, that is what teardown actions are
//! for. Teardown actions run in reverse order after the body, always, and a
//! failing one does not stop the others.

use std::cell::RefCell;
use std::rc::Rc;

use crate::errors::TestError;
use crate::test::Test;

mod files;
mod process;

pub use files::FilesTeardownAction;
pub use process::{ProcessAction, ProcessMode};

pub trait SetupAction {
    fn setup(&mut self, test: &Test) -> Result<(), TestError>;
}

pub trait TeardownAction {
    fn teardown(&mut self) -> Result<(), TestError>;
}

// One action registered in both lists is shared through Rc<RefCell<_>>.
impl<A: SetupAction + ?Sized> SetupAction for Rc<RefCell<A>> {
    fn setup(&mut self, test: &Test) -> Result<(), TestError> {
        self.borrow_mut().setup(test)
    }
}

impl<A: TeardownAction + ?Sized> TeardownAction for Rc<RefCell<A>> {
    fn teardown(&mut self) -> Result<(), TestError> {
        self.borrow_mut().teardown()
    }
}

/// Closure-backed setup action.
pub struct FnSetupAction<F>(pub F)
where
    F: FnMut(&Test) -> Result<(), TestError>;

impl<F> SetupAction for FnSetupAction<F>
where
    F: FnMut(&Test) -> Result<(), TestError>,
{
    fn setup(&mut self, test: &Test) -> Result<(), TestError> {
        (self.0)(test)
    }
}

/// Closure-backed teardown action.
pub struct FnTeardownAction<F>(pub F)
where
    F: FnMut() -> Result<(), TestError>;

impl<F> TeardownAction for FnTeardownAction<F>
where
    F: FnMut() -> Result<(), TestError>,
{
    fn teardown(&mut self) -> Result<(), TestError> {
        (self.0)()
    }
}
