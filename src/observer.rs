//! Observer notification fan-out.
//!
//! Observers are owned by whoever registered them. The registry only keeps
//! `Weak` handles, so a dropped observer is silently skipped and pruned
//! after the notification pass that discovers it.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::check::Check;
use crate::test::Test;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    TestStart,
    TestEnd,
}

/// Receives test events. Every method has an empty default so observers only
/// implement what they care about. Methods take `&self`; observers that
/// record state use interior mutability.
pub trait Observer {
    fn on_lifecycle_event(&self, _source: &Test, _event: EventType) {}

    fn on_check_failed(&self, _source: &Test, _check: &Check) {}

    fn on_exception_thrown(&self, _source: &Test, _description: &str) {}
}

struct Entry {
    observer: Weak<dyn Observer>,
    // Adding the same observer again bumps this instead of adding a second
    // entry; it has to be removed as many times as it was added.
    registrations: usize,
}

impl Entry {
    fn is(&self, observer: &Rc<dyn Observer>) -> bool {
        std::ptr::eq(
            self.observer.as_ptr() as *const (),
            Rc::as_ptr(observer) as *const (),
        )
    }
}

/// Notification takes `&self`, so an observer that panics mid-dispatch
/// leaves every registration in place.
#[derive(Default)]
pub struct Observers {
    entries: RefCell<Vec<Entry>>,
}

impl Observers {
    pub fn add(&mut self, observer: Rc<dyn Observer>) {
        let entries = self.entries.get_mut();
        if let Some(entry) = entries.iter_mut().find(|e| e.is(&observer)) {
            entry.registrations += 1;
            return;
        }
        entries.push(Entry {
            observer: Rc::downgrade(&observer),
            registrations: 1,
        });
    }

    pub fn remove(&mut self, observer: &Rc<dyn Observer>) {
        let entries = self.entries.get_mut();
        if let Some(pos) = entries.iter().position(|e| e.is(observer)) {
            let entry = &mut entries[pos];
            entry.registrations -= 1;
            if entry.registrations == 0 {
                entries.remove(pos);
            }
        }
    }

    /// Registered entries, dead ones included until the next notification.
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    pub fn notify_lifecycle_event(&self, source: &Test, event: EventType) {
        self.dispatch(|observer| observer.on_lifecycle_event(source, event));
    }

    pub fn notify_check_failed(&self, source: &Test, check: &Check) {
        self.dispatch(|observer| observer.on_check_failed(source, check));
    }

    pub fn notify_exception_thrown(&self, source: &Test, description: &str) {
        self.dispatch(|observer| observer.on_exception_thrown(source, description));
    }

    /// Copy live registrations into `target`, which then notifies the same
    /// observers without owning them.
    pub(crate) fn forward_into(&self, target: &mut Observers) {
        for entry in self.entries.borrow().iter() {
            if let Some(observer) = entry.observer.upgrade() {
                target.add(observer);
            }
        }
    }

    fn dispatch(&self, mut deliver: impl FnMut(&dyn Observer)) {
        let mut saw_dead = false;
        for entry in self.entries.borrow().iter() {
            match entry.observer.upgrade() {
                Some(observer) => deliver(observer.as_ref()),
                None => saw_dead = true,
            }
        }
        if saw_dead {
            self.remove_deleted_observers();
        }
    }

    fn remove_deleted_observers(&self) {
        self.entries
            .borrow_mut()
            .retain(|e| e.observer.strong_count() > 0);
    }
}

impl std::fmt::Debug for Observers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Observers")
            .field("entries", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[derive(Default)]
    struct Recorder {
        events: RefCell<Vec<String>>,
    }

    impl Observer for Recorder {
        fn on_lifecycle_event(&self, source: &Test, event: EventType) {
            self.events
                .borrow_mut()
                .push(format!("{:?} {}", event, source.name()));
        }
    }

    #[test]
    fn dropped_observers_are_pruned_on_next_notification() {
        let test = Test::new("probe");
        let kept = Rc::new(Recorder::default());
        let dropped: Rc<dyn Observer> = Rc::new(Recorder::default());

        let mut observers = Observers::default();
        observers.add(kept.clone());
        observers.add(dropped.clone());
        drop(dropped);
        assert_eq!(observers.len(), 2);

        observers.notify_lifecycle_event(&test, EventType::TestStart);
        assert_eq!(observers.len(), 1);
        assert_eq!(kept.events.borrow().as_slice(), ["TestStart probe"]);
    }

    #[test]
    fn repeated_add_needs_repeated_remove() {
        let test = Test::new("probe");
        let recorder = Rc::new(Recorder::default());
        let handle: Rc<dyn Observer> = recorder.clone();

        let mut observers = Observers::default();
        observers.add(handle.clone());
        observers.add(handle.clone());
        assert_eq!(observers.len(), 1);

        observers.remove(&handle);
        observers.notify_lifecycle_event(&test, EventType::TestEnd);
        assert_eq!(recorder.events.borrow().len(), 1);

        observers.remove(&handle);
        assert!(observers.is_empty());
    }

    #[test]
    fn delivery_follows_registration_order() {
        struct Tagged(&'static str, Rc<RefCell<Vec<&'static str>>>);
        impl Observer for Tagged {
            fn on_lifecycle_event(&self, _source: &Test, _event: EventType) {
                self.1.borrow_mut().push(self.0);
            }
        }

        let log = Rc::new(RefCell::new(Vec::new()));
        let first: Rc<dyn Observer> = Rc::new(Tagged("first", log.clone()));
        let second: Rc<dyn Observer> = Rc::new(Tagged("second", log.clone()));
        let mut observers = Observers::default();
        observers.add(first.clone());
        observers.add(second.clone());

        observers.notify_lifecycle_event(&Test::new("t"), EventType::TestStart);
        assert_eq!(log.borrow().as_slice(), ["first", "second"]);
    }
}
