//! Heap allocation accounting used for leak detection.
//!
//! A binary opts in by installing [`CountingAllocator`] as its global
//! allocator:
//!
//! ```rust,ignore
//! #[global_allocator]
//! static ALLOCATOR: trellis::leak::CountingAllocator = trellis::leak::CountingAllocator;
//! ```
//!
//! Without it the live counter stays at zero and every leak check passes.
//! The counter is process wide, so tests running on other threads show up
//! in it too; inject a dedicated [`AllocationCounter`] when that matters.

use std::alloc::{GlobalAlloc, Layout, System};
use std::cell::Cell;
use std::rc::Rc;
use std::sync::atomic::{AtomicIsize, Ordering};

static LIVE_ALLOCATIONS: AtomicIsize = AtomicIsize::new(0);

/// `System` allocator that keeps a count of live allocations.
pub struct CountingAllocator;

unsafe impl GlobalAlloc for CountingAllocator {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        let ptr = System.alloc(layout);
        if !ptr.is_null() {
            LIVE_ALLOCATIONS.fetch_add(1, Ordering::Relaxed);
        }
        ptr
    }

    unsafe fn alloc_zeroed(&self, layout: Layout) -> *mut u8 {
        let ptr = System.alloc_zeroed(layout);
        if !ptr.is_null() {
            LIVE_ALLOCATIONS.fetch_add(1, Ordering::Relaxed);
        }
        ptr
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        System.dealloc(ptr, layout);
        LIVE_ALLOCATIONS.fetch_sub(1, Ordering::Relaxed);
    }

    // realloc moves one live allocation, the count does not change
    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        System.realloc(ptr, layout, new_size)
    }
}

/// Source of the current live allocation count.
pub trait AllocationCounter {
    fn live_allocations(&self) -> isize;
}

/// Reads the counter maintained by [`CountingAllocator`].
#[derive(Debug, Default, Clone, Copy)]
pub struct GlobalAllocationCounter;

impl AllocationCounter for GlobalAllocationCounter {
    fn live_allocations(&self) -> isize {
        LIVE_ALLOCATIONS.load(Ordering::Relaxed)
    }
}

/// For platforms or runs without instrumentation.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopAllocationCounter;

impl AllocationCounter for NoopAllocationCounter {
    fn live_allocations(&self) -> isize {
        0
    }
}

/// Hand-driven counter for deterministic tests of leak handling.
#[derive(Debug, Default)]
pub struct ManualAllocationCounter {
    live: Cell<isize>,
}

impl ManualAllocationCounter {
    pub fn allocate(&self, count: isize) {
        self.live.set(self.live.get() + count);
    }

    pub fn release(&self, count: isize) {
        self.live.set(self.live.get() - count);
    }
}

impl AllocationCounter for ManualAllocationCounter {
    fn live_allocations(&self) -> isize {
        self.live.get()
    }
}

/// Opaque allocation count taken before a test body runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Baseline(isize);

#[derive(Clone)]
pub struct LeakGuard {
    counter: Rc<dyn AllocationCounter>,
}

impl Default for LeakGuard {
    fn default() -> Self {
        Self::new(Rc::new(GlobalAllocationCounter))
    }
}

impl LeakGuard {
    pub fn new(counter: Rc<dyn AllocationCounter>) -> Self {
        Self { counter }
    }

    pub fn disabled() -> Self {
        Self::new(Rc::new(NoopAllocationCounter))
    }

    pub fn snapshot(&self) -> Baseline {
        Baseline(self.counter.live_allocations())
    }

    /// Net allocations since `baseline`; positive means something was not
    /// released.
    pub fn delta(&self, baseline: Baseline) -> isize {
        self.counter.live_allocations() - baseline.0
    }
}

impl std::fmt::Debug for LeakGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LeakGuard")
            .field("live", &self.counter.live_allocations())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_counter_drives_the_delta() {
        let counter = Rc::new(ManualAllocationCounter::default());
        let guard = LeakGuard::new(counter.clone());

        let baseline = guard.snapshot();
        counter.allocate(3);
        counter.release(1);
        assert_eq!(guard.delta(baseline), 2);

        counter.release(2);
        assert_eq!(guard.delta(baseline), 0);
    }

    #[test]
    fn disabled_guard_never_reports_leaks() {
        let guard = LeakGuard::disabled();
        let baseline = guard.snapshot();
        let _kept: Vec<u8> = Vec::with_capacity(1024);
        assert_eq!(guard.delta(baseline), 0);
    }
}
