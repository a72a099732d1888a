//! Test outcomes and their severity order.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::AddAssign;

/// Outcome of a test. The derived order is the severity order used when a
/// sequence aggregates its children: the worst child wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TestResult {
    #[default]
    Unknown,
    Skipped,
    Passed,
    PassedWithLeak,
    Failed,
    Exception,
}

impl TestResult {
    pub fn as_str(&self) -> &'static str {
        match self {
            TestResult::Unknown => "unknown",
            TestResult::Skipped => "skipped",
            TestResult::Passed => "passed",
            TestResult::PassedWithLeak => "passed-with-leak",
            TestResult::Failed => "failed",
            TestResult::Exception => "exception",
        }
    }

    /// Passed, with or without leaks.
    pub fn is_pass(&self) -> bool {
        matches!(self, TestResult::Passed | TestResult::PassedWithLeak)
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, TestResult::Failed | TestResult::Exception)
    }

    /// Combine two outcomes, keeping the more severe one.
    pub fn worst(self, other: TestResult) -> TestResult {
        self.max(other)
    }

    /// Aggregate a set of child outcomes: the worst of the ones that were
    /// not skipped. An empty set is `Unknown`, a set made only of skipped
    /// children is `Skipped`.
    pub fn aggregate<I: IntoIterator<Item = TestResult>>(results: I) -> TestResult {
        let mut any_skipped = false;
        let mut worst: Option<TestResult> = None;
        for result in results {
            if result == TestResult::Skipped {
                any_skipped = true;
            } else {
                worst = Some(worst.map_or(result, |w| w.worst(result)));
            }
        }
        match worst {
            Some(result) => result,
            None if any_skipped => TestResult::Skipped,
            None => TestResult::Unknown,
        }
    }
}

impl fmt::Display for TestResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-outcome counts over a subtree. Leaves count themselves once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassRate {
    pub unknown: usize,
    pub passed: usize,
    pub passed_with_leak: usize,
    pub exception: usize,
    pub failed: usize,
    pub skipped: usize,
    pub total: usize,
}

impl PassRate {
    pub fn of(result: TestResult) -> Self {
        let mut rate = PassRate {
            total: 1,
            ..PassRate::default()
        };
        match result {
            TestResult::Unknown => rate.unknown = 1,
            TestResult::Skipped => rate.skipped = 1,
            TestResult::Passed => rate.passed = 1,
            TestResult::PassedWithLeak => rate.passed_with_leak = 1,
            TestResult::Failed => rate.failed = 1,
            TestResult::Exception => rate.exception = 1,
        }
        rate
    }

    /// Share of executed tests that passed, as a percentage.
    pub fn success_rate(&self) -> f64 {
        let executed = self.total - self.skipped;
        if executed == 0 {
            return 0.0;
        }
        ((self.passed + self.passed_with_leak) as f64 / executed as f64) * 100.0
    }
}

impl AddAssign for PassRate {
    fn add_assign(&mut self, other: PassRate) {
        self.unknown += other.unknown;
        self.passed += other.passed;
        self.passed_with_leak += other.passed_with_leak;
        self.exception += other.exception;
        self.failed += other.failed;
        self.skipped += other.skipped;
        self.total += other.total;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_order_is_total() {
        use TestResult::*;
        let ordered = [Unknown, Skipped, Passed, PassedWithLeak, Failed, Exception];
        for pair in ordered.windows(2) {
            assert!(pair[0] < pair[1], "{} < {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn aggregate_takes_the_worst() {
        use TestResult::*;
        assert_eq!(TestResult::aggregate([Passed, Passed]), Passed);
        assert_eq!(TestResult::aggregate([Passed, Failed, Skipped]), Failed);
        assert_eq!(TestResult::aggregate([Failed, Exception]), Exception);
        assert_eq!(TestResult::aggregate([Skipped, Skipped]), Skipped);
        assert_eq!(TestResult::aggregate([Unknown, Skipped]), Unknown);
        assert_eq!(TestResult::aggregate([Skipped, Passed]), Passed);
        assert_eq!(TestResult::aggregate([]), Unknown);
    }

    #[test]
    fn pass_rate_accumulates() {
        let mut rate = PassRate::default();
        rate += PassRate::of(TestResult::Passed);
        rate += PassRate::of(TestResult::Failed);
        rate += PassRate::of(TestResult::Skipped);
        assert_eq!(rate.total, 3);
        assert_eq!(rate.passed, 1);
        assert_eq!(rate.failed, 1);
        assert_eq!(rate.skipped, 1);
        assert_eq!(rate.success_rate(), 50.0);
    }
}
