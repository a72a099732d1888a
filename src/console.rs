//! Colored progress output while a tree runs.

use std::cell::RefCell;
use std::io::Write;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

use crate::check::Check;
use crate::harness::Summary;
use crate::observer::{EventType, Observer};
use crate::result::TestResult;
use crate::test::Test;

fn label(result: TestResult) -> (&'static str, Color) {
    match result {
        TestResult::Passed => ("PASS", Color::Green),
        TestResult::PassedWithLeak => ("LEAK", Color::Yellow),
        TestResult::Failed => ("FAIL", Color::Red),
        TestResult::Exception => ("ERROR", Color::Red),
        TestResult::Skipped => ("SKIP", Color::Yellow),
        TestResult::Unknown => ("????", Color::Magenta),
    }
}

/// Prints a line per finished test, a header per sequence and failure
/// details as they happen. In quiet mode only problems are printed.
pub struct ConsoleObserver<W: WriteColor = StandardStream> {
    out: RefCell<W>,
    quiet: bool,
}

impl ConsoleObserver<StandardStream> {
    pub fn stdout(choice: ColorChoice) -> Self {
        Self::new(StandardStream::stdout(choice))
    }
}

impl<W: WriteColor> ConsoleObserver<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: RefCell::new(out),
            quiet: false,
        }
    }

    pub fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner()
    }

    fn print_result(&self, test: &Test) {
        let result = test.result();
        if self.quiet && !result.is_failure() && result != TestResult::Unknown {
            return;
        }
        let (text, color) = label(result);
        let mut out = self.out.borrow_mut();
        let _ = out.set_color(ColorSpec::new().set_fg(Some(color)).set_bold(true));
        let _ = write!(out, "{:<5}", text);
        let _ = out.reset();
        let _ = write!(out, " {} {}", test.number(), test.name());
        match test.elapsed() {
            Some(elapsed) if result != TestResult::Skipped => {
                let _ = writeln!(out, " ({:.3}s)", elapsed.as_secs_f64());
            }
            _ => {
                let _ = writeln!(out);
            }
        }
        for error in test.teardown_errors() {
            let _ = writeln!(out, "      teardown: {}", error);
        }
    }

    /// Totals, then the tests that did not pass. Printed in quiet mode too.
    pub fn print_summary(&self, summary: &Summary) {
        let rate = &summary.pass_rate;
        let mut out = self.out.borrow_mut();
        let _ = write!(out, "\nTest summary: total {}", rate.total);
        for (word, color, count) in [
            ("passed", Color::Green, rate.passed),
            ("passed with leaks", Color::Yellow, rate.passed_with_leak),
            ("failed", Color::Red, rate.failed),
            ("exceptions", Color::Red, rate.exception),
            ("skipped", Color::Yellow, rate.skipped),
            ("unknown", Color::Magenta, rate.unknown),
        ] {
            let _ = write!(out, ", ");
            let _ = out.set_color(ColorSpec::new().set_fg(Some(color)));
            let _ = write!(out, "{}", word);
            let _ = out.reset();
            let _ = write!(out, " {}", count);
        }
        let _ = writeln!(out, " ({:.3}s)", summary.elapsed_seconds);

        if !summary.problems.is_empty() {
            let _ = writeln!(out, "\nFailed tests:");
            for problem in &summary.problems {
                let _ = writeln!(
                    out,
                    "  - {} {} ({})",
                    problem.number, problem.name, problem.result
                );
            }
        }
        let _ = out.flush();
    }

    fn print_header(&self, test: &Test) {
        if self.quiet {
            return;
        }
        let mut out = self.out.borrow_mut();
        let _ = out.set_color(ColorSpec::new().set_bold(true));
        if test.number().is_root() {
            let _ = writeln!(out, "{}", test.name());
        } else {
            let _ = writeln!(out, "{} {}", test.number(), test.name());
        }
        let _ = out.reset();
    }
}

impl<W: WriteColor> Observer for ConsoleObserver<W> {
    fn on_lifecycle_event(&self, source: &Test, event: EventType) {
        match (event, source.is_sequence()) {
            (EventType::TestStart, true) => self.print_header(source),
            (EventType::TestEnd, false) => self.print_result(source),
            _ => {}
        }
    }

    fn on_check_failed(&self, source: &Test, check: &Check) {
        let mut out = self.out.borrow_mut();
        let _ = out.set_color(ColorSpec::new().set_fg(Some(Color::Red)));
        let _ = writeln!(
            out,
            "      {} {}: {}",
            source.number(),
            check.location(),
            check.message
        );
        let _ = out.reset();
    }

    fn on_exception_thrown(&self, source: &Test, description: &str) {
        let mut out = self.out.borrow_mut();
        let _ = out.set_color(ColorSpec::new().set_fg(Some(Color::Red)));
        let _ = writeln!(out, "      {} exception: {}", source.number(), description);
        let _ = out.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::case::TestCase;
    use crate::node::TestNode;
    use crate::sequence::TestSequence;
    use std::rc::Rc;
    use termcolor::Buffer;

    fn run_with(console: Rc<ConsoleObserver<Buffer>>) {
        let mut inner = TestSequence::new("maths");
        inner.append(TestCase::new("adds", |t| t.pass()));
        inner.append(TestCase::new("divides", |t| t.fail("by zero", "m.rs", 12)));

        let mut root = TestSequence::new("suite");
        root.add_observer(console);
        root.append(inner);
        root.append(TestCase::with_result("later", TestResult::Skipped));
        root.run().unwrap();
    }

    fn printed(console: Rc<ConsoleObserver<Buffer>>) -> String {
        let console = Rc::try_unwrap(console).ok().unwrap();
        String::from_utf8(console.into_inner().into_inner()).unwrap()
    }

    #[test]
    fn prints_headers_results_and_failures() {
        let console = Rc::new(ConsoleObserver::new(Buffer::no_color()));
        run_with(console.clone());
        let text = printed(console);
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "suite");
        assert_eq!(lines[1], "1 maths");
        assert!(lines[2].starts_with("PASS  1.1 adds ("));
        assert_eq!(lines[3], "      1.2 m.rs:12: by zero");
        assert!(lines[4].starts_with("FAIL  1.2 divides ("));
        assert_eq!(lines[5], "SKIP  2 later");
        assert_eq!(lines.len(), 6);
    }

    #[test]
    fn quiet_mode_only_prints_problems() {
        let console = Rc::new(ConsoleObserver::new(Buffer::no_color()).quiet(true));
        run_with(console.clone());
        let text = printed(console);
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "      1.2 m.rs:12: by zero");
        assert!(lines[1].starts_with("FAIL  1.2 divides"));
    }

    #[test]
    fn summary_lists_totals_and_problems() {
        let mut root = TestSequence::new("suite");
        root.append(TestCase::new("fine", |t| t.pass()));
        root.append(TestCase::new("broken", |_t| panic!("oops")));
        root.run().unwrap();
        let summary = Summary::of(&root);

        let console = ConsoleObserver::new(Buffer::no_color());
        console.print_summary(&summary);
        let text = String::from_utf8(console.into_inner().into_inner()).unwrap();

        assert!(text.contains(
            "Test summary: total 2, passed 1, passed with leaks 0, failed 0, exceptions 1, skipped 0, unknown 0"
        ));
        assert!(text.contains("Failed tests:\n  - 2 broken (exception)\n"));
    }
}
