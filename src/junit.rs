//! JUnit XML report of a test tree.
//!
//! Sequences become `<testsuite>` elements and leaf tests `<testcase>`
//! elements, nested the way the tree is and written in pre-order, so a tree
//! that did not change produces the same document apart from times.

use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::errors::TestError;
use crate::node::TestNode;
use crate::result::TestResult;

pub const NO_OUTCOME_MESSAGE: &str = "test did not report an outcome";

pub fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

fn write_failed(e: io::Error) -> TestError {
    TestError::Report {
        message: "could not write JUnit XML report".to_string(),
        source: Some(Box::new(e)),
    }
}

fn seconds(node: &dyn TestNode) -> f64 {
    node.test()
        .elapsed()
        .map(|elapsed| elapsed.as_secs_f64())
        .unwrap_or(0.0)
}

pub struct JUnitXmlWriter<W: Write> {
    out: W,
}

impl<W: Write> JUnitXmlWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// Write the whole document for the tree under `root`.
    pub fn write(&mut self, root: &dyn TestNode) -> Result<(), TestError> {
        self.write_document(root).map_err(write_failed)
    }

    fn write_document(&mut self, root: &dyn TestNode) -> io::Result<()> {
        let rate = root.pass_rate();
        writeln!(self.out, "<?xml version=\"1.0\" encoding=\"UTF-8\"?>")?;
        writeln!(
            self.out,
            "<testsuites name=\"{}\" tests=\"{}\" failures=\"{}\" errors=\"{}\" skipped=\"{}\" time=\"{:.3}\">",
            escape_xml(root.name()),
            rate.total,
            rate.failed + rate.unknown,
            rate.exception,
            rate.skipped,
            seconds(root)
        )?;
        if root.is_sequence() {
            self.write_suite(root, 1, &[])?;
        } else {
            // A lone test still needs a suite around it.
            writeln!(
                self.out,
                "  <testsuite name=\"{}\" tests=\"1\">",
                escape_xml(root.name())
            )?;
            self.write_case(root, 2, root.name())?;
            writeln!(self.out, "  </testsuite>")?;
        }
        writeln!(self.out, "</testsuites>")?;
        self.out.flush()
    }

    fn write_node(&mut self, node: &dyn TestNode, depth: usize, path: &[&str]) -> io::Result<()> {
        if node.is_sequence() {
            self.write_suite(node, depth, path)
        } else {
            self.write_case(node, depth, &path.join("."))
        }
    }

    fn write_suite(&mut self, node: &dyn TestNode, depth: usize, path: &[&str]) -> io::Result<()> {
        let indent = "  ".repeat(depth);
        let test = node.test();
        let rate = node.pass_rate();

        write!(
            self.out,
            "{}<testsuite name=\"{}\" id=\"{}\" tests=\"{}\" failures=\"{}\" errors=\"{}\" skipped=\"{}\" time=\"{:.3}\"",
            indent,
            escape_xml(node.name()),
            node.number(),
            rate.total,
            rate.failed + rate.unknown,
            rate.exception,
            rate.skipped,
            seconds(node)
        )?;
        if let Some(started_at) = test.started_at() {
            write!(
                self.out,
                " timestamp=\"{}\"",
                started_at.format("%Y-%m-%dT%H:%M:%S")
            )?;
        }
        writeln!(self.out, ">")?;

        let mut nested = path.to_vec();
        nested.push(node.name());
        for child in node.children() {
            self.write_node(child.as_ref(), depth + 1, &nested)?;
        }

        // Problems of the sequence itself, outside any child.
        let mut own = Vec::new();
        for check in test.failed_checks() {
            own.push(format!("{}: {}", check.location(), check.message));
        }
        if let Some(exception) = test.exception() {
            own.push(format!("exception: {}", exception));
        }
        own.extend(test.teardown_errors().iter().map(|e| format!("teardown: {}", e)));
        if !own.is_empty() {
            writeln!(
                self.out,
                "{}  <system-err>{}</system-err>",
                indent,
                escape_xml(&own.join("\n"))
            )?;
        }

        writeln!(self.out, "{}</testsuite>", indent)
    }

    fn write_case(&mut self, node: &dyn TestNode, depth: usize, classname: &str) -> io::Result<()> {
        let indent = "  ".repeat(depth);
        let test = node.test();
        let result = node.result();

        write!(
            self.out,
            "{}<testcase name=\"{}\" id=\"{}\" classname=\"{}\" time=\"{:.3}\" status=\"{}\"",
            indent,
            escape_xml(node.name()),
            node.number(),
            escape_xml(classname),
            seconds(node),
            result
        )?;

        let mut body = Vec::new();
        for check in test.failed_checks() {
            body.push(format!(
                "<failure message=\"{}\" type=\"check\">{}</failure>",
                escape_xml(&check.message),
                escape_xml(&check.location())
            ));
        }
        match result {
            TestResult::Exception => body.push(format!(
                "<error message=\"{}\" type=\"exception\"/>",
                escape_xml(test.exception().unwrap_or("unknown exception"))
            )),
            TestResult::Skipped => body.push("<skipped/>".to_string()),
            TestResult::Unknown => body.push(format!(
                "<failure message=\"{}\" type=\"unknown\"/>",
                NO_OUTCOME_MESSAGE
            )),
            TestResult::PassedWithLeak => body.push(format!(
                "<system-out>leaked {} allocation(s)</system-out>",
                test.leaked_allocations()
            )),
            TestResult::Passed | TestResult::Failed => {}
        }
        if !test.teardown_errors().is_empty() {
            body.push(format!(
                "<system-err>{}</system-err>",
                escape_xml(&test.teardown_errors().join("\n"))
            ));
        }

        if body.is_empty() {
            return writeln!(self.out, "/>");
        }
        writeln!(self.out, ">")?;
        for line in body {
            writeln!(self.out, "{}  {}", indent, line)?;
        }
        writeln!(self.out, "{}</testcase>", indent)
    }
}

pub fn to_junit_xml(root: &dyn TestNode) -> Result<String, TestError> {
    let mut writer = JUnitXmlWriter::new(Vec::new());
    writer.write(root)?;
    String::from_utf8(writer.into_inner()).map_err(|e| TestError::Report {
        message: "JUnit XML report is not valid UTF-8".to_string(),
        source: Some(Box::new(e)),
    })
}

/// Write the report to `path`, creating missing parent directories.
pub fn write_report_file(path: impl AsRef<Path>, root: &dyn TestNode) -> Result<(), TestError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| TestError::io(parent, e))?;
    }
    let file = fs::File::create(path).map_err(|e| TestError::io(path, e))?;
    JUnitXmlWriter::new(BufWriter::new(file)).write(root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::FnTeardownAction;
    use crate::case::TestCase;
    use crate::clock::ManualClock;
    use crate::sequence::TestSequence;
    use std::rc::Rc;

    fn run(mut root: TestSequence) -> TestSequence {
        root.set_clock(Rc::new(ManualClock::new()));
        root.run().unwrap();
        root
    }

    #[test]
    fn escapes_markup_characters() {
        assert_eq!(
            escape_xml(r#"<a href="x">Tom & 'Jerry'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &apos;Jerry&apos;&lt;/a&gt;"
        );
    }

    #[test]
    fn cases_follow_traversal_order_with_failure_detail() {
        let mut root = TestSequence::new("suite");
        root.append(TestCase::new("first", |t| t.pass()));
        root.append(TestCase::new("second", |t| t.pass()));
        root.append(TestCase::new("third", |t| t.fail("expected 1", "f.cpp", 42)));
        let root = run(root);

        let xml = to_junit_xml(&root).unwrap();
        let statuses: Vec<&str> = xml
            .lines()
            .filter(|line| line.trim_start().starts_with("<testcase"))
            .map(|line| {
                let start = line.find("status=\"").unwrap() + "status=\"".len();
                let end = start + line[start..].find('"').unwrap();
                &line[start..end]
            })
            .collect();
        assert_eq!(statuses, ["passed", "passed", "failed"]);
        assert!(xml.contains(
            "<failure message=\"expected 1\" type=\"check\">f.cpp:42</failure>"
        ));
        assert!(xml.contains(
            "<testsuite name=\"suite\" id=\"\" tests=\"3\" failures=\"1\" errors=\"0\" skipped=\"0\" time=\"0.000\" timestamp=\"1970-01-01T00:00:00\">"
        ));
    }

    #[test]
    fn nested_sequences_nest_suites() {
        let mut inner = TestSequence::new("inner");
        inner.append(TestCase::new("leaf", |t| t.pass()));
        let mut root = TestSequence::new("outer");
        root.append(inner);
        let root = run(root);

        let xml = to_junit_xml(&root).unwrap();
        let expected = "\
<?xml version=\"1.0\" encoding=\"UTF-8\"?>
<testsuites name=\"outer\" tests=\"1\" failures=\"0\" errors=\"0\" skipped=\"0\" time=\"0.000\">
  <testsuite name=\"outer\" id=\"\" tests=\"1\" failures=\"0\" errors=\"0\" skipped=\"0\" time=\"0.000\" timestamp=\"1970-01-01T00:00:00\">
    <testsuite name=\"inner\" id=\"1\" tests=\"1\" failures=\"0\" errors=\"0\" skipped=\"0\" time=\"0.000\" timestamp=\"1970-01-01T00:00:00\">
      <testcase name=\"leaf\" id=\"1.1\" classname=\"outer.inner\" time=\"0.000\" status=\"passed\"/>
    </testsuite>
  </testsuite>
</testsuites>
";
        assert_eq!(xml, expected);
    }

    #[test]
    fn skipped_exception_unknown_and_teardown_errors_are_reported() {
        let mut root = TestSequence::new("suite");
        root.append(TestCase::with_result("skipped", TestResult::Skipped));
        root.append(TestCase::new("boom", |_t| panic!("index <3> out of range")));
        root.append(TestCase::new("silent", |_t| {}));
        let mut noisy = TestCase::new("noisy", |t| t.pass());
        noisy
            .test_mut()
            .add_teardown_action(FnTeardownAction(|| Err(TestError::teardown("port busy"))));
        root.append(noisy);
        let root = run(root);

        let xml = to_junit_xml(&root).unwrap();
        assert!(xml.contains("status=\"skipped\">\n      <skipped/>"));
        assert!(xml.contains(
            "<error message=\"index &lt;3&gt; out of range\" type=\"exception\"/>"
        ));
        assert!(xml.contains(
            "<failure message=\"test did not report an outcome\" type=\"unknown\"/>"
        ));
        assert!(xml.contains("<system-err>Teardown error: port busy</system-err>"));
        assert!(xml.contains(
            "tests=\"4\" failures=\"1\" errors=\"1\" skipped=\"1\""
        ));
    }

    #[test]
    fn report_file_creates_missing_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reports").join("nested").join("junit.xml");

        let mut root = TestSequence::new("suite");
        root.append(TestCase::new("only", |t| t.pass()));
        let root = run(root);

        write_report_file(&path, &root).unwrap();
        let written = fs::read_to_string(&path).unwrap();
        assert_eq!(written, to_junit_xml(&root).unwrap());
    }
}
