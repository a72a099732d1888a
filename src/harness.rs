//! Top-level test runner.
//!
//! [`TestHarness`] owns the root sequence of a test program. It applies a
//! [`HarnessConfig`] (command line, optionally layered over a YAML file) to
//! the tree, runs it with a [`ConsoleObserver`] attached, prints a summary,
//! writes the requested reports and turns the outcome into an exit code.
//!
//! ```rust,no_run
//! use clap::Parser;
//! use trellis::{HarnessConfig, TestCase, TestHarness};
//!
//! let config = HarnessConfig::parse().load().unwrap();
//! let mut harness = TestHarness::with_config("my tests", config);
//! harness.append(TestCase::new("works", |test| test.pass()));
//! let summary = harness.run().unwrap();
//! std::process::exit(summary.exit_code());
//! ```

use chrono::{DateTime, Utc};
use clap::{Parser, ValueEnum};
use log::info;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use termcolor::{ColorChoice, WriteColor};

use crate::console::ConsoleObserver;
use crate::errors::TestError;
use crate::junit;
use crate::node::TestNode;
use crate::observer::Observer;
use crate::result::{PassRate, TestResult};
use crate::sequence::TestSequence;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    /// Color when stdout is a terminal.
    #[default]
    Auto,
    Always,
    Never,
}

/// Options of a test program.
///
/// Every option can also come from a YAML file given with `--config`, using
/// the flag names as keys. Flags given on the command line win.
#[derive(Debug, Clone, Default, PartialEq, Parser, Serialize, Deserialize)]
#[command(version, about = "Run a trellis test tree")]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct HarnessConfig {
    /// YAML file with default values for the other options.
    #[arg(long, value_name = "FILE")]
    #[serde(skip)]
    pub config: Option<PathBuf>,

    /// Write a JUnit XML report of the run to this file.
    #[arg(long, value_name = "FILE")]
    pub junit_xml_report: Option<PathBuf>,

    /// Write the summary as JSON to this file.
    #[arg(long, value_name = "FILE")]
    pub summary_json: Option<PathBuf>,

    /// Root test data directory.
    #[arg(long, value_name = "DIR")]
    pub test_data_dir: Option<PathBuf>,

    /// Root reference data directory.
    #[arg(long, value_name = "DIR")]
    pub reference_data_dir: Option<PathBuf>,

    /// Root output directory.
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Only run tests whose path ("sequence/test") contains this text; the
    /// others are skipped.
    #[arg(long, value_name = "TEXT")]
    pub filter: Option<String>,

    #[arg(long, value_enum)]
    pub color: Option<ColorMode>,

    /// Only print failures and the summary.
    #[arg(long, short)]
    pub quiet: bool,
}

impl HarnessConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, TestError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, TestError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| TestError::io(path, e))?;
        Self::from_yaml_str(&text)
    }

    /// Fill the options not given here from the `--config` file, if any.
    pub fn load(self) -> Result<Self, TestError> {
        match &self.config {
            Some(path) => {
                info!("reading harness configuration from {}", path.display());
                let file = Self::from_yaml_file(path)?;
                Ok(self.or(file))
            }
            None => Ok(self),
        }
    }

    /// Keep every value set here, take the rest from `fallback`.
    pub fn or(self, fallback: HarnessConfig) -> Self {
        Self {
            config: self.config.or(fallback.config),
            junit_xml_report: self.junit_xml_report.or(fallback.junit_xml_report),
            summary_json: self.summary_json.or(fallback.summary_json),
            test_data_dir: self.test_data_dir.or(fallback.test_data_dir),
            reference_data_dir: self.reference_data_dir.or(fallback.reference_data_dir),
            output_dir: self.output_dir.or(fallback.output_dir),
            filter: self.filter.or(fallback.filter),
            color: self.color.or(fallback.color),
            quiet: self.quiet || fallback.quiet,
        }
    }

    pub fn color_choice(&self) -> ColorChoice {
        match self.color.unwrap_or_default() {
            ColorMode::Always => ColorChoice::Always,
            ColorMode::Never => ColorChoice::Never,
            ColorMode::Auto if atty::is(atty::Stream::Stdout) => ColorChoice::Auto,
            ColorMode::Auto => ColorChoice::Never,
        }
    }
}

/// A test that did not pass, as listed in the summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Problem {
    pub number: String,
    pub name: String,
    pub result: TestResult,
}

/// Outcome of a harness run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub title: String,
    pub result: TestResult,
    pub pass_rate: PassRate,
    pub elapsed_seconds: f64,
    pub started_at: Option<DateTime<Utc>>,
    pub problems: Vec<Problem>,
}

impl Summary {
    pub fn of(root: &dyn TestNode) -> Self {
        let mut problems = Vec::new();
        root.traverse(&mut |node| {
            let result = node.result();
            if !node.is_sequence() && (result.is_failure() || result == TestResult::Unknown) {
                problems.push(Problem {
                    number: node.number().to_string(),
                    name: node.name().to_string(),
                    result,
                });
            }
        });
        Self {
            title: root.name().to_string(),
            result: root.result(),
            pass_rate: root.pass_rate(),
            elapsed_seconds: root
                .test()
                .elapsed()
                .map(|elapsed| elapsed.as_secs_f64())
                .unwrap_or(0.0),
            started_at: root.test().started_at(),
            problems,
        }
    }

    /// No failure, no exception and no test left without an outcome.
    /// Leaks and skips do not count against a run.
    pub fn success(&self) -> bool {
        !self.result.is_failure()
            && self.pass_rate.failed == 0
            && self.pass_rate.exception == 0
            && self.pass_rate.unknown == 0
    }

    pub fn exit_code(&self) -> i32 {
        if self.success() {
            0
        } else {
            1
        }
    }
}

pub struct TestHarness {
    root: TestSequence,
    config: HarnessConfig,
}

impl TestHarness {
    pub fn new(title: impl Into<String>) -> Self {
        Self::with_config(title, HarnessConfig::default())
    }

    pub fn with_config(title: impl Into<String>, config: HarnessConfig) -> Self {
        Self {
            root: TestSequence::new(title),
            config,
        }
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: HarnessConfig) {
        self.config = config;
    }

    /// Add a top-level test. Top-level tests are numbered 1, 2, ...
    pub fn append(&mut self, child: impl TestNode + 'static) -> &mut Self {
        self.root.append(child);
        self
    }

    pub fn tests(&self) -> &TestSequence {
        &self.root
    }

    pub fn tests_mut(&mut self) -> &mut TestSequence {
        &mut self.root
    }

    /// Run with progress printed to stdout.
    pub fn run(&mut self) -> Result<Summary, TestError> {
        let console = ConsoleObserver::stdout(self.config.color_choice()).quiet(self.config.quiet);
        self.run_with_console(Rc::new(console))
    }

    pub fn run_with_console<W>(&mut self, console: Rc<ConsoleObserver<W>>) -> Result<Summary, TestError>
    where
        W: WriteColor + 'static,
    {
        self.apply_config();

        let observer: Rc<dyn Observer> = console.clone();
        self.root.add_observer(Rc::clone(&observer));
        info!(
            "running `{}`: {} top-level test(s)",
            self.root.name(),
            self.root.len()
        );
        let outcome = self.root.run();
        self.root.test_mut().observers().remove(&observer);
        outcome?;

        let summary = Summary::of(&self.root);
        console.print_summary(&summary);

        if let Some(path) = &self.config.junit_xml_report {
            junit::write_report_file(path, &self.root)?;
            info!("JUnit XML report written to {}", path.display());
        }
        if let Some(path) = &self.config.summary_json {
            write_summary_json(path, &summary)?;
            info!("summary written to {}", path.display());
        }
        Ok(summary)
    }

    fn apply_config(&mut self) {
        let context = self.root.test_mut().context_mut();
        if let Some(dir) = &self.config.test_data_dir {
            context.set_test_data_directory(dir);
        }
        if let Some(dir) = &self.config.reference_data_dir {
            context.set_reference_data_directory(dir);
        }
        if let Some(dir) = &self.config.output_dir {
            context.set_output_directory(dir);
        }
        self.root.reattach_children();

        if let Some(filter) = &self.config.filter {
            let (_, children) = self.root.parts_mut();
            let skipped: usize = children
                .iter_mut()
                .map(|child| skip_unmatched(child.as_mut(), filter, ""))
                .sum();
            info!("filter `{}` skips {} test(s)", filter, skipped);
        }
    }
}

/// Mark every leaf under `node` whose path does not contain `filter` as
/// skipped. Returns how many were.
fn skip_unmatched(node: &mut dyn TestNode, filter: &str, parent_path: &str) -> usize {
    let path = if parent_path.is_empty() {
        node.name().to_string()
    } else {
        format!("{}/{}", parent_path, node.name())
    };
    let (test, children) = node.parts_mut();
    if !test.is_sequence() {
        if path.contains(filter) {
            return 0;
        }
        test.skip();
        return 1;
    }
    children
        .iter_mut()
        .map(|child| skip_unmatched(child.as_mut(), filter, &path))
        .sum()
}

fn write_summary_json(path: &Path, summary: &Summary) -> Result<(), TestError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| TestError::io(parent, e))?;
    }
    let file = fs::File::create(path).map_err(|e| TestError::io(path, e))?;
    serde_json::to_writer_pretty(BufWriter::new(file), summary)?;
    Ok(())
}
