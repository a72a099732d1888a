use log::{debug, warn};
use std::process::{Child, Command, ExitStatus, Stdio};

use super::{SetupAction, TeardownAction};
use crate::errors::TestError;
use crate::test::Test;

/// What teardown does with the process before waiting for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessMode {
    /// Kill it, then wait.
    Terminate,
    /// Let it finish on its own.
    WaitForExit,
}

/// Runs an external process for the duration of a test.
///
/// Register it as both a setup and a teardown action (see
/// `Test::add_action`). Setup spawns the command line, teardown kills it
/// in [`ProcessMode::Terminate`] mode and then always waits, so the process
/// never outlives the test.
#[derive(Debug)]
pub struct ProcessAction {
    command_line: String,
    mode: ProcessMode,
    child: Option<Child>,
    exit_status: Option<ExitStatus>,
}

impl ProcessAction {
    /// `command_line` is split on whitespace: program first, then arguments.
    pub fn new(command_line: impl Into<String>, mode: ProcessMode) -> Self {
        Self {
            command_line: command_line.into(),
            mode,
            child: None,
            exit_status: None,
        }
    }

    pub fn command_line(&self) -> &str {
        &self.command_line
    }

    pub fn mode(&self) -> ProcessMode {
        self.mode
    }

    pub fn is_running(&self) -> bool {
        self.child.is_some()
    }

    pub fn pid(&self) -> Option<u32> {
        self.child.as_ref().map(Child::id)
    }

    /// Exit status collected by teardown.
    pub fn exit_status(&self) -> Option<ExitStatus> {
        self.exit_status
    }

    fn spawn(&self) -> Result<Child, TestError> {
        let mut words = self.command_line.split_whitespace();
        let program = words.next().ok_or_else(|| {
            TestError::execution("ProcessAction::setup was given an empty command line")
        })?;
        Command::new(program)
            .args(words)
            .stdin(Stdio::null())
            .spawn()
            .map_err(|e| {
                TestError::execution_io(
                    format!("ProcessAction::setup failed to execute: {}", self.command_line),
                    e,
                )
            })
    }
}

impl SetupAction for ProcessAction {
    fn setup(&mut self, test: &Test) -> Result<(), TestError> {
        let child = self.spawn()?;
        debug!(
            "test {} `{}`: spawned pid {} for `{}`",
            test.number(),
            test.name(),
            child.id(),
            self.command_line
        );
        self.exit_status = None;
        self.child = Some(child);
        Ok(())
    }
}

impl TeardownAction for ProcessAction {
    fn teardown(&mut self) -> Result<(), TestError> {
        // Taking the handle guarantees a single wait per spawn.
        let Some(mut child) = self.child.take() else {
            return Ok(());
        };
        if self.mode == ProcessMode::Terminate {
            // Fails harmlessly when the process is already gone.
            if let Err(e) = child.kill() {
                debug!("kill of pid {} was a no-op: {}", child.id(), e);
            }
        }
        let status = child.wait().map_err(|e| {
            TestError::teardown_io(
                format!("failed to wait for `{}`", self.command_line),
                e,
            )
        })?;
        debug!("`{}` exited with {}", self.command_line, status);
        self.exit_status = Some(status);
        Ok(())
    }
}

impl Drop for ProcessAction {
    fn drop(&mut self) {
        if let Some(mut child) = self.child.take() {
            warn!(
                "ProcessAction for `{}` dropped before teardown, killing pid {}",
                self.command_line,
                child.id()
            );
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    #[test]
    fn terminate_kills_then_waits() {
        let test = Test::new("process");
        let mut action = ProcessAction::new("sleep 30", ProcessMode::Terminate);

        action.setup(&test).unwrap();
        assert!(action.is_running());

        let start = Instant::now();
        action.teardown().unwrap();
        assert!(start.elapsed() < Duration::from_secs(10));
        assert!(!action.is_running());

        let status = action.exit_status().expect("teardown waited");
        assert!(!status.success());
    }

    #[test]
    fn terminate_tolerates_an_already_exited_process() {
        let test = Test::new("process");
        let mut action = ProcessAction::new("true", ProcessMode::Terminate);
        action.setup(&test).unwrap();
        std::thread::sleep(Duration::from_millis(100));

        action.teardown().unwrap();
        assert!(action.exit_status().is_some());
    }

    #[test]
    fn wait_for_exit_collects_the_status() {
        let test = Test::new("process");
        let mut action = ProcessAction::new("sh -c exit", ProcessMode::WaitForExit);
        action.setup(&test).unwrap();
        action.teardown().unwrap();
        assert!(action.exit_status().unwrap().success());
    }

    #[test]
    fn teardown_without_setup_is_a_no_op() {
        let mut action = ProcessAction::new("sleep 30", ProcessMode::Terminate);
        action.teardown().unwrap();
        assert!(action.exit_status().is_none());
    }

    #[test]
    fn spawn_failure_is_an_execution_error() {
        let test = Test::new("process");
        let mut missing = ProcessAction::new("/definitely/not/a/program", ProcessMode::Terminate);
        assert!(matches!(
            missing.setup(&test),
            Err(TestError::Execution { .. })
        ));

        let mut empty = ProcessAction::new("   ", ProcessMode::WaitForExit);
        assert!(matches!(empty.setup(&test), Err(TestError::Execution { .. })));
    }
}
