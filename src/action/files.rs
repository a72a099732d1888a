use log::debug;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::TeardownAction;
use crate::errors::TestError;

/// Deletes the files a test produced once it is done with them.
#[derive(Debug, Default, Clone)]
pub struct FilesTeardownAction {
    files: Vec<PathBuf>,
}

impl FilesTeardownAction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, path: impl Into<PathBuf>) {
        self.files.push(path.into());
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }
}

fn remove(path: &Path) -> std::io::Result<()> {
    if path.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    }
}

impl TeardownAction for FilesTeardownAction {
    /// Missing files are fine. Every file is attempted; the first real error
    /// is returned.
    fn teardown(&mut self) -> Result<(), TestError> {
        let mut first_error = None;
        for path in &self.files {
            match remove(path) {
                Ok(()) => debug!("removed {}", path.display()),
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => {
                    if first_error.is_none() {
                        first_error = Some(TestError::teardown_io(
                            format!("could not remove {}", path.display()),
                            e,
                        ));
                    }
                }
            }
        }
        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}
