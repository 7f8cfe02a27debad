//! External editor launching.

use std::path::Path;
use std::process::Command;

use crate::error::{FolioError, FolioResult};

/// Something that lets the user edit a file in place and returns once
/// they are done.
pub trait Editor {
    fn invoke(&self, path: &Path) -> FolioResult<()>;
}

/// Runs an interactive program such as `vim` or `code --wait` against the
/// file and blocks until it exits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalEditor {
    program: String,
    args: Vec<String>,
}

impl ExternalEditor {
    /// Build from a command line like the value of `$EDITOR`.
    ///
    /// The first whitespace-separated word is the program; the rest are
    /// passed before the file path.
    pub fn from_command(command: &str) -> FolioResult<Self> {
        let mut words = command.split_whitespace().map(str::to_string);
        let program = words
            .next()
            .ok_or_else(|| FolioError::Config("editor command is empty".to_string()))?;
        Ok(Self {
            program,
            args: words.collect(),
        })
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

impl Editor for ExternalEditor {
    fn invoke(&self, path: &Path) -> FolioResult<()> {
        tracing::debug!(program = %self.program, path = %path.display(), "launching editor");
        let status = Command::new(&self.program)
            .args(&self.args)
            .arg(path)
            .status()
            .map_err(|e| FolioError::Launch {
                program: self.program.clone(),
                reason: e.to_string(),
            })?;

        if !status.success() {
            return Err(FolioError::Launch {
                program: self.program.clone(),
                reason: format!("exited with {status}"),
            });
        }
        Ok(())
    }
}
