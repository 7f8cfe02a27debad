//! Line-oriented console used by the interactive editors.
//!
//! Editors never touch stdin directly. They read through a [`Console`],
//! so a terminal, a pipe, or a scripted list of answers can drive them.

use std::collections::VecDeque;
use std::io::{self, BufRead, Write};

use crate::error::FolioResult;

/// Source of typed answers plus a sink for user-facing messages.
pub trait Console {
    /// Show `prompt` and read one line without its line terminator.
    ///
    /// Returns `None` at end of input.
    fn read_line(&mut self, prompt: &str) -> FolioResult<Option<String>>;

    /// Report a message to the user.
    fn notice(&mut self, message: &str);

    /// Ask a yes/no question. Anything starting with `y` counts as yes;
    /// end of input counts as no.
    fn confirm(&mut self, question: &str) -> FolioResult<bool> {
        let answer = self.read_line(&format!("{question} (y/n): "))?;
        Ok(answer
            .map(|a| a.trim().to_lowercase().starts_with('y'))
            .unwrap_or(false))
    }
}

/// Read one line, treating end of input as an empty answer.
pub fn ask(console: &mut dyn Console, prompt: &str) -> FolioResult<String> {
    Ok(console.read_line(prompt)?.unwrap_or_default())
}

/// Lazily read lines until a blank line or end of input.
///
/// Each item is one non-empty answer; the terminating blank line is
/// consumed and not yielded.
pub fn until_blank<'a>(console: &'a mut dyn Console, prompt: &'a str) -> UntilBlank<'a> {
    UntilBlank {
        console,
        prompt,
        done: false,
    }
}

/// Iterator returned by [`until_blank`].
pub struct UntilBlank<'a> {
    console: &'a mut dyn Console,
    prompt: &'a str,
    done: bool,
}

impl Iterator for UntilBlank<'_> {
    type Item = FolioResult<String>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.console.read_line(self.prompt) {
            Ok(Some(line)) if !line.is_empty() => Some(Ok(line)),
            Ok(_) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

/// Console bound to the process's stdin/stdout.
#[derive(Debug, Default)]
pub struct StdinConsole;

impl Console for StdinConsole {
    fn read_line(&mut self, prompt: &str) -> FolioResult<Option<String>> {
        let mut stdout = io::stdout();
        write!(stdout, "{prompt}")?;
        stdout.flush()?;

        let mut line = String::new();
        if io::stdin().lock().read_line(&mut line)? == 0 {
            return Ok(None);
        }
        let trimmed = line.trim_end_matches(['\n', '\r']).len();
        line.truncate(trimmed);
        Ok(Some(line))
    }

    fn notice(&mut self, message: &str) {
        println!("{message}");
    }
}

/// Non-interactive console: every prompt reads as end of input and
/// notices go to the log instead of stdout.
#[derive(Debug, Default)]
pub struct QuietConsole;

impl Console for QuietConsole {
    fn read_line(&mut self, prompt: &str) -> FolioResult<Option<String>> {
        tracing::debug!(prompt, "no input available");
        Ok(None)
    }

    fn notice(&mut self, message: &str) {
        tracing::info!(message);
    }
}

/// Console that answers from a fixed script and records everything it
/// is asked and told.
#[derive(Debug, Default)]
pub struct ScriptedConsole {
    answers: VecDeque<String>,
    prompts: Vec<String>,
    notices: Vec<String>,
}

impl ScriptedConsole {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Prompts shown so far, in order.
    pub fn prompts(&self) -> &[String] {
        &self.prompts
    }

    /// Messages reported so far, in order.
    pub fn notices(&self) -> &[String] {
        &self.notices
    }

    /// Answers not consumed yet.
    pub fn remaining(&self) -> usize {
        self.answers.len()
    }
}

impl Console for ScriptedConsole {
    fn read_line(&mut self, prompt: &str) -> FolioResult<Option<String>> {
        self.prompts.push(prompt.to_string());
        Ok(self.answers.pop_front())
    }

    fn notice(&mut self, message: &str) {
        self.notices.push(message.to_string());
    }
}
