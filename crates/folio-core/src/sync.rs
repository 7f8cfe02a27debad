//! Sync controller: the load, mutate, save and publish workflow.
//!
//! Every command runs one full cycle against a fresh copy of the
//! document:
//!
//! ```text
//! Idle → Syncing → Loaded → Mutated → Saved → Published → Done
//!   (any step) → Aborted
//! ```
//!
//! `pull` stops after syncing and `view` stops after loading. Mutations
//! that leave the document unchanged skip save and publish, so the file
//! stays byte-for-byte identical and no empty commit is made.
//!
//! No lock is taken on the replica. Two invocations working on the same
//! directory at once are not supported.

use std::fmt;

use chrono::{DateTime, Local};

use crate::config::Config;
use crate::console::Console;
use crate::document::{self, Document};
use crate::editors::{self, EditOutcome};
use crate::error::FolioResult;
use crate::freeform;
use crate::git::{SourceControl, SyncReport};
use crate::launcher::Editor;
use crate::summary::Summary;

/// A command the controller can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    SyncOnly,
    ViewSummary,
    EditFreeform,
    AddProject,
    DeleteProject,
    AddTimelineEntry,
    AddSkill,
}

impl Operation {
    /// Command-line name of the operation.
    pub fn name(self) -> &'static str {
        match self {
            Operation::SyncOnly => "pull",
            Operation::ViewSummary => "view",
            Operation::EditFreeform => "edit",
            Operation::AddProject => "add-project",
            Operation::DeleteProject => "delete-project",
            Operation::AddTimelineEntry => "add-timeline",
            Operation::AddSkill => "add-skill",
        }
    }

    /// True for operations that change the document and publish it.
    pub fn is_mutating(self) -> bool {
        !matches!(self, Operation::SyncOnly | Operation::ViewSummary)
    }

    /// Default publish message, e.g. `Add new skill - 2024-05-01 09:30`.
    ///
    /// `None` for operations that never publish.
    pub fn default_message(self, now: DateTime<Local>) -> Option<String> {
        let label = match self {
            Operation::SyncOnly | Operation::ViewSummary => return None,
            Operation::EditFreeform => "Update portfolio data",
            Operation::AddProject => "Add new project",
            Operation::DeleteProject => "Delete project",
            Operation::AddTimelineEntry => "Add new timeline entry",
            Operation::AddSkill => "Add new skill",
        };
        Some(format!("{label} - {}", now.format("%Y-%m-%d %H:%M")))
    }
}

/// Workflow state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Syncing,
    Loaded,
    Mutated,
    Saved,
    Published,
    Done,
    Aborted,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Idle => "idle",
            Phase::Syncing => "syncing",
            Phase::Loaded => "loaded",
            Phase::Mutated => "mutated",
            Phase::Saved => "saved",
            Phase::Published => "published",
            Phase::Done => "done",
            Phase::Aborted => "aborted",
        };
        f.write_str(name)
    }
}

/// Result of a completed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub operation: Operation,
    pub sync: SyncReport,
    pub outcome: Option<EditOutcome>,
    pub summary: Option<Summary>,
    /// Commit id, when something was published.
    pub commit: Option<String>,
}

/// Drives one command through the workflow.
pub struct SyncController<S, E, C> {
    config: Config,
    scm: S,
    editor: E,
    console: C,
    phase: Phase,
}

impl<S, E, C> SyncController<S, E, C>
where
    S: SourceControl,
    E: Editor,
    C: Console,
{
    pub fn new(config: Config, scm: S, editor: E, console: C) -> Self {
        Self {
            config,
            scm,
            editor,
            console,
            phase: Phase::Idle,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn source_control(&self) -> &S {
        &self.scm
    }

    pub fn console(&self) -> &C {
        &self.console
    }

    /// Run `op`. `message` replaces the default publish message.
    ///
    /// On error the controller is left in [`Phase::Aborted`].
    pub fn run(&mut self, op: Operation, message: Option<String>) -> FolioResult<RunReport> {
        let result = self.run_inner(op, message);
        if let Err(e) = &result {
            tracing::debug!(from = %self.phase, error = %e, "aborting");
            self.phase = Phase::Aborted;
        }
        result
    }

    fn run_inner(&mut self, op: Operation, message: Option<String>) -> FolioResult<RunReport> {
        self.advance(Phase::Syncing);
        if self.config.repo_dir.exists() {
            self.console.notice("Pulling latest changes...");
        } else {
            let source = self.config.remote_url.as_deref().unwrap_or("remote");
            self.console
                .notice(&format!("Cloning repository from {source}..."));
        }
        let sync = self.scm.ensure_present_and_current()?;

        let mut report = RunReport {
            operation: op,
            sync,
            outcome: None,
            summary: None,
            commit: None,
        };

        if op == Operation::SyncOnly {
            self.console.notice("Repository updated successfully.");
            self.advance(Phase::Done);
            return Ok(report);
        }

        let path = self.config.document_path();
        let mut doc = document::load(&path)?;
        self.advance(Phase::Loaded);

        if op == Operation::ViewSummary {
            let summary = Summary::of(&doc);
            self.console.notice(&summary.to_string());
            report.summary = Some(summary);
            self.advance(Phase::Done);
            return Ok(report);
        }

        let outcome = self.mutate(op, &mut doc)?;
        self.advance(Phase::Mutated);
        self.console.notice(&outcome.to_string());

        if !outcome.changed() {
            tracing::info!(operation = op.name(), ?outcome, "nothing to publish");
            report.outcome = Some(outcome);
            self.advance(Phase::Done);
            return Ok(report);
        }

        document::save(&doc, &path)?;
        self.advance(Phase::Saved);
        let saved = format!("Portfolio data saved successfully to {}", path.display());
        self.console.notice(&saved);

        let message = match message {
            Some(m) => m,
            None => op
                .default_message(Local::now())
                .unwrap_or_else(|| op.name().to_string()),
        };
        self.scm.stage(&self.config.document)?;
        let commit = self.scm.commit(&message)?;
        self.scm.push()?;
        self.advance(Phase::Published);
        tracing::info!(operation = op.name(), %commit, "published");
        self.console.notice("Changes committed and pushed.");

        report.outcome = Some(outcome);
        report.commit = Some(commit);
        self.advance(Phase::Done);
        Ok(report)
    }

    fn mutate(&mut self, op: Operation, doc: &mut Document) -> FolioResult<EditOutcome> {
        let console: &mut dyn Console = &mut self.console;
        match op {
            Operation::EditFreeform => freeform::edit_freeform(doc, &self.editor, console),
            Operation::AddProject => editors::add_project(doc, console),
            Operation::DeleteProject => editors::delete_project(doc, console),
            Operation::AddTimelineEntry => editors::add_timeline_entry(doc, console),
            Operation::AddSkill => editors::add_skill(doc, console),
            Operation::SyncOnly | Operation::ViewSummary => Ok(EditOutcome::Unchanged),
        }
    }

    fn advance(&mut self, next: Phase) {
        tracing::debug!(from = %self.phase, to = %next, "phase");
        self.phase = next;
    }
}
