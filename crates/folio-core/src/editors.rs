//! Structured field editors.
//!
//! Each editor collects its input from a [`Console`], applies exactly one
//! change to the in-memory [`Document`], and describes the result as an
//! [`EditOutcome`]. Outcomes such as "not found" are normal results, not
//! errors.

use std::fmt;

use serde_json::Value;

use crate::console::{ask, until_blank, Console};
use crate::document::{Document, EntryType, Link, Project, TimelineEntry, SKILLS};
use crate::error::{FolioError, FolioResult};

/// What a single edit did to the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOutcome {
    ProjectAdded { title: String },
    ProjectDeleted { title: String },
    ProjectNotFound { title: String },
    TimelineEntryAdded { title: String, kind: EntryType },
    SkillAdded { skill: String },
    SkillExists { skill: String },
    /// The whole document was replaced by a freeform edit.
    Replaced,
    /// A freeform edit was abandoned after invalid JSON.
    Discarded,
    /// The edit ran but produced no change (empty input, identical content).
    Unchanged,
}

impl EditOutcome {
    /// True if the document differs from what was loaded.
    pub fn changed(&self) -> bool {
        matches!(
            self,
            EditOutcome::ProjectAdded { .. }
                | EditOutcome::ProjectDeleted { .. }
                | EditOutcome::TimelineEntryAdded { .. }
                | EditOutcome::SkillAdded { .. }
                | EditOutcome::Replaced
        )
    }
}

impl fmt::Display for EditOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EditOutcome::ProjectAdded { title } => write!(f, "Added new project: {title}"),
            EditOutcome::ProjectDeleted { title } => write!(f, "Deleted project: {title}"),
            EditOutcome::ProjectNotFound { title } => write!(f, "Project '{title}' not found."),
            EditOutcome::TimelineEntryAdded { title, kind } => {
                write!(f, "Added new timeline entry: {title} ({})", kind.as_str())
            }
            EditOutcome::SkillAdded { skill } => write!(f, "Added new skill: {skill}"),
            EditOutcome::SkillExists { skill } => write!(f, "Skill '{skill}' already exists."),
            EditOutcome::Replaced => write!(f, "Portfolio document replaced with edited version."),
            EditOutcome::Discarded => write!(f, "Edit discarded; document left unchanged."),
            EditOutcome::Unchanged => write!(f, "No changes made."),
        }
    }
}

/// Prompt for a project and append it.
///
/// Links are read as (text, URL) pairs until the link text is empty, then
/// skills one per line until a blank line. Duplicate titles are allowed.
pub fn add_project(doc: &mut Document, console: &mut dyn Console) -> FolioResult<EditOutcome> {
    let title = ask(console, "Project title: ")?;
    let description = ask(console, "Project description: ")?;

    let mut links = Vec::new();
    loop {
        let text = ask(console, "Link text (or press Enter to skip): ")?;
        if text.is_empty() {
            break;
        }
        let url = ask(console, "Link URL: ")?;
        links.push(Link { text, url });
    }

    console.notice("Enter skills (one per line, press Enter on a blank line to finish):");
    let skills = until_blank(console, "> ").collect::<FolioResult<Vec<_>>>()?;

    let project = Project {
        title,
        description,
        links,
        skills,
    };
    doc.push_project(&project)?;
    tracing::debug!(title = %project.title, links = project.links.len(), "project added");

    Ok(EditOutcome::ProjectAdded {
        title: project.title,
    })
}

/// Prompt for a title and remove the first project carrying it.
pub fn delete_project(doc: &mut Document, console: &mut dyn Console) -> FolioResult<EditOutcome> {
    let title = ask(
        console,
        "Enter the title of the project you would like to delete: ",
    )?;

    match doc.remove_project(&title)? {
        Some(_) => Ok(EditOutcome::ProjectDeleted { title }),
        None => Ok(EditOutcome::ProjectNotFound { title }),
    }
}

/// Prompt for a timeline entry and append it.
///
/// The type is asked until it is `education` or `work`; running out of
/// input at that point aborts without storing anything.
pub fn add_timeline_entry(
    doc: &mut Document,
    console: &mut dyn Console,
) -> FolioResult<EditOutcome> {
    let kind = loop {
        let answer = console
            .read_line("Entry type (education/work): ")?
            .ok_or(FolioError::InputClosed)?;
        if let Ok(kind) = answer.trim().parse::<EntryType>() {
            break kind;
        }
    };

    let title = ask(console, "Title: ")?;
    let organization = ask(console, "Organization: ")?;
    let location = ask(console, "Location: ")?;
    let start_date = ask(console, "Start date: ")?;
    let end_date = ask(console, "End date (or 'Present'): ")?;

    console.notice(
        "Enter description points (one per line, press Enter on a blank line to finish):",
    );
    let description = until_blank(console, "> ").collect::<FolioResult<Vec<_>>>()?;

    console.notice("Enter technologies (one per line, press Enter on a blank line to finish):");
    let technologies = until_blank(console, "> ").collect::<FolioResult<Vec<_>>>()?;

    let entry = TimelineEntry {
        title,
        organization,
        location,
        start_date,
        end_date,
        kind,
        description,
        technologies,
    };
    doc.push_timeline_entry(&entry)?;

    Ok(EditOutcome::TimelineEntryAdded {
        title: entry.title,
        kind,
    })
}

/// Prompt for one skill and append it unless it is empty or already
/// listed. Adding the same skill twice leaves the list as after the first.
pub fn add_skill(doc: &mut Document, console: &mut dyn Console) -> FolioResult<EditOutcome> {
    let skill = ask(console, "Enter new skill: ")?;
    if skill.is_empty() {
        return Ok(EditOutcome::Unchanged);
    }
    if doc.skills().contains(&skill.as_str()) {
        return Ok(EditOutcome::SkillExists { skill });
    }

    doc.collection_mut(SKILLS)?.push(Value::String(skill.clone()));
    Ok(EditOutcome::SkillAdded { skill })
}
