//! The portfolio document and its on-disk store.
//!
//! The document is a JSON object kept in the local replica (by default
//! `portfolio.json`). Known collections are exposed through typed
//! helpers, while every other key is carried through untouched so a
//! load/save cycle never drops data the user keeps in the file.

use std::fs;
use std::io;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{FolioError, FolioResult};
use crate::fsutil::atomic_write;

/// Key of the skill sequence.
pub const SKILLS: &str = "skills";
/// Key of the project sequence.
pub const PROJECTS: &str = "projects";
/// Key of the timeline sequence.
pub const TIMELINE: &str = "timeline";

/// The versioned portfolio record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    fields: Map<String, Value>,
}

/// A labelled link attached to a project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub text: String,
    pub url: String,
}

/// A portfolio project. `title` identifies it for deletion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub links: Vec<Link>,
    #[serde(default)]
    pub skills: Vec<String>,
}

/// Kind of timeline entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    Education,
    Work,
}

impl EntryType {
    pub fn as_str(self) -> &'static str {
        match self {
            EntryType::Education => "education",
            EntryType::Work => "work",
        }
    }
}

impl FromStr for EntryType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "education" => Ok(EntryType::Education),
            "work" => Ok(EntryType::Work),
            other => Err(format!("unknown entry type: '{other}'")),
        }
    }
}

/// One education or work entry on the timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineEntry {
    pub title: String,
    pub organization: String,
    pub location: String,
    pub start_date: String,
    /// Free text; `"Present"` marks an ongoing entry.
    pub end_date: String,
    #[serde(rename = "type")]
    pub kind: EntryType,
    #[serde(default)]
    pub description: Vec<String>,
    #[serde(default)]
    pub technologies: Vec<String>,
}

impl Document {
    /// Create an empty document (`{}`).
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse document text. Anything but a JSON object at top level is
    /// rejected.
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        let fields: Map<String, Value> = serde_json::from_str(text)?;
        Ok(Self { fields })
    }

    /// Serialize with 2-space indentation and a trailing newline.
    ///
    /// Both [`save`] and the freeform export use this, so the bytes a
    /// user edits match the bytes that get committed.
    pub fn to_pretty_string(&self) -> FolioResult<String> {
        let mut text = serde_json::to_string_pretty(&self.fields)?;
        text.push('\n');
        Ok(text)
    }

    /// Raw access to the top-level mapping.
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }

    pub fn name(&self) -> Option<&str> {
        self.get_str("name")
    }

    pub fn title(&self) -> Option<&str> {
        self.get_str("title")
    }

    /// Skill strings in document order. Non-string items are skipped.
    pub fn skills(&self) -> Vec<&str> {
        self.collection(SKILLS)
            .iter()
            .filter_map(Value::as_str)
            .collect()
    }

    pub fn projects(&self) -> &[Value] {
        self.collection(PROJECTS)
    }

    pub fn timeline(&self) -> &[Value] {
        self.collection(TIMELINE)
    }

    /// Items of a named collection; absent or non-array values read as empty.
    pub fn collection(&self, key: &str) -> &[Value] {
        match self.fields.get(key) {
            Some(Value::Array(items)) => items,
            _ => &[],
        }
    }

    /// Mutable access to a named collection, created empty when absent.
    pub fn collection_mut(&mut self, key: &str) -> FolioResult<&mut Vec<Value>> {
        let slot = self
            .fields
            .entry(key.to_string())
            .or_insert_with(|| Value::Array(Vec::new()));
        match slot {
            Value::Array(items) => Ok(items),
            _ => Err(FolioError::FieldType {
                field: key.to_string(),
                expected: "an array",
            }),
        }
    }

    /// Append a project to the project sequence.
    pub fn push_project(&mut self, project: &Project) -> FolioResult<()> {
        let value = serde_json::to_value(project)?;
        self.collection_mut(PROJECTS)?.push(value);
        Ok(())
    }

    /// Remove the first project whose title equals `title` exactly.
    ///
    /// Returns the removed value, or `None` when no project matched. The
    /// document is left untouched in the `None` case, including when the
    /// project collection is absent.
    pub fn remove_project(&mut self, title: &str) -> FolioResult<Option<Value>> {
        if !self.fields.contains_key(PROJECTS) {
            return Ok(None);
        }
        let projects = self.collection_mut(PROJECTS)?;
        let pos = projects
            .iter()
            .position(|p| p.get("title").and_then(Value::as_str) == Some(title));
        Ok(pos.map(|i| projects.remove(i)))
    }

    /// Append an entry to the timeline sequence.
    pub fn push_timeline_entry(&mut self, entry: &TimelineEntry) -> FolioResult<()> {
        let value = serde_json::to_value(entry)?;
        self.collection_mut(TIMELINE)?.push(value);
        Ok(())
    }
}

impl TryFrom<Value> for Document {
    type Error = serde_json::Error;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        let fields: Map<String, Value> = serde_json::from_value(value)?;
        Ok(Self { fields })
    }
}

/// Load the document at `path`.
pub fn load(path: &Path) -> FolioResult<Document> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(FolioError::NotFound(path.to_path_buf()));
        }
        Err(e) => return Err(FolioError::Io(e)),
    };
    Document::parse(&text).map_err(|source| FolioError::MalformedDocument {
        path: path.to_path_buf(),
        source,
    })
}

/// Save the document to `path` (atomic: temp + fsync + rename).
pub fn save(document: &Document, path: &Path) -> FolioResult<()> {
    let text = document.to_pretty_string()?;
    atomic_write(path, text.as_bytes()).map_err(|source| FolioError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::debug!(path = %path.display(), bytes = text.len(), "document saved");
    Ok(())
}
