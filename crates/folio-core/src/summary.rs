//! Human-readable portfolio summary for the `view` command.

use std::fmt;

use serde::Serialize;
use serde_json::Value;

use crate::document::Document;

/// Condensed view of a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub name: Option<String>,
    pub title: Option<String>,
    pub skills: Vec<String>,
    pub projects: Vec<String>,
    /// (title, type) per timeline entry.
    pub timeline: Vec<(String, String)>,
}

impl Summary {
    pub fn of(doc: &Document) -> Self {
        let text = |v: &Value, key: &str, fallback: &str| {
            v.get(key)
                .and_then(Value::as_str)
                .unwrap_or(fallback)
                .to_string()
        };

        Self {
            name: doc.name().map(str::to_string),
            title: doc.title().map(str::to_string),
            skills: doc.skills().into_iter().map(str::to_string).collect(),
            projects: doc
                .projects()
                .iter()
                .map(|p| text(p, "title", "Untitled Project"))
                .collect(),
            timeline: doc
                .timeline()
                .iter()
                .map(|e| (text(e, "title", "Untitled Entry"), text(e, "type", "unknown")))
                .collect(),
        }
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "\n=== Portfolio Summary ===")?;
        writeln!(f, "Name: {}", self.name.as_deref().unwrap_or("N/A"))?;
        writeln!(f, "Title: {}", self.title.as_deref().unwrap_or("N/A"))?;

        writeln!(f, "\nSkills: {}", self.skills.join(", "))?;

        writeln!(f, "\nProjects ({}):", self.projects.len())?;
        for (i, title) in self.projects.iter().enumerate() {
            writeln!(f, "  {}. {title}", i + 1)?;
        }

        write!(f, "\nTimeline Entries ({}):", self.timeline.len())?;
        for (i, (title, kind)) in self.timeline.iter().enumerate() {
            write!(f, "\n  {}. {title} ({kind})", i + 1)?;
        }
        write!(f, "\n\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_renders_all_sections() {
        let doc = Document::parse(
            r#"{
                "name": "Ada",
                "skills": ["Rust", "Go"],
                "projects": [{"title": "Folio"}, {"description": "no title"}],
                "timeline": [{"title": "Engineer", "type": "work"}, {}]
            }"#,
        )
        .unwrap();

        let text = Summary::of(&doc).to_string();

        assert_eq!(
            text,
            "\n=== Portfolio Summary ===\n\
             Name: Ada\n\
             Title: N/A\n\
             \n\
             Skills: Rust, Go\n\
             \n\
             Projects (2):\n  \
             1. Folio\n  \
             2. Untitled Project\n\
             \n\
             Timeline Entries (2):\n  \
             1. Engineer (work)\n  \
             2. Untitled Entry (unknown)\n\n"
        );
    }

    #[test]
    fn test_summary_of_empty_document() {
        let summary = Summary::of(&Document::new());
        assert!(summary.projects.is_empty());
        assert!(summary.to_string().contains("Projects (0):"));
    }
}
