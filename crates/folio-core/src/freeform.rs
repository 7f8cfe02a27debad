//! Freeform editing of the whole document in an external editor.
//!
//! The document is exported to a temporary `.json` file, the editor runs
//! against it, and the result is parsed back. Invalid JSON does not end
//! the session: the user may start another round from the original
//! document or give up and keep it unchanged.

use std::fs;
use std::io::Write;

use crate::console::Console;
use crate::document::Document;
use crate::editors::EditOutcome;
use crate::error::FolioResult;
use crate::launcher::Editor;

/// Let the user edit the whole document, retrying on invalid JSON.
///
/// On success `doc` holds the edited document. On discard, or when the
/// edit changed nothing, `doc` is left as it was.
pub fn edit_freeform(
    doc: &mut Document,
    editor: &dyn Editor,
    console: &mut dyn Console,
) -> FolioResult<EditOutcome> {
    let exported = doc.to_pretty_string()?;
    let mut round = 0u32;

    loop {
        round += 1;
        let edited = edit_round(&exported, editor)?;

        match Document::parse(&edited) {
            Ok(updated) => {
                tracing::debug!(round, "freeform edit parsed");
                // Map equality ignores key order; compare serialized text so
                // a reorder counts as a change.
                if updated.to_pretty_string()? == exported {
                    return Ok(EditOutcome::Unchanged);
                }
                *doc = updated;
                return Ok(EditOutcome::Replaced);
            }
            Err(e) => {
                tracing::warn!(round, error = %e, "edited document is not valid JSON");
                console.notice(&format!(
                    "Error: the edited file contains invalid JSON ({e}). Changes not saved."
                ));
                if !console.confirm("Would you like to try editing again?")? {
                    return Ok(EditOutcome::Discarded);
                }
            }
        }
    }
}

/// One export/edit/read-back cycle.
///
/// The temp file is removed when the `TempPath` drops, on every path out
/// of this function.
fn edit_round(exported: &str, editor: &dyn Editor) -> FolioResult<String> {
    let mut file = tempfile::Builder::new()
        .prefix("folio-")
        .suffix(".json")
        .tempfile()?;
    file.write_all(exported.as_bytes())?;
    file.flush()?;
    let path = file.into_temp_path();

    editor.invoke(&path)?;
    Ok(fs::read_to_string(&path)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::ScriptedConsole;
    use crate::error::FolioError;
    use std::cell::RefCell;
    use std::path::{Path, PathBuf};

    /// Editor that overwrites the file with scripted contents and records
    /// what it saw.
    struct ScriptedEditor {
        outputs: RefCell<Vec<String>>,
        seen_paths: RefCell<Vec<PathBuf>>,
        seen_inputs: RefCell<Vec<String>>,
    }

    impl ScriptedEditor {
        fn new(outputs: &[&str]) -> Self {
            Self {
                outputs: RefCell::new(outputs.iter().rev().map(|s| s.to_string()).collect()),
                seen_paths: RefCell::new(Vec::new()),
                seen_inputs: RefCell::new(Vec::new()),
            }
        }
    }

    impl Editor for ScriptedEditor {
        fn invoke(&self, path: &Path) -> FolioResult<()> {
            self.seen_paths.borrow_mut().push(path.to_path_buf());
            self.seen_inputs
                .borrow_mut()
                .push(fs::read_to_string(path).unwrap());
            if let Some(out) = self.outputs.borrow_mut().pop() {
                fs::write(path, out).unwrap();
            }
            Ok(())
        }
    }

    struct FailingEditor {
        seen_path: RefCell<Option<PathBuf>>,
    }

    impl Editor for FailingEditor {
        fn invoke(&self, path: &Path) -> FolioResult<()> {
            *self.seen_path.borrow_mut() = Some(path.to_path_buf());
            Err(FolioError::Launch {
                program: "vim".to_string(),
                reason: "exited with exit status: 1".to_string(),
            })
        }
    }

    fn original() -> Document {
        Document::parse(r#"{"skills": ["Go"], "projects": []}"#).unwrap()
    }

    #[test]
    fn test_valid_edit_replaces_document() {
        let mut doc = original();
        let editor = ScriptedEditor::new(&[r#"{"skills": ["Go", "Rust"]}"#]);
        let mut console = ScriptedConsole::default();

        let outcome = edit_freeform(&mut doc, &editor, &mut console).unwrap();

        assert_eq!(outcome, EditOutcome::Replaced);
        assert_eq!(doc.skills(), ["Go", "Rust"]);
        assert!(console.prompts().is_empty());
        assert_eq!(
            editor.seen_inputs.borrow()[0],
            original().to_pretty_string().unwrap()
        );
    }

    #[test]
    fn test_key_reorder_is_a_change() {
        let mut doc = original();
        let editor = ScriptedEditor::new(&[r#"{"projects": [], "skills": ["Go"]}"#]);
        let mut console = ScriptedConsole::default();

        let outcome = edit_freeform(&mut doc, &editor, &mut console).unwrap();

        assert_eq!(outcome, EditOutcome::Replaced);
        let keys: Vec<&str> = doc.fields().keys().map(String::as_str).collect();
        assert_eq!(keys, ["projects", "skills"]);
    }

    #[test]
    fn test_reformatted_but_equal_text_is_unchanged() {
        let mut doc = original();
        let editor = ScriptedEditor::new(&[r#"{"skills":["Go"],"projects":[]}"#]);
        let mut console = ScriptedConsole::default();

        let outcome = edit_freeform(&mut doc, &editor, &mut console).unwrap();

        assert_eq!(outcome, EditOutcome::Unchanged);
    }

    #[test]
    fn test_retry_after_invalid_json_uses_original() {
        let mut doc = original();
        let editor = ScriptedEditor::new(&["{ not json", r#"{"skills": ["Zig"]}"#]);
        let mut console = ScriptedConsole::new(["y"]);

        let outcome = edit_freeform(&mut doc, &editor, &mut console).unwrap();

        assert_eq!(outcome, EditOutcome::Replaced);
        assert_eq!(doc, Document::parse(r#"{"skills": ["Zig"]}"#).unwrap());
        let inputs = editor.seen_inputs.borrow();
        assert_eq!(inputs.len(), 2);
        // The second round starts from the pre-edit document, not the broken text.
        assert_eq!(inputs[1], inputs[0]);
        assert!(console.notices()[0].contains("invalid JSON"));
    }

    #[test]
    fn test_discard_keeps_original() {
        let mut doc = original();
        let editor = ScriptedEditor::new(&["[broken"]);
        let mut console = ScriptedConsole::new(["n"]);

        let outcome = edit_freeform(&mut doc, &editor, &mut console).unwrap();

        assert_eq!(outcome, EditOutcome::Discarded);
        assert_eq!(doc, original());
    }

    #[test]
    fn test_non_object_counts_as_invalid() {
        let mut doc = original();
        let editor = ScriptedEditor::new(&["[1, 2]"]);
        let mut console = ScriptedConsole::new(["n"]);

        let outcome = edit_freeform(&mut doc, &editor, &mut console).unwrap();

        assert_eq!(outcome, EditOutcome::Discarded);
    }

    #[test]
    fn test_many_retries_do_not_grow_the_stack() {
        let mut doc = original();
        let mut outputs = vec!["{"; 500];
        outputs.push(r#"{"name": "Ada"}"#);
        let editor = ScriptedEditor::new(&outputs);
        let mut console = ScriptedConsole::new(vec!["y"; 500]);

        let outcome = edit_freeform(&mut doc, &editor, &mut console).unwrap();

        assert_eq!(outcome, EditOutcome::Replaced);
        assert_eq!(doc.name(), Some("Ada"));
    }

    #[test]
    fn test_untouched_file_is_unchanged() {
        let mut doc = original();
        let editor = ScriptedEditor::new(&[]);
        let mut console = ScriptedConsole::default();

        let outcome = edit_freeform(&mut doc, &editor, &mut console).unwrap();

        assert_eq!(outcome, EditOutcome::Unchanged);
        assert!(!outcome.changed());
    }

    #[test]
    fn test_temp_files_removed_on_every_path() {
        let mut doc = original();
        let editor = ScriptedEditor::new(&["{", r#"{"a": 1}"#]);
        let mut console = ScriptedConsole::new(["y"]);
        edit_freeform(&mut doc, &editor, &mut console).unwrap();
        for path in editor.seen_paths.borrow().iter() {
            assert_eq!(path.extension().unwrap(), "json");
            assert!(!path.exists(), "{} left behind", path.display());
        }

        let mut doc = original();
        let editor = ScriptedEditor::new(&["{"]);
        let mut console = ScriptedConsole::new(["n"]);
        edit_freeform(&mut doc, &editor, &mut console).unwrap();
        assert!(!editor.seen_paths.borrow()[0].exists());
    }

    #[test]
    fn test_launch_failure_propagates_and_cleans_up() {
        let mut doc = original();
        let editor = FailingEditor {
            seen_path: RefCell::new(None),
        };
        let mut console = ScriptedConsole::default();

        let err = edit_freeform(&mut doc, &editor, &mut console).unwrap_err();

        assert!(matches!(err, FolioError::Launch { .. }));
        assert!(!editor.seen_path.borrow().as_ref().unwrap().exists());
        assert_eq!(doc, original());
    }
}
