//! Configuration for a folio run.
//!
//! Settings are layered, lowest priority first: built-in defaults, the
//! JSON config file (`<config dir>/folio/config.json` unless another file
//! is given), `$VISUAL`/`$EDITOR`, then explicit overrides from the
//! command line. The result is a plain [`Config`] value handed to the
//! sync controller; nothing reads process state after that.

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{FolioError, FolioResult};

/// Default canonical document name inside the replica.
pub const DEFAULT_DOCUMENT: &str = "portfolio.json";
/// Editor used when nothing else is configured.
pub const DEFAULT_EDITOR: &str = "vim";

/// Commit identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub name: String,
    pub email: String,
}

/// Fully resolved settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Remote repository URL. Only required when the replica must be cloned.
    pub remote_url: Option<String>,
    /// Local replica directory (absolute).
    pub repo_dir: PathBuf,
    /// Canonical document path, relative to `repo_dir`.
    pub document: PathBuf,
    /// Editor command line for freeform edits.
    pub editor: String,
    /// Commit identity; git's own configuration is used when `None`.
    pub author: Option<Author>,
}

impl Config {
    /// Absolute path of the canonical document.
    pub fn document_path(&self) -> PathBuf {
        self.repo_dir.join(&self.document)
    }
}

/// On-disk config file format. Every key is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo_dir: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub editor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<Author>,
}

impl ConfigFile {
    /// Load a config file. `Ok(None)` when it does not exist.
    pub fn load(path: &Path) -> FolioResult<Option<Self>> {
        let data = match fs::read_to_string(path) {
            Ok(data) => data,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(FolioError::Io(e)),
        };
        let file = serde_json::from_str(&data).map_err(|e| {
            FolioError::Config(format!("invalid config file {}: {e}", path.display()))
        })?;
        Ok(Some(file))
    }
}

/// Values given explicitly on the command line.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub config_file: Option<PathBuf>,
    pub remote_url: Option<String>,
    pub repo_dir: Option<PathBuf>,
    pub document: Option<PathBuf>,
    pub editor: Option<String>,
}

/// The parts of the process environment configuration depends on.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    pub cwd: PathBuf,
    pub visual: Option<String>,
    pub editor: Option<String>,
    pub config_dir: Option<PathBuf>,
    pub data_dir: Option<PathBuf>,
}

impl Environment {
    /// Capture the current process environment.
    pub fn from_process() -> FolioResult<Self> {
        let non_empty = |key: &str| std::env::var(key).ok().filter(|v| !v.trim().is_empty());
        Ok(Self {
            cwd: std::env::current_dir()?,
            visual: non_empty("VISUAL"),
            editor: non_empty("EDITOR"),
            config_dir: dirs::config_dir(),
            data_dir: dirs::data_dir(),
        })
    }

    fn default_config_file(&self) -> Option<PathBuf> {
        self.config_dir
            .as_ref()
            .map(|dir| dir.join("folio").join("config.json"))
    }

    fn default_repo_dir(&self) -> PathBuf {
        match &self.data_dir {
            Some(dir) => dir.join("folio").join("portfolio-data"),
            None => self.cwd.join("portfolio-data"),
        }
    }
}

/// Resolve the final configuration from all layers.
pub fn resolve(overrides: Overrides, env: &Environment) -> FolioResult<Config> {
    let file = match &overrides.config_file {
        Some(path) => Some(ConfigFile::load(path)?.ok_or_else(|| {
            FolioError::Config(format!("config file {} does not exist", path.display()))
        })?),
        None => match env.default_config_file() {
            Some(path) => ConfigFile::load(&path)?,
            None => None,
        },
    }
    .unwrap_or_default();

    let repo_dir = overrides
        .repo_dir
        .or(file.repo_dir)
        .unwrap_or_else(|| env.default_repo_dir());
    let repo_dir = if repo_dir.is_absolute() {
        repo_dir
    } else {
        env.cwd.join(repo_dir)
    };

    let document = overrides
        .document
        .or(file.document)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DOCUMENT));
    let document = normalize_document_path(&document)?;

    let editor = overrides
        .editor
        .or_else(|| env.visual.clone())
        .or_else(|| env.editor.clone())
        .or(file.editor)
        .unwrap_or_else(|| DEFAULT_EDITOR.to_string());

    let config = Config {
        remote_url: overrides.remote_url.or(file.remote_url),
        repo_dir,
        document,
        editor,
        author: file.author,
    };
    tracing::debug!(?config, "configuration resolved");
    Ok(config)
}

/// The document must name a file inside the replica. `.` components are
/// dropped, since git only stages plain relative paths.
fn normalize_document_path(path: &Path) -> FolioResult<PathBuf> {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => normalized.push(part),
            Component::CurDir => {}
            _ => return Err(outside_replica(path)),
        }
    }
    if normalized.as_os_str().is_empty() {
        return Err(outside_replica(path));
    }
    Ok(normalized)
}

fn outside_replica(path: &Path) -> FolioError {
    FolioError::Config(format!(
        "document path {} must name a file relative to the repository",
        path.display()
    ))
}
