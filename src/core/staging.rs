//! Staging directory: rendered command files and materialized argument objects.
//!
//! Created lazily, never cleaned up. Writes go through a temp file and a
//! rename so a reader never sees a half-written file.

use super::error::{EngineError, Result};
use super::types::Document;
use std::path::{Path, PathBuf};

/// Handle on the staging directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagingDir {
    root: PathBuf,
}

impl StagingDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Create the directory if it does not exist yet.
    pub fn ensure(&self) -> Result<&Path> {
        std::fs::create_dir_all(&self.root).map_err(|e| EngineError::io(&self.root, e))?;
        Ok(&self.root)
    }

    /// Path of the rendered command file for a template: `<stem>-command<.ext>`.
    pub fn command_file_path(&self, template: &Path) -> PathBuf {
        let stem = template
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "template".to_string());
        let file_name = match template.extension() {
            Some(ext) => format!("{}-command.{}", stem, ext.to_string_lossy()),
            None => format!("{}-command", stem),
        };
        self.root.join(file_name)
    }

    /// Path for an argument object named by an `-f` option value.
    pub fn argument_file_path(&self, option_value: &str) -> PathBuf {
        if option_value.ends_with(".yaml") {
            self.root.join(option_value)
        } else {
            self.root.join(format!("{}.yaml", option_value))
        }
    }

    /// Serialize an argument-object document into the staging directory and
    /// return the path of the written file.
    pub fn materialize(&self, option_value: &str, object: &Document) -> Result<PathBuf> {
        if option_value.is_empty() {
            return Err(EngineError::MissingArgument(
                "the -f option needs a file name".to_string(),
            ));
        }
        if object.is_empty() {
            return Err(EngineError::MissingArgument(format!(
                "the argument object for -f {} is empty",
                option_value
            )));
        }

        let path = self.argument_file_path(option_value);
        let yaml = serde_yaml_ng::to_string(object.body()).map_err(|e| EngineError::yaml(&path, e))?;
        write_atomic(&path, &yaml)?;
        tracing::debug!("materialized argument object {}", path.display());
        Ok(path)
    }
}

/// Write a file atomically (temp file + rename), creating parent directories.
pub fn write_atomic(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| EngineError::io(parent, e))?;
    }
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    std::fs::write(&tmp, content).map_err(|e| EngineError::io(&tmp, e))?;
    std::fs::rename(&tmp, path).map_err(|e| EngineError::io(path, e))
}
