//! Engine configuration: one immutable record passed by reference to every stage.

use super::codegen::KindRegistry;
use super::error::{EngineError, Result};
use super::types::IntrinsicVariables;
use indexmap::IndexMap;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Default staging directory, relative to the working directory.
pub const DEFAULT_STAGING_DIR: &str = "staging";

/// Everything a command-set run needs besides the command-set directory itself.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Where rendered command files and `-f` argument objects are written
    pub staging_dir: PathBuf,

    /// Framework-supplied variables
    pub intrinsics: IntrinsicVariables,

    /// Caller-supplied replacements for custom variables
    pub overrides: IndexMap<String, serde_yaml_ng::Value>,

    /// Registered command kinds
    pub registry: KindRegistry,

    /// Variable names whose values are masked in log output
    pub sensitive: BTreeSet<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            staging_dir: PathBuf::from(DEFAULT_STAGING_DIR),
            intrinsics: IntrinsicVariables::default(),
            overrides: IndexMap::new(),
            registry: KindRegistry::default(),
            sensitive: BTreeSet::new(),
        }
    }
}

impl EngineConfig {
    pub fn with_staging_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.staging_dir = dir.into();
        self
    }

    pub fn with_intrinsics(mut self, intrinsics: IntrinsicVariables) -> Self {
        self.intrinsics = intrinsics;
        self
    }

    pub fn with_overrides(mut self, overrides: IndexMap<String, serde_yaml_ng::Value>) -> Self {
        self.overrides = overrides;
        self
    }

    pub fn with_sensitive<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sensitive = names.into_iter().map(Into::into).collect();
        self
    }
}

/// Load a YAML mapping of variable names to values.
pub fn load_variable_file(path: &Path) -> Result<IndexMap<String, serde_yaml_ng::Value>> {
    let content = std::fs::read_to_string(path).map_err(|e| EngineError::io(path, e))?;
    if content.trim().is_empty() {
        return Ok(IndexMap::new());
    }
    serde_yaml_ng::from_str(&content).map_err(|e| EngineError::yaml(path, e))
}

/// Parse a `NAME=VALUE` assignment. The value is kept as a string.
pub fn parse_assignment(raw: &str) -> Result<(String, serde_yaml_ng::Value)> {
    let (name, value) = raw.split_once('=').ok_or_else(|| {
        EngineError::InvalidArgument(format!("expected NAME=VALUE, got '{}'", raw))
    })?;
    let name = name.trim();
    if name.is_empty() {
        return Err(EngineError::InvalidArgument(format!(
            "empty variable name in '{}'",
            raw
        )));
    }
    Ok((
        name.to_string(),
        serde_yaml_ng::Value::String(value.to_string()),
    ))
}

/// Parse a list of `NAME=VALUE` assignments, later entries winning.
pub fn parse_assignments(raw: &[String]) -> Result<IndexMap<String, serde_yaml_ng::Value>> {
    let mut values = IndexMap::new();
    for item in raw {
        let (name, value) = parse_assignment(item)?;
        values.insert(name, value);
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.staging_dir, PathBuf::from("staging"));
        assert!(cfg.intrinsics.is_empty());
        assert!(cfg.registry.lookup("kubectl").is_some());
    }

    #[test]
    fn test_config_parse_assignment() {
        let (name, value) = parse_assignment("Namespace=kube-system").unwrap();
        assert_eq!(name, "Namespace");
        assert_eq!(value.as_str(), Some("kube-system"));

        // only the first '=' separates
        let (_, value) = parse_assignment("Opts=a=b").unwrap();
        assert_eq!(value.as_str(), Some("a=b"));
    }

    #[test]
    fn test_config_parse_assignment_errors() {
        assert!(matches!(
            parse_assignment("novalue"),
            Err(EngineError::InvalidArgument(_))
        ));
        assert!(parse_assignment("=x").is_err());
    }

    #[test]
    fn test_config_parse_assignments_last_wins() {
        let raw = vec!["A=1".to_string(), "A=2".to_string()];
        let values = parse_assignments(&raw).unwrap();
        assert_eq!(values.len(), 1);
        assert_eq!(values["A"].as_str(), Some("2"));
    }

    #[test]
    fn test_config_load_variable_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("intrinsics.yaml");
        std::fs::write(&path, "AWSRegion: us-east-1\nMasterNodes: [m1, m2]\n").unwrap();
        let values = load_variable_file(&path).unwrap();
        assert_eq!(values["AWSRegion"].as_str(), Some("us-east-1"));
        assert!(values["MasterNodes"].is_sequence());

        let empty = dir.path().join("empty.yaml");
        std::fs::write(&empty, "\n").unwrap();
        assert!(load_variable_file(&empty).unwrap().is_empty());
    }

    #[test]
    fn test_config_load_variable_file_missing() {
        let result = load_variable_file(Path::new("/nonexistent/intrinsics.yaml"));
        assert!(matches!(result, Err(EngineError::Io { .. })));
    }
}
