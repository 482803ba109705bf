//! Variable resolution for a command set.
//!
//! Custom variables come from the first `kind: variables` file in the
//! directory. Overrides replace custom values by name but never add new
//! names. The result is custom-over-intrinsic. An optional `kind: metadata`
//! file lists variables that must be non-empty for the set to run.

use super::error::{EngineError, Result};
use super::parser::{self, KindFilter};
use super::types::{
    IntrinsicVariables, MetadataDoc, VariableSet, VariablesDoc, KIND_METADATA, KIND_VARIABLES,
};
use indexmap::IndexMap;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Replacement shown in logs for sensitive values.
pub const SCRUBBED: &str = "********";

/// Outcome of the required-variable check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Gate {
    Open,
    /// Names that were missing or empty
    Closed(Vec<String>),
}

impl Gate {
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Open)
    }
}

/// Return the first file in `dir` whose first document has `kind`, warning
/// when more than one exists.
fn first_file_of_kind(dir: &Path, kind: &str) -> Result<Option<PathBuf>> {
    let files = parser::list_yaml_files(dir, &KindFilter::include(&[kind]))?;
    if files.len() > 1 {
        tracing::warn!(
            "multiple {} files in {}; only {} is used",
            kind,
            dir.display(),
            files[0].display()
        );
    }
    Ok(files.into_iter().next())
}

/// Load the custom variables declared for a command set, if any.
pub fn load_custom_variables(dir: &Path) -> Result<Option<IndexMap<String, serde_yaml_ng::Value>>> {
    let Some(path) = first_file_of_kind(dir, KIND_VARIABLES)? else {
        tracing::debug!("no variables file in {}; intrinsic variables only", dir.display());
        return Ok(None);
    };
    let Some(doc) = parser::first_document(&path)? else {
        return Ok(None);
    };
    let vars: VariablesDoc = serde_yaml_ng::from_value(doc.body().clone()).map_err(|e| {
        EngineError::InvalidConfiguration(format!(
            "malformed variables document {}: {}",
            path.display(),
            e
        ))
    })?;
    tracing::debug!("using variables defined in {}", path.display());
    Ok(Some(vars.custom_variables.unwrap_or_default()))
}

/// Load the metadata document of a command set, if any.
pub fn load_metadata(dir: &Path) -> Result<Option<MetadataDoc>> {
    let Some(path) = first_file_of_kind(dir, KIND_METADATA)? else {
        return Ok(None);
    };
    let Some(doc) = parser::first_document(&path)? else {
        return Ok(None);
    };
    serde_yaml_ng::from_value(doc.body().clone())
        .map(Some)
        .map_err(|e| {
            EngineError::InvalidConfiguration(format!(
                "malformed metadata document {}: {}",
                path.display(),
                e
            ))
        })
}

/// Replace custom values with overrides of the same name. Names present only
/// in `overrides` are dropped, and null overrides are ignored.
pub fn merge_overrides(
    mut custom: IndexMap<String, serde_yaml_ng::Value>,
    overrides: &IndexMap<String, serde_yaml_ng::Value>,
) -> IndexMap<String, serde_yaml_ng::Value> {
    for (name, value) in custom.iter_mut() {
        if let Some(replacement) = overrides.get(name) {
            if !replacement.is_null() {
                tracing::debug!("override replaces custom variable {}", name);
                *value = replacement.clone();
            }
        }
    }
    custom
}

/// Merge custom variables over intrinsics; custom wins on collision.
pub fn merge_over_intrinsics(
    custom: IndexMap<String, serde_yaml_ng::Value>,
    intrinsics: &IntrinsicVariables,
) -> VariableSet {
    intrinsics
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .chain(custom)
        .collect()
}

/// Build the variable set for a command-set directory.
pub fn resolve(
    dir: &Path,
    intrinsics: &IntrinsicVariables,
    overrides: &IndexMap<String, serde_yaml_ng::Value>,
) -> Result<VariableSet> {
    match load_custom_variables(dir)? {
        None => Ok(VariableSet::from(intrinsics)),
        Some(custom) => {
            let custom = merge_overrides(custom, overrides);
            Ok(merge_over_intrinsics(custom, intrinsics))
        }
    }
}

/// Check the metadata's required variables against a resolved set.
pub fn check_required(metadata: Option<&MetadataDoc>, vars: &VariableSet) -> Gate {
    let missing: Vec<String> = metadata
        .map(|m| m.required_intrinsics.as_slice())
        .unwrap_or_default()
        .iter()
        .filter(|name| vars.is_blank(name))
        .cloned()
        .collect();
    if missing.is_empty() {
        Gate::Open
    } else {
        Gate::Closed(missing)
    }
}

/// Copy of the variable set with sensitive values masked, for logging.
pub fn scrub(vars: &VariableSet, sensitive: &BTreeSet<String>) -> VariableSet {
    vars.iter()
        .map(|(k, v)| {
            let shown = if sensitive.contains(k) && !v.is_null() {
                serde_yaml_ng::Value::String(SCRUBBED.to_string())
            } else {
                v.clone()
            };
            (k.clone(), shown)
        })
        .collect()
}
