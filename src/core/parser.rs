//! Document loading and classification.
//!
//! A command-set directory holds `*.yaml` files, each with one or more
//! `---`-separated documents. Files are selected by the kind of their first
//! document. Within a file, kind-specific builders scan a contiguous run of
//! documents and stop at the first foreign kind.

use super::error::{EngineError, Result};
use super::types::{Document, KIND_METADATA, KIND_VARIABLES};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Include/exclude filter evaluated against the first document's kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KindFilter {
    include: Vec<String>,
    exclude: Vec<String>,
}

impl KindFilter {
    /// Accept every file.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn include<S: AsRef<str>>(kinds: &[S]) -> Self {
        Self {
            include: kinds.iter().map(|k| k.as_ref().to_string()).collect(),
            exclude: Vec::new(),
        }
    }

    pub fn exclude<S: AsRef<str>>(kinds: &[S]) -> Self {
        Self {
            include: Vec::new(),
            exclude: kinds.iter().map(|k| k.as_ref().to_string()).collect(),
        }
    }

    pub fn and_exclude<S: AsRef<str>>(mut self, kinds: &[S]) -> Self {
        self.exclude
            .extend(kinds.iter().map(|k| k.as_ref().to_string()));
        self
    }

    pub fn is_unfiltered(&self) -> bool {
        self.include.is_empty() && self.exclude.is_empty()
    }

    /// Decide whether a kind passes the filter.
    pub fn accepts(&self, kind: &str) -> bool {
        let included = self.include.is_empty() || self.include.iter().any(|k| k == kind);
        let excluded = self.exclude.iter().any(|k| k == kind);
        included && !excluded
    }
}

/// Parse every document in a YAML stream. Empty documents are dropped.
pub fn parse_documents(yaml: &str, origin: &Path) -> Result<Vec<Document>> {
    let mut docs = Vec::new();
    for de in serde_yaml_ng::Deserializer::from_str(yaml) {
        let value =
            serde_yaml_ng::Value::deserialize(de).map_err(|e| EngineError::yaml(origin, e))?;
        if value.is_null() {
            tracing::debug!("skipping empty document in {}", origin.display());
            continue;
        }
        docs.push(Document::new(value));
    }
    Ok(docs)
}

/// Load all documents of a YAML file, in file order.
pub fn load_documents(path: &Path) -> Result<Vec<Document>> {
    let content = std::fs::read_to_string(path).map_err(|e| EngineError::io(path, e))?;
    parse_documents(&content, path)
}

/// Load only the first document of a YAML file.
pub fn first_document(path: &Path) -> Result<Option<Document>> {
    Ok(load_documents(path)?.into_iter().next())
}

/// List the `*.yaml` files in a directory, sorted by name, keeping those whose
/// first document passes the filter. With any filter set, files whose first
/// document has no kind are dropped.
pub fn list_yaml_files(dir: &Path, filter: &KindFilter) -> Result<Vec<PathBuf>> {
    let dir_str = dir.to_str().ok_or_else(|| {
        EngineError::InvalidArgument(format!("non UTF-8 directory path: {}", dir.display()))
    })?;
    let pattern = format!("{}/*.yaml", glob::Pattern::escape(dir_str));

    let mut files = Vec::new();
    for entry in glob::glob(&pattern)? {
        let path = entry.map_err(|e| {
            let path = e.path().to_path_buf();
            EngineError::io(path, e.into())
        })?;
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();

    if filter.is_unfiltered() {
        return Ok(files);
    }

    let mut selected = Vec::new();
    for path in files {
        let kind = first_document(&path)?.and_then(|d| d.kind().map(str::to_string));
        match kind {
            Some(k) if filter.accepts(&k) => selected.push(path),
            _ => {}
        }
    }
    tracing::debug!(
        "selected {} yaml file(s) in {} with {:?}",
        selected.len(),
        dir.display(),
        filter
    );
    Ok(selected)
}

/// What a kind-specific scan does with one document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scan {
    /// Build a command from it.
    Take,
    /// Step over it without ending the run.
    Skip,
    /// End the run here.
    Halt,
}

/// Classify a document for a scan expecting `expected_kind`.
///
/// Processed documents and `variables`/`metadata` documents are stepped over;
/// any other foreign kind (or a missing kind) ends the run.
pub fn classify(doc: &Document, expected_kind: &str) -> Scan {
    if doc.is_processed() {
        return Scan::Skip;
    }
    match doc.kind() {
        Some(k) if k == expected_kind => Scan::Take,
        Some(KIND_VARIABLES) | Some(KIND_METADATA) => Scan::Skip,
        _ => Scan::Halt,
    }
}
