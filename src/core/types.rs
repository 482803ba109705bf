//! Data model shared by every stage of command-set processing.
//!
//! Variable sets, template documents with their processing status, and the
//! command descriptors handed to the executor.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Document kind holding custom variables for a command set.
pub const KIND_VARIABLES: &str = "variables";

/// Document kind holding command-set metadata (required intrinsics).
pub const KIND_METADATA: &str = "metadata";

// ============================================================================
// Variables
// ============================================================================

/// Framework-supplied values, shared read-only by every command set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IntrinsicVariables(IndexMap<String, serde_yaml_ng::Value>);

impl IntrinsicVariables {
    pub fn new(values: IndexMap<String, serde_yaml_ng::Value>) -> Self {
        Self(values)
    }

    pub fn get(&self, name: &str) -> Option<&serde_yaml_ng::Value> {
        self.0.get(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &serde_yaml_ng::Value)> {
        self.0.iter()
    }
}

impl FromIterator<(String, serde_yaml_ng::Value)> for IntrinsicVariables {
    fn from_iter<I: IntoIterator<Item = (String, serde_yaml_ng::Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Resolved variables for one command set. Built once, read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VariableSet(IndexMap<String, serde_yaml_ng::Value>);

impl VariableSet {
    pub fn get(&self, name: &str) -> Option<&serde_yaml_ng::Value> {
        self.0.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// True when the variable is absent, null, an empty string or an empty list.
    pub fn is_blank(&self, name: &str) -> bool {
        match self.0.get(name) {
            None | Some(serde_yaml_ng::Value::Null) => true,
            Some(serde_yaml_ng::Value::String(s)) => s.is_empty(),
            Some(serde_yaml_ng::Value::Sequence(seq)) => seq.is_empty(),
            Some(_) => false,
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &serde_yaml_ng::Value)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&IntrinsicVariables> for VariableSet {
    fn from(intrinsics: &IntrinsicVariables) -> Self {
        Self(intrinsics.0.clone())
    }
}

impl FromIterator<(String, serde_yaml_ng::Value)> for VariableSet {
    fn from_iter<I: IntoIterator<Item = (String, serde_yaml_ng::Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// A `kind: variables` document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VariablesDoc {
    #[serde(default)]
    pub kind: Option<String>,

    /// Values declared for this command set; overrides may replace them
    #[serde(rename = "CustomVariables", default)]
    pub custom_variables: Option<IndexMap<String, serde_yaml_ng::Value>>,
}

/// A `kind: metadata` document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetadataDoc {
    #[serde(default)]
    pub kind: Option<String>,

    /// Variables that must be non-empty for the command set to run
    #[serde(rename = "required-intrinsics", default)]
    pub required_intrinsics: Vec<String>,
}

// ============================================================================
// Template documents
// ============================================================================

/// Processing status of a loaded document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DocStatus {
    #[default]
    Unset,
    Processed,
}

impl fmt::Display for DocStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unset => write!(f, "unset"),
            Self::Processed => write!(f, "PROCESSED"),
        }
    }
}

/// One YAML document from a rendered command file.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    body: serde_yaml_ng::Value,
    status: DocStatus,
}

impl Document {
    /// Wrap a parsed value. A `status: PROCESSED` field is lifted out of the
    /// body into the document status.
    pub fn new(mut body: serde_yaml_ng::Value) -> Self {
        let mut status = DocStatus::Unset;
        if let serde_yaml_ng::Value::Mapping(ref mut map) = body {
            if map.get("status").and_then(|v| v.as_str()) == Some("PROCESSED") {
                map.remove("status");
                status = DocStatus::Processed;
            }
        }
        Self { body, status }
    }

    pub fn body(&self) -> &serde_yaml_ng::Value {
        &self.body
    }

    pub fn kind(&self) -> Option<&str> {
        self.body.get("kind").and_then(|v| v.as_str())
    }

    pub fn get(&self, field: &str) -> Option<&serde_yaml_ng::Value> {
        self.body.get(field)
    }

    pub fn status(&self) -> DocStatus {
        self.status
    }

    pub fn is_processed(&self) -> bool {
        self.status == DocStatus::Processed
    }

    pub fn mark_processed(&mut self) {
        self.status = DocStatus::Processed;
    }

    /// True for an empty mapping, empty sequence or null body.
    pub fn is_empty(&self) -> bool {
        match &self.body {
            serde_yaml_ng::Value::Null => true,
            serde_yaml_ng::Value::Mapping(m) => m.is_empty(),
            serde_yaml_ng::Value::Sequence(s) => s.is_empty(),
            _ => false,
        }
    }
}

// ============================================================================
// Command descriptors
// ============================================================================

/// One external command invocation. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandDescriptor {
    #[serde(rename = "cmdList")]
    argv: Vec<String>,

    #[serde(rename = "cmdString")]
    display: String,
}

impl CommandDescriptor {
    /// Build a descriptor whose display string mirrors the argv tokens.
    pub fn new(argv: Vec<String>) -> Self {
        let display = argv.join(" ");
        Self { argv, display }
    }

    pub fn argv(&self) -> &[String] {
        &self.argv
    }

    pub fn display(&self) -> &str {
        &self.display
    }

    pub fn program(&self) -> &str {
        self.argv.first().map(String::as_str).unwrap_or_default()
    }
}

impl fmt::Display for CommandDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display)
    }
}

// ============================================================================
// Value helpers
// ============================================================================

/// Convert a value to the text substituted for a macro or emitted as an
/// argv token. Collections render in YAML flow style so they stay parseable.
pub fn yaml_value_to_string(val: &serde_yaml_ng::Value) -> String {
    match val {
        serde_yaml_ng::Value::String(s) => s.clone(),
        serde_yaml_ng::Value::Number(n) => n.to_string(),
        serde_yaml_ng::Value::Bool(b) => b.to_string(),
        serde_yaml_ng::Value::Null => String::new(),
        serde_yaml_ng::Value::Tagged(t) => yaml_value_to_string(&t.value),
        collection => flow_style(collection),
    }
}

fn flow_style(val: &serde_yaml_ng::Value) -> String {
    match val {
        serde_yaml_ng::Value::String(s) => format!("'{}'", s.replace('\'', "''")),
        serde_yaml_ng::Value::Null => "null".to_string(),
        serde_yaml_ng::Value::Sequence(items) => {
            let inner: Vec<String> = items.iter().map(flow_style).collect();
            format!("[{}]", inner.join(", "))
        }
        serde_yaml_ng::Value::Mapping(map) => {
            let inner: Vec<String> = map
                .iter()
                .map(|(k, v)| format!("{}: {}", flow_style(k), flow_style(v)))
                .collect();
            format!("{{{}}}", inner.join(", "))
        }
        scalar => yaml_value_to_string(scalar),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_yaml_ng::Value;

    #[test]
    fn test_types_value_to_string_scalars() {
        assert_eq!(yaml_value_to_string(&Value::String("hello".into())), "hello");
        assert_eq!(yaml_value_to_string(&Value::Bool(true)), "true");
        assert_eq!(yaml_value_to_string(&Value::Number(3.into())), "3");
        assert_eq!(yaml_value_to_string(&Value::Null), "");
    }

    #[test]
    fn test_types_value_to_string_collections() {
        let seq: Value = serde_yaml_ng::from_str("[a, 1, it's]").unwrap();
        assert_eq!(yaml_value_to_string(&seq), "['a', 1, 'it''s']");

        let map: Value = serde_yaml_ng::from_str("{zone: a, count: 2}").unwrap();
        assert_eq!(yaml_value_to_string(&map), "{'zone': 'a', 'count': 2}");

        // flow output parses back to the same value
        let back: Value = serde_yaml_ng::from_str(&yaml_value_to_string(&seq)).unwrap();
        assert_eq!(back, seq);
    }

    #[test]
    fn test_types_variable_set_blank() {
        let vars: VariableSet = [
            ("A".to_string(), Value::String("x".into())),
            ("B".to_string(), Value::String(String::new())),
            ("C".to_string(), Value::Sequence(vec![])),
            ("D".to_string(), Value::Null),
            ("E".to_string(), Value::Bool(false)),
        ]
        .into_iter()
        .collect();
        assert!(!vars.is_blank("A"));
        assert!(vars.is_blank("B"));
        assert!(vars.is_blank("C"));
        assert!(vars.is_blank("D"));
        assert!(!vars.is_blank("E"));
        assert!(vars.is_blank("missing"));
    }

    #[test]
    fn test_types_document_status_lifted() {
        let body: Value = serde_yaml_ng::from_str("kind: kubectl\nstatus: PROCESSED\n").unwrap();
        let doc = Document::new(body);
        assert!(doc.is_processed());
        assert!(doc.get("status").is_none());
        assert_eq!(doc.kind(), Some("kubectl"));
    }

    #[test]
    fn test_types_document_mark_processed() {
        let body: Value = serde_yaml_ng::from_str("kind: helm\ncommand: install\n").unwrap();
        let mut doc = Document::new(body);
        assert_eq!(doc.status(), DocStatus::Unset);
        doc.mark_processed();
        assert_eq!(doc.status().to_string(), "PROCESSED");
    }

    #[test]
    fn test_types_descriptor_json_shape() {
        let cmd = CommandDescriptor::new(vec!["kubectl".into(), "get".into(), "pods".into()]);
        assert_eq!(cmd.display(), "kubectl get pods");
        assert_eq!(cmd.program(), "kubectl");
        let json = serde_json::to_string(&cmd).unwrap();
        assert_eq!(
            json,
            r#"{"cmdList":["kubectl","get","pods"],"cmdString":"kubectl get pods"}"#
        );
    }

    #[test]
    fn test_types_metadata_doc_parse() {
        let meta: MetadataDoc =
            serde_yaml_ng::from_str("kind: metadata\nrequired-intrinsics: [VPCId, AWSRegion]\n")
                .unwrap();
        assert_eq!(meta.required_intrinsics, vec!["VPCId", "AWSRegion"]);
    }
}
