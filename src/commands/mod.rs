//! Command builders: turn declarative command documents into argv.
//!
//! Every builder produces argv in the same order:
//! `tool, command words, flags, options, set-values, positionals`.
//! Names of length one get a single dash, longer names a double dash.

pub mod helm;
pub mod kubectl;

use crate::core::error::{EngineError, Result};
use crate::core::parser::{classify, Scan};
use crate::core::types::{yaml_value_to_string, CommandDescriptor, Document};

/// Render a flag or option name as a switch token.
pub fn switch(name: &str) -> String {
    if name.chars().count() > 1 {
        format!("--{}", name)
    } else {
        format!("-{}", name)
    }
}

/// Split the required `command` field into argv words.
pub fn command_words(doc: &Document, index: usize) -> Result<Vec<String>> {
    let command = doc
        .get("command")
        .map(yaml_value_to_string)
        .unwrap_or_default();
    let words: Vec<String> = command.split_whitespace().map(str::to_string).collect();
    if words.is_empty() {
        return Err(EngineError::MissingArgument(format!(
            "the {} document at position {} must have a command attribute",
            doc.kind().unwrap_or("command"),
            index
        )));
    }
    Ok(words)
}

/// The `flags` list as plain names.
pub fn flags(doc: &Document) -> Result<Vec<String>> {
    match doc.get("flags") {
        None | Some(serde_yaml_ng::Value::Null) => Ok(Vec::new()),
        Some(serde_yaml_ng::Value::Sequence(items)) => {
            Ok(items.iter().map(yaml_value_to_string).collect())
        }
        Some(other) => Err(EngineError::InvalidArgument(format!(
            "flags must be a list, got {}",
            yaml_value_to_string(other)
        ))),
    }
}

/// A mapping field (`options`, `set-values`) as ordered name/value pairs.
pub fn named_values(doc: &Document, field: &str) -> Result<Vec<(String, String)>> {
    match doc.get(field) {
        None | Some(serde_yaml_ng::Value::Null) => Ok(Vec::new()),
        Some(serde_yaml_ng::Value::Mapping(map)) => Ok(map
            .iter()
            .map(|(k, v)| (yaml_value_to_string(k), yaml_value_to_string(v)))
            .collect()),
        Some(other) => Err(EngineError::InvalidArgument(format!(
            "{} must be a mapping, got {}",
            field,
            yaml_value_to_string(other)
        ))),
    }
}

/// Fields listed for `command` in a positional table, read from the document.
/// Absent fields are skipped.
pub fn positionals(
    doc: &Document,
    table: &[(&str, &[&str])],
    command_words: &[String],
) -> Vec<String> {
    let command = command_words.join(" ");
    table
        .iter()
        .find(|(cmd, _)| *cmd == command)
        .map(|(_, fields)| {
            fields
                .iter()
                .filter_map(|f| doc.get(f))
                .filter(|v| !v.is_null())
                .map(yaml_value_to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Accumulates argv tokens for one command.
#[derive(Debug, Clone)]
pub struct ArgvBuilder {
    argv: Vec<String>,
}

impl ArgvBuilder {
    pub fn new(tool: &str) -> Self {
        Self {
            argv: vec![tool.to_string()],
        }
    }

    pub fn words<I: IntoIterator<Item = String>>(&mut self, words: I) -> &mut Self {
        self.argv.extend(words);
        self
    }

    pub fn flag(&mut self, name: &str) -> &mut Self {
        self.argv.push(switch(name));
        self
    }

    pub fn option(&mut self, name: &str, value: impl Into<String>) -> &mut Self {
        self.argv.push(switch(name));
        self.argv.push(value.into());
        self
    }

    pub fn finish(self) -> CommandDescriptor {
        CommandDescriptor::new(self.argv)
    }
}

/// Scan the run of `kind` documents from `start`, building one command per
/// taken document and marking it processed. Stops at the first foreign kind.
pub fn scan_run<F>(
    docs: &mut [Document],
    start: usize,
    kind: &str,
    mut build_one: F,
) -> Result<(Vec<CommandDescriptor>, usize)>
where
    F: FnMut(&mut [Document], usize) -> Result<CommandDescriptor>,
{
    let mut commands = Vec::new();
    let mut i = start;
    while i < docs.len() {
        match classify(&docs[i], kind) {
            Scan::Halt => break,
            Scan::Skip => {}
            Scan::Take => {
                let cmd = build_one(docs, i)?;
                docs[i].mark_processed();
                tracing::debug!("built command: {}", cmd);
                commands.push(cmd);
            }
        }
        i += 1;
    }
    Ok((commands, i))
}
