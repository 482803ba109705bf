//! helm command builder.
//!
//! Adds `set-values` as `--set name=value` pairs and appends the unnamed
//! arguments a command takes (e.g. the chart of `install`) from same-named
//! document fields.

use super::{command_words, flags, named_values, positionals, scan_run, ArgvBuilder};
use crate::core::codegen::BuildContext;
use crate::core::error::Result;
use crate::core::types::{CommandDescriptor, Document};

pub const KIND: &str = "helm";
pub const TOOL: &str = "helm";

/// Command → document fields supplying its positional arguments, in order.
pub const POSITIONAL_ARGS: &[(&str, &[&str])] = &[
    ("repo add", &["name", "url"]),
    ("repo update", &[]),
    ("install", &["chart"]),
];

/// Build the helm commands in the run starting at `start`.
pub fn build(
    docs: &mut [Document],
    start: usize,
    _ctx: &BuildContext,
) -> Result<(Vec<CommandDescriptor>, usize)> {
    scan_run(docs, start, KIND, |docs, i| build_one(&docs[i], i))
}

fn build_one(doc: &Document, i: usize) -> Result<CommandDescriptor> {
    let words = command_words(doc, i)?;
    let extra = positionals(doc, POSITIONAL_ARGS, &words);

    let mut argv = ArgvBuilder::new(TOOL);
    argv.words(words);
    for flag in flags(doc)? {
        argv.flag(&flag);
    }
    for (name, value) in named_values(doc, "options")? {
        argv.option(&name, value);
    }
    for (name, value) in named_values(doc, "set-values")? {
        argv.option("set", format!("{}={}", name, value));
    }
    argv.words(extra);
    Ok(argv.finish())
}
