//! kubectl command builder.
//!
//! An `f` option names a file: the document right after the command is
//! written to the staging directory under that name and the option value
//! becomes the written path.

use super::{command_words, flags, named_values, positionals, scan_run, ArgvBuilder};
use crate::core::codegen::BuildContext;
use crate::core::error::{EngineError, Result};
use crate::core::types::{CommandDescriptor, Document};

pub const KIND: &str = "kubectl";
pub const TOOL: &str = "kubectl";

/// kubectl takes no positional arguments from the document.
pub const POSITIONAL_ARGS: &[(&str, &[&str])] = &[];

/// Option whose following document is materialized as a file.
pub const FILE_OPTION: &str = "f";

/// Build the kubectl commands in the run starting at `start`.
pub fn build(
    docs: &mut [Document],
    start: usize,
    ctx: &BuildContext,
) -> Result<(Vec<CommandDescriptor>, usize)> {
    scan_run(docs, start, KIND, |docs, i| build_one(docs, i, ctx))
}

fn build_one(docs: &mut [Document], i: usize, ctx: &BuildContext) -> Result<CommandDescriptor> {
    let doc = &docs[i];
    let words = command_words(doc, i)?;
    let flag_names = flags(doc)?;
    let options = named_values(doc, "options")?;
    let extra = positionals(doc, POSITIONAL_ARGS, &words);

    let mut argv = ArgvBuilder::new(TOOL);
    argv.words(words);
    for flag in &flag_names {
        argv.flag(flag);
    }
    for (name, value) in options {
        let value = if name == FILE_OPTION {
            materialize_next(docs, i, &value, ctx)?
        } else {
            value
        };
        argv.option(&name, value);
    }
    argv.words(extra);
    Ok(argv.finish())
}

/// Write the document after `i` to the staging directory, mark it processed
/// and return the written path.
fn materialize_next(
    docs: &mut [Document],
    i: usize,
    option_value: &str,
    ctx: &BuildContext,
) -> Result<String> {
    let object_index = i + 1;
    if object_index >= docs.len() {
        return Err(EngineError::MissingArgument(format!(
            "kubectl command at position {} uses -f {} but no document follows it",
            i, option_value
        )));
    }
    let staging = ctx.staging.ok_or_else(|| {
        EngineError::MissingArgument(
            "a kubectl command with a -f option needs a staging directory".to_string(),
        )
    })?;

    let path = staging.materialize(option_value, &docs[object_index])?;
    docs[object_index].mark_processed();
    Ok(path.to_string_lossy().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::parser::parse_documents;
    use crate::core::staging::StagingDir;
    use std::path::Path;

    fn docs(yaml: &str) -> Vec<Document> {
        parse_documents(yaml, Path::new("cmd.yaml")).unwrap()
    }

    #[test]
    fn test_kubectl_flags_and_options() {
        let mut d = docs(
            "kind: kubectl\ncommand: get\nflags: [A, watch]\noptions:\n  o: wide\n  namespace: kube-system\n",
        );
        let (cmds, next) = build(&mut d, 0, &BuildContext::default()).unwrap();
        assert_eq!(next, 1);
        assert_eq!(
            cmds[0].argv(),
            ["kubectl", "get", "-A", "--watch", "-o", "wide", "--namespace", "kube-system"]
        );
        assert_eq!(
            cmds[0].display(),
            "kubectl get -A --watch -o wide --namespace kube-system"
        );
        assert!(d[0].is_processed());
    }

    #[test]
    fn test_kubectl_file_option_materializes_next_document() {
        let dir = tempfile::tempdir().unwrap();
        let staging = StagingDir::new(dir.path());
        let ctx = BuildContext {
            staging: Some(&staging),
        };
        let mut d = docs(
            "kind: kubectl\ncommand: create\noptions: {f: foo}\n---\napiVersion: v1\nkind: Namespace\nmetadata: {name: widget}\n",
        );
        let (cmds, next) = build(&mut d, 0, &ctx).unwrap();
        assert_eq!(cmds.len(), 1);
        assert_eq!(next, 2);

        let staged = dir.path().join("foo.yaml");
        assert_eq!(
            cmds[0].argv(),
            ["kubectl", "create", "-f", staged.to_str().unwrap()]
        );
        let written: serde_yaml_ng::Value =
            serde_yaml_ng::from_str(&std::fs::read_to_string(&staged).unwrap()).unwrap();
        assert_eq!(&written, d[1].body());
        assert!(d[1].is_processed());

        // a repeated scan emits nothing for the consumed documents
        let (again, _) = build(&mut d, 0, &ctx).unwrap();
        assert!(again.is_empty());
    }

    #[test]
    fn test_kubectl_consumed_object_does_not_halt_run() {
        let dir = tempfile::tempdir().unwrap();
        let staging = StagingDir::new(dir.path());
        let ctx = BuildContext {
            staging: Some(&staging),
        };
        let mut d = docs(
            "kind: kubectl\ncommand: apply\noptions: {f: a}\n---\nkind: ConfigMap\ndata: {x: '1'}\n---\nkind: kubectl\ncommand: get\nflags: [A]\n",
        );
        let (cmds, next) = build(&mut d, 0, &ctx).unwrap();
        assert_eq!(cmds.len(), 2);
        assert_eq!(cmds[1].display(), "kubectl get -A");
        assert_eq!(next, 3);
    }

    #[test]
    fn test_kubectl_halts_at_foreign_kind() {
        let mut d = docs(
            "kind: kubectl\ncommand: get\n---\nkind: helm\ncommand: list\n---\nkind: kubectl\ncommand: describe\n",
        );
        let (cmds, next) = build(&mut d, 0, &BuildContext::default()).unwrap();
        assert_eq!(cmds.len(), 1);
        assert_eq!(next, 1);
        assert!(!d[2].is_processed());
    }

    #[test]
    fn test_kubectl_skips_variables_and_metadata() {
        let mut d = docs(
            "kind: kubectl\ncommand: get\n---\nkind: metadata\n---\nkind: kubectl\ncommand: describe\n",
        );
        let (cmds, _) = build(&mut d, 0, &BuildContext::default()).unwrap();
        assert_eq!(cmds.len(), 2);
    }

    #[test]
    fn test_kubectl_file_option_without_next_document() {
        let dir = tempfile::tempdir().unwrap();
        let staging = StagingDir::new(dir.path());
        let ctx = BuildContext {
            staging: Some(&staging),
        };
        let mut d = docs("kind: kubectl\ncommand: create\noptions: {f: foo}\n");
        let result = build(&mut d, 0, &ctx);
        assert!(matches!(result, Err(EngineError::MissingArgument(_))));
    }

    #[test]
    fn test_kubectl_file_option_without_staging() {
        let mut d = docs("kind: kubectl\ncommand: create\noptions: {f: foo}\n---\nkind: Pod\n");
        let result = build(&mut d, 0, &BuildContext::default());
        assert!(matches!(
            result,
            Err(EngineError::MissingArgument(msg)) if msg.contains("staging")
        ));
    }

    #[test]
    fn test_kubectl_missing_command() {
        let mut d = docs("kind: kubectl\noptions: {n: default}\n");
        let result = build(&mut d, 0, &BuildContext::default());
        assert!(matches!(result, Err(EngineError::MissingArgument(_))));
        assert!(!d[0].is_processed());
    }
}
