//! Command-kind registry: dispatch a document run to its kind's builder.
//!
//! Each kind turns a contiguous run of its documents into command
//! descriptors:
//! - kubectl: `-f` options materialize the following document as a file
//! - helm: `set-values` and per-command positional arguments

use super::error::Result;
use super::staging::StagingDir;
use super::types::{CommandDescriptor, Document};
use crate::commands;
use indexmap::IndexMap;
use std::fmt;
use std::str::FromStr;

/// A registered command kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    Kubectl,
    Helm,
}

impl CommandKind {
    pub const ALL: [CommandKind; 2] = [CommandKind::Kubectl, CommandKind::Helm];

    /// The `kind:` value selecting this builder.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Kubectl => "kubectl",
            Self::Helm => "helm",
        }
    }

    /// The executable placed at argv[0].
    pub fn tool(&self) -> &'static str {
        match self {
            Self::Kubectl => commands::kubectl::TOOL,
            Self::Helm => commands::helm::TOOL,
        }
    }

    /// Positional-argument table: command → document fields appended in order.
    pub fn positional_table(&self) -> &'static [(&'static str, &'static [&'static str])] {
        match self {
            Self::Kubectl => commands::kubectl::POSITIONAL_ARGS,
            Self::Helm => commands::helm::POSITIONAL_ARGS,
        }
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CommandKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.name() == s)
            .ok_or_else(|| format!("unknown command kind: {}", s))
    }
}

/// What a builder may use besides the documents themselves.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuildContext<'a> {
    /// Destination for `-f` argument objects
    pub staging: Option<&'a StagingDir>,
}

/// Build commands for the run of `kind` documents starting at `start`.
/// Returns the descriptors and the index where the run ended.
pub fn build_commands(
    kind: CommandKind,
    docs: &mut [Document],
    start: usize,
    ctx: &BuildContext,
) -> Result<(Vec<CommandDescriptor>, usize)> {
    match kind {
        CommandKind::Kubectl => commands::kubectl::build(docs, start, ctx),
        CommandKind::Helm => commands::helm::build(docs, start, ctx),
    }
}

/// Kind names recognized as commands, resolved once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KindRegistry {
    kinds: IndexMap<String, CommandKind>,
}

impl Default for KindRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        for kind in CommandKind::ALL {
            registry.register(kind);
        }
        registry
    }
}

impl KindRegistry {
    pub fn empty() -> Self {
        Self {
            kinds: IndexMap::new(),
        }
    }

    pub fn register(&mut self, kind: CommandKind) {
        self.kinds.insert(kind.name().to_string(), kind);
    }

    pub fn lookup(&self, name: &str) -> Option<CommandKind> {
        self.kinds.get(name).copied()
    }

    pub fn kinds(&self) -> impl Iterator<Item = CommandKind> + '_ {
        self.kinds.values().copied()
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn docs(yaml: &str) -> Vec<Document> {
        crate::core::parser::parse_documents(yaml, std::path::Path::new("test.yaml")).unwrap()
    }

    #[test]
    fn test_codegen_kind_names() {
        assert_eq!(CommandKind::Kubectl.to_string(), "kubectl");
        assert_eq!("helm".parse::<CommandKind>().unwrap(), CommandKind::Helm);
        assert!("docker".parse::<CommandKind>().is_err());
        assert_eq!(CommandKind::Helm.tool(), "helm");
    }

    #[test]
    fn test_codegen_registry_default() {
        let registry = KindRegistry::default();
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.lookup("kubectl"), Some(CommandKind::Kubectl));
        assert_eq!(registry.lookup("Deployment"), None);
        let names: Vec<_> = registry.kinds().map(|k| k.name()).collect();
        assert_eq!(names, vec!["kubectl", "helm"]);
    }

    #[test]
    fn test_codegen_registry_restricted() {
        let mut registry = KindRegistry::empty();
        assert!(registry.is_empty());
        registry.register(CommandKind::Helm);
        assert!(registry.lookup("kubectl").is_none());
        assert!(registry.lookup("helm").is_some());
    }

    #[test]
    fn test_codegen_dispatches_kubectl() {
        let mut d = docs("kind: kubectl\ncommand: get\nflags: [A]\n");
        let (cmds, next) =
            build_commands(CommandKind::Kubectl, &mut d, 0, &BuildContext::default()).unwrap();
        assert_eq!(cmds[0].display(), "kubectl get -A");
        assert_eq!(next, 1);
    }

    #[test]
    fn test_codegen_dispatches_helm() {
        let mut d = docs("kind: helm\ncommand: repo update\n");
        let (cmds, _) =
            build_commands(CommandKind::Helm, &mut d, 0, &BuildContext::default()).unwrap();
        assert_eq!(cmds[0].argv(), ["helm", "repo", "update"]);
    }

    #[test]
    fn test_codegen_positional_tables() {
        assert!(CommandKind::Kubectl.positional_table().is_empty());
        assert!(CommandKind::Helm
            .positional_table()
            .iter()
            .any(|(cmd, args)| *cmd == "install" && *args == ["chart"]));
    }
}
