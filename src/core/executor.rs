//! Orchestration driver: command sets in, ordered command descriptors out.
//!
//! Per command-set directory:
//! resolve variables → gate → for each template (sorted): render → load → build
//!
//! The multi-set driver walks sorted subdirectories and isolates failures:
//! an error in one set is logged and recorded, and the next set still runs.

use super::codegen::{self, BuildContext, KindRegistry};
use super::config::EngineConfig;
use super::error::{EngineError, Result};
use super::parser::{self, KindFilter};
use super::resolver::{self, RenderOptions};
use super::staging::StagingDir;
use super::types::{CommandDescriptor, KIND_METADATA, KIND_VARIABLES};
use super::variables::{self, Gate};
use crate::transport::CommandRunner;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Where a command set ended up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum SetStatus {
    /// Commands built, nothing executed
    Ready,
    /// Every command ran and exited zero
    Completed,
    /// Required variables were missing or empty
    Skipped { missing: Vec<String> },
    /// Rendering, building or a command failed
    Failed { error: String },
}

/// Report for one command set.
#[derive(Debug, Clone, Serialize)]
pub struct SetReport {
    pub name: String,
    pub dir: PathBuf,
    #[serde(flatten)]
    pub status: SetStatus,
    pub commands: Vec<CommandDescriptor>,
}

impl SetReport {
    pub fn is_failed(&self) -> bool {
        matches!(self.status, SetStatus::Failed { .. })
    }
}

/// Reports for every command set under a root, in processing order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    pub sets: Vec<SetReport>,
}

impl RunSummary {
    pub fn failed(&self) -> usize {
        self.sets.iter().filter(|s| s.is_failed()).count()
    }

    pub fn has_failures(&self) -> bool {
        self.failed() > 0
    }
}

fn set_name(dir: &Path) -> String {
    dir.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| dir.display().to_string())
}

/// Render, load and build every template of one command set.
///
/// A closed gate yields a `Skipped` report with no commands and renders
/// nothing. Errors abort the set.
pub fn plan_command_set(dir: &Path, cfg: &EngineConfig) -> Result<SetReport> {
    let name = set_name(dir);
    if !dir.is_dir() {
        return Err(EngineError::InvalidArgument(format!(
            "command set {} is not a directory",
            dir.display()
        )));
    }

    let vars = variables::resolve(dir, &cfg.intrinsics, &cfg.overrides)?;
    tracing::debug!(
        "variables for {}: {:?}",
        name,
        variables::scrub(&vars, &cfg.sensitive)
    );

    let metadata = variables::load_metadata(dir)?;
    if let Gate::Closed(missing) = variables::check_required(metadata.as_ref(), &vars) {
        tracing::info!(
            "command set {} SKIPPED: missing required variables {}",
            name,
            missing.join(", ")
        );
        return Ok(SetReport {
            name,
            dir: dir.to_path_buf(),
            status: SetStatus::Skipped { missing },
            commands: Vec::new(),
        });
    }

    let templates =
        parser::list_yaml_files(dir, &KindFilter::exclude(&[KIND_VARIABLES, KIND_METADATA]))?;
    if templates.is_empty() {
        tracing::warn!("command set {} has no command templates", name);
    }

    let staging = StagingDir::new(&cfg.staging_dir);
    staging.ensure()?;
    let opts = RenderOptions::lenient();

    let mut commands = Vec::new();
    for template in &templates {
        let rendered = staging.command_file_path(template);
        tracing::debug!("rendering {} to {}", template.display(), rendered.display());
        resolver::render(template, &rendered, &vars, &opts)?;
        commands.extend(build_file(&rendered, &cfg.registry, &staging)?);
    }

    Ok(SetReport {
        name,
        dir: dir.to_path_buf(),
        status: SetStatus::Ready,
        commands,
    })
}

/// Build the commands of one rendered file.
///
/// Documents of unregistered kinds are stepped over; a registered kind hands
/// its run of documents to that kind's builder.
pub fn build_file(
    path: &Path,
    registry: &KindRegistry,
    staging: &StagingDir,
) -> Result<Vec<CommandDescriptor>> {
    let mut docs = parser::load_documents(path)?;
    let ctx = BuildContext {
        staging: Some(staging),
    };

    let mut commands = Vec::new();
    let mut i = 0;
    while i < docs.len() {
        if docs[i].is_processed() {
            i += 1;
            continue;
        }
        let Some(kind) = docs[i].kind().and_then(|k| registry.lookup(k)) else {
            tracing::debug!(
                "{}: skipping document {} of kind {}",
                path.display(),
                i,
                docs[i].kind().unwrap_or("<none>")
            );
            i += 1;
            continue;
        };
        let (built, next) = codegen::build_commands(kind, &mut docs, i, &ctx).map_err(|e| {
            tracing::error!("{}: document {} ({}): {}", path.display(), i, kind, e);
            e
        })?;
        commands.extend(built);
        i = next.max(i + 1);
    }
    Ok(commands)
}

/// Plan one command set, then run its commands in order. A nonzero exit
/// aborts the remaining commands of the set.
pub fn run_command_set(
    dir: &Path,
    cfg: &EngineConfig,
    runner: &dyn CommandRunner,
) -> Result<SetReport> {
    let mut report = plan_command_set(dir, cfg)?;
    if report.status != SetStatus::Ready {
        return Ok(report);
    }

    tracing::info!("command set {} STARTED", report.name);
    for command in &report.commands {
        tracing::info!("Invoking: {}", command);
        let out = runner.run(command)?;
        if !out.success() {
            return Err(EngineError::CommandFailed {
                command: command.display().to_string(),
                exit_code: out.exit_code,
            });
        }
    }
    tracing::info!("command set {} COMPLETED", report.name);
    report.status = SetStatus::Completed;
    Ok(report)
}

/// Subdirectories of `root`, sorted by name. The staging directory is never
/// a command set, even when it lives under `root`.
pub fn list_command_sets(root: &Path, staging_dir: &Path) -> Result<Vec<PathBuf>> {
    let staging = std::fs::canonicalize(staging_dir).ok();
    let entries = std::fs::read_dir(root).map_err(|e| EngineError::io(root, e))?;
    let mut dirs = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| EngineError::io(root, e))?;
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        if staging.is_some() && std::fs::canonicalize(&path).ok() == staging {
            tracing::debug!("{} is the staging directory; not a command set", path.display());
            continue;
        }
        dirs.push(path);
    }
    dirs.sort();
    Ok(dirs)
}

/// Process every command set under `root`. With a runner the commands are
/// executed, without one they are only planned.
///
/// Per-set errors are recorded as `Failed` and processing continues.
pub fn process_command_sets(
    root: &Path,
    cfg: &EngineConfig,
    runner: Option<&dyn CommandRunner>,
) -> Result<RunSummary> {
    let mut summary = RunSummary::default();
    for dir in list_command_sets(root, &cfg.staging_dir)? {
        let result = match runner {
            Some(runner) => run_command_set(&dir, cfg, runner),
            None => plan_command_set(&dir, cfg),
        };
        let report = match result {
            Ok(report) => report,
            Err(e) => {
                tracing::error!("command set {} FAILED: {}", dir.display(), e);
                SetReport {
                    name: set_name(&dir),
                    dir,
                    status: SetStatus::Failed {
                        error: e.to_string(),
                    },
                    commands: Vec::new(),
                }
            }
        };
        summary.sets.push(report);
    }
    if summary.has_failures() {
        tracing::warn!(
            "{} of {} command set(s) failed",
            summary.failed(),
            summary.sets.len()
        );
    }
    Ok(summary)
}
