//! CLI subcommands.

use crate::core::codegen::KindRegistry;
use crate::core::config::{self, EngineConfig, DEFAULT_STAGING_DIR};
use crate::core::executor::{self, RunSummary, SetReport, SetStatus};
use crate::core::resolver::{self, RenderOptions};
use crate::core::types::{yaml_value_to_string, IntrinsicVariables, VariableSet};
use crate::transport::local::LocalRunner;
use crate::transport::{CommandRunner, DryRunner};
use clap::{Args, Subcommand};
use indexmap::IndexMap;
use std::path::{Path, PathBuf};

/// Options shared by `plan` and `apply`.
#[derive(Args, Debug, Clone)]
pub struct EngineArgs {
    /// Directory for rendered command files and -f argument objects
    #[arg(long, env = "CMDSET_STAGING_DIR", default_value = DEFAULT_STAGING_DIR)]
    pub staging_dir: PathBuf,

    /// YAML mapping of intrinsic variables
    #[arg(long)]
    pub intrinsics: Option<PathBuf>,

    /// Intrinsic variable (NAME=VALUE), repeatable
    #[arg(long = "intrinsic", value_name = "NAME=VALUE")]
    pub intrinsic: Vec<String>,

    /// Override for a custom variable (NAME=VALUE), repeatable
    #[arg(long = "var", value_name = "NAME=VALUE")]
    pub var: Vec<String>,

    /// Variable whose value is masked in logs, repeatable
    #[arg(long = "sensitive", value_name = "NAME")]
    pub sensitive: Vec<String>,
}

impl EngineArgs {
    /// Build the engine configuration. `--intrinsic` entries win over the file.
    pub fn to_config(&self) -> Result<EngineConfig, String> {
        let mut intrinsics = match &self.intrinsics {
            Some(path) => config::load_variable_file(path).map_err(|e| e.to_string())?,
            None => IndexMap::new(),
        };
        intrinsics.extend(config::parse_assignments(&self.intrinsic).map_err(|e| e.to_string())?);
        let overrides = config::parse_assignments(&self.var).map_err(|e| e.to_string())?;

        Ok(EngineConfig::default()
            .with_staging_dir(&self.staging_dir)
            .with_intrinsics(IntrinsicVariables::new(intrinsics))
            .with_overrides(overrides)
            .with_sensitive(self.sensitive.iter().cloned()))
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the commands a command set would run, without running them
    Plan {
        /// Command-set directory (or a directory of them with --sets)
        path: PathBuf,

        /// Treat PATH as a directory of command-set directories
        #[arg(long)]
        sets: bool,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        engine: EngineArgs,
    },

    /// Build and run the commands of a command set, in order
    Apply {
        /// Command-set directory (or a directory of them with --sets)
        path: PathBuf,

        /// Treat PATH as a directory of command-set directories
        #[arg(long)]
        sets: bool,

        /// Log each command instead of running it
        #[arg(long)]
        dry_run: bool,

        #[command(flatten)]
        engine: EngineArgs,
    },

    /// Expand ${NAME} macros in a template file
    Render {
        /// Template file
        template: PathBuf,

        /// Output file
        output: PathBuf,

        /// Parameter (NAME=VALUE), repeatable
        #[arg(long = "param", value_name = "NAME=VALUE")]
        param: Vec<String>,

        /// YAML mapping of parameters
        #[arg(long)]
        params: Option<PathBuf>,

        /// Parameter to macro-name mapping (NAME=MACRO), repeatable
        #[arg(long = "keyword", value_name = "NAME=MACRO")]
        keyword: Vec<String>,

        /// Require a --keyword mapping for every parameter
        #[arg(long)]
        strict: bool,

        /// Format for a macro's value, e.g. MACRO='"{}"', repeatable
        #[arg(long = "format", value_name = "MACRO=FMT")]
        format: Vec<String>,

        /// Substitute each parameter on the first line it appears only
        #[arg(long)]
        once: bool,

        /// Macro exempt from --once, repeatable
        #[arg(long = "repeat", value_name = "MACRO")]
        repeat: Vec<String>,
    },

    /// List the registered command kinds
    Kinds,
}

/// Dispatch a CLI command.
pub fn dispatch(cmd: Commands) -> Result<(), String> {
    match cmd {
        Commands::Plan {
            path,
            sets,
            json,
            engine,
        } => cmd_plan(&path, sets, json, &engine.to_config()?),
        Commands::Apply {
            path,
            sets,
            dry_run,
            engine,
        } => cmd_apply(&path, sets, dry_run, &engine.to_config()?),
        Commands::Render {
            template,
            output,
            param,
            params,
            keyword,
            strict,
            format,
            once,
            repeat,
        } => {
            let opts = render_options(&keyword, strict, &format, once, &repeat)?;
            let values = render_params(params.as_deref(), &param)?;
            cmd_render(&template, &output, &values, &opts)
        }
        Commands::Kinds => cmd_kinds(&EngineConfig::default().registry),
    }
}

/// Parse `NAME=VALUE` entries into a string map.
fn string_pairs(raw: &[String]) -> Result<IndexMap<String, String>, String> {
    Ok(config::parse_assignments(raw)
        .map_err(|e| e.to_string())?
        .into_iter()
        .map(|(k, v)| (k, yaml_value_to_string(&v)))
        .collect())
}

fn render_options(
    keyword: &[String],
    strict: bool,
    format: &[String],
    once: bool,
    repeat: &[String],
) -> Result<RenderOptions, String> {
    let keyword_map = string_pairs(keyword)?;
    let mut opts = if strict {
        RenderOptions::strict(keyword_map)
    } else {
        RenderOptions::lenient().with_keyword_map(keyword_map)
    };
    opts = opts.with_special_values(string_pairs(format)?);
    if once {
        opts = opts.single_appearance(repeat.iter().cloned());
    }
    Ok(opts)
}

fn render_params(file: Option<&Path>, param: &[String]) -> Result<VariableSet, String> {
    let mut values = match file {
        Some(path) => config::load_variable_file(path).map_err(|e| e.to_string())?,
        None => IndexMap::new(),
    };
    values.extend(config::parse_assignments(param).map_err(|e| e.to_string())?);
    Ok(values.into_iter().collect())
}

fn cmd_render(
    template: &Path,
    output: &Path,
    params: &VariableSet,
    opts: &RenderOptions,
) -> Result<(), String> {
    resolver::render(template, output, params, opts).map_err(|e| e.to_string())?;
    println!("Rendered {} -> {}", template.display(), output.display());
    Ok(())
}

fn cmd_plan(path: &Path, sets: bool, json: bool, cfg: &EngineConfig) -> Result<(), String> {
    if sets {
        let summary =
            executor::process_command_sets(path, cfg, None).map_err(|e| e.to_string())?;
        if json {
            print_json(&summary)?;
        } else {
            print_summary(&summary);
        }
        return summary_result(&summary);
    }

    let report = executor::plan_command_set(path, cfg).map_err(|e| e.to_string())?;
    if json {
        print_json(&report)
    } else {
        print_report(&report);
        Ok(())
    }
}

fn cmd_apply(path: &Path, sets: bool, dry_run: bool, cfg: &EngineConfig) -> Result<(), String> {
    let dry = DryRunner::new();
    let runner: &dyn CommandRunner = if dry_run { &dry } else { &LocalRunner };

    if sets {
        let summary =
            executor::process_command_sets(path, cfg, Some(runner)).map_err(|e| e.to_string())?;
        print_summary(&summary);
        return summary_result(&summary);
    }

    let report = executor::run_command_set(path, cfg, runner).map_err(|e| e.to_string())?;
    print_report(&report);
    if dry_run {
        println!("Dry run — no commands executed.");
    }
    Ok(())
}

/// One line per registered kind, followed by its positional-argument commands.
fn kinds_listing(registry: &KindRegistry) -> Vec<String> {
    let mut lines = Vec::new();
    for kind in registry.kinds() {
        lines.push(format!("{} (runs {})", kind, kind.tool()));
        for (command, fields) in kind.positional_table() {
            if fields.is_empty() {
                lines.push(format!("  {}", command));
            } else {
                lines.push(format!("  {} <{}>", command, fields.join("> <")));
            }
        }
    }
    lines
}

fn cmd_kinds(registry: &KindRegistry) -> Result<(), String> {
    for line in kinds_listing(registry) {
        println!("{}", line);
    }
    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), String> {
    let text = serde_json::to_string_pretty(value).map_err(|e| format!("JSON error: {}", e))?;
    println!("{}", text);
    Ok(())
}

fn status_label(status: &SetStatus) -> String {
    match status {
        SetStatus::Ready => "ready".to_string(),
        SetStatus::Completed => "completed".to_string(),
        SetStatus::Skipped { missing } => format!("skipped, missing {}", missing.join(", ")),
        SetStatus::Failed { error } => format!("FAILED: {}", error),
    }
}

fn print_report(report: &SetReport) {
    println!(
        "{}: {} ({} command(s))",
        report.name,
        status_label(&report.status),
        report.commands.len()
    );
    for command in &report.commands {
        println!("  $ {}", command);
    }
}

fn print_summary(summary: &RunSummary) {
    for report in &summary.sets {
        print_report(report);
    }
    println!();
    println!(
        "{} command set(s), {} failed.",
        summary.sets.len(),
        summary.failed()
    );
}

fn summary_result(summary: &RunSummary) -> Result<(), String> {
    if summary.has_failures() {
        Err(format!("{} command set(s) failed", summary.failed()))
    } else {
        Ok(())
    }
}
