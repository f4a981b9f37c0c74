//! oas-sync - OpenAPI reconciliation CLI tool
//!
//! Diffs a consolidated OpenAPI document against its multi-file reference
//! and patches the differences in place without reformatting the rest.

use std::error::Error;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use openapi_sync::config::ReconcileConfig;
use openapi_sync::document::{ReferenceSet, TargetFile};
use openapi_sync::error::ReconcileError;
use openapi_sync::logging::{self, Verbosity};
use openapi_sync::pipeline::{Reconciler, RunSummary};
use openapi_sync::report::{DiffReport, Narrative};
use openapi_sync::validate::validate_document;

#[derive(Debug, Parser)]
#[command(
    name = "oas-sync",
    version,
    about = "Reconcile an OpenAPI document against its reference",
    args_conflicts_with_subcommands = true
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Arguments of the default `sync` command.
    #[command(flatten)]
    args: RunArgs,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Diff the target against the reference and write the report
    Diff(RunArgs),
    /// Add missing entities, convert inline parameters, rewrite references and validate
    Sync(RunArgs),
    /// Remove entities the reference does not define (backs up the target)
    Prune(RunArgs),
    /// Rewrite external references into internal ones (backs up the target)
    Rewrite(RunArgs),
    /// Replace inline path parameters with component references
    Convert(RunArgs),
    /// Copy drifting type, nullable and example attributes from the reference
    FixFields(RunArgs),
    /// Validate the target document
    Validate(RunArgs),
}

#[derive(Debug, Clone, Default, Args)]
struct RunArgs {
    /// Reference OpenAPI document [default: reference/openapi.yaml]
    reference: Option<PathBuf>,

    /// Target OpenAPI document [default: openapi/openapi.yml]
    target: Option<PathBuf>,

    /// Where to write the JSON diff report [default: openapi_diff.json]
    diff_report: Option<PathBuf>,

    /// Flat models file [default: reference/schemas/models.yaml if it exists]
    #[arg(long, value_name = "FILE")]
    models: Option<PathBuf>,

    /// YAML configuration file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Where to write the Markdown narrative of the diff
    #[arg(long, value_name = "FILE")]
    narrative: Option<PathBuf>,

    /// Compute every edit without writing the target
    #[arg(long)]
    dry_run: bool,

    /// Log debug events
    #[arg(short, long)]
    verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Diff,
    Sync,
    Prune,
    Rewrite,
    Convert,
    FixFields,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let (stage, args) = match cli.command {
        Some(Command::Validate(args)) => (None, args),
        Some(Command::Diff(args)) => (Some(Stage::Diff), args),
        Some(Command::Sync(args)) => (Some(Stage::Sync), args),
        Some(Command::Prune(args)) => (Some(Stage::Prune), args),
        Some(Command::Rewrite(args)) => (Some(Stage::Rewrite), args),
        Some(Command::Convert(args)) => (Some(Stage::Convert), args),
        Some(Command::FixFields(args)) => (Some(Stage::FixFields), args),
        None => (Some(Stage::Sync), cli.args),
    };
    logging::init(Verbosity::from_flags(args.verbose, args.quiet));

    let result = match stage {
        Some(stage) => reconcile(stage, args),
        None => validate(args),
    };
    if let Err(e) = result {
        eprintln!("Error: {}", e);
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

/// Paths resolved from arguments, then configuration defaults.
struct Resolved {
    config: ReconcileConfig,
    reference: PathBuf,
    target: PathBuf,
    report: PathBuf,
    models: Option<PathBuf>,
}

fn resolve(args: &RunArgs) -> Result<Resolved, ReconcileError> {
    let config = ReconcileConfig::load(args.config.as_deref())?;
    let models = args
        .models
        .clone()
        .or_else(|| config.default_models().map(Path::to_path_buf));
    Ok(Resolved {
        reference: args.reference.clone().unwrap_or_else(|| config.paths.reference.clone()),
        target: args.target.clone().unwrap_or_else(|| config.paths.target.clone()),
        report: args.diff_report.clone().unwrap_or_else(|| config.paths.report.clone()),
        models,
        config,
    })
}

fn validate(args: RunArgs) -> Result<(), Box<dyn Error>> {
    let resolved = resolve(&args)?;
    let target = TargetFile::new(resolved.target).load()?;
    validate_document(&target.tree).map_err(ReconcileError::Validation)?;
    println!("{}: valid", target.name());
    Ok(())
}

fn reconcile(stage: Stage, args: RunArgs) -> Result<(), Box<dyn Error>> {
    let resolved = resolve(&args)?;
    let reference = ReferenceSet::load(&resolved.reference, resolved.models.as_deref())?;
    let target = TargetFile::new(&resolved.target).with_dry_run(args.dry_run);
    let reconciler = Reconciler::from_config(&resolved.config, reference, target);

    let mut summary = match stage {
        Stage::Diff => {
            let diffs = reconciler.diff()?;
            println!("{}", diffs);
            let report = DiffReport::build(&diffs, reconciler.reference());
            write_report(&report, &resolved.report, args.narrative.as_deref())?;
            return Ok(());
        }
        Stage::Sync => {
            let summary = reconciler.sync();
            if let Some(report) = &summary.report {
                write_report(report, &resolved.report, args.narrative.as_deref())?;
            }
            summary
        }
        Stage::Prune => reconciler.prune(),
        Stage::FixFields => reconciler.fix_fields(),
        Stage::Rewrite => RunSummary {
            rewritten: reconciler.rewrite()?,
            dry_run: args.dry_run,
            ..RunSummary::default()
        },
        Stage::Convert => RunSummary {
            outcomes: reconciler.convert()?,
            dry_run: args.dry_run,
            ..RunSummary::default()
        },
    };
    let failure = summary.failure.take();
    println!("{}", summary);
    match failure {
        Some(err) => Err(err.into()),
        None => Ok(()),
    }
}

fn write_report(
    report: &DiffReport,
    path: &Path,
    narrative: Option<&Path>,
) -> Result<(), ReconcileError> {
    report.write(path)?;
    if let Some(narrative) = narrative {
        Narrative::from_report(report).write(narrative)?;
    }
    Ok(())
}
