//! speclink command-line interface
//!
//! [`command`] builds the clap command tree and [`run`] executes parsed
//! arguments against a [`Pipeline`], writing human or JSON output to the
//! given writer and returning the process exit code. Logging goes to
//! stderr so `--json` output stays machine-readable.

#![warn(missing_docs)]
#![warn(unreachable_pub)]

use anyhow::Context;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use serde::Serialize;
use speclink_core::{
    render_status_summary, Gated, NewSpec, Pipeline, SpeclinkConfig, SpeclinkError, EXIT_IO_ERROR,
    EXIT_REQUIREMENTS_PENDING, EXIT_SUCCESS, EXIT_VALIDATION_FAILED,
};
use speclink_document::ValidationReport;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Build the command tree
#[must_use]
pub fn command() -> Command {
    let doc = || {
        Arg::new("document")
            .required(true)
            .value_parser(value_parser!(PathBuf))
            .help("Requirements document (Markdown with front matter)")
    };
    let json = || {
        Arg::new("json")
            .long("json")
            .action(ArgAction::SetTrue)
            .help("Print JSON instead of text")
    };
    let source = || {
        Arg::new("source")
            .long("source")
            .required(true)
            .value_parser(value_parser!(PathBuf))
            .help("Source tree to scan for requirement references")
    };

    Command::new("speclink")
        .version(speclink_core::VERSION)
        .about("Requirement-first scaffolding and requirement/code/test traceability")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("Configuration file (default: nearest speclink.toml)"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Debug logging"),
        )
        .subcommand(
            Command::new("validate")
                .about("Check document structure and requirement ids")
                .arg(doc())
                .arg(json()),
        )
        .subcommand(
            Command::new("match")
                .about("Rank catalog capabilities against a document")
                .arg(doc())
                .arg(json()),
        )
        .subcommand(
            Command::new("generate")
                .about("Write scaffold files for every entity and role")
                .arg(doc())
                .arg(
                    Arg::new("out")
                        .long("out")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Output directory"),
                )
                .arg(Arg::new("namespace").long("namespace").help("Package namespace"))
                .arg(
                    Arg::new("force")
                        .long("force")
                        .action(ArgAction::SetTrue)
                        .help("Overwrite files without a generated header"),
                )
                .arg(json()),
        )
        .subcommand(
            Command::new("sync")
                .about("Rewrite the traceability matrix from a source scan")
                .arg(doc())
                .arg(source())
                .arg(
                    Arg::new("summary")
                        .long("summary")
                        .value_parser(value_parser!(PathBuf))
                        .help("Also write a Markdown status summary here"),
                )
                .arg(
                    Arg::new("architecture")
                        .long("architecture")
                        .value_parser(value_parser!(PathBuf))
                        .help("Also write the code files grouped by architecture layer here"),
                )
                .arg(
                    Arg::new("dry-run")
                        .long("dry-run")
                        .action(ArgAction::SetTrue)
                        .help("Report without rewriting the document"),
                )
                .arg(json()),
        )
        .subcommand(
            Command::new("verify")
                .about("Report coverage without writing anything; exits 1 while requirements are pending")
                .arg(doc())
                .arg(source())
                .arg(json()),
        )
        .subcommand(
            Command::new("create")
                .about("Write a new requirements document")
                .arg(Arg::new("feature").required(true).help("Feature name"))
                .arg(
                    Arg::new("specs-dir")
                        .long("specs-dir")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Directory holding requirements documents"),
                )
                .arg(Arg::new("purpose").short('p').long("purpose").help("One-line purpose"))
                .arg(
                    Arg::new("requirement")
                        .short('r')
                        .long("requirement")
                        .action(ArgAction::Append)
                        .help("Requirement line (repeatable)"),
                )
                .arg(Arg::new("author").long("author").help("Author recorded in the front matter")),
        )
        .subcommand(
            Command::new("stamp")
                .about("Write parser-assigned requirement ids into the document")
                .arg(doc()),
        )
}

/// Install the stderr subscriber (`RUST_LOG`, default `info`; `verbose` forces `debug`)
pub fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    // Fails only when a subscriber is already installed (repeated in-process runs)
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .ok();
}

/// Exit code for an error from [`run`]
#[must_use]
pub fn exit_code(error: &anyhow::Error) -> i32 {
    error
        .downcast_ref::<SpeclinkError>()
        .map_or(EXIT_IO_ERROR, SpeclinkError::exit_code)
}

/// Execute parsed arguments, writing results to `out`
///
/// # Errors
/// Pipeline errors, with the failing operation as context. Use
/// [`exit_code`] to map them to a process status.
pub fn run(matches: &ArgMatches, out: &mut dyn Write) -> anyhow::Result<i32> {
    let Some((name, args)) = matches.subcommand() else {
        return Ok(EXIT_SUCCESS);
    };
    let json = args.try_get_one::<bool>("json").ok().flatten().copied().unwrap_or(false);
    let anchor = args
        .try_get_one::<PathBuf>("document")
        .ok()
        .flatten()
        .or_else(|| args.try_get_one::<PathBuf>("specs-dir").ok().flatten())
        .cloned();
    let explicit = args
        .get_one::<PathBuf>("config")
        .or_else(|| matches.get_one::<PathBuf>("config"));
    let config = load_config(explicit, anchor.as_deref())?;
    let pipeline = Pipeline::new(config).context("setting up pipeline")?;

    match name {
        "validate" => {
            let path = document(args)?;
            let loaded = pipeline.load(path).with_context(|| format!("loading {}", path.display()))?;
            let report = pipeline.validate(&loaded.document);
            if json {
                print_json(out, &report)?;
            } else {
                print_findings(out, &report)?;
                writeln!(out, "{}: {}", path.display(), if report.ok { "ok" } else { "FAILED" })?;
            }
            Ok(validation_exit(&report))
        }
        "match" => {
            let path = document(args)?;
            let loaded = pipeline.load(path).with_context(|| format!("loading {}", path.display()))?;
            let matches = pipeline.match_capabilities(&loaded.document);
            if json {
                print_json(out, &matches)?;
            } else if matches.is_empty() {
                writeln!(out, "no capability matched")?;
            } else {
                for m in &matches {
                    writeln!(out, "{:>3}  {}  [{}]", m.score, m.name(), m.matched_tags.join(", "))?;
                }
            }
            Ok(EXIT_SUCCESS)
        }
        "generate" => {
            let path = document(args)?;
            let out_dir = args.get_one::<PathBuf>("out").context("--out is required")?;
            let loaded = pipeline.load(path).with_context(|| format!("loading {}", path.display()))?;
            let mut options = pipeline.generate_options(out_dir).with_force(args.get_flag("force"));
            if let Some(namespace) = args.get_one::<String>("namespace") {
                options.namespace.clone_from(namespace);
            }
            let gated = pipeline
                .generate(&loaded.document, &options)
                .with_context(|| format!("generating into {}", out_dir.display()))?;
            if json {
                print_json(out, &gated)?;
            } else if let Some(report) = gated.output() {
                for artifact in &report.artifacts {
                    writeln!(out, "{:<14} {}", artifact.outcome.as_str(), artifact.path.display())?;
                }
                for notice in &report.skipped {
                    writeln!(out, "skipped        {}", serde_json::to_string(notice)?)?;
                }
                writeln!(out, "{} written, {} skipped", report.written(), report.skipped.len())?;
            } else {
                print_findings(out, gated.validation())?;
            }
            Ok(gate_exit(&gated))
        }
        "sync" => {
            let path = document(args)?;
            let source = args.get_one::<PathBuf>("source").context("--source is required")?;
            let gated = pipeline
                .synchronize(path, source, args.get_flag("dry-run"))
                .with_context(|| format!("synchronizing {}", path.display()))?;
            if let Some(outcome) = gated.output() {
                if let Some(summary) = args.get_one::<PathBuf>("summary") {
                    pipeline.write_summary(&outcome.report, summary)?;
                }
                if let Some(architecture) = args.get_one::<PathBuf>("architecture") {
                    pipeline.write_architecture(&outcome.report, architecture)?;
                }
            }
            if json {
                print_json(out, &gated)?;
            } else if let Some(outcome) = gated.output() {
                let report = &outcome.report;
                writeln!(out, "{}", speclink_document::coverage_line(&report.counts))?;
                for notice in &report.notices {
                    writeln!(out, "notice: {}", serde_json::to_string(notice)?)?;
                }
                for orphan in &report.orphan_references {
                    writeln!(out, "unknown reference {} at {}", orphan.id, orphan.location)?;
                }
                let state = if outcome.written { "updated" } else { "unchanged" };
                writeln!(out, "{}: {state}", path.display())?;
            } else {
                print_findings(out, gated.validation())?;
            }
            Ok(gate_exit(&gated))
        }
        "verify" => {
            let path = document(args)?;
            let source = args.get_one::<PathBuf>("source").context("--source is required")?;
            let report = pipeline
                .verify(path, source)
                .with_context(|| format!("verifying {}", path.display()))?;
            if json {
                print_json(out, &report)?;
            } else {
                write!(out, "{}", render_status_summary(&report))?;
            }
            Ok(if report.counts.pending > 0 {
                EXIT_REQUIREMENTS_PENDING
            } else {
                EXIT_SUCCESS
            })
        }
        "create" => {
            let specs_dir = args.get_one::<PathBuf>("specs-dir").context("--specs-dir is required")?;
            let feature = args.get_one::<String>("feature").context("feature is required")?;
            let id = pipeline.next_spec_id(specs_dir)?;
            let mut spec = NewSpec::new(id, feature.as_str());
            if let Some(purpose) = args.get_one::<String>("purpose") {
                spec = spec.with_purpose(purpose.as_str());
            }
            if let Some(author) = args.get_one::<String>("author") {
                spec = spec.with_author(author.as_str());
            }
            for requirement in args.get_many::<String>("requirement").into_iter().flatten() {
                spec = spec.with_requirement(requirement.as_str());
            }
            let created = pipeline
                .create(&spec, specs_dir)
                .with_context(|| format!("creating document in {}", specs_dir.display()))?;
            writeln!(
                out,
                "{} created at {} ({} requirements)",
                created.authored.spec_id,
                created.path.display(),
                created.authored.document.requirements().len()
            )?;
            Ok(EXIT_SUCCESS)
        }
        "stamp" => {
            let path = document(args)?;
            let stamped = pipeline.stamp(path).with_context(|| format!("stamping {}", path.display()))?;
            writeln!(out, "{}: {stamped} requirement ids stamped", path.display())?;
            Ok(EXIT_SUCCESS)
        }
        other => anyhow::bail!("unknown command '{other}'"),
    }
}

fn load_config(explicit: Option<&PathBuf>, anchor: Option<&Path>) -> anyhow::Result<SpeclinkConfig> {
    if let Some(path) = explicit {
        return SpeclinkConfig::load(path)
            .map_err(SpeclinkError::from)
            .with_context(|| format!("loading {}", path.display()));
    }
    let start = anchor
        .and_then(|p| if p.is_dir() { Some(p) } else { p.parent() })
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    Ok(SpeclinkConfig::discover(start).map_err(SpeclinkError::from)?)
}

fn document(args: &ArgMatches) -> anyhow::Result<&PathBuf> {
    args.get_one::<PathBuf>("document").context("document path is required")
}

fn print_json<T: Serialize + ?Sized>(out: &mut dyn Write, value: &T) -> anyhow::Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

fn print_findings(out: &mut dyn Write, report: &ValidationReport) -> anyhow::Result<()> {
    for finding in &report.findings {
        match finding.line {
            Some(line) => writeln!(out, "{}[{}] line {line}: {}", finding.severity, finding.code, finding.message)?,
            None => writeln!(out, "{}[{}]: {}", finding.severity, finding.code, finding.message)?,
        }
    }
    Ok(())
}

fn validation_exit(report: &ValidationReport) -> i32 {
    if report.ok {
        EXIT_SUCCESS
    } else {
        EXIT_VALIDATION_FAILED
    }
}

fn gate_exit<T>(gated: &Gated<T>) -> i32 {
    validation_exit(gated.validation())
}
