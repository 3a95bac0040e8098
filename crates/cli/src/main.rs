//! uniqprops CLI
//!
//! Reports keys that are defined more than once in `.properties` files

mod config;
mod progress;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, info, warn, Level};
use tracing_subscriber::FmtSubscriber;
use uniqprops_core::{
    CheckSettings, DuplicateKeyTracker, TrackerStats, UniquePropertiesCheck, Violation,
    ViolationKind,
};
use uniqprops_formats::{parse_str, read_text, PropertiesReader, PropertyEntry};

use config::CheckConfig;
use progress::{CheckSummary, ProgressReporter};

#[derive(Parser)]
#[command(name = "uniqprops")]
#[command(version, about = "Report duplicated keys in properties files", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output results in JSON format
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Check files and directories for duplicated keys
    Check {
        /// Files or directories to check (directories are searched recursively)
        #[arg(value_name = "PATH", required = true)]
        paths: Vec<PathBuf>,

        /// Config file with check settings (YAML or TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Comma-separated file extensions to check (overrides config)
        #[arg(short, long, value_delimiter = ',')]
        extensions: Option<Vec<String>>,

        /// Exit with status 1 when any violation is found
        #[arg(long)]
        fail_on_violation: bool,
    },

    /// Show the duplicated keys of one file, in duplication order
    Duplicates {
        /// Path to the properties file
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },

    /// Print the parsed entries of a properties file
    Inspect {
        /// Path to the properties file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Number of entries to show
        #[arg(short = 'n', long, default_value = "10")]
        limit: usize,
    },

    /// Write a default config file (YAML or TOML, by extension)
    InitConfig {
        /// Where to write the config
        #[arg(value_name = "FILE", default_value = "uniqprops.yaml")]
        output: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_ansi(!cli.json)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Check {
            paths,
            config,
            extensions,
            fail_on_violation,
        } => {
            let report = run_check(&paths, config.as_deref(), extensions, fail_on_violation, cli.json)?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&report.to_json())?);
            } else {
                for violation in &report.violations {
                    println!("{}", violation);
                }
                progress::print_summary_report(&report.summary);
            }
            return Ok(report.exit_code());
        }
        Commands::Duplicates { input } => {
            let report = collect_duplicates(&input)?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&report.to_json())?);
            } else {
                for line in report.text_lines() {
                    println!("{}", line);
                }
            }
        }
        Commands::Inspect { input, limit } => {
            inspect_file(&input, limit)?;
        }
        Commands::InitConfig { output, force } => {
            init_config(&output, force)?;
            println!("Wrote default config to {}", output.display());
        }
        Commands::Completions { shell } => {
            generate_completions(shell);
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// Outcome of one `check` run
struct CheckReport {
    summary: CheckSummary,
    /// All violations, grouped by file in input order
    violations: Vec<Violation>,
    fail_on_violation: bool,
}

impl CheckReport {
    fn should_fail(&self) -> bool {
        self.fail_on_violation && !self.violations.is_empty()
    }

    fn exit_code(&self) -> ExitCode {
        if self.should_fail() {
            ExitCode::FAILURE
        } else {
            ExitCode::SUCCESS
        }
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "files_checked": self.summary.files_checked,
            "files_with_violations": self.summary.files_with_violations,
            "total_violations": self.summary.total_violations(),
            "violations": self.violations,
        })
    }
}

/// Merge config and flags, then check every matching file.
///
/// `extensions` replaces the config's list; `fail_on_violation` is OR-ed
/// with the config value.
fn run_check(
    paths: &[PathBuf],
    config_path: Option<&Path>,
    extensions: Option<Vec<String>>,
    fail_on_violation: bool,
    quiet: bool,
) -> Result<CheckReport> {
    let mut config = match config_path {
        Some(path) => CheckConfig::load(path)?,
        None => CheckConfig::default(),
    };
    if let Some(extensions) = extensions {
        config.file_extensions = extensions;
    }
    config.fail_on_violation |= fail_on_violation;

    let check = UniquePropertiesCheck::new(config.to_settings()?);
    let files = collect_files(paths, check.settings())?;

    info!("Starting duplicate key check");
    info!("  Paths: {:?}", paths);
    info!("  Extensions: {:?}", check.settings().file_extensions);
    info!("  Files: {}", files.len());

    let progress = ProgressReporter::new(files.len() as u64, quiet);
    let running = AtomicUsize::new(0);

    // Collected in input order regardless of which worker finishes first
    let per_file: Vec<Vec<Violation>> = files
        .par_iter()
        .map(|path| {
            let violations = check_file(&check, path);
            let total = running.fetch_add(violations.len(), Ordering::Relaxed) + violations.len();
            progress.file_done(total);
            violations
        })
        .collect();

    let mut summary = CheckSummary {
        files_checked: files.len(),
        elapsed: progress.finish(),
        ..Default::default()
    };
    for violations in &per_file {
        if !violations.is_empty() {
            summary.files_with_violations += 1;
        }
        for violation in violations {
            match violation.kind {
                ViolationKind::DuplicateProperty { .. } => summary.duplicated_keys += 1,
                ViolationKind::UnableToOpen { .. } => summary.unreadable_files += 1,
            }
        }
    }

    Ok(CheckReport {
        summary,
        violations: per_file.into_iter().flatten().collect(),
        fail_on_violation: config.fail_on_violation,
    })
}

/// Run the check on one file, turning load failures into violations
fn check_file(check: &UniquePropertiesCheck, path: &Path) -> Vec<Violation> {
    debug!("Checking {:?}", path);

    let text = match read_text(path) {
        Ok(text) => text,
        Err(e) => {
            warn!("Failed to read {:?}: {}", path, e);
            return vec![check.unable_to_open(path, e)];
        }
    };
    let entries = match parse_str(&text) {
        Ok(entries) => entries,
        Err(e) => {
            warn!("Failed to parse {:?}: {}", path, e);
            return vec![check.unable_to_open(path, e)];
        }
    };

    match check.process(path, entries.into_iter().map(PropertyEntry::into_located)) {
        Ok(violations) => violations,
        Err(e) => vec![check.unable_to_open(path, e)],
    }
}

/// Expand directories recursively and keep files the check accepts.
///
/// Directory contents are visited in sorted order so output is stable.
fn collect_files(paths: &[PathBuf], settings: &CheckSettings) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            walk_dir(path, settings, &mut files)?;
        } else if settings.accepts(path) {
            files.push(path.clone());
        } else {
            debug!("Skipping {:?}: extension not checked", path);
        }
    }
    Ok(files)
}

fn walk_dir(dir: &Path, settings: &CheckSettings, files: &mut Vec<PathBuf>) -> Result<()> {
    let mut children = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read directory: {}", dir.display()))?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<std::io::Result<Vec<_>>>()
        .with_context(|| format!("Failed to list directory: {}", dir.display()))?;
    children.sort();

    for child in children {
        if child.is_dir() {
            walk_dir(&child, settings, files)?;
        } else if settings.accepts(&child) {
            files.push(child);
        }
    }
    Ok(())
}

/// One duplicated key with its final value
struct DuplicateLine {
    key: String,
    count: usize,
    occurrences: usize,
    value: Option<String>,
}

/// Duplicated keys of one file, in duplication order
struct DuplicatesReport {
    input: PathBuf,
    duplicates: Vec<DuplicateLine>,
    stats: TrackerStats,
}

impl DuplicatesReport {
    fn to_json(&self) -> serde_json::Value {
        let duplicates: Vec<_> = self
            .duplicates
            .iter()
            .map(|d| {
                serde_json::json!({
                    "key": d.key,
                    "count": d.count,
                    "occurrences": d.occurrences,
                    "value": d.value,
                })
            })
            .collect();
        serde_json::json!({
            "input": self.input.to_string_lossy().to_string(),
            "assignments": self.stats.assignments,
            "distinct_keys": self.stats.distinct_keys,
            "duplication_rate": self.stats.duplication_rate(),
            "duplicates": duplicates,
        })
    }

    fn text_lines(&self) -> Vec<String> {
        if self.duplicates.is_empty() {
            return vec![format!("No duplicated keys in {}", self.input.display())];
        }

        let mut lines: Vec<String> = self
            .duplicates
            .iter()
            .map(|d| {
                format!(
                    "{} ({} occurrences) = {}",
                    d.key,
                    d.occurrences,
                    d.value.as_deref().unwrap_or_default()
                )
            })
            .collect();
        lines.push(format!(
            "\n{} duplicated of {} distinct keys ({:.1}% of assignments were duplicates)",
            self.stats.duplicated_keys,
            self.stats.distinct_keys,
            self.stats.duplication_rate()
        ));
        lines
    }
}

fn collect_duplicates(input: &Path) -> Result<DuplicatesReport> {
    info!("Collecting duplicated keys in: {:?}", input);

    let reader = PropertiesReader::open(input)
        .with_context(|| format!("Failed to open {}", input.display()))?;
    let tracker = DuplicateKeyTracker::new();
    for entry in reader {
        let entry = entry.with_context(|| format!("Failed to parse {}", input.display()))?;
        tracker.assign(entry.key, entry.value);
    }

    let duplicates = tracker
        .duplicates()
        .into_iter()
        .map(|entry| DuplicateLine {
            value: tracker.get(&entry.key),
            occurrences: entry.occurrences(),
            count: entry.count,
            key: entry.key,
        })
        .collect();

    Ok(DuplicatesReport {
        input: input.to_path_buf(),
        duplicates,
        stats: tracker.stats(),
    })
}

fn inspect_file(input: &Path, limit: usize) -> Result<()> {
    info!("Inspecting properties file: {:?}", input);

    let mut reader = PropertiesReader::open(input)
        .with_context(|| format!("Failed to open {}", input.display()))?;
    let mut count = 0;

    while count < limit {
        let entry = match reader.next() {
            Some(entry) => entry?,
            None => break,
        };
        println!("Line {}: {} = {:?}", entry.line, entry.key, entry.value);
        count += 1;
    }

    info!(
        "Read {} lines ({} bytes)",
        reader.lines_processed(),
        reader.bytes_processed()
    );

    Ok(())
}

/// Write the default config to `output`, refusing to clobber unless `force`
fn init_config(output: &Path, force: bool) -> Result<()> {
    if output.exists() && !force {
        anyhow::bail!(
            "{} already exists, use --force to overwrite",
            output.display()
        );
    }
    CheckConfig::default().save(output)
}

fn generate_completions(shell: Shell) {
    let mut cmd = Cli::command();
    let bin_name = cmd.get_name().to_string();
    generate(shell, &mut cmd, bin_name, &mut std::io::stdout());
}
