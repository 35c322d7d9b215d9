//! Command-line interface module for sortdir.
//!
//! This module handles all CLI-related functionality including:
//! - Argument parsing
//! - Loading configuration into an extension table and filters
//! - Running the organizer and printing its records
//! - Writing the report and the undo history
//! - Undo operation handling

use crate::config::Config;
use crate::file_organizer::{
    Action, AuditRecord, DirectoryPolicy, FailurePolicy, FileOrganizer, Mode, Run,
};
use crate::output::OutputFormatter;
use crate::report::{ReportFormat, ReportWriter};
use crate::summary::{Summary, summarize};
use crate::undo::{OperationLog, UndoManager};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};

/// Destination used when none is given: a folder inside the source.
pub const DEFAULT_DEST_DIR_NAME: &str = "Organized Files";

#[derive(Parser, Debug)]
#[command(name = "sortdir")]
#[command(version)]
#[command(about = "Sort files into category folders by extension")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Move the files of a directory into category folders
    Organize(OrganizeArgs),
    /// Print the category of each file name
    Classify {
        #[arg(required = true, help = "File names to classify")]
        names: Vec<String>,
        #[arg(short, long, help = "Configuration file")]
        config: Option<PathBuf>,
    },
    /// Move the files of the last organize run back to where they came from
    Undo {
        #[arg(help = "Destination directory of the run to revert")]
        destination: PathBuf,
    },
}

#[derive(Args, Debug, Clone)]
pub struct OrganizeArgs {
    #[arg(help = "Directory whose files are organized")]
    pub source: PathBuf,

    #[arg(short, long, help = "Destination directory [default: <SOURCE>/Organized Files]")]
    pub dest: Option<PathBuf>,

    #[arg(short = 'n', long, help = "Preview the moves without touching any file")]
    pub dry_run: bool,

    #[arg(long, help = "Create every category folder up front")]
    pub eager_dirs: bool,

    #[arg(long, help = "Stop at the first file that cannot be moved")]
    pub abort_on_error: bool,

    #[arg(short, long, value_enum, default_value_t = ReportFormat::Csv, help = "Report format")]
    pub format: ReportFormat,

    #[arg(long, help = "Do not write a report file")]
    pub no_report: bool,

    #[arg(short, long, help = "Configuration file")]
    pub config: Option<PathBuf>,
}

impl OrganizeArgs {
    /// Arguments for a plain run with every option at its default.
    pub fn new(source: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            dest: None,
            dry_run: false,
            eager_dirs: false,
            abort_on_error: false,
            format: ReportFormat::Csv,
            no_report: false,
            config: None,
        }
    }

    /// The destination, defaulting to `<source>/Organized Files`.
    pub fn destination(&self) -> PathBuf {
        self.dest
            .clone()
            .unwrap_or_else(|| self.source.join(DEFAULT_DEST_DIR_NAME))
    }

    fn to_run(&self) -> Run {
        Run::new(
            &self.source,
            self.destination(),
            Mode::from_dry_run(self.dry_run),
        )
        .with_directory_policy(if self.eager_dirs {
            DirectoryPolicy::Eager
        } else {
            DirectoryPolicy::Lazy
        })
        .with_failure_policy(if self.abort_on_error {
            FailurePolicy::Abort
        } else {
            FailurePolicy::Isolate
        })
    }
}

/// What an organize command produced.
#[derive(Debug)]
pub struct OrganizeOutcome {
    pub destination: PathBuf,
    pub records: Vec<AuditRecord>,
    pub summary: Summary,
    pub report_path: Option<PathBuf>,
}

impl OrganizeOutcome {
    pub fn failed(&self) -> usize {
        self.records
            .iter()
            .filter(|r| r.action == Action::Failed)
            .count()
    }
}

/// Runs the parsed command line.
///
/// # Examples
///
/// ```no_run
/// use clap::Parser;
/// use sortdir::cli::{Cli, run_cli};
///
/// let cli = Cli::parse_from(["sortdir", "organize", "/path/to/Downloads", "--dry-run"]);
/// if let Err(e) = run_cli(cli) {
///     eprintln!("Error: {}", e);
/// }
/// ```
pub fn run_cli(cli: Cli) -> Result<(), String> {
    match cli.command {
        Command::Organize(args) => {
            let outcome = organize_directory(&args)?;
            match outcome.failed() {
                0 => Ok(()),
                failed => Err(format!("{} file(s) could not be organized", failed)),
            }
        }
        Command::Classify { names, config } => classify_names(&names, config.as_deref()),
        Command::Undo { destination } => undo_organization(&destination),
    }
}

/// Organizes (or previews) a directory and reports the result.
///
/// This function:
/// 1. Loads the configuration and builds the extension table and filters
/// 2. Runs the organizer, printing one line per file
/// 3. Saves the undo history when files were moved, even if the run then fails
/// 4. Writes the report into the destination
/// 5. Prints the per-category summary
pub fn organize_directory(args: &OrganizeArgs) -> Result<OrganizeOutcome, String> {
    let config = Config::load(args.config.as_deref())
        .map_err(|e| format!("Error loading configuration: {}", e))?;
    let table = config
        .extension_table()
        .map_err(|e| format!("Error in category table: {}", e))?;
    let filters = config
        .compile_filters()
        .map_err(|e| format!("Error compiling filters: {}", e))?;

    let run = args.to_run();
    if run.mode.is_dry_run() {
        OutputFormatter::dry_run_notice(&format!(
            "Previewing {} -> {}",
            run.source.display(),
            run.destination.display()
        ));
    } else {
        OutputFormatter::info(&format!(
            "Organizing {} -> {}",
            run.source.display(),
            run.destination.display()
        ));
    }

    let progress = OutputFormatter::create_progress_bar(0);
    let mut records = Vec::new();
    let result = FileOrganizer::new(&table).with_filters(filters).run_into(
        &run,
        &mut records,
        |record, total| {
            progress.set_length(total as u64);
            progress.set_message(record.file_name.clone());
            progress.inc(1);
        },
    );
    progress.finish_and_clear();

    if records.is_empty() && result.is_ok() {
        OutputFormatter::plain("No files found to organize.");
    }
    for record in &records {
        OutputFormatter::plain(&OutputFormatter::record_line(record));
    }

    // files moved before an abort or a report failure must stay undoable
    if !run.mode.is_dry_run() {
        save_history(&run, &records);
    }
    result.map_err(|e| format!("Error: {}", e))?;

    let report_path = if args.no_report {
        None
    } else {
        ReportWriter::new(args.format)
            .write(&records, &run.destination)
            .map_err(|e| format!("Error: {}", e))?
    };

    let summary = summarize(&records);
    OutputFormatter::summary_table(&summary);

    if let Some(path) = &report_path {
        OutputFormatter::success(&format!("Report saved at: {}", path.display()));
    }

    let outcome = OrganizeOutcome {
        destination: run.destination,
        records,
        summary,
        report_path,
    };

    let failed = outcome.failed();
    if failed > 0 {
        OutputFormatter::warning(&format!(
            "{} file(s) could not be organized. See the lines marked Failed above.",
            failed
        ));
    } else if run.mode.is_dry_run() {
        OutputFormatter::dry_run_notice("No files were modified. Run without --dry-run to apply.");
    }

    Ok(outcome)
}

fn save_history(run: &Run, records: &[AuditRecord]) {
    let log = OperationLog::from_records(&run.source, &run.destination, records);
    if log.is_empty() {
        return;
    }
    match log.save(&run.destination) {
        Ok(()) => OutputFormatter::plain(&format!(
            "History saved. Use 'sortdir undo {}' to revert changes.",
            run.destination.display()
        )),
        Err(e) => OutputFormatter::warning(&format!("Could not save history: {}", e)),
    }
}

/// Prints the category of each name.
fn classify_names(names: &[String], config_path: Option<&Path>) -> Result<(), String> {
    let table = Config::load(config_path)
        .and_then(|config| config.extension_table())
        .map_err(|e| format!("Error loading configuration: {}", e))?;

    for name in names {
        OutputFormatter::plain(&format!("{}: {}", name, table.classify(name)));
    }
    Ok(())
}

/// Undoes the previous organization into `destination`.
///
/// Reports skipped and failed restorations; the history file is kept when
/// anything could not be restored.
pub fn undo_organization(destination: &Path) -> Result<(), String> {
    OutputFormatter::info("Undoing previous organization...");

    let report = UndoManager::undo(destination).map_err(|e| format!("Error: {}", e))?;

    OutputFormatter::success(&format!("Restored: {}", report.restored_files));

    if !report.skipped_files.is_empty() {
        OutputFormatter::warning(&format!("Skipped: {}", report.skipped_files.len()));
        for (path, reason) in &report.skipped_files {
            OutputFormatter::plain(&format!("    - {}: {}", path.display(), reason));
        }
    }

    if !report.failed_restores.is_empty() {
        OutputFormatter::error(&format!("Failed: {}", report.failed_restores.len()));
        for (path, reason) in &report.failed_restores {
            OutputFormatter::error(&format!("    - {}: {}", path.display(), reason));
        }
        OutputFormatter::warning("History file was NOT deleted due to failures.");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_organize_flags() {
        let cli = Cli::parse_from([
            "sortdir",
            "organize",
            "/tmp/src",
            "--dest",
            "/tmp/out",
            "--dry-run",
            "--eager-dirs",
            "--format",
            "json",
        ]);
        match cli.command {
            Command::Organize(args) => {
                assert!(args.dry_run);
                assert!(args.eager_dirs);
                assert!(!args.abort_on_error);
                assert_eq!(args.format, ReportFormat::Json);
                assert_eq!(args.destination(), PathBuf::from("/tmp/out"));
                let run = args.to_run();
                assert_eq!(run.mode, Mode::DryRun);
                assert_eq!(run.directories, DirectoryPolicy::Eager);
                assert_eq!(run.failures, FailurePolicy::Isolate);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_default_destination_inside_source() {
        let args = OrganizeArgs::new("/data/inbox");
        assert_eq!(
            args.destination(),
            PathBuf::from("/data/inbox").join("Organized Files")
        );
        assert_eq!(args.to_run().mode, Mode::Apply);
    }

    #[test]
    fn test_parse_undo_and_classify() {
        let cli = Cli::parse_from(["sortdir", "-v", "undo", "/tmp/out"]);
        assert_eq!(cli.verbose, 1);
        assert!(matches!(cli.command, Command::Undo { .. }));

        let cli = Cli::parse_from(["sortdir", "classify", "a.pdf", "b"]);
        match cli.command {
            Command::Classify { names, config } => {
                assert_eq!(names, vec!["a.pdf", "b"]);
                assert!(config.is_none());
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_failed_files_give_an_error_exit() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let src = temp_dir.path().join("src");
        let dest = temp_dir.path().join("dest");
        let config = temp_dir.path().join("empty.toml");
        std::fs::create_dir_all(&src).unwrap();
        std::fs::create_dir_all(&dest).unwrap();
        std::fs::write(&config, "").unwrap();
        std::fs::write(src.join("a.pdf"), "pdf").unwrap();
        std::fs::write(src.join("b.png"), "png").unwrap();
        std::fs::write(dest.join("Documents"), "not a directory").unwrap();

        let cli = Cli::parse_from([
            "sortdir",
            "organize",
            src.to_str().unwrap(),
            "--dest",
            dest.to_str().unwrap(),
            "--config",
            config.to_str().unwrap(),
            "--no-report",
        ]);
        let result = run_cli(cli);

        assert_eq!(result, Err("1 file(s) could not be organized".to_string()));
        assert!(dest.join("Images").join("b.png").exists());
        assert!(src.join("a.pdf").exists());
    }
}
