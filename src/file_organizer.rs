/// Moves files from a source directory into category subdirectories of a destination.
///
/// A run enumerates the regular files directly inside the source directory,
/// classifies each one, picks a collision-free destination path and either moves
/// the file there or only previews the move. Every considered file yields one
/// [`AuditRecord`], in enumeration order.
use crate::config::CompiledFilters;
use crate::file_category::{Category, ExtensionTable};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::ffi::{OsStr, OsString};
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Upper bound on `name(N).ext` candidates tried for one file.
pub const MAX_COLLISION_ATTEMPTS: u32 = 10_000;

/// Errors that can occur during file organization operations.
#[derive(Debug, Error)]
pub enum OrganizeError {
    /// The source directory is missing, unreadable or not a directory.
    #[error("Cannot read directory {}: {source}", path.display())]
    InvalidSource { path: PathBuf, source: io::Error },

    #[error("Failed to create directory {}: {source}", path.display())]
    DirectoryCreationFailed { path: PathBuf, source: io::Error },

    #[error("Failed to move {} to {}: {source}", from.display(), to.display())]
    FileMoveFailure {
        from: PathBuf,
        to: PathBuf,
        source: io::Error,
    },

    #[error("No free name for {} after {attempts} attempts", path.display())]
    CollisionResolutionExhausted { path: PathBuf, attempts: u32 },

    /// The file was listed but is gone by the time it is processed.
    #[error("File disappeared before it could be processed: {}", path.display())]
    FileVanished { path: PathBuf },

    #[error("Failed to read metadata of {}: {source}", path.display())]
    Metadata { path: PathBuf, source: io::Error },

    #[error("Failed to write history file: {source}")]
    HistoryWriteFailed { source: io::Error },

    #[error("Failed to read history file: {source}")]
    HistoryReadFailed { source: io::Error },

    #[error("Invalid history file format: {reason}")]
    InvalidHistoryFormat { reason: String },

    #[error("Failed to write report {}: {source}", path.display())]
    ReportWriteFailed { path: PathBuf, source: io::Error },
}

/// Result type for file organization operations.
pub type OrganizeResult<T> = Result<T, OrganizeError>;

/// Whether a run touches the file system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Compute and report destinations only.
    #[default]
    DryRun,
    /// Create directories and move files.
    Apply,
}

impl Mode {
    pub fn from_dry_run(dry_run: bool) -> Self {
        if dry_run { Mode::DryRun } else { Mode::Apply }
    }

    pub fn is_dry_run(self) -> bool {
        self == Mode::DryRun
    }
}

/// When category directories are created. Neither policy creates anything in dry-run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DirectoryPolicy {
    /// Create a category directory right before the first file is moved into it.
    #[default]
    Lazy,
    /// Create the destination and every table category (plus `Others`) up front.
    Eager,
}

/// What a per-file failure does to the rest of the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Record the failure on the file's record and keep going.
    #[default]
    Isolate,
    /// Stop the run and return the first error.
    Abort,
}

/// One organize invocation.
#[derive(Debug, Clone)]
pub struct Run {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub mode: Mode,
    pub directories: DirectoryPolicy,
    pub failures: FailurePolicy,
}

impl Run {
    pub fn new(source: impl Into<PathBuf>, destination: impl Into<PathBuf>, mode: Mode) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
            mode,
            directories: DirectoryPolicy::default(),
            failures: FailurePolicy::default(),
        }
    }

    pub fn with_directory_policy(mut self, policy: DirectoryPolicy) -> Self {
        self.directories = policy;
        self
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failures = policy;
        self
    }
}

/// Outcome recorded for one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    Preview,
    Moved,
    Failed,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Action::Preview => "Preview",
            Action::Moved => "Moved",
            Action::Failed => "Failed",
        })
    }
}

/// One row of the audit trail: what happened (or would happen) to a single file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub file_name: String,
    pub old_path: PathBuf,
    pub new_path: PathBuf,
    pub category: Category,
    /// Size in kilobytes, rounded to two decimals.
    pub size_kb: f64,
    pub timestamp: DateTime<Local>,
    pub action: Action,
    /// Error text, only for `Failed` records.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// A regular file found in the source directory.
#[derive(Debug, Clone)]
struct SourceFile {
    name: OsString,
    path: PathBuf,
}

/// Organizes files by moving them into category subdirectories.
pub struct FileOrganizer<'a> {
    table: &'a ExtensionTable,
    filters: CompiledFilters,
}

impl<'a> FileOrganizer<'a> {
    /// Creates an organizer that considers every regular file.
    pub fn new(table: &'a ExtensionTable) -> Self {
        Self {
            table,
            filters: CompiledFilters::allow_all(),
        }
    }

    /// Restricts the run to files accepted by `filters`.
    pub fn with_filters(mut self, filters: CompiledFilters) -> Self {
        self.filters = filters;
        self
    }

    /// Executes a run and returns its records in enumeration order.
    ///
    /// # Errors
    ///
    /// `InvalidSource` if the source cannot be listed, `DirectoryCreationFailed`
    /// if eager directory creation fails, and under [`FailurePolicy::Abort`] the
    /// first per-file error.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use sortdir::file_category::ExtensionTable;
    /// use sortdir::file_organizer::{FileOrganizer, Mode, Run};
    ///
    /// let table = ExtensionTable::default();
    /// let run = Run::new("/home/me/Downloads", "/home/me/Sorted", Mode::DryRun);
    /// let records = FileOrganizer::new(&table).run(&run).unwrap();
    /// for record in &records {
    ///     println!("{} -> {}", record.file_name, record.new_path.display());
    /// }
    /// ```
    pub fn run(&self, run: &Run) -> OrganizeResult<Vec<AuditRecord>> {
        self.run_with(run, |_, _| {})
    }

    /// Like [`run`](Self::run), calling `on_record(record, total)` after each file.
    pub fn run_with<F>(&self, run: &Run, on_record: F) -> OrganizeResult<Vec<AuditRecord>>
    where
        F: FnMut(&AuditRecord, usize),
    {
        let mut records = Vec::new();
        self.run_into(run, &mut records, on_record)?;
        Ok(records)
    }

    /// Executes a run, appending each record to `records` as soon as the file
    /// is done.
    ///
    /// When the run stops early under [`FailurePolicy::Abort`], `records` still
    /// holds every file handled before the failure, including the ones already
    /// moved.
    pub fn run_into<F>(
        &self,
        run: &Run,
        records: &mut Vec<AuditRecord>,
        mut on_record: F,
    ) -> OrganizeResult<()>
    where
        F: FnMut(&AuditRecord, usize),
    {
        let files = self.collect_files(&run.source)?;
        tracing::debug!(
            source = %run.source.display(),
            destination = %run.destination.display(),
            files = files.len(),
            mode = ?run.mode,
            "starting run"
        );

        if run.mode == Mode::Apply && run.directories == DirectoryPolicy::Eager {
            self.create_all_category_dirs(&run.destination)?;
        }

        let total = files.len();
        let mut reserved = HashSet::new();
        records.reserve(total);
        for file in &files {
            let record = self.process_file(run, file, &mut reserved)?;
            on_record(&record, total);
            records.push(record);
        }

        Ok(())
    }

    /// Lists the regular files directly inside `source` that pass the filters.
    fn collect_files(&self, source: &Path) -> OrganizeResult<Vec<SourceFile>> {
        let invalid = |e: io::Error| OrganizeError::InvalidSource {
            path: source.to_path_buf(),
            source: e,
        };

        let metadata = fs::metadata(source).map_err(invalid)?;
        if !metadata.is_dir() {
            return Err(invalid(io::Error::new(
                io::ErrorKind::NotADirectory,
                "not a directory",
            )));
        }

        let mut files = Vec::new();
        for entry in fs::read_dir(source).map_err(invalid)? {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!(error = %e, "skipping unreadable directory entry");
                    continue;
                }
            };

            // file_type() does not follow symlinks
            let is_file = entry.file_type().map(|t| t.is_file()).unwrap_or(false);
            if !is_file {
                continue;
            }

            let path = entry.path();
            if !self.filters.should_include(Path::new(&entry.file_name())) {
                tracing::debug!(path = %path.display(), "excluded by filters");
                continue;
            }

            files.push(SourceFile {
                name: entry.file_name(),
                path,
            });
        }

        Ok(files)
    }

    fn create_all_category_dirs(&self, destination: &Path) -> OrganizeResult<()> {
        for category in self.table.categories() {
            ensure_dir(&destination.join(category.dir_name()))?;
        }
        Ok(())
    }

    fn process_file(
        &self,
        run: &Run,
        file: &SourceFile,
        reserved: &mut HashSet<PathBuf>,
    ) -> OrganizeResult<AuditRecord> {
        let file_name = file.name.to_string_lossy().into_owned();
        let category = self.table.classify(&file_name);
        let category_dir = run.destination.join(category.dir_name());
        tracing::debug!(file = %file_name, category = %category, "classified");

        let mut record = AuditRecord {
            file_name,
            old_path: file.path.clone(),
            new_path: category_dir.join(&file.name),
            category,
            size_kb: 0.0,
            timestamp: Local::now(),
            action: Action::Preview,
            error: None,
        };

        record.size_kb = match file_size_kb(&file.path) {
            Ok(size) => size,
            Err(e) => return apply_failure_policy(run, record, e),
        };

        record.new_path = match resolve_destination(&category_dir, &file.name, |candidate| {
            path_is_taken(candidate) || reserved.contains(candidate)
        }) {
            Ok(path) => path,
            Err(e) => return apply_failure_policy(run, record, e),
        };

        match run.mode {
            Mode::DryRun => {
                reserved.insert(record.new_path.clone());
                record.action = Action::Preview;
            }
            Mode::Apply => {
                let moved = ensure_dir(&category_dir)
                    .and_then(|()| move_file(&file.path, &record.new_path));
                if let Err(e) = moved {
                    return apply_failure_policy(run, record, e);
                }
                tracing::info!(
                    from = %record.old_path.display(),
                    to = %record.new_path.display(),
                    "moved file"
                );
                record.action = Action::Moved;
            }
        }

        Ok(record)
    }
}

/// Applies the run's failure policy to a per-file error.
fn apply_failure_policy(
    run: &Run,
    mut record: AuditRecord,
    error: OrganizeError,
) -> OrganizeResult<AuditRecord> {
    match run.failures {
        FailurePolicy::Abort => Err(error),
        FailurePolicy::Isolate => {
            tracing::warn!(file = %record.file_name, error = %error, "file not organized");
            record.action = Action::Failed;
            record.error = Some(error.to_string());
            Ok(record)
        }
    }
}

/// Organizes `source` into category folders under `destination`.
///
/// Shorthand for a [`FileOrganizer`] run with default policies (lazy directory
/// creation, per-file failure isolation) and no filters.
pub fn organize(
    source: &Path,
    destination: &Path,
    dry_run: bool,
    table: &ExtensionTable,
) -> OrganizeResult<Vec<AuditRecord>> {
    let run = Run::new(source, destination, Mode::from_dry_run(dry_run));
    FileOrganizer::new(table).run(&run)
}

/// Finds a free path for `file_name` inside `dir`.
///
/// Tries `dir/file_name`, then `name(1).ext`, `name(2).ext`, ... calling
/// `is_taken` afresh for every candidate. Gives up after
/// [`MAX_COLLISION_ATTEMPTS`] numbered candidates.
///
/// ```
/// use sortdir::file_organizer::resolve_destination;
/// use std::ffi::OsStr;
/// use std::path::{Path, PathBuf};
///
/// let taken = [PathBuf::from("/d/a.txt"), PathBuf::from("/d/a(1).txt")];
/// let free = resolve_destination(Path::new("/d"), OsStr::new("a.txt"), |p| {
///     taken.iter().any(|t| t == p)
/// });
/// assert_eq!(free.unwrap(), PathBuf::from("/d/a(2).txt"));
/// ```
pub fn resolve_destination<F>(
    dir: &Path,
    file_name: &OsStr,
    mut is_taken: F,
) -> OrganizeResult<PathBuf>
where
    F: FnMut(&Path) -> bool,
{
    let candidate = dir.join(file_name);
    if !is_taken(&candidate) {
        return Ok(candidate);
    }

    let lossy = file_name.to_string_lossy();
    let (stem, ext) = split_file_name(&lossy);
    for counter in 1..=MAX_COLLISION_ATTEMPTS {
        let numbered = dir.join(format!("{stem}({counter}){ext}"));
        if !is_taken(&numbered) {
            return Ok(numbered);
        }
    }

    Err(OrganizeError::CollisionResolutionExhausted {
        path: candidate,
        attempts: MAX_COLLISION_ATTEMPTS,
    })
}

/// Splits a file name into stem and extension (with its dot).
///
/// Leading dots belong to the stem, so `.bashrc` has no extension here.
fn split_file_name(name: &str) -> (&str, &str) {
    let leading = name.len() - name.trim_start_matches('.').len();
    match name[leading..].rfind('.') {
        Some(idx) => name.split_at(leading + idx),
        None => (name, ""),
    }
}

/// Anything at the path counts as an occupant, including dangling symlinks.
fn path_is_taken(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}

fn file_size_kb(path: &Path) -> OrganizeResult<f64> {
    let metadata = fs::metadata(path).map_err(|e| {
        vanished_or(path, e, |path, source| OrganizeError::Metadata { path, source })
    })?;
    Ok(round_kb(metadata.len()))
}

/// Bytes to kilobytes, rounded to two decimals.
pub fn round_kb(bytes: u64) -> f64 {
    (bytes as f64 / 1024.0 * 100.0).round() / 100.0
}

fn vanished_or<F>(path: &Path, error: io::Error, other: F) -> OrganizeError
where
    F: FnOnce(PathBuf, io::Error) -> OrganizeError,
{
    if error.kind() == io::ErrorKind::NotFound {
        OrganizeError::FileVanished {
            path: path.to_path_buf(),
        }
    } else {
        other(path.to_path_buf(), error)
    }
}

/// Creates `path` and its parents; an existing directory is fine.
pub(crate) fn ensure_dir(path: &Path) -> OrganizeResult<()> {
    fs::create_dir_all(path).map_err(|e| OrganizeError::DirectoryCreationFailed {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Moves a file, falling back to copy + remove when a rename crosses volumes.
///
/// The source is only removed after the copy has been checked to have the
/// source's full length.
pub fn move_file(from: &Path, to: &Path) -> OrganizeResult<()> {
    let move_failure = |source: io::Error| OrganizeError::FileMoveFailure {
        from: from.to_path_buf(),
        to: to.to_path_buf(),
        source,
    };

    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
            tracing::warn!(
                from = %from.display(),
                to = %to.display(),
                "rename crosses volumes, falling back to copy"
            );
            copy_then_remove(from, to).map_err(move_failure)
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound && fs::symlink_metadata(from).is_err() => {
            Err(OrganizeError::FileVanished {
                path: from.to_path_buf(),
            })
        }
        Err(e) => Err(move_failure(e)),
    }
}

fn copy_then_remove(from: &Path, to: &Path) -> io::Result<()> {
    let expected = fs::metadata(from)?.len();
    let copied = fs::copy(from, to)?;
    let written = fs::metadata(to)?.len();
    if copied != expected || written != expected {
        let _ = fs::remove_file(to);
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("copied {written} of {expected} bytes"),
        ));
    }
    fs::remove_file(from)
}
