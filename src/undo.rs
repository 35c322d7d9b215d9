/// Undo support for reverting an apply run.
///
/// After files are moved, the `Moved` records of the run are saved as an
/// operation log inside the destination directory. Undoing replays that log in
/// reverse, moving every file back to where it came from.
use crate::file_organizer::{Action, AuditRecord, OrganizeError, OrganizeResult, move_file};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the history file kept in the destination directory.
pub const HISTORY_FILE_NAME: &str = ".sortdir_history.json";

/// The moves performed by one apply run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationLog {
    pub timestamp: DateTime<Utc>,
    pub source: PathBuf,
    pub destination: PathBuf,
    pub operations: Vec<AuditRecord>,
}

impl OperationLog {
    /// Builds a log from a run's records, keeping only files that were actually moved.
    pub fn from_records(source: &Path, destination: &Path, records: &[AuditRecord]) -> Self {
        Self {
            timestamp: Utc::now(),
            source: source.to_path_buf(),
            destination: destination.to_path_buf(),
            operations: records
                .iter()
                .filter(|r| r.action == Action::Moved)
                .cloned()
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Returns the path to the history file for a destination directory.
    pub fn history_file_path(destination: &Path) -> PathBuf {
        destination.join(HISTORY_FILE_NAME)
    }

    /// Saves this log as pretty-printed JSON, replacing any previous one.
    pub fn save(&self, destination: &Path) -> OrganizeResult<()> {
        let json = serde_json::to_string_pretty(self).map_err(|e| {
            OrganizeError::HistoryWriteFailed {
                source: std::io::Error::new(std::io::ErrorKind::InvalidData, e),
            }
        })?;

        fs::write(Self::history_file_path(destination), json)
            .map_err(|e| OrganizeError::HistoryWriteFailed { source: e })
    }

    /// Loads the log for a destination directory, if there is one.
    pub fn load(destination: &Path) -> OrganizeResult<Option<Self>> {
        let history_path = Self::history_file_path(destination);
        if !history_path.exists() {
            return Ok(None);
        }

        let json = fs::read_to_string(&history_path)
            .map_err(|e| OrganizeError::HistoryReadFailed { source: e })?;

        serde_json::from_str(&json)
            .map(Some)
            .map_err(|e| OrganizeError::InvalidHistoryFormat {
                reason: e.to_string(),
            })
    }

    /// Deletes the history file for a destination directory.
    pub fn delete(destination: &Path) -> OrganizeResult<()> {
        let history_path = Self::history_file_path(destination);
        if history_path.exists() {
            fs::remove_file(&history_path)
                .map_err(|e| OrganizeError::HistoryWriteFailed { source: e })?;
        }
        Ok(())
    }
}

/// Outcome of an undo.
#[derive(Debug, Default)]
pub struct UndoReport {
    pub restored_files: usize,
    pub failed_restores: Vec<(PathBuf, String)>,
    /// Files no longer at their organized location.
    pub skipped_files: Vec<(PathBuf, String)>,
}

impl UndoReport {
    pub fn total_processed(&self) -> usize {
        self.restored_files + self.failed_restores.len() + self.skipped_files.len()
    }

    pub fn is_complete_success(&self) -> bool {
        self.failed_restores.is_empty() && self.skipped_files.is_empty()
    }
}

enum RestoreFailure {
    Missing(PathBuf, String),
    Failed(PathBuf, String),
}

/// Manages undo operations for file organization.
pub struct UndoManager;

impl UndoManager {
    /// Undoes the most recent apply run into `destination`.
    ///
    /// Operations are reversed last-first. A file that is gone from its
    /// organized location is skipped; a file already occupying the original
    /// location is renamed aside with a timestamp suffix. The history file is
    /// removed only when every file was restored.
    ///
    /// # Errors
    ///
    /// Returns an error if `destination` does not exist or there is no usable history.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use sortdir::undo::UndoManager;
    /// use std::path::Path;
    ///
    /// match UndoManager::undo(Path::new("/path/to/sorted")) {
    ///     Ok(report) => println!("Restored {} files", report.restored_files),
    ///     Err(e) => eprintln!("Undo failed: {}", e),
    /// }
    /// ```
    pub fn undo(destination: &Path) -> OrganizeResult<UndoReport> {
        if !destination.is_dir() {
            return Err(OrganizeError::InvalidSource {
                path: destination.to_path_buf(),
                source: std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "destination directory does not exist",
                ),
            });
        }

        let log = OperationLog::load(destination)?.ok_or_else(|| {
            OrganizeError::InvalidHistoryFormat {
                reason: "No previous organization found to undo".to_string(),
            }
        })?;

        let mut report = UndoReport::default();
        for operation in log.operations.iter().rev() {
            match Self::restore_file(operation) {
                Ok(()) => report.restored_files += 1,
                Err(RestoreFailure::Missing(path, reason)) => {
                    report.skipped_files.push((path, reason))
                }
                Err(RestoreFailure::Failed(path, reason)) => {
                    report.failed_restores.push((path, reason))
                }
            }
        }

        if report.is_complete_success()
            && let Err(e) = OperationLog::delete(destination)
        {
            tracing::warn!(error = %e, "could not delete history file");
        }

        Ok(report)
    }

    fn restore_file(operation: &AuditRecord) -> Result<(), RestoreFailure> {
        if fs::symlink_metadata(&operation.new_path).is_err() {
            return Err(RestoreFailure::Missing(
                operation.new_path.clone(),
                "File not found at organized location".to_string(),
            ));
        }

        if fs::symlink_metadata(&operation.old_path).is_ok() {
            let backup_path = Self::generate_backup_path(&operation.old_path);
            fs::rename(&operation.old_path, &backup_path).map_err(|e| {
                RestoreFailure::Failed(
                    operation.old_path.clone(),
                    format!("Could not back up conflicting file: {}", e),
                )
            })?;
            tracing::info!(backup = %backup_path.display(), "backed up conflicting file");
        }

        move_file(&operation.new_path, &operation.old_path).map_err(|e| {
            RestoreFailure::Failed(
                operation.new_path.clone(),
                format!("Failed to restore file: {}", e),
            )
        })?;

        tracing::info!(
            from = %operation.new_path.display(),
            to = %operation.old_path.display(),
            "restored file"
        );
        Ok(())
    }

    /// `file.txt` becomes `file.txt.bak.20251109-143052`.
    fn generate_backup_path(original_path: &Path) -> PathBuf {
        let timestamp = chrono::Local::now().format("%Y%m%d-%H%M%S");
        let filename = original_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "file".to_string());

        original_path.with_file_name(format!("{}.bak.{}", filename, timestamp))
    }
}
