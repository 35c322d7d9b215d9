//! sortdir - sort a directory's files into category folders by extension
//!
//! The library classifies file names through an [`ExtensionTable`], moves (or
//! previews moving) the files of a source directory into per-category folders
//! of a destination with collision-safe names, and describes every file it
//! considered as an [`AuditRecord`]. Reports, undo history and TOML
//! configuration are layered on top for the command-line tool.
//!
//! ```no_run
//! use sortdir::{ExtensionTable, organize, summarize};
//! use std::path::Path;
//!
//! let table = ExtensionTable::default();
//! let records = organize(Path::new("/tmp/inbox"), Path::new("/tmp/sorted"), false, &table)?;
//! println!("{}", summarize(&records));
//! # Ok::<(), sortdir::OrganizeError>(())
//! ```

pub mod cli;
pub mod config;
pub mod file_category;
pub mod file_organizer;
pub mod output;
pub mod report;
pub mod summary;
pub mod undo;

pub use config::{CompiledFilters, Config, ConfigError};
pub use file_category::{Category, ExtensionTable, classify};
pub use file_organizer::{
    Action, AuditRecord, DirectoryPolicy, FailurePolicy, FileOrganizer, Mode, OrganizeError,
    OrganizeResult, Run, organize,
};
pub use report::{ReportFormat, ReportWriter};
pub use summary::{Summary, summarize};
pub use undo::{OperationLog, UndoManager, UndoReport};
