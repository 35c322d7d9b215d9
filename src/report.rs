//! Audit report files.
//!
//! The report is one row per [`AuditRecord`], written next to the organized
//! files as `organizer_report.csv` (or `.json`).

use crate::file_organizer::{AuditRecord, OrganizeError, OrganizeResult};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// File name of the report, without extension.
pub const REPORT_FILE_STEM: &str = "organizer_report";

/// Column headers, in row order.
pub const CSV_HEADERS: [&str; 7] = [
    "File Name",
    "Old Path",
    "New Path",
    "Category",
    "Size (KB)",
    "Date",
    "Action",
];

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ReportFormat {
    #[default]
    Csv,
    Json,
}

impl ReportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ReportFormat::Csv => "csv",
            ReportFormat::Json => "json",
        }
    }
}

/// Writes audit records to a report file in the destination directory.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReportWriter {
    format: ReportFormat,
}

impl ReportWriter {
    pub fn new(format: ReportFormat) -> Self {
        Self { format }
    }

    pub fn report_path(&self, destination: &Path) -> PathBuf {
        destination.join(format!("{}.{}", REPORT_FILE_STEM, self.format.extension()))
    }

    /// Writes the report and returns its path, or `None` when there are no records.
    ///
    /// The destination directory is created if needed; an existing report is replaced.
    pub fn write(
        &self,
        records: &[AuditRecord],
        destination: &Path,
    ) -> OrganizeResult<Option<PathBuf>> {
        if records.is_empty() {
            return Ok(None);
        }

        let path = self.report_path(destination);
        let write_failed = |source: io::Error| OrganizeError::ReportWriteFailed {
            path: path.clone(),
            source,
        };

        fs::create_dir_all(destination).map_err(write_failed)?;
        let mut file = io::BufWriter::new(fs::File::create(&path).map_err(write_failed)?);
        let written = match self.format {
            ReportFormat::Csv => write_csv(&mut file, records),
            ReportFormat::Json => {
                serde_json::to_writer_pretty(&mut file, records).map_err(io::Error::other)
            }
        };
        written.and_then(|()| file.flush()).map_err(write_failed)?;

        tracing::info!(path = %path.display(), rows = records.len(), "report written");
        Ok(Some(path))
    }
}

/// Writes records as CSV with a header row. Fields are quoted when needed.
pub fn write_csv<W: Write>(out: &mut W, records: &[AuditRecord]) -> io::Result<()> {
    writeln!(out, "{}", CSV_HEADERS.join(","))?;
    for record in records {
        let row = [
            escape_field(&record.file_name),
            escape_field(&record.old_path.to_string_lossy()),
            escape_field(&record.new_path.to_string_lossy()),
            escape_field(record.category.dir_name()),
            format!("{:.2}", record.size_kb),
            record.timestamp.format(DATE_FORMAT).to_string(),
            record.action.to_string(),
        ];
        writeln!(out, "{}", row.join(","))?;
    }
    Ok(())
}

fn escape_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file_category::Category;
    use crate::file_organizer::Action;
    use chrono::{Local, TimeZone};
    use tempfile::TempDir;

    fn record(name: &str) -> AuditRecord {
        AuditRecord {
            file_name: name.to_string(),
            old_path: PathBuf::from("/src").join(name),
            new_path: PathBuf::from("/dest/Documents").join(name),
            category: Category::named("Documents"),
            size_kb: 10.0,
            timestamp: Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap(),
            action: Action::Moved,
            error: None,
        }
    }

    #[test]
    fn test_escape_field() {
        assert_eq!(escape_field("plain.txt"), "plain.txt");
        assert_eq!(escape_field("a,b.txt"), "\"a,b.txt\"");
        assert_eq!(escape_field("say \"hi\".txt"), "\"say \"\"hi\"\".txt\"");
    }

    #[test]
    fn test_csv_rows() {
        let mut out = Vec::new();
        write_csv(&mut out, &[record("report.pdf"), record("a,b.txt")]).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<_> = text.lines().collect();

        assert_eq!(
            lines[0],
            "File Name,Old Path,New Path,Category,Size (KB),Date,Action"
        );
        assert_eq!(
            lines[1],
            "report.pdf,/src/report.pdf,/dest/Documents/report.pdf,Documents,10.00,2024-03-09 14:05:07,Moved"
        );
        assert!(lines[2].starts_with("\"a,b.txt\",\"/src/a,b.txt\","));
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn test_no_records_no_file() {
        let temp_dir = TempDir::new().unwrap();
        let writer = ReportWriter::default();
        assert_eq!(writer.write(&[], temp_dir.path()).unwrap(), None);
        assert!(!writer.report_path(temp_dir.path()).exists());
    }

    #[test]
    fn test_write_csv_report() {
        let temp_dir = TempDir::new().unwrap();
        let dest = temp_dir.path().join("dest");
        let path = ReportWriter::new(ReportFormat::Csv)
            .write(&[record("x.txt")], &dest)
            .unwrap()
            .expect("report written");

        assert_eq!(path, dest.join("organizer_report.csv"));
        assert_eq!(fs::read_to_string(&path).unwrap().lines().count(), 2);
    }

    #[test]
    fn test_write_json_report() {
        let temp_dir = TempDir::new().unwrap();
        let path = ReportWriter::new(ReportFormat::Json)
            .write(&[record("x.txt")], temp_dir.path())
            .unwrap()
            .expect("report written");

        assert_eq!(path.file_name().unwrap(), "organizer_report.json");
        let parsed: Vec<AuditRecord> =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(parsed, vec![record("x.txt")]);
    }
}
