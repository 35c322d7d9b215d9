//! Output formatting and styling module.
//!
//! All terminal output of the CLI goes through [`OutputFormatter`] so colors,
//! symbols and table layout stay consistent.

use crate::file_organizer::{Action, AuditRecord};
use crate::summary::Summary;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};

/// Manages all CLI output with consistent styling and formatting.
///
/// This struct provides methods for:
/// - Success messages (green with ✓)
/// - Error messages (red with ✗)
/// - Warning messages (yellow with ⚠)
/// - Info messages (cyan)
/// - Progress bars for runs
/// - Summary tables with per-category counts
pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints a success message in green with a checkmark.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use sortdir::output::OutputFormatter;
    /// OutputFormatter::success("Files organized successfully!");
    /// ```
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Prints an error message in red with an X mark, to stderr.
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Prints a warning message in yellow with a warning symbol.
    pub fn warning(message: &str) {
        println!("{} {}", "⚠".yellow(), message);
    }

    /// Prints an info message in cyan.
    pub fn info(message: &str) {
        println!("{}", message.cyan());
    }

    pub fn plain(message: &str) {
        println!("{}", message);
    }

    /// Prints a section header.
    pub fn header(header: &str) {
        println!("\n{}", header.bold());
    }

    /// Creates a progress bar for a run over `total` files.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use sortdir::output::OutputFormatter;
    /// let pb = OutputFormatter::create_progress_bar(100);
    /// pb.inc(1);
    /// pb.finish_and_clear();
    /// ```
    pub fn create_progress_bar(total: u64) -> ProgressBar {
        let pb = ProgressBar::new(total);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        {
            pb.set_style(style.progress_chars("█▓░"));
        }
        pb
    }

    /// Formats one record as `Action: name -> Category`.
    pub fn record_line(record: &AuditRecord) -> String {
        let action = match record.action {
            Action::Moved => record.action.to_string().green(),
            Action::Preview => record.action.to_string().yellow(),
            Action::Failed => record.action.to_string().red(),
        };
        let mut line = format!("{}: {} -> {}", action, record.file_name, record.category);
        if let Some(error) = &record.error {
            line.push_str(&format!(" ({})", error.red()));
        }
        line
    }

    /// Prints the per-category table of moved files, in first-seen order.
    ///
    /// An empty summary prints `No files moved.`.
    pub fn summary_table(summary: &Summary) {
        Self::header("SUMMARY");

        if summary.is_empty() {
            println!("No files moved.");
            return;
        }

        let max_category_len = summary
            .iter()
            .map(|(category, _)| category.dir_name().len())
            .max()
            .unwrap_or(0)
            .max(8); // "Category"

        println!(
            "{:<width$} | {}",
            "Category".bold(),
            "Files".bold(),
            width = max_category_len
        );
        println!("{}", "-".repeat(max_category_len + 10));

        for (category, count) in summary.iter() {
            println!(
                "{:<width$} | {} {}",
                category.dir_name(),
                count.to_string().green(),
                file_word(count),
                width = max_category_len
            );
        }

        let total = summary.total();
        println!("{}", "-".repeat(max_category_len + 10));
        println!(
            "{:<width$} | {} {}",
            "Total".bold(),
            total.to_string().green().bold(),
            file_word(total),
            width = max_category_len
        );
    }

    pub fn dry_run_notice(message: &str) {
        println!("{}", format!("[DRY RUN] {}", message).yellow());
    }
}

fn file_word(count: usize) -> &'static str {
    if count == 1 { "file" } else { "files" }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file_category::Category;
    use chrono::Local;
    use std::path::PathBuf;

    #[test]
    fn test_record_line() {
        colored::control::set_override(false);
        let record = AuditRecord {
            file_name: "photo.JPG".to_string(),
            old_path: PathBuf::from("/src/photo.JPG"),
            new_path: PathBuf::from("/dest/Images/photo.JPG"),
            category: Category::named("Images"),
            size_kb: 500.0,
            timestamp: Local::now(),
            action: Action::Moved,
            error: None,
        };
        assert_eq!(OutputFormatter::record_line(&record), "Moved: photo.JPG -> Images");
    }

    #[test]
    fn test_file_word() {
        assert_eq!(file_word(1), "file");
        assert_eq!(file_word(0), "files");
        assert_eq!(file_word(2), "files");
    }
}
