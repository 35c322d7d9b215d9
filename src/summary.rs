//! Per-category counts of moved files.

use crate::file_category::Category;
use crate::file_organizer::{Action, AuditRecord};
use std::fmt;

/// Moved-file counts per category, in the order categories were first seen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Summary {
    counts: Vec<(Category, usize)>,
}

impl Summary {
    pub fn get(&self, category: &Category) -> Option<usize> {
        self.counts
            .iter()
            .find(|(c, _)| c == category)
            .map(|(_, n)| *n)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Category, usize)> {
        self.counts.iter().map(|(c, n)| (c, *n))
    }

    /// Number of distinct categories.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Number of moved files.
    pub fn total(&self) -> usize {
        self.counts.iter().map(|(_, n)| n).sum()
    }

    fn add(&mut self, category: &Category) {
        match self.counts.iter_mut().find(|(c, _)| c == category) {
            Some((_, n)) => *n += 1,
            None => self.counts.push((category.clone(), 1)),
        }
    }
}

impl fmt::Display for Summary {
    /// One `Category: N files` line per category, or `No files moved.`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("No files moved.");
        }
        for (i, (category, count)) in self.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}: {} files", category, count)?;
        }
        Ok(())
    }
}

/// Counts `Moved` records per category. Preview and failed records never count.
///
/// ```
/// use sortdir::summary::summarize;
///
/// assert!(summarize(&[]).is_empty());
/// ```
pub fn summarize(records: &[AuditRecord]) -> Summary {
    let mut summary = Summary::default();
    for record in records.iter().filter(|r| r.action == Action::Moved) {
        summary.add(&record.category);
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Local;
    use std::path::PathBuf;

    fn record(category: &str, action: Action) -> AuditRecord {
        AuditRecord {
            file_name: "f".to_string(),
            old_path: PathBuf::from("/src/f"),
            new_path: PathBuf::from("/dest/f"),
            category: Category::named(category),
            size_kb: 1.0,
            timestamp: Local::now(),
            action,
            error: None,
        }
    }

    #[test]
    fn test_preview_records_never_count() {
        let records = vec![
            record("Images", Action::Moved),
            record("Documents", Action::Preview),
            record("Images", Action::Moved),
            record("Documents", Action::Preview),
            record("Images", Action::Moved),
        ];

        let summary = summarize(&records);

        assert_eq!(summary.len(), 1);
        assert_eq!(summary.get(&Category::named("Images")), Some(3));
        assert_eq!(summary.get(&Category::named("Documents")), None);
        assert_eq!(summary.total(), 3);
    }

    #[test]
    fn test_failed_records_never_count() {
        let records = vec![record("Images", Action::Failed)];
        assert!(summarize(&records).is_empty());
    }

    #[test]
    fn test_first_seen_order() {
        let records = vec![
            record("Videos", Action::Moved),
            record("Archives", Action::Moved),
            record("Others", Action::Moved),
            record("Archives", Action::Moved),
        ];

        let order: Vec<_> = summarize(&records)
            .iter()
            .map(|(c, n)| (c.to_string(), n))
            .collect();

        assert_eq!(
            order,
            vec![
                ("Videos".to_string(), 1),
                ("Archives".to_string(), 2),
                ("Others".to_string(), 1)
            ]
        );
    }

    #[test]
    fn test_display() {
        let records = vec![record("Images", Action::Moved), record("Code", Action::Moved)];
        assert_eq!(
            summarize(&records).to_string(),
            "Images: 1 files\nCode: 1 files"
        );
        assert_eq!(summarize(&[]).to_string(), "No files moved.");
    }
}
