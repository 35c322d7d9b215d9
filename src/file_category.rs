/// Extension-based file categorization.
///
/// This module maps file name extensions to broad categories (e.g. "Documents",
/// "Images"). Lookup is case-insensitive and any extension the table does not
/// know falls into the reserved [`Category::Other`] bucket.
///
/// # Examples
///
/// ```
/// use sortdir::file_category::{Category, ExtensionTable};
///
/// let table = ExtensionTable::default();
/// assert_eq!(table.classify("report.PDF"), Category::named("Documents"));
/// assert_eq!(table.classify("photo.jpeg"), Category::named("Images"));
/// assert_eq!(table.classify("README"), Category::Other);
/// ```
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;

/// Display name of the fallback bucket.
pub const OTHER_CATEGORY_NAME: &str = "Others";

/// A file category.
///
/// Configured categories carry their display name, which doubles as the name of
/// the destination subdirectory. `Other` is the implicit fallback for every
/// extension the table does not map.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Category {
    /// A category from the extension table.
    Named(String),
    /// Unknown, missing or empty extension.
    Other,
}

impl Category {
    /// Builds a category from its display name.
    ///
    /// The reserved name "Others" always yields [`Category::Other`].
    ///
    /// ```
    /// use sortdir::file_category::Category;
    ///
    /// assert_eq!(Category::named("Others"), Category::Other);
    /// assert_eq!(Category::named("Code").dir_name(), "Code");
    /// ```
    pub fn named(name: impl Into<String>) -> Self {
        let name = name.into();
        if name == OTHER_CATEGORY_NAME {
            Category::Other
        } else {
            Category::Named(name)
        }
    }

    /// Returns the directory name for this category.
    pub fn dir_name(&self) -> &str {
        match self {
            Category::Named(name) => name,
            Category::Other => OTHER_CATEGORY_NAME,
        }
    }

    /// True for the fallback bucket.
    pub fn is_other(&self) -> bool {
        matches!(self, Category::Other)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

impl From<String> for Category {
    fn from(name: String) -> Self {
        Category::named(name)
    }
}

impl From<Category> for String {
    fn from(category: Category) -> Self {
        category.dir_name().to_string()
    }
}

/// Returns the extension of a file name: the text after the last `.`.
///
/// Names without a dot, or ending in a dot, have an empty extension. The result
/// keeps its original case.
///
/// ```
/// use sortdir::file_category::extension_of;
///
/// assert_eq!(extension_of("archive.tar.GZ"), "GZ");
/// assert_eq!(extension_of("notes"), "");
/// assert_eq!(extension_of("trailing."), "");
/// ```
pub fn extension_of(file_name: &str) -> &str {
    match file_name.rfind('.') {
        Some(idx) => &file_name[idx + 1..],
        None => "",
    }
}

/// Maps lowercase file extensions to categories.
///
/// Keys are unique and stored without the leading dot. Several extensions may
/// share a category. The table is built once (defaults plus any configured
/// overrides) and then only read.
#[derive(Debug, Clone)]
pub struct ExtensionTable {
    extension_map: HashMap<String, Category>,
}

impl ExtensionTable {
    /// Creates a table with the standard mappings.
    pub fn new() -> Self {
        let mut table = Self::empty();
        table.populate_standard_mappings();
        table
    }

    /// Creates a table with no mappings; every file classifies as `Other`.
    pub fn empty() -> Self {
        Self {
            extension_map: HashMap::new(),
        }
    }

    fn populate_standard_mappings(&mut self) {
        for ext in ["pdf", "docx", "txt", "csv"] {
            self.add_extension_mapping(ext, "Documents");
        }
        for ext in ["jpg", "jpeg", "png", "gif"] {
            self.add_extension_mapping(ext, "Images");
        }
        for ext in ["mp4", "mkv", "mov"] {
            self.add_extension_mapping(ext, "Videos");
        }
        for ext in ["zip", "rar", "7z", "tar"] {
            self.add_extension_mapping(ext, "Archives");
        }
        for ext in ["py", "cpp", "java", "js", "html", "css"] {
            self.add_extension_mapping(ext, "Code");
        }
    }

    /// Adds (or replaces) the mapping for one extension.
    ///
    /// A leading dot is stripped and the key is lower-cased. Empty keys are
    /// ignored since an empty extension always means `Other`.
    pub fn add_extension_mapping(&mut self, ext: &str, category: &str) {
        let key = ext.trim_start_matches('.').to_lowercase();
        if key.is_empty() {
            return;
        }
        self.extension_map.insert(key, Category::named(category));
    }

    /// Removes the mapping for one extension, if present.
    pub fn remove_extension_mapping(&mut self, ext: &str) -> Option<Category> {
        self.extension_map
            .remove(&ext.trim_start_matches('.').to_lowercase())
    }

    /// Maps a bare extension to its category.
    ///
    /// ```
    /// use sortdir::file_category::{Category, ExtensionTable};
    ///
    /// let table = ExtensionTable::default();
    /// assert_eq!(table.extension_to_category("PNG"), Some(Category::named("Images")));
    /// assert_eq!(table.extension_to_category("xyz"), None);
    /// ```
    pub fn extension_to_category(&self, ext: &str) -> Option<Category> {
        self.extension_map.get(&ext.to_lowercase()).cloned()
    }

    /// Classifies a file name by its extension.
    pub fn classify(&self, file_name: &str) -> Category {
        let ext = extension_of(file_name);
        if ext.is_empty() {
            return Category::Other;
        }
        self.extension_to_category(ext).unwrap_or(Category::Other)
    }

    /// Distinct categories in the table, sorted by name, followed by `Other`.
    pub fn categories(&self) -> Vec<Category> {
        let named: BTreeSet<&Category> = self
            .extension_map
            .values()
            .filter(|c| !c.is_other())
            .collect();
        named
            .into_iter()
            .cloned()
            .chain(std::iter::once(Category::Other))
            .collect()
    }

    /// Number of extension keys.
    pub fn len(&self) -> usize {
        self.extension_map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extension_map.is_empty()
    }
}

impl Default for ExtensionTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Classifies `file_name` against `table`.
///
/// Total over all strings: anything without a known extension is
/// [`Category::Other`].
pub fn classify(file_name: &str, table: &ExtensionTable) -> Category {
    table.classify(file_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_table_categories() {
        let table = ExtensionTable::default();
        assert_eq!(table.classify("a.pdf"), Category::named("Documents"));
        assert_eq!(table.classify("a.csv"), Category::named("Documents"));
        assert_eq!(table.classify("a.gif"), Category::named("Images"));
        assert_eq!(table.classify("a.mkv"), Category::named("Videos"));
        assert_eq!(table.classify("a.7z"), Category::named("Archives"));
        assert_eq!(table.classify("a.css"), Category::named("Code"));
    }

    #[test]
    fn test_classify_case_insensitive() {
        let table = ExtensionTable::default();
        assert_eq!(table.classify("a.PDF"), table.classify("a.pdf"));
        assert_eq!(table.classify("photo.JpG"), Category::named("Images"));
    }

    #[test]
    fn test_classify_without_extension() {
        let table = ExtensionTable::default();
        assert_eq!(table.classify("README"), Category::Other);
        assert_eq!(table.classify("Makefile"), Category::Other);
        assert_eq!(table.classify("ends-with-dot."), Category::Other);
        assert_eq!(table.classify(""), Category::Other);
    }

    #[test]
    fn test_classify_uses_last_dot() {
        let table = ExtensionTable::default();
        assert_eq!(table.classify("backup.pdf.zip"), Category::named("Archives"));
        assert_eq!(table.classify("notes.zip.unknown"), Category::Other);
    }

    #[test]
    fn test_unknown_extension_is_other() {
        let table = ExtensionTable::default();
        assert_eq!(table.classify("song.flac"), Category::Other);
        assert_eq!(table.extension_to_category("flac"), None);
    }

    #[test]
    fn test_empty_table_classifies_everything_as_other() {
        let table = ExtensionTable::empty();
        assert!(table.is_empty());
        assert_eq!(table.classify("a.pdf"), Category::Other);
        assert_eq!(table.categories(), vec![Category::Other]);
    }

    #[test]
    fn test_custom_mapping() {
        let mut table = ExtensionTable::default();
        table.add_extension_mapping(".TTF", "Fonts");
        table.add_extension_mapping("pdf", "Papers");

        assert_eq!(table.classify("font.ttf"), Category::named("Fonts"));
        assert_eq!(table.classify("a.pdf"), Category::named("Papers"));
    }

    #[test]
    fn test_empty_key_is_ignored() {
        let mut table = ExtensionTable::empty();
        table.add_extension_mapping("", "Weird");
        table.add_extension_mapping(".", "Weird");
        assert!(table.is_empty());
    }

    #[test]
    fn test_others_name_maps_to_sentinel() {
        let mut table = ExtensionTable::empty();
        table.add_extension_mapping("log", "Others");
        assert_eq!(table.classify("app.log"), Category::Other);
        assert_eq!(table.categories(), vec![Category::Other]);
    }

    #[test]
    fn test_categories_are_distinct_and_end_with_other() {
        let table = ExtensionTable::default();
        let names: Vec<_> = table.categories().iter().map(|c| c.to_string()).collect();
        assert_eq!(
            names,
            vec!["Archives", "Code", "Documents", "Images", "Videos", "Others"]
        );
    }

    #[test]
    fn test_remove_mapping() {
        let mut table = ExtensionTable::default();
        assert_eq!(
            table.remove_extension_mapping("TXT"),
            Some(Category::named("Documents"))
        );
        assert_eq!(table.classify("a.txt"), Category::Other);
    }

    #[test]
    fn test_category_serde_as_string() {
        let json = serde_json::to_string(&Category::Other).unwrap();
        assert_eq!(json, "\"Others\"");
        let back: Category = serde_json::from_str("\"Images\"").unwrap();
        assert_eq!(back, Category::named("Images"));
    }
}
