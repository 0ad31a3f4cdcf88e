use ignore::WalkBuilder;
use slice_protocol::{IgnoreFilter, Language};
use std::path::{Path, PathBuf};

/// Scanner for finding source files under the configured project roots.
///
/// The ignore filter is consulted via `filter_entry`, so an ignored
/// directory is never descended into and an ignored file is never listed.
pub struct FileScanner {
    roots: Vec<PathBuf>,
    filter: IgnoreFilter,
}

impl FileScanner {
    pub fn new(roots: &[PathBuf], filter: IgnoreFilter) -> Self {
        Self {
            roots: roots.to_vec(),
            filter,
        }
    }

    /// All non-ignored files under every root (.gitignore aware).
    ///
    /// Output is sorted so that downstream consumers see a stable order
    /// regardless of directory iteration order.
    pub fn scan(&self) -> Vec<PathBuf> {
        let mut files = Vec::new();

        for root in &self.roots {
            let root_for_filter = root.clone();
            let filter = self.filter.clone();

            let mut builder = WalkBuilder::new(root);
            builder
                .hidden(true)
                .git_ignore(true)
                .git_global(false)
                .git_exclude(true);
            builder.filter_entry(move |entry| {
                !Self::relative_is_ignored(entry.path(), &root_for_filter, &filter)
            });

            for result in builder.build() {
                match result {
                    Ok(entry) => {
                        let Some(file_type) = entry.file_type() else {
                            continue;
                        };
                        if !file_type.is_file() {
                            continue;
                        }
                        files.push(entry.path().to_path_buf());
                    }
                    Err(e) => log::warn!("failed to read entry: {e}"),
                }
            }
        }

        files.sort();
        files.dedup();
        log::debug!("scanner found {} files", files.len());
        files
    }

    /// Non-ignored files of one language, sorted.
    pub fn scan_language(&self, language: Language) -> Vec<PathBuf> {
        let mut files = self.scan();
        files.retain(|path| Language::from_path(path) == language);
        files
    }

    fn relative_is_ignored(path: &Path, root: &Path, filter: &IgnoreFilter) -> bool {
        let relative = path.strip_prefix(root).unwrap_or(path);
        filter.is_ignored(relative)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn lists_files_under_all_roots_sorted() {
        let temp = tempdir().unwrap();
        let a = temp.path().join("a");
        let b = temp.path().join("b");
        fs::create_dir_all(&a).unwrap();
        fs::create_dir_all(&b).unwrap();
        fs::write(a.join("z.py"), "").unwrap();
        fs::write(b.join("m.cs"), "").unwrap();

        let scanner = FileScanner::new(&[a.clone(), b.clone()], IgnoreFilter::default());
        let files = scanner.scan();

        assert_eq!(files.len(), 2);
        assert!(files.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn ignored_directories_are_not_descended() {
        let temp = tempdir().unwrap();
        let hidden = temp.path().join("venv").join("lib");
        fs::create_dir_all(&hidden).unwrap();
        fs::write(hidden.join("secret.py"), "").unwrap();
        fs::write(temp.path().join("main.py"), "").unwrap();

        let filter = IgnoreFilter::new(["venv"], Vec::<String>::new());
        let scanner = FileScanner::new(&[temp.path().to_path_buf()], filter);
        let files = scanner.scan();

        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("main.py"));
    }

    #[test]
    fn ignored_file_patterns_are_excluded() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("keep.cs"), "").unwrap();
        fs::write(temp.path().join("Designer.g.cs"), "").unwrap();

        let filter = IgnoreFilter::new(Vec::<String>::new(), ["*.g.cs"]);
        let scanner = FileScanner::new(&[temp.path().to_path_buf()], filter);
        let files = scanner.scan_language(Language::CSharp);

        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("keep.cs"));
    }

    #[test]
    fn scan_language_filters_by_extension() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("main.py"), "").unwrap();
        fs::write(temp.path().join("Program.cs"), "").unwrap();
        fs::write(temp.path().join("notes.txt"), "").unwrap();

        let scanner = FileScanner::new(&[temp.path().to_path_buf()], IgnoreFilter::default());
        assert_eq!(scanner.scan_language(Language::Python).len(), 1);
        assert_eq!(scanner.scan_language(Language::CSharp).len(), 1);
    }
}
