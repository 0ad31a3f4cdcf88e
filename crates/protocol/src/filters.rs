use std::collections::BTreeSet;
use std::path::Path;

/// Directory names skipped by default when no explicit ignore set is given.
pub const DEFAULT_IGNORE_DIRS: &[&str] = &[
    ".git",
    ".hg",
    ".svn",
    ".idea",
    ".vscode",
    "__pycache__",
    ".venv",
    "venv",
    "node_modules",
    "bin",
    "obj",
    "target",
    "build",
    "dist",
];

/// Pure predicate deciding whether a path is excluded from the job.
///
/// Directory-name patterns match any normal path component; file patterns
/// match the final component, as a glob when the pattern carries
/// metacharacters and as an exact name otherwise. Consulted before a path
/// is opened, indexed, enqueued, or copied.
#[derive(Debug, Clone, Default)]
pub struct IgnoreFilter {
    dirs: BTreeSet<String>,
    files: Vec<FilePattern>,
}

#[derive(Debug, Clone)]
enum FilePattern {
    Exact(String),
    Glob(glob::Pattern),
}

impl IgnoreFilter {
    pub fn new<D, F>(dirs: D, files: F) -> Self
    where
        D: IntoIterator,
        D::Item: AsRef<str>,
        F: IntoIterator,
        F::Item: AsRef<str>,
    {
        let dirs = dirs
            .into_iter()
            .map(|d| d.as_ref().trim().to_string())
            .filter(|d| !d.is_empty())
            .collect();

        let files = files
            .into_iter()
            .filter_map(|raw| {
                let raw = raw.as_ref().trim();
                if raw.is_empty() {
                    return None;
                }
                if raw.contains('*') || raw.contains('?') || raw.contains('[') {
                    match glob::Pattern::new(raw) {
                        Ok(pattern) => Some(FilePattern::Glob(pattern)),
                        Err(e) => {
                            log::warn!("invalid ignore pattern `{raw}`: {e}");
                            None
                        }
                    }
                } else {
                    Some(FilePattern::Exact(raw.to_string()))
                }
            })
            .collect();

        Self { dirs, files }
    }

    /// True when the path matches an ignored directory name or file pattern.
    pub fn is_ignored(&self, path: &Path) -> bool {
        for component in path.components() {
            if let std::path::Component::Normal(name) = component {
                if let Some(name) = name.to_str() {
                    if self.dirs.contains(name) {
                        log::debug!(
                            "ignoring {} (directory `{name}` is ignored)",
                            path.display()
                        );
                        return true;
                    }
                }
            }
        }

        let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
            return false;
        };
        for pattern in &self.files {
            let matched = match pattern {
                FilePattern::Exact(name) => file_name == name,
                FilePattern::Glob(glob) => glob.matches(file_name),
            };
            if matched {
                log::debug!("ignoring {} (file pattern matched)", path.display());
                return true;
            }
        }

        false
    }

    pub fn is_empty(&self) -> bool {
        self.dirs.is_empty() && self.files.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn filter(dirs: &[&str], files: &[&str]) -> IgnoreFilter {
        IgnoreFilter::new(dirs.iter().copied(), files.iter().copied())
    }

    #[test]
    fn directory_name_matches_any_segment() {
        let f = filter(&["__pycache__"], &[]);
        assert!(f.is_ignored(&PathBuf::from("src/__pycache__/mod.py")));
        assert!(f.is_ignored(&PathBuf::from("__pycache__/x.py")));
        assert!(!f.is_ignored(&PathBuf::from("src/cache/mod.py")));
    }

    #[test]
    fn file_glob_matches_final_segment_only() {
        let f = filter(&[], &["*.log"]);
        assert!(f.is_ignored(&PathBuf::from("logs/app.log")));
        assert!(!f.is_ignored(&PathBuf::from("app.log.py")));
    }

    #[test]
    fn plain_file_pattern_is_exact_name() {
        let f = filter(&[], &[".DS_Store"]);
        assert!(f.is_ignored(&PathBuf::from("a/b/.DS_Store")));
        assert!(!f.is_ignored(&PathBuf::from("a/b/DS_Store")));
    }

    #[test]
    fn empty_patterns_ignore_nothing() {
        let f = filter(&[], &[]);
        assert!(f.is_empty());
        assert!(!f.is_ignored(&PathBuf::from("anything/at/all.py")));
    }

    #[test]
    fn blank_entries_are_dropped() {
        let f = filter(&["", "  "], &["", " "]);
        assert!(f.is_empty());
    }
}
