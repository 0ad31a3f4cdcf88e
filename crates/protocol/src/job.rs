use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum JobError {
    #[error("no entry files given")]
    NoEntryFiles,

    #[error("no project roots given")]
    NoProjectRoots,

    #[error("project root not found or not a directory: {}", .0.display())]
    InvalidRoot(PathBuf),

    #[error("entry file not found: {}", .0.display())]
    EntryNotFound(PathBuf),

    #[error("entry file lies under none of the project roots: {}", .0.display())]
    EntryOutsideRoots(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// How far the traversal expands past the entry files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecursionPolicy {
    /// Follow dependencies transitively until the closure is complete
    #[default]
    Full,

    /// Entry files plus their immediate dependencies, nothing deeper
    DirectOnly,
}

/// Where the materialized closure goes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputSpec {
    /// Destination directory for the extracted tree
    pub dir: Option<PathBuf>,

    /// Path of a zip archive with the same relative layout
    pub archive: Option<PathBuf>,

    /// Replace an existing destination directory instead of failing
    #[serde(default)]
    pub force: bool,
}

impl OutputSpec {
    pub fn is_empty(&self) -> bool {
        self.dir.is_none() && self.archive.is_none()
    }
}

/// Fully specified extraction job. Assembled and validated before traversal
/// begins; never mutated during the run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionJob {
    /// Files the closure is computed from
    pub entry_files: Vec<PathBuf>,

    /// Ordered project roots; a file's relative path is computed against
    /// the first root that contains it
    pub roots: Vec<PathBuf>,

    /// Directory names excluded everywhere
    #[serde(default)]
    pub ignore_dirs: Vec<String>,

    /// File-name patterns excluded everywhere
    #[serde(default)]
    pub ignore_files: Vec<String>,

    #[serde(default)]
    pub recursion: RecursionPolicy,

    #[serde(default)]
    pub output: OutputSpec,

    /// Write a summary report next to the extracted files
    #[serde(default)]
    pub report: bool,
}

impl ExtractionJob {
    /// Canonicalize roots and entries and check that the job is well formed.
    ///
    /// Fails fast: a job with a missing root or entry has an ill-defined
    /// scope, so nothing is traversed.
    pub fn canonicalize(&mut self) -> Result<(), JobError> {
        if self.entry_files.is_empty() {
            return Err(JobError::NoEntryFiles);
        }
        if self.roots.is_empty() {
            return Err(JobError::NoProjectRoots);
        }

        for root in &mut self.roots {
            if !root.is_dir() {
                return Err(JobError::InvalidRoot(root.clone()));
            }
            *root = root.canonicalize()?;
        }

        for entry in &mut self.entry_files {
            if !entry.is_file() {
                return Err(JobError::EntryNotFound(entry.clone()));
            }
            *entry = entry.canonicalize()?;
            if !self.roots.iter().any(|root| entry.starts_with(root)) {
                return Err(JobError::EntryOutsideRoots(entry.clone()));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn job(entries: Vec<PathBuf>, roots: Vec<PathBuf>) -> ExtractionJob {
        ExtractionJob {
            entry_files: entries,
            roots,
            ignore_dirs: Vec::new(),
            ignore_files: Vec::new(),
            recursion: RecursionPolicy::Full,
            output: OutputSpec::default(),
            report: false,
        }
    }

    #[test]
    fn rejects_missing_root() {
        let temp = tempdir().unwrap();
        let entry = temp.path().join("main.py");
        fs::write(&entry, "").unwrap();

        let mut j = job(vec![entry], vec![temp.path().join("nope")]);
        assert!(matches!(j.canonicalize(), Err(JobError::InvalidRoot(_))));
    }

    #[test]
    fn rejects_missing_entry() {
        let temp = tempdir().unwrap();
        let mut j = job(
            vec![temp.path().join("missing.py")],
            vec![temp.path().to_path_buf()],
        );
        assert!(matches!(j.canonicalize(), Err(JobError::EntryNotFound(_))));
    }

    #[test]
    fn rejects_entry_outside_roots() {
        let temp = tempdir().unwrap();
        let root = temp.path().join("project");
        fs::create_dir(&root).unwrap();
        let outside = temp.path().join("stray.py");
        fs::write(&outside, "").unwrap();

        let mut j = job(vec![outside], vec![root]);
        assert!(matches!(
            j.canonicalize(),
            Err(JobError::EntryOutsideRoots(_))
        ));
    }

    #[test]
    fn accepts_well_formed_job() {
        let temp = tempdir().unwrap();
        let entry = temp.path().join("main.py");
        fs::write(&entry, "print('hi')").unwrap();

        let mut j = job(vec![entry], vec![temp.path().to_path_buf()]);
        assert!(j.canonicalize().is_ok());
        assert!(j.entry_files[0].is_absolute());
    }
}
