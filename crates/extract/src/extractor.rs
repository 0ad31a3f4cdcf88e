use crate::error::Result;
use slice_protocol::{ExternalPackage, SourceFile, Warning};
use std::path::PathBuf;

/// What one file contributes to the closure.
#[derive(Debug, Clone, Default)]
pub struct FileReferences {
    /// Dependencies resolved to files under the project roots
    pub locals: Vec<PathBuf>,

    /// Dependencies attributed to named packages
    pub externals: Vec<ExternalPackage>,

    /// Per-file problems; never fatal for the job
    pub warnings: Vec<Warning>,
}

impl FileReferences {
    /// Drop duplicate local targets, keeping first-occurrence order.
    pub fn dedup_locals(&mut self) {
        let mut seen = std::collections::HashSet::new();
        self.locals.retain(|path| seen.insert(path.clone()));
    }
}

/// One language's extraction strategy.
///
/// Implementations read nothing from disk themselves beyond resolving
/// candidate paths under the configured roots; the caller loads file
/// content exactly once and hands it in.
pub trait Extractor {
    fn extract(&mut self, file: &SourceFile, content: &str) -> Result<FileReferences>;
}
