use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};

/// Language of a source file, detected from its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    Python,
    CSharp,
    Unknown,
}

impl Language {
    /// Detect language from file extension
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "py" | "pyw" => Language::Python,
            "cs" => Language::CSharp,
            _ => Language::Unknown,
        }
    }

    /// Detect language from file path
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .map(Self::from_extension)
            .unwrap_or(Language::Unknown)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::CSharp => "csharp",
            Language::Unknown => "unknown",
        }
    }
}

/// A source file that has been located under a project root.
///
/// The relative path is computed against the first root that contains the
/// file and determines where the file lands in the output artifact.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceFile {
    /// Absolute path on disk
    pub path: PathBuf,

    /// Path relative to the owning project root
    pub relative: PathBuf,

    /// Detected language
    pub language: Language,
}

impl SourceFile {
    /// Identify a file against an ordered list of project roots.
    ///
    /// Returns `None` when the file lies under none of the roots.
    pub fn identify(path: &Path, roots: &[PathBuf]) -> Option<Self> {
        let relative = relative_to_roots(path, roots)?;
        Some(Self {
            path: path.to_path_buf(),
            relative,
            language: Language::from_path(path),
        })
    }
}

/// Compute a path relative to the first root that contains it.
pub fn relative_to_roots(path: &Path, roots: &[PathBuf]) -> Option<PathBuf> {
    roots
        .iter()
        .find_map(|root| path.strip_prefix(root).ok().map(Path::to_path_buf))
}

/// External package referenced by the closure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalPackage {
    pub name: String,
    pub version: Option<String>,
    pub language: Language,
}

impl ExternalPackage {
    pub fn new(name: impl Into<String>, language: Language) -> Self {
        Self {
            name: name.into(),
            version: None,
            language,
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Render as a requirements-style line (`name` or `name==version`).
    pub fn as_requirement(&self) -> String {
        match &self.version {
            Some(version) => format!("{}=={}", self.name, version),
            None => self.name.clone(),
        }
    }
}

/// A file included in the closure, tagged with the entry points that first
/// reached it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncludedFile {
    pub file: SourceFile,

    /// Entry labels, first discovery wins
    pub entries: BTreeSet<String>,
}

/// Everything a job produced: the deduplicated closure, the external
/// packages it references, and the warnings accumulated along the way.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub files: Vec<IncludedFile>,
    pub external: Vec<ExternalPackage>,
    pub warnings: Vec<Warning>,
}

impl ExtractionResult {
    /// Record an external package reference.
    ///
    /// Deduplication is by (language, name). The first observed version wins;
    /// a later disagreeing version is recorded as a warning, never silently
    /// dropped. A version arriving for a previously version-less entry is a
    /// refinement, not a conflict.
    pub fn add_external(&mut self, package: ExternalPackage) {
        if let Some(existing) = self
            .external
            .iter_mut()
            .find(|p| p.language == package.language && p.name == package.name)
        {
            match (&existing.version, &package.version) {
                (Some(kept), Some(new)) if kept != new => {
                    self.warnings.push(Warning::VersionConflict {
                        package: package.name,
                        kept: kept.clone(),
                        ignored: new.clone(),
                    });
                }
                (None, Some(new)) => existing.version = Some(new.clone()),
                _ => {}
            }
            return;
        }
        self.external.push(package);
    }

    pub fn add_warning(&mut self, warning: Warning) {
        self.warnings.push(warning);
    }

    /// Languages with at least one external package in the result.
    pub fn external_languages(&self) -> BTreeSet<Language> {
        self.external.iter().map(|p| p.language).collect()
    }

    /// External packages of one language family, in recorded order.
    pub fn external_for(&self, language: Language) -> Vec<&ExternalPackage> {
        self.external
            .iter()
            .filter(|p| p.language == language)
            .collect()
    }

    /// Sort files, packages and warnings so that identical jobs produce
    /// byte-identical results regardless of discovery order.
    pub fn normalize(&mut self) {
        self.files.sort_by(|a, b| a.file.relative.cmp(&b.file.relative));
        self.external
            .sort_by(|a, b| (a.language, &a.name).cmp(&(b.language, &b.name)));
        self.warnings.sort_by_key(|w| w.to_string());
    }
}

/// Recoverable problems encountered during a job.
///
/// None of these abort the run; they are carried in the result and surfaced
/// in the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Warning {
    UnreadableFile {
        path: PathBuf,
        reason: String,
    },
    SyntaxError {
        path: PathBuf,
        detail: String,
    },
    UnresolvedReference {
        path: PathBuf,
        reference: String,
    },
    AmbiguousSymbol {
        path: PathBuf,
        symbol: String,
        chosen: PathBuf,
        candidates: Vec<PathBuf>,
    },
    VersionConflict {
        package: String,
        kept: String,
        ignored: String,
    },
    PathCollision {
        relative: PathBuf,
        kept: PathBuf,
        skipped: PathBuf,
    },
    ManifestUnreadable {
        path: PathBuf,
        reason: String,
    },
    EntryIgnored {
        path: PathBuf,
    },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::UnreadableFile { path, reason } => {
                write!(f, "could not read {}: {}", path.display(), reason)
            }
            Warning::SyntaxError { path, detail } => {
                write!(f, "syntax error in {}: {}", path.display(), detail)
            }
            Warning::UnresolvedReference { path, reference } => {
                write!(
                    f,
                    "unresolved reference `{}` in {}",
                    reference,
                    path.display()
                )
            }
            Warning::AmbiguousSymbol {
                path,
                symbol,
                chosen,
                candidates,
            } => {
                let listed = candidates
                    .iter()
                    .map(|c| c.display().to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(
                    f,
                    "ambiguous symbol `{}` in {}: picked {} among [{}]",
                    symbol,
                    path.display(),
                    chosen.display(),
                    listed
                )
            }
            Warning::VersionConflict {
                package,
                kept,
                ignored,
            } => {
                write!(
                    f,
                    "version conflict for package `{}`: kept {}, ignored {}",
                    package, kept, ignored
                )
            }
            Warning::PathCollision {
                relative,
                kept,
                skipped,
            } => {
                write!(
                    f,
                    "output path collision at {}: kept {}, skipped {}",
                    relative.display(),
                    kept.display(),
                    skipped.display()
                )
            }
            Warning::ManifestUnreadable { path, reason } => {
                write!(f, "could not read manifest {}: {}", path.display(), reason)
            }
            Warning::EntryIgnored { path } => {
                write!(
                    f,
                    "entry file {} matches an ignore pattern and was skipped",
                    path.display()
                )
            }
        }
    }
}
