use anyhow::{Context, Result};
use serde::Deserialize;
use slice_protocol::{ExtractionJob, OutputSpec, RecursionPolicy, DEFAULT_IGNORE_DIRS};
use std::path::{Path, PathBuf};

/// JSON configuration file. Field names follow the job model; explicit
/// command-line flags win over file values per field.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub entry_files: Vec<PathBuf>,
    pub project_dirs: Vec<PathBuf>,
    pub ignore_dirs: Vec<String>,
    pub ignore_files: Vec<String>,
    pub output_dir: Option<PathBuf>,
    pub zip_file: Option<PathBuf>,
    pub direct_only: bool,
    pub report: bool,
}

pub fn load(path: &Path) -> Result<FileConfig> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("could not read config file {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("could not parse config file {}", path.display()))
}

pub fn merge(cli: &crate::Cli, file: FileConfig) -> ExtractionJob {
    let entry_files = if cli.entry_files.is_empty() {
        file.entry_files
    } else {
        cli.entry_files.clone()
    };

    let roots = if cli.project_dirs.is_empty() {
        file.project_dirs
    } else {
        cli.project_dirs.clone()
    };

    let mut ignore_dirs = if cli.ignore_dirs.is_empty() {
        file.ignore_dirs
    } else {
        cli.ignore_dirs.clone()
    };
    if !cli.no_default_ignores {
        ignore_dirs.extend(DEFAULT_IGNORE_DIRS.iter().map(|d| d.to_string()));
    }

    let ignore_files = if cli.ignore_files.is_empty() {
        file.ignore_files
    } else {
        cli.ignore_files.clone()
    };

    ExtractionJob {
        entry_files,
        roots,
        ignore_dirs,
        ignore_files,
        recursion: if cli.direct_only || file.direct_only {
            RecursionPolicy::DirectOnly
        } else {
            RecursionPolicy::Full
        },
        output: OutputSpec {
            dir: cli.output_dir.clone().or(file.output_dir),
            archive: cli.archive.clone().or(file.zip_file),
            force: cli.force,
        },
        report: cli.report || file.report,
    }
}
