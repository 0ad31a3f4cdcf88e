use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use slice_extract::ManifestReader;
use slice_graph::DependencyResolver;
use slice_index::{build_symbol_index, FileScanner};
use slice_output::Materializer;
use slice_protocol::{ExtractionJob, IgnoreFilter, Language, Warning};
use std::sync::Arc;
use std::time::Duration;

pub struct RunSummary {
    pub files: usize,
    pub external: usize,
    pub files_written: usize,
    pub warnings: Vec<Warning>,
}

/// Run the whole job: manifests, symbol index when needed, traversal,
/// materialization. The phases are strictly ordered; only the indexing
/// pass is parallel internally.
pub async fn execute(job: ExtractionJob, show_progress: bool) -> Result<RunSummary> {
    let spinner = progress(show_progress);
    let filter = IgnoreFilter::new(&job.ignore_dirs, &job.ignore_files);
    let scanner = FileScanner::new(&job.roots, filter.clone());

    set_message(&spinner, "reading project manifests");
    let reader = ManifestReader::new(&job.roots, filter.clone());
    let (declared, mut carried_warnings) = reader.read();
    log::info!("manifests declare {} packages", declared.len());

    let needs_index = job
        .entry_files
        .iter()
        .any(|path| Language::from_path(path) == Language::CSharp);
    let index = if needs_index {
        let files = scanner.scan_language(Language::CSharp);
        set_message(&spinner, format!("indexing {} files", files.len()));
        let (index, index_warnings) = build_symbol_index(&files)
            .await
            .context("symbol indexing failed")?;
        carried_warnings.extend(index_warnings);
        Some(Arc::new(index))
    } else {
        None
    };

    set_message(&spinner, "resolving dependencies");
    let mut resolver = DependencyResolver::new(
        &job.roots,
        filter,
        job.recursion,
        index,
        declared,
    )?;
    let mut resolution = resolver.resolve(&job.entry_files)?;

    for warning in carried_warnings {
        resolution.result.add_warning(warning);
    }
    resolution.result.normalize();

    set_message(&spinner, "writing output");
    let materializer = Materializer::new(job.output.clone(), job.report);
    let written = materializer.materialize(&resolution.result)?;

    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }

    let mut warnings = resolution.result.warnings.clone();
    warnings.extend(written.warnings);

    Ok(RunSummary {
        files: resolution.result.files.len(),
        external: resolution.result.external.len(),
        files_written: written.files_written,
        warnings,
    })
}

fn progress(enabled: bool) -> Option<ProgressBar> {
    if !enabled {
        return None;
    }
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::with_template("{spinner} {msg}").expect("spinner template"));
    spinner.enable_steady_tick(Duration::from_millis(120));
    Some(spinner)
}

fn set_message(spinner: &Option<ProgressBar>, message: impl Into<String>) {
    if let Some(spinner) = spinner {
        spinner.set_message(message.into());
    }
}
