use crate::error::{OutputError, Result};
use crate::report::{render_markdown, Report};
use slice_protocol::{ExtractionResult, Language, OutputSpec, Warning};
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

const REPORT_MD: &str = "extraction-report.md";
const REPORT_JSON: &str = "extraction-report.json";

/// Manifest file carrying the external packages of one language family.
pub fn manifest_file_name(language: Language) -> Option<&'static str> {
    match language {
        Language::Python => Some("requirements.txt"),
        Language::CSharp => Some("csharp_packages.txt"),
        Language::Unknown => None,
    }
}

/// What a materialization run produced.
#[derive(Debug, Default)]
pub struct MaterializeSummary {
    /// Files copied into the directory and/or archive
    pub files_written: usize,

    /// Collisions detected while planning the output layout
    pub warnings: Vec<Warning>,
}

/// Writes the closure to disk.
pub struct Materializer {
    spec: OutputSpec,
    write_report: bool,
}

impl Materializer {
    pub fn new(spec: OutputSpec, write_report: bool) -> Self {
        Self { spec, write_report }
    }

    pub fn materialize(&self, result: &ExtractionResult) -> Result<MaterializeSummary> {
        let (entries, collisions) = plan(result);

        let report = if self.write_report {
            let mut all_warnings = result.warnings.clone();
            all_warnings.extend(collisions.iter().cloned());
            let report = Report::new(result, all_warnings);
            Some((render_markdown(&report, result), report))
        } else {
            None
        };

        if let Some(dir) = &self.spec.dir {
            self.write_directory(dir, &entries, result, report.as_ref())?;
        }
        if let Some(archive) = &self.spec.archive {
            self.write_archive(archive, &entries, result, report.as_ref())?;
        }

        Ok(MaterializeSummary {
            files_written: entries.len(),
            warnings: collisions,
        })
    }

    fn write_directory(
        &self,
        dest: &Path,
        entries: &BTreeMap<PathBuf, PathBuf>,
        result: &ExtractionResult,
        report: Option<&(String, Report)>,
    ) -> Result<()> {
        if dest.exists() {
            if !self.spec.force {
                return Err(OutputError::DestinationExists(dest.to_path_buf()));
            }
            fs::remove_dir_all(dest)?;
        }
        fs::create_dir_all(dest)?;
        log::info!("copying {} files to {}", entries.len(), dest.display());

        for (relative, source) in entries {
            let target = dest.join(relative);
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(source, &target)?;
        }

        for language in result.external_languages() {
            let Some(name) = manifest_file_name(language) else {
                continue;
            };
            fs::write(dest.join(name), render_manifest(result, language))?;
        }

        if let Some((markdown, report)) = report {
            fs::write(dest.join(REPORT_MD), markdown)?;
            fs::write(dest.join(REPORT_JSON), serde_json::to_vec_pretty(report)?)?;
        }

        Ok(())
    }

    fn write_archive(
        &self,
        path: &Path,
        entries: &BTreeMap<PathBuf, PathBuf>,
        result: &ExtractionResult,
        report: Option<&(String, Report)>,
    ) -> Result<()> {
        log::info!("writing archive {}", path.display());
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let file = fs::File::create(path)?;
        let mut writer = ZipWriter::new(file);
        let options =
            SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        for (relative, source) in entries {
            writer.start_file(archive_name(relative), options)?;
            writer.write_all(&fs::read(source)?)?;
        }

        for language in result.external_languages() {
            let Some(name) = manifest_file_name(language) else {
                continue;
            };
            writer.start_file(name, options)?;
            writer.write_all(render_manifest(result, language).as_bytes())?;
        }

        if let Some((markdown, report)) = report {
            writer.start_file(REPORT_MD, options)?;
            writer.write_all(markdown.as_bytes())?;
            writer.start_file(REPORT_JSON, options)?;
            writer.write_all(&serde_json::to_vec_pretty(report)?)?;
        }

        writer.finish()?;
        Ok(())
    }
}

/// Map each included file onto its output-relative slot.
///
/// The first file to claim a slot keeps it; later claimants are skipped
/// with a collision warning. Result files are already in sorted order, so
/// the outcome is deterministic.
fn plan(result: &ExtractionResult) -> (BTreeMap<PathBuf, PathBuf>, Vec<Warning>) {
    let mut entries: BTreeMap<PathBuf, PathBuf> = BTreeMap::new();
    let mut collisions = Vec::new();

    for included in &result.files {
        let relative = &included.file.relative;
        if let Some(kept) = entries.get(relative) {
            collisions.push(Warning::PathCollision {
                relative: relative.clone(),
                kept: kept.clone(),
                skipped: included.file.path.clone(),
            });
            continue;
        }
        entries.insert(relative.clone(), included.file.path.clone());
    }

    (entries, collisions)
}

fn render_manifest(result: &ExtractionResult, language: Language) -> String {
    let mut lines: Vec<String> = result
        .external_for(language)
        .iter()
        .map(|p| p.as_requirement())
        .collect();
    lines.sort();
    let mut content = lines.join("\n");
    content.push('\n');
    content
}

/// Zip entry names always use forward slashes.
fn archive_name(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
