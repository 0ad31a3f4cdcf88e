use serde::Serialize;
use slice_protocol::{ExternalPackage, ExtractionResult, Language, Warning};
use std::collections::BTreeMap;

/// Machine-readable summary of an extraction run.
#[derive(Debug, Serialize)]
pub struct Report {
    pub entry_points: Vec<String>,
    pub total_files: usize,
    pub files_per_entry: BTreeMap<String, usize>,
    pub external_packages: Vec<ExternalPackage>,
    pub warnings: Vec<Warning>,
}

impl Report {
    pub fn new(result: &ExtractionResult, warnings: Vec<Warning>) -> Self {
        let mut files_per_entry: BTreeMap<String, usize> = BTreeMap::new();
        for file in &result.files {
            for entry in &file.entries {
                *files_per_entry.entry(entry.clone()).or_insert(0) += 1;
            }
        }

        Self {
            entry_points: files_per_entry.keys().cloned().collect(),
            total_files: result.files.len(),
            files_per_entry,
            external_packages: result.external.clone(),
            warnings,
        }
    }
}

/// Human-readable companion of [`Report`].
pub fn render_markdown(report: &Report, result: &ExtractionResult) -> String {
    let mut md = String::new();
    md.push_str("# Extraction report\n\n");

    md.push_str("## Summary\n\n");
    md.push_str(&format!(
        "- Entry points: `{}`\n",
        report.entry_points.join("`, `")
    ));
    md.push_str(&format!("- Files included: `{}`\n", report.total_files));
    md.push_str(&format!(
        "- External packages: `{}`\n",
        report.external_packages.len()
    ));
    md.push_str(&format!("- Warnings: `{}`\n\n", report.warnings.len()));

    md.push_str("## Files per entry point\n\n");
    md.push_str("| entry | files |\n|---|---:|\n");
    for (entry, count) in &report.files_per_entry {
        md.push_str(&format!("| `{entry}` | `{count}` |\n"));
    }
    md.push('\n');

    md.push_str("## Included files\n\n```\n");
    for file in &result.files {
        md.push_str(&format!("{}\n", file.file.relative.display()));
    }
    md.push_str("```\n\n");

    md.push_str("## External packages\n\n");
    if report.external_packages.is_empty() {
        md.push_str("None found.\n");
    } else {
        for language in [Language::Python, Language::CSharp] {
            let packages: Vec<&ExternalPackage> = report
                .external_packages
                .iter()
                .filter(|p| p.language == language)
                .collect();
            if packages.is_empty() {
                continue;
            }
            md.push_str(&format!("### {}\n\n```\n", language.as_str()));
            for package in packages {
                md.push_str(&format!("{}\n", package.as_requirement()));
            }
            md.push_str("```\n\n");
        }
    }

    md.push_str("## Warnings\n\n");
    if report.warnings.is_empty() {
        md.push_str("None.\n");
    } else {
        for warning in &report.warnings {
            md.push_str(&format!("- {warning}\n"));
        }
    }

    md
}

#[cfg(test)]
mod tests {
    use super::*;
    use slice_protocol::{IncludedFile, SourceFile};
    use std::collections::BTreeSet;
    use std::path::PathBuf;

    fn result_with_two_entries() -> ExtractionResult {
        let mut result = ExtractionResult::default();
        for (relative, entry) in [
            ("main.py", "main.py"),
            ("utils/db.py", "main.py"),
            ("tool.py", "tool.py"),
        ] {
            result.files.push(IncludedFile {
                file: SourceFile {
                    path: PathBuf::from("/p").join(relative),
                    relative: PathBuf::from(relative),
                    language: Language::Python,
                },
                entries: BTreeSet::from([entry.to_string()]),
            });
        }
        result.add_external(ExternalPackage::new("requests", Language::Python));
        result
    }

    #[test]
    fn per_entry_counts_follow_attribution() {
        let result = result_with_two_entries();
        let report = Report::new(&result, Vec::new());

        assert_eq!(report.total_files, 3);
        assert_eq!(report.files_per_entry["main.py"], 2);
        assert_eq!(report.files_per_entry["tool.py"], 1);
        assert_eq!(report.entry_points, vec!["main.py", "tool.py"]);
    }

    #[test]
    fn markdown_lists_files_packages_and_warnings() {
        let result = result_with_two_entries();
        let warnings = vec![Warning::UnresolvedReference {
            path: PathBuf::from("/p/main.py"),
            reference: "ghost".to_string(),
        }];
        let report = Report::new(&result, warnings);
        let md = render_markdown(&report, &result);

        assert!(md.contains("utils/db.py"));
        assert!(md.contains("### python"));
        assert!(md.contains("requests"));
        assert!(md.contains("unresolved reference `ghost`"));
    }
}
