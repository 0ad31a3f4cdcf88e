use once_cell::sync::Lazy;
use regex::Regex;
use slice_protocol::{ExternalPackage, IgnoreFilter, Language, Warning};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

static PACKAGE_REFERENCE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)<PackageReference\s+Include="([^"]+)"(?:\s+Version="([^"]+)")?"#)
        .expect("package reference regex")
});

/// Reads project-description files under the roots to produce the
/// authoritative declared-package list.
///
/// This list is the source of truth for external package versions; the
/// extractors only decide whether a package is referenced. A manifest with
/// no recognizable package section yields an empty list, not an error.
pub struct ManifestReader {
    roots: Vec<PathBuf>,
    filter: IgnoreFilter,
}

impl ManifestReader {
    pub fn new(roots: &[PathBuf], filter: IgnoreFilter) -> Self {
        Self {
            roots: roots.to_vec(),
            filter,
        }
    }

    /// Collect declared packages from every manifest under the roots.
    ///
    /// Duplicates collapse to the first observed version; a disagreeing
    /// later version is reported, never silently dropped.
    pub fn read(&self) -> (Vec<ExternalPackage>, Vec<Warning>) {
        let mut packages: Vec<ExternalPackage> = Vec::new();
        let mut warnings = Vec::new();

        for path in self.manifest_files() {
            let content = match std::fs::read_to_string(&path) {
                Ok(content) => content,
                Err(e) => {
                    warnings.push(Warning::ManifestUnreadable {
                        path,
                        reason: e.to_string(),
                    });
                    continue;
                }
            };

            let found = match path.file_name().and_then(|n| n.to_str()) {
                Some("pyproject.toml") => match parse_pyproject(&content) {
                    Ok(found) => found,
                    Err(reason) => {
                        warnings.push(Warning::ManifestUnreadable { path, reason });
                        continue;
                    }
                },
                Some("requirements.txt") => parse_requirements(&content),
                _ => parse_csproj(&content),
            };

            for package in found {
                merge(&mut packages, package, &mut warnings);
            }
        }

        (packages, warnings)
    }

    /// Manifest candidates in sorted order, so that first-wins merging is
    /// deterministic across runs.
    fn manifest_files(&self) -> Vec<PathBuf> {
        let mut files = Vec::new();

        for root in &self.roots {
            let root = root.clone();
            let filter = self.filter.clone();
            let walker = WalkDir::new(&root).into_iter().filter_entry(move |entry| {
                let relative = entry.path().strip_prefix(&root).unwrap_or(entry.path());
                !filter.is_ignored(relative)
            });

            for entry in walker {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(e) => {
                        log::warn!("failed to read entry: {e}");
                        continue;
                    }
                };
                if !entry.file_type().is_file() {
                    continue;
                }
                if is_manifest(entry.path()) {
                    files.push(entry.path().to_path_buf());
                }
            }
        }

        files.sort();
        files.dedup();
        files
    }
}

fn is_manifest(path: &Path) -> bool {
    if path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("csproj"))
    {
        return true;
    }
    matches!(
        path.file_name().and_then(|n| n.to_str()),
        Some("pyproject.toml") | Some("requirements.txt")
    )
}

fn merge(packages: &mut Vec<ExternalPackage>, package: ExternalPackage, warnings: &mut Vec<Warning>) {
    if let Some(existing) = packages
        .iter_mut()
        .find(|p| p.language == package.language && p.name == package.name)
    {
        match (&existing.version, &package.version) {
            (Some(kept), Some(new)) if kept != new => warnings.push(Warning::VersionConflict {
                package: package.name,
                kept: kept.clone(),
                ignored: new.clone(),
            }),
            (None, Some(new)) => existing.version = Some(new.clone()),
            _ => {}
        }
        return;
    }
    packages.push(package);
}

fn parse_csproj(content: &str) -> Vec<ExternalPackage> {
    PACKAGE_REFERENCE_RE
        .captures_iter(content)
        .map(|captures| ExternalPackage {
            name: captures[1].to_string(),
            version: captures.get(2).map(|v| v.as_str().to_string()),
            language: Language::CSharp,
        })
        .collect()
}

fn parse_pyproject(content: &str) -> std::result::Result<Vec<ExternalPackage>, String> {
    let value: toml::Value = toml::from_str(content).map_err(|e| e.to_string())?;

    let Some(dependencies) = value
        .get("project")
        .and_then(|p| p.get("dependencies"))
        .and_then(|d| d.as_array())
    else {
        return Ok(Vec::new());
    };

    Ok(dependencies
        .iter()
        .filter_map(|d| d.as_str())
        .filter_map(parse_requirement)
        .collect())
}

fn parse_requirements(content: &str) -> Vec<ExternalPackage> {
    content
        .lines()
        .filter_map(parse_requirement)
        .collect()
}

/// One requirements-style specifier: `name`, `name==1.2`, `name>=2,<3`.
/// Only exact `==` pins carry a version; ranges leave it open.
fn parse_requirement(line: &str) -> Option<ExternalPackage> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') || line.starts_with('-') {
        return None;
    }

    let name: String = line
        .chars()
        .take_while(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | '.'))
        .collect();
    if name.is_empty() {
        return None;
    }

    let rest = &line[name.len()..];
    let version = rest
        .trim()
        .strip_prefix("==")
        .map(|v| {
            v.split(|c: char| c == ';' || c == ',' || c.is_whitespace())
                .next()
                .unwrap_or(v)
                .to_string()
        })
        .filter(|v| !v.is_empty());

    Some(ExternalPackage {
        name,
        version,
        language: Language::Python,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn csproj_package_references_are_parsed() {
        let content = r#"
<Project Sdk="Microsoft.NET.Sdk">
  <ItemGroup>
    <PackageReference Include="Newtonsoft.Json" Version="13.0.1" />
    <PackageReference Include="Serilog" Version="3.1.1" />
    <PackageReference Include="Pinless" />
  </ItemGroup>
</Project>
"#;
        let packages = parse_csproj(content);
        assert_eq!(packages.len(), 3);
        assert_eq!(packages[0].name, "Newtonsoft.Json");
        assert_eq!(packages[0].version.as_deref(), Some("13.0.1"));
        assert_eq!(packages[2].version, None);
    }

    #[test]
    fn pyproject_dependencies_are_parsed() {
        let content = r#"
[project]
name = "demo"
dependencies = ["requests==2.31.0", "flask>=2.0", "rich"]
"#;
        let packages = parse_pyproject(content).unwrap();
        assert_eq!(packages.len(), 3);
        assert_eq!(packages[0].name, "requests");
        assert_eq!(packages[0].version.as_deref(), Some("2.31.0"));
        assert_eq!(packages[1].name, "flask");
        assert_eq!(packages[1].version, None);
    }

    #[test]
    fn pyproject_without_project_section_is_empty_not_error() {
        let packages = parse_pyproject("[tool.black]\nline-length = 100\n").unwrap();
        assert!(packages.is_empty());
    }

    #[test]
    fn requirements_lines_skip_comments_and_options() {
        let content = "# pinned\nrequests==2.31.0\n-r other.txt\n\nflask\n";
        let packages = parse_requirements(content);
        assert_eq!(packages.len(), 2);
        assert_eq!(packages[0].name, "requests");
        assert_eq!(packages[1].name, "flask");
    }

    #[test]
    fn duplicate_declarations_keep_first_version_and_warn() {
        let temp = tempdir().unwrap();
        fs::write(
            temp.path().join("A.csproj"),
            r#"<PackageReference Include="Serilog" Version="3.1.1" />"#,
        )
        .unwrap();
        fs::write(
            temp.path().join("B.csproj"),
            r#"<PackageReference Include="Serilog" Version="2.12.0" />"#,
        )
        .unwrap();

        let reader =
            ManifestReader::new(&[temp.path().to_path_buf()], IgnoreFilter::default());
        let (packages, warnings) = reader.read();

        assert_eq!(packages.len(), 1);
        assert_eq!(packages[0].version.as_deref(), Some("3.1.1"));
        assert_eq!(warnings.len(), 1);
        assert!(matches!(
            &warnings[0],
            Warning::VersionConflict { package, kept, ignored }
                if package == "Serilog" && kept == "3.1.1" && ignored == "2.12.0"
        ));
    }

    #[test]
    fn ignored_directories_are_not_searched() {
        let temp = tempdir().unwrap();
        let vendored = temp.path().join("vendor");
        fs::create_dir_all(&vendored).unwrap();
        fs::write(
            vendored.join("Dep.csproj"),
            r#"<PackageReference Include="Hidden" Version="1.0.0" />"#,
        )
        .unwrap();

        let filter = IgnoreFilter::new(["vendor"], Vec::<String>::new());
        let reader = ManifestReader::new(&[temp.path().to_path_buf()], filter);
        let (packages, warnings) = reader.read();

        assert!(packages.is_empty());
        assert!(warnings.is_empty());
    }
}
