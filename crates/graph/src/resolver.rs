use crate::error::Result;
use crate::graph::{EdgeKind, FileGraph};
use slice_extract::{CSharpExtractor, Extractor, FileReferences, PythonExtractor};
use slice_protocol::{
    relative_to_roots, ExternalPackage, ExtractionResult, IgnoreFilter, IncludedFile, Language,
    RecursionPolicy, SourceFile, SymbolIndex, Warning,
};
use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};
use std::path::PathBuf;
use std::sync::Arc;

/// The finished closure: the result consumed by the materializer plus the
/// file graph it was derived from.
#[derive(Debug)]
pub struct Resolution {
    pub result: ExtractionResult,
    pub graph: FileGraph,
}

struct QueueItem {
    path: PathBuf,
    depth: usize,
    entry: String,
}

/// Breadth-first closure computation across entry files and project roots.
///
/// All job-wide state (roots, ignore patterns, symbol index, declared
/// packages) is handed in at construction and treated as immutable; the
/// traversal loop is the only writer of the visited set and the result.
pub struct DependencyResolver {
    roots: Vec<PathBuf>,
    filter: IgnoreFilter,
    policy: RecursionPolicy,
    declared: Vec<ExternalPackage>,
    python: PythonExtractor,
    csharp: Option<CSharpExtractor>,
}

impl DependencyResolver {
    pub fn new(
        roots: &[PathBuf],
        filter: IgnoreFilter,
        policy: RecursionPolicy,
        index: Option<Arc<SymbolIndex>>,
        declared: Vec<ExternalPackage>,
    ) -> Result<Self> {
        let python = PythonExtractor::new(roots, filter.clone())?;
        let csharp = index.map(|index| CSharpExtractor::new(index, declared.clone()));

        Ok(Self {
            roots: roots.to_vec(),
            filter,
            policy,
            declared,
            python,
            csharp,
        })
    }

    /// Compute the closure reachable from `entries`.
    ///
    /// Each file is parsed at most once regardless of how many edges point
    /// at it; attribution goes to the entry whose traversal discovered the
    /// file first.
    pub fn resolve(&mut self, entries: &[PathBuf]) -> Result<Resolution> {
        let mut result = ExtractionResult::default();
        let mut graph = FileGraph::new();

        let mut visited: HashSet<PathBuf> = HashSet::new();
        let mut attribution: HashMap<PathBuf, BTreeSet<String>> = HashMap::new();
        let mut order: Vec<PathBuf> = Vec::new();
        let mut queue: VecDeque<QueueItem> = VecDeque::new();

        // Seed the queue with deduplicated entries at depth 0.
        let mut seeded: HashSet<PathBuf> = HashSet::new();
        for entry in entries {
            if !seeded.insert(entry.clone()) {
                continue;
            }
            let label = self.entry_label(entry);
            let probe = relative_to_roots(entry, &self.roots);
            if self
                .filter
                .is_ignored(probe.as_deref().unwrap_or_else(|| entry.as_path()))
            {
                result.add_warning(Warning::EntryIgnored {
                    path: entry.clone(),
                });
                continue;
            }
            attribution
                .entry(entry.clone())
                .or_default()
                .insert(label.clone());
            queue.push_back(QueueItem {
                path: entry.clone(),
                depth: 0,
                entry: label,
            });
        }

        while let Some(item) = queue.pop_front() {
            if visited.contains(&item.path) {
                continue;
            }
            visited.insert(item.path.clone());

            let Some(source) = SourceFile::identify(&item.path, &self.roots) else {
                log::warn!(
                    "{} lies under none of the project roots, skipping",
                    item.path.display()
                );
                continue;
            };

            log::debug!(
                "visiting {} (depth {})",
                source.relative.display(),
                item.depth
            );
            graph.add_file(source.clone());
            order.push(item.path.clone());

            // Under direct-only, files past the entries are included but
            // never expanded.
            if self.policy == RecursionPolicy::DirectOnly && item.depth >= 1 {
                continue;
            }

            let content = match std::fs::read_to_string(&item.path) {
                Ok(content) => content,
                Err(e) => {
                    result.add_warning(Warning::UnreadableFile {
                        path: item.path.clone(),
                        reason: e.to_string(),
                    });
                    continue;
                }
            };

            let refs = self.extract(&source, &content)?;
            let edge_kind = match source.language {
                Language::CSharp => EdgeKind::Uses,
                _ => EdgeKind::Imports,
            };

            for warning in refs.warnings {
                result.add_warning(warning);
            }
            for package in refs.externals {
                result.add_external(self.with_declared_version(package));
            }
            for target in refs.locals {
                if let Some(target_file) = SourceFile::identify(&target, &self.roots) {
                    graph.add_file(target_file);
                    graph.add_edge(&item.path, &target, edge_kind);
                } else {
                    log::warn!(
                        "resolved target {} lies under none of the project roots",
                        target.display()
                    );
                    continue;
                }

                if !visited.contains(&target) && !attribution.contains_key(&target) {
                    attribution
                        .entry(target.clone())
                        .or_default()
                        .insert(item.entry.clone());
                    queue.push_back(QueueItem {
                        path: target,
                        depth: item.depth + 1,
                        entry: item.entry.clone(),
                    });
                }
            }
        }

        for path in order {
            let Some(source) = SourceFile::identify(&path, &self.roots) else {
                continue;
            };
            let entries = attribution.remove(&path).unwrap_or_default();
            result.files.push(IncludedFile {
                file: source,
                entries,
            });
        }

        result.normalize();
        log::info!(
            "closure complete: {} files, {} external packages, {} warnings ({} graph edges)",
            result.files.len(),
            result.external.len(),
            result.warnings.len(),
            graph.edge_count()
        );

        Ok(Resolution { result, graph })
    }

    fn extract(&mut self, source: &SourceFile, content: &str) -> Result<FileReferences> {
        match source.language {
            Language::Python => Ok(self.python.extract(source, content)?),
            Language::CSharp => match &mut self.csharp {
                Some(csharp) => Ok(csharp.extract(source, content)?),
                None => {
                    log::debug!(
                        "no symbol index for this job, {} contributes no edges",
                        source.relative.display()
                    );
                    Ok(FileReferences::default())
                }
            },
            Language::Unknown => Ok(FileReferences::default()),
        }
    }

    /// Versions come from the manifest reader, never from usage sites.
    fn with_declared_version(&self, mut package: ExternalPackage) -> ExternalPackage {
        if package.version.is_some() {
            return package;
        }
        let wanted = normalized(&package.name);
        if let Some(declared) = self
            .declared
            .iter()
            .find(|d| d.language == package.language && normalized(&d.name) == wanted)
        {
            package.version = declared.version.clone();
        }
        package
    }

    fn entry_label(&self, entry: &std::path::Path) -> String {
        relative_to_roots(entry, &self.roots)
            .unwrap_or_else(|| entry.to_path_buf())
            .display()
            .to_string()
    }
}

/// Package-name comparison form: case-insensitive with `-`/`_` folded.
fn normalized(name: &str) -> String {
    name.to_lowercase().replace('-', "_")
}
