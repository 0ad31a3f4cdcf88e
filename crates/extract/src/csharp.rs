use crate::error::Result;
use crate::extractor::{Extractor, FileReferences};
use once_cell::sync::Lazy;
use regex::Regex;
use slice_protocol::{ExternalPackage, Language, SourceFile, SymbolIndex, Warning};
use std::collections::HashSet;
use std::sync::Arc;

/// Occurrences that denote a dependency on a type: construction,
/// base-list membership, generic arguments, attributes, typeof.
static USAGE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:new\s+|:\s*|typeof\s*\(|<|\[)\s*([A-Z][A-Za-z0-9_]*)").expect("usage regex")
});

/// Plain and static using directives (alias forms are skipped).
static USING_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^\s*using\s+(?:static\s+)?([A-Za-z_][A-Za-z0-9_.]*)\s*;").expect("using regex")
});

/// Index-based extraction for C#.
///
/// The language carries no per-file import of local code, so references are
/// implicit: the extractor scans for type usages and resolves each name
/// through the prebuilt symbol index. Names the index knows nothing about
/// are attributed to declared external packages where the file's using
/// directives allow it, and reported as unresolved otherwise.
pub struct CSharpExtractor {
    index: Arc<SymbolIndex>,
    declared: Vec<ExternalPackage>,
}

impl CSharpExtractor {
    pub fn new(index: Arc<SymbolIndex>, declared: Vec<ExternalPackage>) -> Self {
        let declared = declared
            .into_iter()
            .filter(|p| p.language == Language::CSharp)
            .collect();
        Self { index, declared }
    }

    fn declared_for_namespace(&self, namespace: &str) -> Option<&ExternalPackage> {
        self.declared.iter().find(|p| {
            namespace == p.name
                || namespace.starts_with(&format!("{}.", p.name))
                || p.name.starts_with(&format!("{namespace}."))
        })
    }

    fn declared_for_top_segment(&self, name: &str) -> Option<&ExternalPackage> {
        self.declared
            .iter()
            .find(|p| p.name.split('.').next() == Some(name))
    }

    /// Resolve the using directives first: a directive naming a declared
    /// package is an external edge; one naming an indexed namespace needs
    /// no edge of its own (type usages provide them); anything else that
    /// is not a platform namespace is unresolved.
    fn resolve_usings(
        &self,
        usings: &[String],
        file: &SourceFile,
        refs: &mut FileReferences,
    ) {
        for namespace in usings {
            if let Some(package) = self.declared_for_namespace(namespace) {
                refs.externals.push(package.clone());
                continue;
            }
            if self.index.has_namespace(namespace) {
                continue;
            }
            let top = namespace.split('.').next().unwrap_or(namespace);
            if PLATFORM_NAMESPACES.contains(&top) {
                continue;
            }
            refs.warnings.push(Warning::UnresolvedReference {
                path: file.path.clone(),
                reference: namespace.clone(),
            });
        }
    }

    fn resolve_usage(
        &self,
        name: &str,
        usings: &[String],
        file: &SourceFile,
        refs: &mut FileReferences,
    ) {
        let entries = self.index.lookup(name);

        // A type declared in this very file needs no edge.
        if entries.iter().any(|e| e.file == file.path) {
            return;
        }

        match entries.len() {
            0 => {
                if let Some(package) = self.declared_for_top_segment(name) {
                    refs.externals.push(package.clone());
                    return;
                }
                // Covered by a package-providing using directive: the
                // external edge was already emitted for the directive.
                if usings
                    .iter()
                    .any(|ns| self.declared_for_namespace(ns).is_some())
                {
                    return;
                }
                refs.warnings.push(Warning::UnresolvedReference {
                    path: file.path.clone(),
                    reference: name.to_string(),
                });
            }
            1 => refs.locals.push(entries[0].file.clone()),
            _ => {
                // Tie-break: a candidate whose namespace is explicitly
                // imported wins outright. Otherwise the first indexed entry
                // is chosen and the ambiguity is surfaced.
                if let Some(entry) = entries.iter().find(|e| {
                    e.namespace
                        .as_deref()
                        .is_some_and(|ns| usings.iter().any(|u| u == ns))
                }) {
                    refs.locals.push(entry.file.clone());
                    return;
                }

                let chosen = &entries[0];
                refs.warnings.push(Warning::AmbiguousSymbol {
                    path: file.path.clone(),
                    symbol: name.to_string(),
                    chosen: chosen.file.clone(),
                    candidates: entries.iter().map(|e| e.file.clone()).collect(),
                });
                refs.locals.push(chosen.file.clone());
            }
        }
    }
}

impl Extractor for CSharpExtractor {
    fn extract(&mut self, file: &SourceFile, content: &str) -> Result<FileReferences> {
        let mut refs = FileReferences::default();

        let usings: Vec<String> = USING_RE
            .captures_iter(content)
            .map(|c| c[1].to_string())
            .collect();

        self.resolve_usings(&usings, file, &mut refs);

        let mut seen: HashSet<&str> = HashSet::new();
        for captures in USAGE_RE.captures_iter(content) {
            let Some(name) = captures.get(1).map(|m| m.as_str()) else {
                continue;
            };
            if !seen.insert(name) {
                continue;
            }
            if COMMON_BCL_TYPES.contains(&name) {
                continue;
            }
            self.resolve_usage(name, &usings, file, &mut refs);
        }

        refs.dedup_locals();
        Ok(refs)
    }
}

/// Namespace roots owned by the platform; a using directive under these is
/// neither local nor an external package.
const PLATFORM_NAMESPACES: &[&str] = &["System", "Microsoft"];

/// Framework types that show up in usage positions constantly and are
/// never project-local. Keeping them out of the lookup avoids a wall of
/// unresolved-reference noise.
const COMMON_BCL_TYPES: &[&str] = &[
    "Action",
    "ArgumentException",
    "ArgumentNullException",
    "Attribute",
    "Console",
    "Convert",
    "DateTime",
    "DateTimeOffset",
    "Dictionary",
    "EventArgs",
    "Exception",
    "Func",
    "Guid",
    "HashSet",
    "IDisposable",
    "IEnumerable",
    "IList",
    "IReadOnlyDictionary",
    "IReadOnlyList",
    "InvalidOperationException",
    "KeyValuePair",
    "Lazy",
    "List",
    "Math",
    "NotImplementedException",
    "NotSupportedException",
    "Nullable",
    "Object",
    "Queue",
    "Random",
    "Stack",
    "String",
    "StringBuilder",
    "StringComparison",
    "Task",
    "TimeSpan",
    "Tuple",
    "Type",
    "Uri",
    "ValueTask",
];
