use crate::error::{ExtractError, Result};
use crate::extractor::{Extractor, FileReferences};
use slice_protocol::{ExternalPackage, IgnoreFilter, Language, SourceFile, Warning};
use std::path::{Path, PathBuf};
use tree_sitter::{Node, Parser};

/// Import-based extraction for Python.
///
/// Walks the syntax tree for `import` and `from .. import` statements and
/// resolves each referenced module against the project roots: either a
/// direct `a/b/c.py` match or a package directory whose `__init__.py`
/// becomes the target. Modules that resolve nowhere locally and are not
/// part of the standard library are reported as external packages, keyed
/// by the top-level segment of the module path.
pub struct PythonExtractor {
    roots: Vec<PathBuf>,
    filter: IgnoreFilter,
    parser: Parser,
}

enum Resolution {
    File(PathBuf),
    Ignored,
    NotFound,
}

impl PythonExtractor {
    pub fn new(roots: &[PathBuf], filter: IgnoreFilter) -> Result<Self> {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_python::LANGUAGE.into())
            .map_err(|e| ExtractError::parse(format!("failed to set language: {e}")))?;

        Ok(Self {
            roots: roots.to_vec(),
            filter,
            parser,
        })
    }

    fn walk(&self, node: Node, content: &str, file: &SourceFile, refs: &mut FileReferences) {
        match node.kind() {
            "import_statement" => {
                // import a.b, x.y as z
                let mut cursor = node.walk();
                for child in node.named_children(&mut cursor) {
                    let module = match child.kind() {
                        "dotted_name" => Some(node_text(child, content)),
                        "aliased_import" => child
                            .child_by_field_name("name")
                            .map(|name| node_text(name, content)),
                        _ => None,
                    };
                    if let Some(module) = module {
                        self.handle_module(&module, file, refs);
                    }
                }
            }
            "import_from_statement" => self.handle_from_import(node, content, file, refs),
            _ => {}
        }

        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            self.walk(child, content, file, refs);
        }
    }

    fn handle_from_import(
        &self,
        node: Node,
        content: &str,
        file: &SourceFile,
        refs: &mut FileReferences,
    ) {
        let Some(module_node) = node.child_by_field_name("module_name") else {
            return;
        };

        let imported: Vec<String> = {
            let mut cursor = node.walk();
            node.children_by_field_name("name", &mut cursor)
                .filter_map(|name| match name.kind() {
                    "dotted_name" => Some(node_text(name, content)),
                    "aliased_import" => name
                        .child_by_field_name("name")
                        .map(|inner| node_text(inner, content)),
                    _ => None,
                })
                .collect()
        };

        match module_node.kind() {
            "dotted_name" => {
                let module = node_text(module_node, content);
                self.handle_module(&module, file, refs);
                // `from utils import db` may name a submodule rather than a
                // symbol; pick those up as well when they exist on disk.
                for name in &imported {
                    let dotted = format!("{module}.{name}");
                    if let Resolution::File(path) = self.resolve_module(&dotted) {
                        refs.locals.push(path);
                    }
                }
            }
            "relative_import" => {
                let text = node_text(module_node, content);
                let dots = text.chars().take_while(|c| *c == '.').count();
                let remainder = text.trim_start_matches('.');

                if dots > 1 {
                    refs.warnings.push(Warning::UnresolvedReference {
                        path: file.path.clone(),
                        reference: text,
                    });
                    return;
                }

                let Some(base) = file.path.parent() else {
                    return;
                };
                if remainder.is_empty() {
                    for name in &imported {
                        self.handle_relative(base, name, file, refs);
                    }
                } else {
                    self.handle_relative(base, remainder, file, refs);
                }
            }
            _ => {}
        }
    }

    /// Absolute module reference: local file, ignored local file, or
    /// external package.
    fn handle_module(&self, dotted: &str, file: &SourceFile, refs: &mut FileReferences) {
        match self.resolve_module(dotted) {
            Resolution::File(path) => refs.locals.push(path),
            Resolution::Ignored => refs.warnings.push(Warning::UnresolvedReference {
                path: file.path.clone(),
                reference: dotted.to_string(),
            }),
            Resolution::NotFound => {
                let top = dotted.split('.').next().unwrap_or(dotted);
                if !PYTHON_STDLIB.contains(&top) {
                    refs.externals
                        .push(ExternalPackage::new(top, Language::Python));
                }
            }
        }
    }

    /// `from . import name` / `from .pkg import x`, resolved against the
    /// importing file's own directory.
    fn handle_relative(
        &self,
        base: &Path,
        dotted: &str,
        file: &SourceFile,
        refs: &mut FileReferences,
    ) {
        let relative: PathBuf = dotted.split('.').collect();
        match self.resolve_candidate(&base.join(&relative)) {
            Resolution::File(path) => refs.locals.push(path),
            Resolution::Ignored | Resolution::NotFound => {
                refs.warnings.push(Warning::UnresolvedReference {
                    path: file.path.clone(),
                    reference: format!(".{dotted}"),
                });
            }
        }
    }

    fn resolve_module(&self, dotted: &str) -> Resolution {
        let relative: PathBuf = dotted.split('.').collect();
        for root in &self.roots {
            match self.resolve_candidate(&root.join(&relative)) {
                Resolution::NotFound => continue,
                resolved => return resolved,
            }
        }
        Resolution::NotFound
    }

    /// A candidate is a module file (`stem.py`) or a package directory
    /// containing `__init__.py`. Resolution never escapes the project
    /// roots, and an ignored match behaves as if the file were absent.
    fn resolve_candidate(&self, stem: &Path) -> Resolution {
        let file = stem.with_extension("py");
        if file.is_file() {
            return self.admit(file);
        }

        let init = stem.join("__init__.py");
        if init.is_file() {
            return self.admit(init);
        }

        Resolution::NotFound
    }

    fn admit(&self, path: PathBuf) -> Resolution {
        let relative = slice_protocol::relative_to_roots(&path, &self.roots);
        let probe = relative.as_deref().unwrap_or(&path);
        if self.filter.is_ignored(probe) {
            Resolution::Ignored
        } else {
            Resolution::File(path)
        }
    }
}

impl Extractor for PythonExtractor {
    fn extract(&mut self, file: &SourceFile, content: &str) -> Result<FileReferences> {
        let mut refs = FileReferences::default();

        let Some(tree) = self.parser.parse(content, None) else {
            refs.warnings.push(Warning::SyntaxError {
                path: file.path.clone(),
                detail: "parser returned no tree".to_string(),
            });
            return Ok(refs);
        };

        let root = tree.root_node();
        if root.has_error() {
            // Non-fatal: the file stays in the closure but contributes no
            // edges.
            refs.warnings.push(Warning::SyntaxError {
                path: file.path.clone(),
                detail: "invalid syntax".to_string(),
            });
            return Ok(refs);
        }

        self.walk(root, content, file, &mut refs);
        refs.dedup_locals();
        Ok(refs)
    }
}

fn node_text(node: Node, content: &str) -> String {
    content[node.start_byte()..node.end_byte()].to_string()
}

/// Top-level standard-library module names. An import whose first segment
/// is listed here is neither a local target nor an external package.
const PYTHON_STDLIB: &[&str] = &[
    "abc",
    "argparse",
    "array",
    "ast",
    "asyncio",
    "base64",
    "bisect",
    "builtins",
    "calendar",
    "collections",
    "concurrent",
    "configparser",
    "contextlib",
    "copy",
    "csv",
    "ctypes",
    "dataclasses",
    "datetime",
    "decimal",
    "difflib",
    "dis",
    "email",
    "enum",
    "errno",
    "fnmatch",
    "fractions",
    "functools",
    "gc",
    "getpass",
    "glob",
    "gzip",
    "hashlib",
    "heapq",
    "hmac",
    "html",
    "http",
    "importlib",
    "inspect",
    "io",
    "ipaddress",
    "itertools",
    "json",
    "logging",
    "lzma",
    "math",
    "mimetypes",
    "multiprocessing",
    "operator",
    "os",
    "pathlib",
    "pickle",
    "platform",
    "pprint",
    "queue",
    "random",
    "re",
    "secrets",
    "select",
    "shlex",
    "shutil",
    "signal",
    "site",
    "socket",
    "sqlite3",
    "ssl",
    "stat",
    "statistics",
    "string",
    "struct",
    "subprocess",
    "sys",
    "tarfile",
    "tempfile",
    "textwrap",
    "threading",
    "time",
    "timeit",
    "tkinter",
    "token",
    "tokenize",
    "traceback",
    "types",
    "typing",
    "unicodedata",
    "unittest",
    "urllib",
    "uuid",
    "venv",
    "warnings",
    "weakref",
    "xml",
    "zipfile",
    "zlib",
];
