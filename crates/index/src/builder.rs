use crate::error::Result;
use once_cell::sync::Lazy;
use regex::Regex;
use slice_protocol::{SymbolEntry, SymbolIndex, Warning};
use std::collections::HashSet;
use std::path::PathBuf;

/// Type and member-carrier declarations: classes, interfaces, enums,
/// structs, records. Modifier prefixes are optional and unordered enough
/// in practice for this two-slot form.
static TYPE_DECL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b(?:(?:public|internal|private|protected|file)\s+)?(?:(?:sealed|abstract|static|partial|readonly)\s+)*(?:class|interface|enum|struct|record)\s+([A-Za-z_][A-Za-z0-9_]*)",
    )
    .expect("type declaration regex")
});

/// Block-scoped and file-scoped namespace declarations.
static NAMESPACE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^\s*namespace\s+([A-Za-z_][A-Za-z0-9_.]*)").expect("namespace regex")
});

/// Build the symbol index from the given files.
///
/// Every file is scanned independently by a worker task; each worker
/// returns an owned partial list of (name, entry) pairs, and a single fold
/// merges them here, concatenating entries per name so the index reflects
/// every definition. Files must be given in a stable (sorted) order: the
/// merge preserves it, which is what makes "first indexed entry"
/// deterministic for ambiguous names.
///
/// A file that cannot be read contributes no symbols and a warning; it
/// never aborts the pass.
pub async fn build_symbol_index(files: &[PathBuf]) -> Result<(SymbolIndex, Vec<Warning>)> {
    let mut index = SymbolIndex::new();
    let mut warnings = Vec::new();

    if files.is_empty() {
        return Ok((index, warnings));
    }

    // Scanning is a mix of IO and regex work; a small adaptive cap avoids
    // fan-out spikes on large trees.
    let max_concurrent = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .clamp(2, 8);

    for file_chunk in files.chunks(max_concurrent) {
        let mut tasks = Vec::with_capacity(file_chunk.len());
        for file_path in file_chunk {
            let file_path = file_path.clone();
            tasks.push(tokio::spawn(async move { scan_file(file_path).await }));
        }

        for task in tasks {
            match task.await {
                Ok(Ok(partial)) => {
                    index.record_file();
                    for (name, entry) in partial {
                        index.insert(name, entry);
                    }
                }
                Ok(Err((path, reason))) => {
                    warnings.push(Warning::UnreadableFile { path, reason });
                }
                Err(e) => {
                    return Err(crate::error::IndexError::TaskFailed(e.to_string()));
                }
            }
        }
    }

    log::info!(
        "symbol index built: {} names from {} files",
        index.symbol_count(),
        index.files_indexed()
    );
    Ok((index, warnings))
}

type PartialScan = std::result::Result<Vec<(String, SymbolEntry)>, (PathBuf, String)>;

/// Lightweight syntactic scan of one file, no full parse.
async fn scan_file(path: PathBuf) -> PartialScan {
    let content = match tokio::fs::read_to_string(&path).await {
        Ok(content) => content,
        Err(e) => return Err((path, e.to_string())),
    };

    Ok(scan_declarations(&path, &content))
}

fn scan_declarations(path: &PathBuf, content: &str) -> Vec<(String, SymbolEntry)> {
    // Namespace spans are approximated by declaration order: a type belongs
    // to the closest namespace declared above it.
    let namespaces: Vec<(usize, String)> = NAMESPACE_RE
        .captures_iter(content)
        .filter_map(|c| c.get(1).map(|m| (m.start(), m.as_str().to_string())))
        .collect();

    let mut seen: HashSet<String> = HashSet::new();
    let mut found = Vec::new();

    for captures in TYPE_DECL_RE.captures_iter(content) {
        let Some(name_match) = captures.get(1) else {
            continue;
        };
        let name = name_match.as_str().to_string();
        // Partial classes can redeclare a name inside one file; a single
        // entry per (file, name) is enough for resolution.
        if !seen.insert(name.clone()) {
            continue;
        }

        let namespace = namespaces
            .iter()
            .take_while(|(pos, _)| *pos < name_match.start())
            .last()
            .map(|(_, ns)| ns.clone());

        found.push((
            name,
            SymbolEntry {
                file: path.clone(),
                namespace,
            },
        ));
    }

    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::tempdir;

    #[tokio::test]
    async fn indexes_declarations_with_namespaces() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("Pedido.cs");
        fs::write(
            &path,
            r#"
namespace Loja.Pedidos
{
    public class PedidoService
    {
    }

    internal interface IPedidoRepository
    {
    }
}
"#,
        )
        .unwrap();

        let (index, warnings) = build_symbol_index(&[path.clone()]).await.unwrap();

        assert!(warnings.is_empty());
        assert_eq!(index.files_indexed(), 1);
        let entries = index.lookup("PedidoService");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].file, path);
        assert_eq!(entries[0].namespace.as_deref(), Some("Loja.Pedidos"));
        assert_eq!(index.lookup("IPedidoRepository").len(), 1);
    }

    #[tokio::test]
    async fn file_scoped_namespace_is_detected() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("Cliente.cs");
        fs::write(
            &path,
            "namespace Loja.Clientes;\n\npublic sealed record Cliente(string Nome);\n",
        )
        .unwrap();

        let (index, _) = build_symbol_index(&[path]).await.unwrap();
        let entries = index.lookup("Cliente");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].namespace.as_deref(), Some("Loja.Clientes"));
    }

    #[tokio::test]
    async fn same_name_in_two_files_yields_two_entries_in_scan_order() {
        let temp = tempdir().unwrap();
        let first = temp.path().join("a.cs");
        let second = temp.path().join("b.cs");
        fs::write(&first, "namespace A { class Widget {} }").unwrap();
        fs::write(&second, "namespace B { class Widget {} }").unwrap();

        let (index, _) = build_symbol_index(&[first.clone(), second.clone()])
            .await
            .unwrap();

        let entries = index.lookup("Widget");
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].file, first);
        assert_eq!(entries[1].file, second);
    }

    #[tokio::test]
    async fn unreadable_file_contributes_warning_not_error() {
        let temp = tempdir().unwrap();
        let good = temp.path().join("ok.cs");
        fs::write(&good, "class Ok {}").unwrap();
        let missing = temp.path().join("gone.cs");

        let (index, warnings) = build_symbol_index(&[good, missing.clone()]).await.unwrap();

        assert_eq!(index.lookup("Ok").len(), 1);
        assert_eq!(warnings.len(), 1);
        assert!(matches!(
            &warnings[0],
            Warning::UnreadableFile { path, .. } if path == &missing
        ));
    }

    #[tokio::test]
    async fn partial_class_in_one_file_is_indexed_once() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("Split.cs");
        fs::write(
            &path,
            "namespace N { partial class Split {} partial class Split {} }",
        )
        .unwrap();

        let (index, _) = build_symbol_index(&[path]).await.unwrap();
        assert_eq!(index.lookup("Split").len(), 1);
    }
}
