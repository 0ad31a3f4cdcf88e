use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// One declaration site of a type or symbol name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolEntry {
    /// File the symbol is declared in
    pub file: PathBuf,

    /// Enclosing namespace or module, when one is declared
    pub namespace: Option<String>,
}

/// Read-only map from declared symbol name to its declaration sites.
///
/// Built once per job by the concurrent indexing pass and never mutated
/// afterwards. Several entries for one name represent genuine ambiguity;
/// entries keep insertion order, so "first indexed entry" is deterministic
/// as long as the indexing pass feeds files in a stable order.
#[derive(Debug, Clone, Default)]
pub struct SymbolIndex {
    map: HashMap<String, Vec<SymbolEntry>>,
    namespaces: std::collections::HashSet<String>,
    files: usize,
}

impl SymbolIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a declaration site for `name`.
    pub fn insert(&mut self, name: impl Into<String>, entry: SymbolEntry) {
        if let Some(namespace) = &entry.namespace {
            self.namespaces.insert(namespace.clone());
        }
        self.map.entry(name.into()).or_default().push(entry);
    }

    /// True when `prefix` is a declared namespace or an ancestor of one.
    pub fn has_namespace(&self, prefix: &str) -> bool {
        if self.namespaces.contains(prefix) {
            return true;
        }
        self.namespaces
            .iter()
            .any(|ns| ns.len() > prefix.len() && ns.starts_with(prefix) && ns.as_bytes()[prefix.len()] == b'.')
    }

    /// All declaration sites for `name`, in index order.
    pub fn lookup(&self, name: &str) -> &[SymbolEntry] {
        self.map.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of distinct symbol names.
    pub fn symbol_count(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Number of files that contributed symbols.
    pub fn files_indexed(&self) -> usize {
        self.files
    }

    pub fn record_file(&mut self) {
        self.files += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_preserves_insertion_order() {
        let mut index = SymbolIndex::new();
        index.insert(
            "PedidoService",
            SymbolEntry {
                file: PathBuf::from("/a/PedidoService.cs"),
                namespace: Some("Loja.Pedidos".into()),
            },
        );
        index.insert(
            "PedidoService",
            SymbolEntry {
                file: PathBuf::from("/b/PedidoService.cs"),
                namespace: Some("Loja.Legacy".into()),
            },
        );

        let entries = index.lookup("PedidoService");
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].file, PathBuf::from("/a/PedidoService.cs"));
        assert!(index.lookup("Missing").is_empty());
        assert_eq!(index.symbol_count(), 1);
    }
}
