use petgraph::graph::{DiGraph, NodeIndex};
use slice_protocol::SourceFile;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Kind of dependency edge between two files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeKind {
    /// Explicit import statement (import-based languages)
    Imports,

    /// Implicit type usage resolved through the symbol index
    Uses,
}

/// The closure as a directed graph of files.
///
/// Nodes are deduplicated by absolute path through a side map, mirroring
/// how the traversal deduplicates visits.
#[derive(Debug, Default)]
pub struct FileGraph {
    graph: DiGraph<SourceFile, EdgeKind>,
    path_index: HashMap<PathBuf, NodeIndex>,
}

impl FileGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file node, returning the existing index when the path is
    /// already present.
    pub fn add_file(&mut self, file: SourceFile) -> NodeIndex {
        if let Some(&idx) = self.path_index.get(&file.path) {
            return idx;
        }
        let path = file.path.clone();
        let idx = self.graph.add_node(file);
        self.path_index.insert(path, idx);
        idx
    }

    /// Add an edge between two known files. Unknown endpoints are a no-op.
    pub fn add_edge(&mut self, from: &Path, to: &Path, kind: EdgeKind) {
        let (Some(&from_idx), Some(&to_idx)) =
            (self.path_index.get(from), self.path_index.get(to))
        else {
            return;
        };
        self.graph.add_edge(from_idx, to_idx, kind);
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.path_index.contains_key(path)
    }

    /// Files directly depended on by `path`.
    pub fn dependencies_of(&self, path: &Path) -> Vec<&SourceFile> {
        let Some(&idx) = self.path_index.get(path) else {
            return Vec::new();
        };
        self.graph
            .neighbors_directed(idx, petgraph::Direction::Outgoing)
            .filter_map(|n| self.graph.node_weight(n))
            .collect()
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }
}
