//! # Slice Graph
//!
//! Dependency-closure computation over one or more entry files.
//!
//! ## Architecture
//!
//! ```text
//! Entry files
//!     │
//!     ├──> Work queue (breadth-first, depth-tagged)
//!     │      ├─ visited set: each file parsed at most once
//!     │      ├─ per-language extractor dispatch
//!     │      └─ first-discovery entry attribution
//!     │
//!     ├──> File Graph (petgraph)
//!     │      ├─ Nodes: source files
//!     │      └─ Edges: import / type-usage references
//!     │
//!     └──> ExtractionResult
//!            ├─ included files, external packages
//!            └─ warnings
//! ```
//!
//! Cycles close naturally through the visited set; a diamond-shaped import
//! graph parses the shared file once no matter how many edges point at it.

mod error;
mod graph;
mod resolver;

pub use error::{GraphError, Result};
pub use graph::{EdgeKind, FileGraph};
pub use resolver::{DependencyResolver, Resolution};
