//! # Slice Index
//!
//! File discovery and the concurrent symbol-indexing pass.
//!
//! ## Pipeline
//!
//! ```text
//! Project roots
//!     │
//!     ├──> File Scanner (.gitignore aware, ignore-filter first)
//!     │      └─> Source files, sorted
//!     │
//!     └──> Symbol Index builder (parallel per-file scans)
//!            └─> name -> [(defining file, namespace)]
//! ```
//!
//! Workers scan files independently and return owned partial maps; a single
//! fold merges them into the read-only [`SymbolIndex`](slice_protocol::SymbolIndex)
//! consumed by the traversal.

mod builder;
mod error;
mod scanner;

pub use builder::build_symbol_index;
pub use error::{IndexError, Result};
pub use scanner::FileScanner;
