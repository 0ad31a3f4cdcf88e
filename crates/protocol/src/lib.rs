//! # Slice Protocol
//!
//! Shared data model for the extraction pipeline.
//!
//! ```text
//! ExtractionJob
//!     │
//!     ├──> Ignore Filter (pure path predicate)
//!     │
//!     ├──> Symbol Index (name -> defining files)
//!     │
//!     └──> ExtractionResult
//!            ├─ included files (with entry attribution)
//!            ├─ external packages (deduplicated, first version wins)
//!            └─ warnings
//! ```
//!
//! Every component receives this state as explicit, immutable context so
//! that independent jobs can run in the same process without interference.

mod filters;
mod job;
mod symbols;
mod types;

pub use filters::{IgnoreFilter, DEFAULT_IGNORE_DIRS};
pub use job::{ExtractionJob, JobError, OutputSpec, RecursionPolicy};
pub use symbols::{SymbolEntry, SymbolIndex};
pub use types::{
    relative_to_roots, ExternalPackage, ExtractionResult, IncludedFile, Language, SourceFile,
    Warning,
};
