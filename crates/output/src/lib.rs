//! # Slice Output
//!
//! Materializes a finished closure: copies the included files into a
//! destination directory and/or streams them into a zip archive, preserving
//! each file's root-relative path, and writes one dependency manifest per
//! language family plus an optional summary report.
//!
//! Path collisions (two roots mapping different files onto the same
//! output-relative path) are detected up front; the first file keeps the
//! slot, the rest are reported, never silently overwritten.

mod error;
mod materializer;
mod report;

pub use error::{OutputError, Result};
pub use materializer::{manifest_file_name, MaterializeSummary, Materializer};
pub use report::{render_markdown, Report};
