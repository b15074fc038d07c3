//! Digest assembly for infoia.
//!
//! [`Pipeline`] drives one run end to end. The stages it composes are usable
//! on their own: [`filter_new`] and [`deduplicate`] against the seen index,
//! [`categorize`] into per-category buckets, and [`assemble`] into the final
//! [`infoia_core::Digest`].

pub mod assemble;
pub mod categorize;
pub mod dedup;
pub mod export;
pub mod run;

pub use assemble::assemble;
pub use categorize::{categorize, Categorized, CategoryMap};
pub use dedup::{deduplicate, filter_new, DedupOutcome, DedupPolicy};
pub use export::{export_digest, export_file_name, ExportError, LATEST_FILE};
pub use run::{load_sources, Pipeline, RunError, RunOptions, RunReport, RunState, RunStats};
