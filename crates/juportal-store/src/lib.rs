//! Storage layer: raw documents in, flattened records and run artifacts out.

mod error;
pub use error::StoreError;

mod sink;
mod source;

pub use sink::{DEDUP_LOG, INVALID_FILES, LoadedRecords, OutputSink, RUN_STATS};
pub use source::DocumentSource;
