//! The Juportal pipeline: transform every document, collapse aliases, then
//! validate what the language rules could not decide.

pub mod config;
mod error;
pub mod orchestrator;
pub mod stats;
pub mod transform;

pub use config::PipelineConfig;
pub use error::PipelineError;
pub use orchestrator::{Pipeline, RunOutput};
pub use stats::RunStats;
pub use transform::{RecordTransformer, Transformed};
