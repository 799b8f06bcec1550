//! Language validation: n-gram detection for the rule stage, and the
//! batched classification-service stage for records the rules leave uncertain.

pub mod batch;
pub mod detector;
pub mod languages;
pub mod mock;
pub mod prompt;
pub mod retry;
pub mod service;
pub mod stage1;

#[cfg(test)]
mod fixtures;

pub use batch::{BatchConfig, BatchValidator, Stage2Report};
pub use detector::Detector;
pub use mock::MockClassifier;
pub use retry::RetryPolicy;
pub use service::{ClassificationService, ClassifyError};
pub use stage1::{RuleValidator, RuleVerdict};
