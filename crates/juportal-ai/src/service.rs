//! Classification service abstraction for stage-2 validation.

use async_trait::async_trait;
use juportal_core::{ClassificationItem, Verdict};

/// Errors from a classification service call.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ClassifyError {
    #[error("classification service not available: {0}")]
    Unavailable(String),
    #[error("not authorised: {0}")]
    Unauthorized(String),
    #[error("rate limited: {0}")]
    RateLimited(String),
    #[error("timed out after {0}s")]
    Timeout(u64),
    #[error("server returned {status}: {body}")]
    Server { status: u16, body: String },
    #[error("transport error: {0}")]
    Transport(String),
    #[error("reply parse error: {0}")]
    Parse(String),
}

impl ClassifyError {
    /// Worth another attempt after a backoff.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::RateLimited(_) | Self::Timeout(_) | Self::Server { .. } | Self::Transport(_)
        )
    }
}

/// A service judging whether texts are written in their declared language.
///
/// One call per batch; implementations return one verdict per item they
/// could judge, keyed by `fileName`.
#[async_trait]
pub trait ClassificationService: Send + Sync {
    /// Cheap reachability / credentials check, done once before stage 2.
    async fn is_available(&self) -> bool;

    async fn classify(&self, items: &[ClassificationItem]) -> Result<Vec<Verdict>, ClassifyError>;
}
