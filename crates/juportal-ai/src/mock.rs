//! Mock classification service for tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use juportal_core::{ClassificationItem, Verdict};

use crate::service::{ClassificationService, ClassifyError};

/// Scripted [`ClassificationService`].
///
/// Answers from per-file verdicts, then an optional default verdict; items
/// with neither get no verdict. Failures can be permanent or limited to the
/// first `n` calls.
pub struct MockClassifier {
    available: bool,
    verdicts: HashMap<String, (bool, f32)>,
    default: Option<(bool, f32)>,
    failure: Option<ClassifyError>,
    failures_left: AtomicUsize,
    delay: Duration,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    batch_sizes: Mutex<Vec<usize>>,
}

impl MockClassifier {
    /// A mock that reports as available.
    pub fn available() -> Self {
        Self {
            available: true,
            verdicts: HashMap::new(),
            default: None,
            failure: None,
            failures_left: AtomicUsize::new(0),
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            batch_sizes: Mutex::new(Vec::new()),
        }
    }

    /// A mock that reports as unavailable.
    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::available()
        }
    }

    pub fn with_verdict(mut self, file_name: impl Into<String>, is_valid: bool, confidence: f32) -> Self {
        self.verdicts.insert(file_name.into(), (is_valid, confidence));
        self
    }

    /// Verdict for every item without a specific one.
    pub fn with_default(mut self, is_valid: bool, confidence: f32) -> Self {
        self.default = Some((is_valid, confidence));
        self
    }

    /// Fail every call.
    pub fn with_failure(mut self, error: ClassifyError) -> Self {
        self.failure = Some(error);
        self.failures_left = AtomicUsize::new(usize::MAX);
        self
    }

    /// Fail the first `n` calls, then answer normally.
    pub fn with_failures(mut self, n: usize, error: ClassifyError) -> Self {
        self.failure = Some(error);
        self.failures_left = AtomicUsize::new(n);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn batch_sizes(&self) -> Vec<usize> {
        self.batch_sizes.lock().map(|v| v.clone()).unwrap_or_default()
    }

    fn take_failure(&self) -> Option<ClassifyError> {
        let error = self.failure.as_ref()?;
        self.failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .ok()
            .map(|_| error.clone())
    }

    fn answer(&self, items: &[ClassificationItem]) -> Vec<Verdict> {
        items
            .iter()
            .filter_map(|item| {
                let (is_valid, confidence) = self
                    .verdicts
                    .get(&item.file_name)
                    .copied()
                    .or(self.default)?;
                Some(Verdict {
                    file_name: item.file_name.clone(),
                    is_valid,
                    confidence,
                    explanation: "mock".into(),
                    detected_language: None,
                })
            })
            .collect()
    }
}

#[async_trait]
impl ClassificationService for MockClassifier {
    async fn is_available(&self) -> bool {
        self.available
    }

    async fn classify(&self, items: &[ClassificationItem]) -> Result<Vec<Verdict>, ClassifyError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut sizes) = self.batch_sizes.lock() {
            sizes.push(items.len());
        }
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let result = match self.take_failure() {
            Some(error) => Err(error),
            None => Ok(self.answer(items)),
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}
