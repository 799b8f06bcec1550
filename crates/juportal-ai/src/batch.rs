//! Stage-2 batch validation of records left uncertain by the rule validator.
//!
//! Uncertain records are grouped into fixed-size batches; each batch is one
//! service call. Batches run concurrently up to a semaphore limit, every call
//! has a timeout, and transient failures are retried with backoff. A batch
//! that still fails leaves its records uncertain (`isValid = false`,
//! method `unresolved`) and is reported, never raised.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use juportal_core::{
    ClassificationItem, Issue, IssueKind, TransformedRecord, ValidationMethod, ValidationStatus,
    Verdict,
};
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use crate::prompt;
use crate::retry::RetryPolicy;
use crate::service::{ClassificationService, ClassifyError};

#[derive(Debug, Clone, Copy)]
pub struct BatchConfig {
    pub batch_size: usize,
    pub max_concurrency: usize,
    pub request_timeout: Duration,
    pub retry: RetryPolicy,
    /// Minimum confidence for a positive verdict to count as valid.
    pub accept_threshold: f32,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            batch_size: 10,
            max_concurrency: 5,
            request_timeout: Duration::from_secs(30),
            retry: RetryPolicy::default(),
            accept_threshold: 0.8,
        }
    }
}

/// What stage 2 did.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stage2Report {
    /// Uncertain records submitted (or that would have been).
    pub submitted: usize,
    /// Records that received a verdict.
    pub validated: usize,
    pub accepted: usize,
    pub rejected: usize,
    /// Records still uncertain afterwards.
    pub unresolved: usize,
    pub batches: usize,
    pub degraded_batches: usize,
    pub service_unavailable: bool,
    #[serde(skip)]
    pub issues: Vec<Issue>,
}

impl Stage2Report {
    pub fn is_degraded(&self) -> bool {
        self.service_unavailable || self.degraded_batches > 0
    }
}

pub struct BatchValidator {
    service: Arc<dyn ClassificationService>,
    config: BatchConfig,
}

impl BatchValidator {
    pub fn new(service: Arc<dyn ClassificationService>, config: BatchConfig) -> Self {
        Self { service, config }
    }

    /// Validate every uncertain record in place.
    pub async fn validate(&self, records: &mut [TransformedRecord]) -> Stage2Report {
        let pending: Vec<usize> = records
            .iter()
            .enumerate()
            .filter(|(_, r)| r.is_uncertain())
            .map(|(i, _)| i)
            .collect();

        let mut report = Stage2Report {
            submitted: pending.len(),
            ..Default::default()
        };
        if pending.is_empty() {
            return report;
        }

        for &i in &pending {
            let confidence = records[i].validation_confidence;
            records[i].set_validation(ValidationStatus::Uncertain, ValidationMethod::Unresolved, confidence);
        }

        if !self.service.is_available().await {
            warn!(records = pending.len(), "classification service unavailable, leaving records unresolved");
            report.service_unavailable = true;
            report.unresolved = pending.len();
            report.issues.push(Issue::new(
                None,
                IssueKind::ValidationUnavailable,
                format!("service unavailable; {} records left unresolved", pending.len()),
            ));
            return report;
        }

        let batches: Vec<Vec<usize>> = pending
            .chunks(self.config.batch_size.max(1))
            .map(<[usize]>::to_vec)
            .collect();
        report.batches = batches.len();
        info!(
            records = pending.len(),
            batches = batches.len(),
            concurrency = self.config.max_concurrency,
            "starting stage-2 validation"
        );

        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrency.max(1)));
        let calls = batches.iter().map(|batch| {
            let items: Vec<ClassificationItem> = batch.iter().map(|&i| prompt::item_for(&records[i])).collect();
            let semaphore = Arc::clone(&semaphore);
            async move {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(e) => return Err(ClassifyError::Unavailable(e.to_string())),
                };
                self.call_with_retry(&items).await
            }
        });
        let outcomes = join_all(calls).await;

        for (batch, outcome) in batches.iter().zip(outcomes) {
            match outcome {
                Ok(verdicts) => self.apply(records, batch, verdicts, &mut report),
                Err(e) => {
                    warn!(records = batch.len(), error = %e, "batch abandoned");
                    report.degraded_batches += 1;
                    report.unresolved += batch.len();
                    for &i in batch {
                        report.issues.push(Issue::for_file(
                            &records[i].file_name,
                            IssueKind::ValidationUnavailable,
                            e.to_string(),
                        ));
                    }
                }
            }
        }

        info!(
            validated = report.validated,
            accepted = report.accepted,
            rejected = report.rejected,
            unresolved = report.unresolved,
            degraded_batches = report.degraded_batches,
            "stage-2 validation done"
        );
        report
    }

    async fn call_with_retry(&self, items: &[ClassificationItem]) -> Result<Vec<Verdict>, ClassifyError> {
        let policy = self.config.retry;
        let timeout = self.config.request_timeout;
        let mut attempt = 0;
        loop {
            let outcome = match tokio::time::timeout(timeout, self.service.classify(items)).await {
                Ok(result) => result,
                Err(_) => Err(ClassifyError::Timeout(timeout.as_secs())),
            };
            match outcome {
                Ok(verdicts) => return Ok(verdicts),
                Err(e) if e.is_transient() && attempt + 1 < policy.attempts() => {
                    let delay = policy.next_delay(attempt);
                    debug!(attempt, delay_ms = delay.as_millis() as u64, error = %e, "retrying batch");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn apply(
        &self,
        records: &mut [TransformedRecord],
        batch: &[usize],
        verdicts: Vec<Verdict>,
        report: &mut Stage2Report,
    ) {
        let by_file: HashMap<String, Verdict> = verdicts
            .into_iter()
            .map(|v| (v.file_name.clone(), v))
            .collect();

        for &i in batch {
            let record = &mut records[i];
            let Some(verdict) = by_file.get(&record.file_name) else {
                report.unresolved += 1;
                report.issues.push(Issue::for_file(
                    &record.file_name,
                    IssueKind::ValidationUnavailable,
                    "no verdict returned for record",
                ));
                continue;
            };
            let accepted = verdict.is_valid && verdict.confidence >= self.config.accept_threshold;
            let status = if accepted {
                report.accepted += 1;
                ValidationStatus::Valid
            } else {
                report.rejected += 1;
                ValidationStatus::Invalid
            };
            record.set_validation(status, ValidationMethod::Llm, verdict.confidence);
            report.validated += 1;
        }
    }
}
