//! Pipeline orchestration: transform-all → deduplicate → validate-uncertain.
//!
//! Stage boundaries are barriers. Stage 1 runs the record transformer over
//! all documents on a rayon pool, collecting results by value; deduplication
//! needs the complete record set; stage 2 only sees the survivors.

use std::path::Path;
use std::sync::Arc;

use juportal_ai::{BatchValidator, ClassificationService};
use juportal_core::dedup::SelectionReason;
use juportal_core::{DedupDecision, Issue, IssueKind, LabelTable, RawDocument, TransformedRecord, deduplicate};
use juportal_store::{DocumentSource, OutputSink};
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::config::PipelineConfig;
use crate::stats::RunStats;
use crate::transform::{RecordTransformer, Transformed};
use crate::PipelineError;

/// Final state of a run.
#[derive(Debug)]
pub struct RunOutput {
    /// Surviving records, ordered by file name.
    pub records: Vec<TransformedRecord>,
    pub dedup_log: Vec<DedupDecision>,
    pub stats: RunStats,
}

enum Stage1 {
    Record(Box<TransformedRecord>, Vec<Issue>),
    Skipped(String),
    Failed(String, String),
}

pub struct Pipeline {
    config: PipelineConfig,
    transformer: RecordTransformer,
    service: Arc<dyn ClassificationService>,
    pool: Option<rayon::ThreadPool>,
}

impl Pipeline {
    pub fn new(config: PipelineConfig, service: Arc<dyn ClassificationService>) -> Result<Self, PipelineError> {
        let table = LabelTable::load(config.mapping_table.as_deref());
        let transformer = RecordTransformer::new(table, config.rule_validator(), &config.skip_decision_types);
        let pool = match config.workers {
            Some(n) if n > 0 => Some(rayon::ThreadPoolBuilder::new().num_threads(n).build()?),
            _ => None,
        };
        Ok(Self {
            config,
            transformer,
            service,
            pool,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Full run over an input directory, writing every output artifact.
    ///
    /// Only an unusable input root or output directory is an error; bad
    /// documents are counted and reported in the returned statistics.
    pub async fn run(&self, input: &Path, output: &Path) -> Result<RunStats, PipelineError> {
        let source = DocumentSource::open(input)?;
        let sink = OutputSink::create(output)?;
        let paths = source.list()?;

        let mut stats = RunStats::new();
        let records = self.stage1(&paths, |path| load(&source, path), &mut stats);
        let out = self.finish_run(records, stats).await;

        write_outputs(&sink, &out.records, &out.dedup_log)?;
        sink.write_stats(&out.stats)?;
        Ok(out.stats)
    }

    /// Run all stages over documents already in memory. Nothing is written.
    pub async fn run_documents(&self, documents: Vec<(String, RawDocument)>) -> RunOutput {
        let mut stats = RunStats::new();
        let records = self.stage1(&documents, |(name, doc)| (name.clone(), Ok(doc.clone())), &mut stats);
        self.finish_run(records, stats).await
    }

    /// Resume: reload a previous output directory and run stage 2 again over
    /// the records still uncertain. Deduplication is not repeated.
    pub async fn revalidate(&self, output: &Path) -> Result<RunStats, PipelineError> {
        let sink = OutputSink::create(output)?;
        let loaded = sink.load_records()?;

        let mut stats = RunStats::new();
        for (file, reason) in loaded.rejected {
            stats.failed += 1;
            stats.record_issue(Issue::for_file(&file, IssueKind::Extraction, reason));
        }
        let mut records = loaded.records;
        stats.processed = records.len();
        let pending: Vec<bool> = records.iter().map(TransformedRecord::is_uncertain).collect();
        let uncertain = pending.iter().filter(|&&p| p).count();
        info!(records = records.len(), uncertain, "resuming stage 2");

        self.stage2(&mut records, &mut stats).await;

        for (record, _) in records.iter().zip(&pending).filter(|&(_, &p)| p) {
            sink.write_record(record)?;
        }
        sink.write_invalid_list(&records)?;
        stats.finish();
        sink.write_stats(&stats)?;
        Ok(stats)
    }

    fn stage1<T, F>(&self, inputs: &[T], load: F, stats: &mut RunStats) -> Vec<TransformedRecord>
    where
        T: Sync,
        F: Fn(&T) -> (String, Result<RawDocument, String>) + Sync,
    {
        let work = || -> Vec<Stage1> {
            inputs
                .par_iter()
                .map(|input| {
                    let (file_name, doc) = load(input);
                    match doc {
                        Ok(doc) => match self.transformer.transform(&file_name, &doc) {
                            Transformed::Record { record, issues } => Stage1::Record(record, issues),
                            Transformed::Skipped { file_name, .. } => Stage1::Skipped(file_name),
                        },
                        Err(detail) => Stage1::Failed(file_name, detail),
                    }
                })
                .collect()
        };
        let results = match &self.pool {
            Some(pool) => pool.install(work),
            None => work(),
        };

        let mut records = Vec::with_capacity(results.len());
        for result in results {
            match result {
                Stage1::Record(record, issues) => {
                    stats.processed += 1;
                    stats.issues.extend(issues);
                    records.push(*record);
                }
                Stage1::Skipped(file) => {
                    debug!(file = %file, "skipped");
                    stats.skipped += 1;
                }
                Stage1::Failed(file, detail) => {
                    warn!(file = %file, error = %detail, "document failed");
                    stats.failed += 1;
                    stats.record_issue(Issue::for_file(&file, IssueKind::Extraction, detail));
                }
            }
        }
        info!(
            processed = stats.processed,
            skipped = stats.skipped,
            failed = stats.failed,
            "stage 1 done"
        );
        records
    }

    async fn finish_run(&self, records: Vec<TransformedRecord>, mut stats: RunStats) -> RunOutput {
        let outcome = deduplicate(records);
        stats.deduplicated_out = outcome.log.iter().map(|d| d.removed_files.len()).sum();
        for decision in outcome.log.iter().filter(|d| d.reason == SelectionReason::Indistinguishable) {
            stats.record_issue(Issue::for_file(
                &decision.canonical_file,
                IssueKind::DedupAmbiguous,
                format!(
                    "kept over {} by content order; candidates identical on every criterion",
                    decision.removed_files.join(", ")
                ),
            ));
        }
        info!(
            survivors = outcome.survivors.len(),
            removed = stats.deduplicated_out,
            components = outcome.log.len(),
            "deduplication done"
        );

        let mut records = outcome.survivors;
        self.stage2(&mut records, &mut stats).await;
        stats.finish();

        RunOutput {
            records,
            dedup_log: outcome.log,
            stats,
        }
    }

    async fn stage2(&self, records: &mut [TransformedRecord], stats: &mut RunStats) {
        let validator = BatchValidator::new(Arc::clone(&self.service), self.config.batch_config());
        let mut report = validator.validate(records).await;
        stats.issues.append(&mut report.issues);
        stats.stage2 = report;
        stats.tally_validation(records);
    }
}

fn load(source: &DocumentSource, path: &Path) -> (String, Result<RawDocument, String>) {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let doc = source.read(path).map_err(|e| e.to_string());
    (file_name, doc)
}

fn write_outputs(
    sink: &OutputSink,
    records: &[TransformedRecord],
    log: &[DedupDecision],
) -> Result<(), PipelineError> {
    for record in records {
        sink.write_record(record)?;
    }
    sink.append_dedup_log(log)?;
    let invalid = sink.write_invalid_list(records)?;
    info!(
        dir = %sink.dir().display(),
        records = records.len(),
        invalid,
        "outputs written"
    );
    Ok(())
}
