//! End-of-run summary, grouped the same way as `run_stats.json`.

use std::fmt::Write;
use std::time::Duration;

use juportal_core::IssueKind;
use juportal_pipeline::RunStats;

const ISSUE_KINDS: &[(IssueKind, &str)] = &[
    (IssueKind::Mapping, "mapping"),
    (IssueKind::Parse, "parse"),
    (IssueKind::Extraction, "extraction"),
    (IssueKind::ValidationUnavailable, "validation unavailable"),
    (IssueKind::DedupAmbiguous, "dedup ambiguous"),
];

/// Issues listed individually before the summary switches to counts only.
const MAX_LISTED_ISSUES: usize = 10;

pub fn print_summary(stats: &RunStats, elapsed: Duration) {
    print!("{}", render(stats, elapsed));
}

fn row(out: &mut String, label: &str, value: impl std::fmt::Display) {
    let _ = writeln!(out, "  {label:<26} {value}");
}

fn render(stats: &RunStats, elapsed: Duration) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "=== Juportal run ({:.1}s) ===", elapsed.as_secs_f64());
    out.push('\n');

    out.push_str("Records\n");
    row(&mut out, "processed", stats.processed);
    row(&mut out, "skipped", stats.skipped);
    row(&mut out, "failed", stats.failed);
    row(&mut out, "deduplicated out", stats.deduplicated_out);

    out.push_str("Validation\n");
    row(&mut out, "by rule", stats.validated_by_rule);
    row(&mut out, "by llm", stats.validated_by_llm);
    row(&mut out, "unresolved", stats.unresolved);
    if stats.stage2.submitted > 0 {
        row(
            &mut out,
            "stage 2",
            format!(
                "{} submitted, {} accepted, {} rejected in {} batches",
                stats.stage2.submitted, stats.stage2.accepted, stats.stage2.rejected, stats.stage2.batches
            ),
        );
    }
    if stats.stage2.service_unavailable {
        row(&mut out, "stage 2 degraded", "classification service unavailable");
    } else if stats.stage2.degraded_batches > 0 {
        row(
            &mut out,
            "stage 2 degraded",
            format!("{} batches abandoned", stats.stage2.degraded_batches),
        );
    }

    if !stats.issues.is_empty() {
        out.push_str("Issues\n");
        for (kind, label) in ISSUE_KINDS {
            let n = stats.issue_count(*kind);
            if n > 0 {
                row(&mut out, label, n);
            }
        }
        for issue in stats.issues.iter().take(MAX_LISTED_ISSUES) {
            let _ = writeln!(
                out,
                "    - {}: {}",
                issue.file_name.as_deref().unwrap_or("(run)"),
                issue.detail
            );
        }
        if stats.issues.len() > MAX_LISTED_ISSUES {
            let _ = writeln!(out, "    ... {} more", stats.issues.len() - MAX_LISTED_ISSUES);
        }
    }
    out
}
