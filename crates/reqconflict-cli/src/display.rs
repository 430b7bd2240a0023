//! Console summaries for training rounds, bulk results, and incremental checks.

use std::collections::BTreeMap;
use std::path::Path;

use arrow::util::pretty::pretty_format_batches;
use reqconflict_ai::cache::CacheStats;
use reqconflict_ai::inference::CallStats;
use reqconflict_ai::labels::LabelSummary;
use reqconflict_ai::pairing::{IncrementalReport, PairingStats};
use reqconflict_ai::refine::RefinementOutcome;
use reqconflict_core::{ClassificationResult, ConflictCategory, results};

/// Results per category, most frequent first, ties in label order.
pub fn category_counts(rows: &[ClassificationResult]) -> Vec<(ConflictCategory, usize)> {
    let mut counts: BTreeMap<ConflictCategory, usize> = BTreeMap::new();
    for r in rows {
        *counts.entry(r.category).or_insert(0) += 1;
    }
    let mut counts: Vec<_> = counts.into_iter().collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.label().cmp(b.0.label())));
    counts
}

pub fn print_label_summary(summary: &LabelSummary) {
    println!("=== Training data ===");
    println!("  {:<26} {}", "pairs", summary.total_pairs);
    println!("  {:<26} {}", "requirements", summary.distinct_requirements);
    println!("  {:<26} {}", "no-conflict pairs", summary.no_conflict_pairs);
    println!("  {:<26} {}", "expected categories", summary.per_category.len());
    println!();
}

pub fn print_refinement(outcome: &RefinementOutcome) {
    println!("=== Refinement ===");
    for round in &outcome.rounds {
        let accuracy = round
            .accuracy
            .map(|a| format!("{:.1}%", a * 100.0))
            .unwrap_or_else(|| "n/a".into());
        println!(
            "  round {:<3} accuracy {:>7}  confirmed {:<5} disputed {:<5}{}",
            round.round,
            accuracy,
            round.confirmed,
            round.disputed,
            if round.adjusted { "  (weights adjusted)" } else { "" }
        );
    }
    println!("  {:<26} {:?}", "final state", outcome.state);

    let ranked = outcome.weights.ranked();
    let raised: Vec<_> = ranked.iter().filter(|(_, w)| *w > 1.0).collect();
    if raised.is_empty() {
        println!("  {:<26} all at initial value", "weights");
    } else {
        println!("  weights raised:");
        for (category, weight) in raised {
            println!("    {:<30} {weight:.2}", category.label());
        }
    }
    println!();
}

pub fn print_bulk_summary(rows: &[ClassificationResult], stats: PairingStats) -> anyhow::Result<()> {
    println!("=== Conflict analysis ===");
    println!("  {:<26} {}", "pairs evaluated", stats.evaluated);
    println!("  {:<26} {}", "pairs skipped", stats.skipped);
    println!("  {:<26} {}", "conflicts", rows.len());

    if rows.is_empty() {
        println!();
        return Ok(());
    }

    println!();
    println!("  By category:");
    for (category, count) in category_counts(rows) {
        println!("    {:<30} {}", category.label(), count);
    }
    println!();

    let batch = results::to_batch(rows)?;
    println!("{}", pretty_format_batches(&[batch])?);
    println!();
    Ok(())
}

pub fn print_incremental(requirement: &str, report: &IncrementalReport, artifact: Option<&Path>) {
    if report.evaluated == 0 {
        println!("  No new pairs to evaluate for: {requirement}");
        return;
    }
    if !report.has_conflicts() {
        println!(
            "  No conflicts detected ({} pairs checked).",
            report.evaluated
        );
        return;
    }

    println!("  {} conflict(s) detected:", report.conflicts.len());
    for r in &report.conflicts {
        println!("    [{}] {}", r.category.label(), r.requirement_2);
        println!("      {}", r.reason);
    }
    if let Some(path) = artifact {
        println!("  Saved to {}", path.display());
    }
}

pub fn print_inference_stats(cache: CacheStats, calls: CallStats) {
    println!("=== Inference ===");
    println!("  {:<26} {}", "service calls", calls.calls);
    println!("  {:<26} {}", "failed calls", calls.failures);
    println!("  {:<26} {}", "cache hits", cache.hits);
    println!("  {:<26} {}", "cache misses", cache.misses);
}
