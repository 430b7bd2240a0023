//! Pairing engine: enumerates requirement pairs and classifies each one once.
//!
//! Bulk mode walks every unordered combination of a corpus in index order.
//! Incremental mode pairs one new requirement against every existing one.
//! Both consult the [`CheckedPairs`] ledger first, so a pair that was already
//! evaluated in this run costs no inference call and yields no duplicate row.

use reqconflict_core::{CategoryWeights, CheckedPairs, ClassificationResult, DedupPolicy};
use tracing::{debug, info};

use crate::inference::Inference;
use crate::parser::parse_response;
use crate::prompt::{PromptSubject, build_prompt};

/// Build, call, parse: classify one pair.
pub async fn classify_pair<I: Inference>(
    inference: &mut I,
    requirement_1: &str,
    requirement_2: &str,
    weights: Option<&CategoryWeights>,
) -> ClassificationResult {
    let prompt = build_prompt(PromptSubject::Pair(requirement_1, requirement_2), weights);
    let raw = inference.call(&prompt).await;
    let parsed = parse_response(&raw);
    ClassificationResult::new(requirement_1, requirement_2, parsed.category, parsed.reason)
}

/// Running totals across every mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PairingStats {
    /// Pairs sent to inference.
    pub evaluated: usize,
    /// Pairs skipped because they were already checked (or identical).
    pub skipped: usize,
    /// Evaluated pairs classified as anything other than `No Conflict`.
    pub conflicts: usize,
}

/// Outcome of pairing one new requirement against the existing corpus.
///
/// `evaluated == 0` means nothing was compared; an empty `conflicts` with
/// `evaluated > 0` means every comparison came back `No Conflict`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IncrementalReport {
    pub evaluated: usize,
    pub skipped: usize,
    pub conflicts: Vec<ClassificationResult>,
}

impl IncrementalReport {
    pub fn has_conflicts(&self) -> bool {
        !self.conflicts.is_empty()
    }
}

enum Evaluation {
    Skipped,
    Compatible,
    Conflict(ClassificationResult),
}

/// Drives classification over a corpus with a fixed weights snapshot.
pub struct PairingEngine<I> {
    inference: I,
    weights: Option<CategoryWeights>,
    checked: CheckedPairs,
    stats: PairingStats,
}

impl<I: Inference> PairingEngine<I> {
    /// `weights` is rendered into every prompt when present and never changes
    /// for the lifetime of the engine.
    pub fn new(inference: I, weights: Option<CategoryWeights>, policy: DedupPolicy) -> Self {
        Self {
            inference,
            weights,
            checked: CheckedPairs::new(policy),
            stats: PairingStats::default(),
        }
    }

    /// Bulk mode: classify all C(N,2) combinations of `requirements`.
    ///
    /// Pairs are generated as `(requirements[i], requirements[j])` for `i < j`
    /// in lexicographic index order; results follow that order and contain
    /// conflicts only.
    pub async fn analyze_corpus(&mut self, requirements: &[String]) -> Vec<ClassificationResult> {
        let n = requirements.len();
        info!(
            requirements = n,
            pairs = n * n.saturating_sub(1) / 2,
            dedup = ?self.checked.policy(),
            "starting bulk pair analysis"
        );

        let mut results = Vec::new();
        for (i, a) in requirements.iter().enumerate() {
            for b in &requirements[i + 1..] {
                if let Evaluation::Conflict(result) = self.evaluate(a, b).await {
                    results.push(result);
                }
            }
        }

        info!(
            conflicts = results.len(),
            evaluated = self.stats.evaluated,
            skipped = self.stats.skipped,
            "bulk pair analysis complete"
        );
        results
    }

    /// Classify explicit pairs in the order given.
    pub async fn analyze_pairs(&mut self, pairs: &[(String, String)]) -> Vec<ClassificationResult> {
        info!(
            pairs = pairs.len(),
            dedup = ?self.checked.policy(),
            "starting pairwise analysis"
        );

        let mut results = Vec::new();
        for (a, b) in pairs {
            if let Evaluation::Conflict(result) = self.evaluate(a, b).await {
                results.push(result);
            }
        }

        info!(conflicts = results.len(), "pairwise analysis complete");
        results
    }

    /// Incremental mode: pair `new` against each of `existing` in list order.
    ///
    /// `new` is always the first requirement of each pair.
    pub async fn analyze_new(&mut self, new: &str, existing: &[String]) -> IncrementalReport {
        let mut report = IncrementalReport::default();
        for prior in existing {
            match self.evaluate(new, prior).await {
                Evaluation::Skipped => report.skipped += 1,
                Evaluation::Compatible => report.evaluated += 1,
                Evaluation::Conflict(result) => {
                    report.evaluated += 1;
                    report.conflicts.push(result);
                }
            }
        }

        info!(
            evaluated = report.evaluated,
            skipped = report.skipped,
            conflicts = report.conflicts.len(),
            "incremental analysis complete"
        );
        report
    }

    async fn evaluate(&mut self, a: &str, b: &str) -> Evaluation {
        if a == b {
            debug!("skipping self-pair");
            self.stats.skipped += 1;
            return Evaluation::Skipped;
        }
        if !self.checked.mark(a, b) {
            debug!(requirement_1 = a, requirement_2 = b, "pair already checked");
            self.stats.skipped += 1;
            return Evaluation::Skipped;
        }

        let result = classify_pair(&mut self.inference, a, b, self.weights.as_ref()).await;
        self.stats.evaluated += 1;
        if result.is_conflict() {
            info!(
                requirement_1 = a,
                requirement_2 = b,
                category = %result.category,
                "conflict found"
            );
            self.stats.conflicts += 1;
            Evaluation::Conflict(result)
        } else {
            debug!(requirement_1 = a, requirement_2 = b, "no conflict");
            Evaluation::Compatible
        }
    }

    pub fn checked(&self) -> &CheckedPairs {
        &self.checked
    }

    /// The ledger, for seeding pairs known from an earlier pass.
    pub fn checked_mut(&mut self) -> &mut CheckedPairs {
        &mut self.checked
    }

    pub fn stats(&self) -> PairingStats {
        self.stats
    }

    pub fn into_inner(self) -> I {
        self.inference
    }
}
