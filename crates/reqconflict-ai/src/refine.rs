//! Weighted refinement loop over a labeled dataset.
//!
//! Each round classifies every labeled pair from scratch with the current
//! category weights rendered into the prompt. Between rounds, if the previous
//! round's accuracy fell below the threshold, weights move toward the
//! categories the labels expected. The model itself is never changed; only
//! the priority hint in the prompt is.

use std::collections::BTreeMap;

use reqconflict_core::{CategoryWeights, ClassificationResult, ConflictCategory};
use tracing::{debug, info};

use crate::inference::Inference;
use crate::labels::LabeledDataset;
use crate::pairing::classify_pair;

/// Rounds run when not configured.
pub const DEFAULT_ITERATIONS: usize = 3;
/// Accuracy below which weights are adjusted.
pub const DEFAULT_ACCURACY_THRESHOLD: f64 = 0.8;
/// Added to the expected category when a prediction misses.
pub const DEFAULT_MISS_INCREMENT: f64 = 0.2;
/// Added to the predicted category when a prediction hits.
pub const DEFAULT_HIT_INCREMENT: f64 = 0.1;

#[derive(Debug, Clone, PartialEq)]
pub struct RefinementConfig {
    pub iterations: usize,
    pub accuracy_threshold: f64,
    pub miss_increment: f64,
    pub hit_increment: f64,
    /// End early once a round reaches this accuracy. `None` always runs every round.
    pub stop_at_accuracy: Option<f64>,
}

impl Default for RefinementConfig {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_ITERATIONS,
            accuracy_threshold: DEFAULT_ACCURACY_THRESHOLD,
            miss_increment: DEFAULT_MISS_INCREMENT,
            hit_increment: DEFAULT_HIT_INCREMENT,
            stop_at_accuracy: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefinementState {
    Idle,
    Running { round: usize },
    /// Stopped early at the configured accuracy.
    Converged,
    /// Ran every configured round.
    Exhausted,
}

/// Whether a prediction matches its expected label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Agreement {
    Confirmed,
    Disputed,
}

impl Agreement {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Confirmed => "confirmed",
            Self::Disputed => "disputed",
        }
    }
}

/// One labeled pair as classified in a round.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub result: ClassificationResult,
    pub expected: ConflictCategory,
    pub agreement: Agreement,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RoundReport {
    pub round: usize,
    /// `None` for an empty dataset.
    pub accuracy: Option<f64>,
    pub confirmed: usize,
    pub disputed: usize,
    /// `(expected, predicted)` counts.
    pub confusion: BTreeMap<(ConflictCategory, ConflictCategory), usize>,
    /// Whether weights were adjusted before this round ran.
    pub adjusted: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RefinementOutcome {
    pub weights: CategoryWeights,
    /// Predictions from the last round that ran.
    pub predictions: Vec<Prediction>,
    pub rounds: Vec<RoundReport>,
    pub state: RefinementState,
}

impl RefinementOutcome {
    pub fn results(&self) -> Vec<ClassificationResult> {
        self.predictions.iter().map(|p| p.result.clone()).collect()
    }

    pub fn final_accuracy(&self) -> Option<f64> {
        self.rounds.last().and_then(|r| r.accuracy)
    }
}

/// The refinement state machine.
pub struct Refiner {
    config: RefinementConfig,
    weights: CategoryWeights,
    state: RefinementState,
}

impl Refiner {
    pub fn new(config: RefinementConfig) -> Self {
        Self::with_weights(config, CategoryWeights::new())
    }

    /// Start from previously saved weights instead of the initial ones.
    pub fn with_weights(config: RefinementConfig, weights: CategoryWeights) -> Self {
        Self {
            config,
            weights,
            state: RefinementState::Idle,
        }
    }

    pub fn state(&self) -> RefinementState {
        self.state
    }

    pub fn weights(&self) -> &CategoryWeights {
        &self.weights
    }

    /// Run every configured round over `dataset`.
    pub async fn run<I: Inference>(
        mut self,
        inference: &mut I,
        dataset: &LabeledDataset,
    ) -> RefinementOutcome {
        let mut predictions: Vec<Prediction> = Vec::new();
        let mut rounds: Vec<RoundReport> = Vec::new();
        info!(
            iterations = self.config.iterations,
            pairs = dataset.len(),
            "starting refinement"
        );

        for round in 1..=self.config.iterations {
            self.state = RefinementState::Running { round };

            let adjusted = match rounds.last().and_then(|r| r.accuracy) {
                Some(accuracy) if accuracy < self.config.accuracy_threshold => {
                    self.adjust(&predictions);
                    true
                }
                _ => false,
            };

            predictions = self.classify_round(inference, dataset).await;
            let report = round_report(round, &predictions, adjusted);
            info!(
                round,
                accuracy = report.accuracy.unwrap_or(0.0),
                confirmed = report.confirmed,
                disputed = report.disputed,
                adjusted,
                "refinement round complete"
            );

            let reached = match (self.config.stop_at_accuracy, report.accuracy) {
                (Some(target), Some(accuracy)) => accuracy >= target,
                _ => false,
            };
            rounds.push(report);
            if reached {
                info!(round, "target accuracy reached, stopping early");
                self.state = RefinementState::Converged;
                break;
            }
        }

        if self.state != RefinementState::Converged {
            self.state = RefinementState::Exhausted;
        }

        RefinementOutcome {
            weights: self.weights,
            predictions,
            rounds,
            state: self.state,
        }
    }

    async fn classify_round<I: Inference>(
        &self,
        inference: &mut I,
        dataset: &LabeledDataset,
    ) -> Vec<Prediction> {
        let mut predictions = Vec::with_capacity(dataset.len());
        for pair in &dataset.pairs {
            let result = classify_pair(
                inference,
                &pair.requirement_1,
                &pair.requirement_2,
                Some(&self.weights),
            )
            .await;
            let agreement = if result.category == pair.expected {
                Agreement::Confirmed
            } else {
                Agreement::Disputed
            };
            predictions.push(Prediction {
                result,
                expected: pair.expected,
                agreement,
            });
        }
        predictions
    }

    fn adjust(&mut self, predictions: &[Prediction]) {
        for p in predictions {
            match p.agreement {
                Agreement::Disputed => self.weights.bump(p.expected, self.config.miss_increment),
                Agreement::Confirmed => {
                    self.weights.bump(p.result.category, self.config.hit_increment)
                }
            }
        }
        debug!(weights = ?self.weights.ranked().first(), "weights adjusted");
    }
}

fn round_report(round: usize, predictions: &[Prediction], adjusted: bool) -> RoundReport {
    let mut confusion = BTreeMap::new();
    let mut confirmed = 0;
    for p in predictions {
        *confusion.entry((p.expected, p.result.category)).or_insert(0) += 1;
        if p.agreement == Agreement::Confirmed {
            confirmed += 1;
        }
    }
    let accuracy = if predictions.is_empty() {
        None
    } else {
        Some(confirmed as f64 / predictions.len() as f64)
    };
    RoundReport {
        round,
        accuracy,
        confirmed,
        disputed: predictions.len() - confirmed,
        confusion,
        adjusted,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::testing::{ScriptedBackend, client};
    use reqconflict_core::LabeledPair;

    fn dataset(pairs: &[(&str, &str, ConflictCategory)]) -> LabeledDataset {
        LabeledDataset {
            pairs: pairs
                .iter()
                .map(|(a, b, expected)| LabeledPair {
                    requirement_1: a.to_string(),
                    requirement_2: b.to_string(),
                    expected: *expected,
                })
                .collect(),
        }
    }

    fn config(iterations: usize) -> RefinementConfig {
        RefinementConfig {
            iterations,
            ..RefinementConfig::default()
        }
    }

    #[tokio::test]
    async fn single_round_leaves_weights_initial() {
        let backend = ScriptedBackend::answering("Cost Conflict: budget");
        let mut inference = client(&backend);
        let ds = dataset(&[
            ("a", "b", ConflictCategory::Safety),
            ("c", "d", ConflictCategory::Cost),
        ]);

        let outcome = Refiner::new(config(1)).run(&mut inference, &ds).await;

        assert!(outcome.weights.is_initial());
        assert_eq!(outcome.predictions.len(), 2);
        assert_eq!(outcome.rounds.len(), 1);
        assert_eq!(outcome.state, RefinementState::Exhausted);
        assert_eq!(outcome.final_accuracy(), Some(0.5));
        assert!(!outcome.rounds[0].adjusted);
    }

    #[tokio::test]
    async fn low_accuracy_adjusts_between_rounds() {
        // Round 1: one miss (expected Safety) and one hit (Cost).
        let backend = ScriptedBackend::answering("Cost Conflict: budget");
        let mut inference = client(&backend);
        let ds = dataset(&[
            ("a", "b", ConflictCategory::Safety),
            ("c", "d", ConflictCategory::Cost),
        ]);

        let outcome = Refiner::new(config(2)).run(&mut inference, &ds).await;

        assert!((outcome.weights.get(ConflictCategory::Safety) - 1.2).abs() < 1e-9);
        assert!((outcome.weights.get(ConflictCategory::Cost) - 1.1).abs() < 1e-9);
        assert_eq!(outcome.weights.get(ConflictCategory::Thermal), 1.0);
        assert!(outcome.rounds[1].adjusted);
        assert_eq!(backend.call_count(), 4);
    }

    #[tokio::test]
    async fn high_accuracy_leaves_weights_alone() {
        let backend = ScriptedBackend::answering("Cost Conflict: budget");
        let mut inference = client(&backend);
        let ds = dataset(&[("a", "b", ConflictCategory::Cost)]);

        let outcome = Refiner::new(config(3)).run(&mut inference, &ds).await;

        assert!(outcome.weights.is_initial());
        assert_eq!(outcome.rounds.len(), 3);
        assert!(outcome.rounds.iter().all(|r| !r.adjusted));
    }

    #[tokio::test]
    async fn every_round_reclassifies_every_pair() {
        let backend = ScriptedBackend::answering("No Conflict: fine");
        let mut inference = client(&backend);
        let ds = dataset(&[
            ("a", "b", ConflictCategory::NoConflict),
            ("a", "b", ConflictCategory::NoConflict),
        ]);

        let outcome = Refiner::new(config(2)).run(&mut inference, &ds).await;
        assert_eq!(backend.call_count(), 4);
        assert!(outcome
            .predictions
            .iter()
            .all(|p| p.result.category == ConflictCategory::NoConflict));
    }

    #[tokio::test]
    async fn stops_early_at_target_accuracy() {
        let backend = ScriptedBackend::answering("Cost Conflict: budget");
        let mut inference = client(&backend);
        let ds = dataset(&[("a", "b", ConflictCategory::Cost)]);
        let cfg = RefinementConfig {
            iterations: 5,
            stop_at_accuracy: Some(0.9),
            ..RefinementConfig::default()
        };

        let outcome = Refiner::new(cfg).run(&mut inference, &ds).await;
        assert_eq!(outcome.state, RefinementState::Converged);
        assert_eq!(outcome.rounds.len(), 1);
        assert_eq!(backend.call_count(), 1);
    }

    #[tokio::test]
    async fn empty_dataset_never_adjusts() {
        let backend = ScriptedBackend::answering("Cost Conflict: budget");
        let mut inference = client(&backend);

        let outcome = Refiner::new(config(3))
            .run(&mut inference, &LabeledDataset::default())
            .await;
        assert!(outcome.weights.is_initial());
        assert!(outcome.predictions.is_empty());
        assert_eq!(outcome.final_accuracy(), None);
        assert_eq!(backend.call_count(), 0);
    }

    #[tokio::test]
    async fn confusion_counts_and_agreement() {
        let backend = ScriptedBackend::answering("Cost Conflict: budget");
        backend.push(Ok("Safety Conflict: brakes"));
        let mut inference = client(&backend);
        let ds = dataset(&[
            ("a", "b", ConflictCategory::Safety),
            ("c", "d", ConflictCategory::Safety),
        ]);

        let outcome = Refiner::new(config(1)).run(&mut inference, &ds).await;
        let report = &outcome.rounds[0];
        assert_eq!(report.confirmed, 1);
        assert_eq!(report.disputed, 1);
        assert_eq!(
            report.confusion[&(ConflictCategory::Safety, ConflictCategory::Cost)],
            1
        );
        assert_eq!(outcome.predictions[0].agreement, Agreement::Confirmed);
        assert_eq!(outcome.predictions[1].agreement.as_str(), "disputed");
    }

    #[test]
    fn refiner_starts_idle() {
        let refiner = Refiner::new(RefinementConfig::default());
        assert_eq!(refiner.state(), RefinementState::Idle);
        assert!(refiner.weights().is_initial());
    }

    #[tokio::test]
    async fn zero_iterations_is_exhausted_immediately() {
        let backend = ScriptedBackend::answering("Cost Conflict: budget");
        let mut inference = client(&backend);
        let ds = dataset(&[("a", "b", ConflictCategory::Cost)]);

        let outcome = Refiner::new(config(0)).run(&mut inference, &ds).await;
        assert_eq!(outcome.state, RefinementState::Exhausted);
        assert!(outcome.rounds.is_empty());
    }
}
