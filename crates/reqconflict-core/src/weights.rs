//! Per-category priority weights used as a prompt hint.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::taxonomy::ConflictCategory;

/// Initial weight for every category.
pub const INITIAL_WEIGHT: f64 = 1.0;

/// Mapping from every [`ConflictCategory`] to a positive weight.
///
/// Weights only ever grow. They rank categories in the prompt hint and never
/// filter or forbid a category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryWeights {
    weights: BTreeMap<ConflictCategory, f64>,
}

impl Default for CategoryWeights {
    fn default() -> Self {
        Self::new()
    }
}

impl CategoryWeights {
    /// Every category at [`INITIAL_WEIGHT`].
    pub fn new() -> Self {
        Self {
            weights: ConflictCategory::ALL
                .into_iter()
                .map(|c| (c, INITIAL_WEIGHT))
                .collect(),
        }
    }

    pub fn get(&self, category: ConflictCategory) -> f64 {
        self.weights
            .get(&category)
            .copied()
            .unwrap_or(INITIAL_WEIGHT)
    }

    /// Increase a category's weight. Non-positive or non-finite increments are ignored.
    pub fn bump(&mut self, category: ConflictCategory, increment: f64) {
        if increment.is_finite() && increment > 0.0 {
            *self.weights.entry(category).or_insert(INITIAL_WEIGHT) += increment;
        }
    }

    /// Categories by descending weight; equal weights fall back to label order.
    pub fn ranked(&self) -> Vec<(ConflictCategory, f64)> {
        let mut ranked: Vec<(ConflictCategory, f64)> = ConflictCategory::ALL
            .into_iter()
            .map(|c| (c, self.get(c)))
            .collect();
        ranked.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.label().cmp(b.0.label()))
        });
        ranked
    }

    /// True when no category has moved off its initial weight.
    pub fn is_initial(&self) -> bool {
        ConflictCategory::ALL
            .iter()
            .all(|&c| self.get(c) == INITIAL_WEIGHT)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ConflictCategory, f64)> + '_ {
        ConflictCategory::ALL.into_iter().map(|c| (c, self.get(c)))
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Parse weights saved by [`to_json`](Self::to_json).
    ///
    /// Categories missing from the input keep their initial weight; negative
    /// or non-finite values are reset to it.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        let parsed: BTreeMap<ConflictCategory, f64> = serde_json::from_str(json)?;
        let mut weights = Self::new();
        for (category, value) in parsed {
            if value.is_finite() && value > 0.0 {
                weights.weights.insert(category, value);
            } else {
                tracing::warn!(%category, value, "ignoring invalid saved weight");
            }
        }
        Ok(weights)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_one_for_every_category() {
        let w = CategoryWeights::new();
        assert!(w.is_initial());
        assert_eq!(w.iter().count(), ConflictCategory::ALL.len());
        assert_eq!(w.get(ConflictCategory::Other), 1.0);
    }

    #[test]
    fn bump_accumulates() {
        let mut w = CategoryWeights::new();
        w.bump(ConflictCategory::Cost, 0.2);
        w.bump(ConflictCategory::Cost, 0.1);
        assert!((w.get(ConflictCategory::Cost) - 1.3).abs() < 1e-9);
        assert!(!w.is_initial());
    }

    #[test]
    fn bump_ignores_non_positive() {
        let mut w = CategoryWeights::new();
        w.bump(ConflictCategory::Cost, -1.0);
        w.bump(ConflictCategory::Cost, f64::NAN);
        assert!(w.is_initial());
    }

    #[test]
    fn ranked_by_weight_then_label() {
        let mut w = CategoryWeights::new();
        w.bump(ConflictCategory::Safety, 0.5);
        w.bump(ConflictCategory::Cost, 0.2);

        let ranked = w.ranked();
        assert_eq!(ranked.len(), ConflictCategory::ALL.len());
        assert_eq!(ranked[0].0, ConflictCategory::Safety);
        assert_eq!(ranked[1].0, ConflictCategory::Cost);
        // The rest tie at 1.0 and sort lexicographically by label.
        assert_eq!(ranked[2].0, ConflictCategory::Aesthetic);
        let tail: Vec<&str> = ranked[2..].iter().map(|(c, _)| c.label()).collect();
        let mut sorted = tail.clone();
        sorted.sort();
        assert_eq!(tail, sorted);
    }

    #[test]
    fn json_roundtrip_keeps_bumps() {
        let mut w = CategoryWeights::new();
        w.bump(ConflictCategory::Thermal, 0.4);
        let json = w.to_json().unwrap();
        assert!(json.contains("\"Thermal Conflict\""));
        let back = CategoryWeights::from_json(&json).unwrap();
        assert_eq!(back, w);
    }

    #[test]
    fn from_json_fills_missing_and_drops_invalid() {
        let w = CategoryWeights::from_json(r#"{"Cost Conflict": 2.5, "Safety Conflict": -1.0}"#)
            .unwrap();
        assert_eq!(w.get(ConflictCategory::Cost), 2.5);
        assert_eq!(w.get(ConflictCategory::Safety), 1.0);
        assert_eq!(w.get(ConflictCategory::Design), 1.0);
    }

    #[test]
    fn from_json_rejects_unknown_labels() {
        assert!(CategoryWeights::from_json(r#"{"Vibes Conflict": 2.0}"#).is_err());
    }
}
