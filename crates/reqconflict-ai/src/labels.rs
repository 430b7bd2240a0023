//! Labeled refinement corpus: requirement pairs with their expected category.
//!
//! Built from Arrow RecordBatches with `Requirement_1`, `Requirement_2` and
//! `Conflict_Type` columns.

use std::collections::{BTreeMap, HashSet};

use arrow::datatypes::Schema;
use arrow::record_batch::RecordBatch;
use reqconflict_core::{ConflictCategory, LabeledPair};
use tracing::{info, warn};

use crate::columns::{column, column_names, find_column, get_string};
use crate::corpus::{CorpusError, EXPECTED_COLUMN, PAIR_COLUMNS};

/// Ground-truth pairs for the refinement loop, in file order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LabeledDataset {
    pub pairs: Vec<LabeledPair>,
}

/// Summary statistics for a LabeledDataset.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelSummary {
    pub total_pairs: usize,
    pub distinct_requirements: usize,
    pub no_conflict_pairs: usize,
    /// Expected labels outside the taxonomy, coerced to `Other`.
    pub coerced_labels: usize,
    pub per_category: BTreeMap<ConflictCategory, usize>,
}

impl LabeledDataset {
    /// Build a dataset from labeled batches.
    ///
    /// Rows with a blank requirement or label are skipped. Labels that are not
    /// in the taxonomy are kept as `Other`.
    pub fn from_batches(schema: &Schema, batches: &[RecordBatch]) -> Result<Self, CorpusError> {
        let required = [PAIR_COLUMNS[0], PAIR_COLUMNS[1], EXPECTED_COLUMN];
        if required
            .iter()
            .any(|name| find_column(schema, &[*name]).is_none())
        {
            return Err(CorpusError::MissingColumns {
                expected: format!("columns {required:?}"),
                found: column_names(schema),
            });
        }

        let mut pairs = Vec::new();
        let mut coerced = 0usize;

        for batch in batches {
            let (Some(first), Some(second), Some(expected)) = (
                column(batch, PAIR_COLUMNS[0]),
                column(batch, PAIR_COLUMNS[1]),
                column(batch, EXPECTED_COLUMN),
            ) else {
                continue;
            };

            for row in 0..batch.num_rows() {
                let (Some(requirement_1), Some(requirement_2), Some(label)) = (
                    get_string(first.as_ref(), row),
                    get_string(second.as_ref(), row),
                    get_string(expected.as_ref(), row),
                ) else {
                    warn!(row, "skipping incomplete labeled row");
                    continue;
                };

                let expected = match ConflictCategory::from_label(label.trim()) {
                    Some(category) => category,
                    None => {
                        warn!(label = %label, "unknown expected label, using Other");
                        coerced += 1;
                        ConflictCategory::Other
                    }
                };

                pairs.push(LabeledPair {
                    requirement_1,
                    requirement_2,
                    expected,
                });
            }
        }

        if pairs.is_empty() {
            return Err(CorpusError::Empty);
        }

        let dataset = Self { pairs };
        let summary = dataset.summary_with_coerced(coerced);
        info!(
            pairs = summary.total_pairs,
            requirements = summary.distinct_requirements,
            no_conflict = summary.no_conflict_pairs,
            coerced = summary.coerced_labels,
            categories = summary.per_category.len(),
            "loaded labeled dataset"
        );
        Ok(dataset)
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Summary statistics. `coerced_labels` is only known at load time and is 0 here.
    pub fn summary(&self) -> LabelSummary {
        self.summary_with_coerced(0)
    }

    fn summary_with_coerced(&self, coerced_labels: usize) -> LabelSummary {
        let mut requirements = HashSet::new();
        let mut per_category = BTreeMap::new();
        for pair in &self.pairs {
            requirements.insert(pair.requirement_1.as_str());
            requirements.insert(pair.requirement_2.as_str());
            *per_category.entry(pair.expected).or_insert(0) += 1;
        }

        LabelSummary {
            total_pairs: self.pairs.len(),
            distinct_requirements: requirements.len(),
            no_conflict_pairs: per_category
                .get(&ConflictCategory::NoConflict)
                .copied()
                .unwrap_or(0),
            coerced_labels,
            per_category,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{ArrayRef, StringArray};
    use arrow::datatypes::{DataType, Field};
    use std::sync::Arc;

    /// Build a test batch with the expected columns.
    fn test_batch(rows: &[(Option<&str>, Option<&str>, Option<&str>)]) -> RecordBatch {
        let first: Vec<Option<&str>> = rows.iter().map(|r| r.0).collect();
        let second: Vec<Option<&str>> = rows.iter().map(|r| r.1).collect();
        let labels: Vec<Option<&str>> = rows.iter().map(|r| r.2).collect();

        let schema = Schema::new(vec![
            Field::new("Requirement_1", DataType::Utf8, true),
            Field::new("Requirement_2", DataType::Utf8, true),
            Field::new("Conflict_Type", DataType::Utf8, true),
        ]);

        RecordBatch::try_new(
            Arc::new(schema),
            vec![
                Arc::new(StringArray::from(first)) as ArrayRef,
                Arc::new(StringArray::from(second)),
                Arc::new(StringArray::from(labels)),
            ],
        )
        .unwrap()
    }

    #[test]
    fn extracts_labeled_pairs() {
        let batch = test_batch(&[
            (Some("fully electric"), Some("top speed 120"), Some("No Conflict")),
            (Some("premium leather"), Some("cost effective"), Some("Cost Conflict")),
        ]);

        let ds = LabeledDataset::from_batches(&batch.schema(), &[batch]).unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.pairs[0].expected, ConflictCategory::NoConflict);
        assert_eq!(ds.pairs[1].expected, ConflictCategory::Cost);
        assert_eq!(ds.pairs[1].requirement_1, "premium leather");
    }

    #[test]
    fn unknown_labels_become_other() {
        let batch = test_batch(&[(Some("a"), Some("b"), Some("Budget Conflict"))]);
        let ds = LabeledDataset::from_batches(&batch.schema(), &[batch]).unwrap();
        assert_eq!(ds.pairs[0].expected, ConflictCategory::Other);
    }

    #[test]
    fn skips_incomplete_rows() {
        let batch = test_batch(&[
            (Some("a"), None, Some("Cost Conflict")),
            (Some("a"), Some("b"), None),
            (Some("a"), Some("b"), Some("Safety Conflict")),
        ]);
        let ds = LabeledDataset::from_batches(&batch.schema(), &[batch]).unwrap();
        assert_eq!(ds.len(), 1);
        assert_eq!(ds.pairs[0].expected, ConflictCategory::Safety);
    }

    #[test]
    fn missing_label_column_is_an_error() {
        let schema = Schema::new(vec![
            Field::new("Requirement_1", DataType::Utf8, true),
            Field::new("Requirement_2", DataType::Utf8, true),
        ]);
        let err = LabeledDataset::from_batches(&schema, &[]).unwrap_err();
        assert!(matches!(err, CorpusError::MissingColumns { .. }));
    }

    #[test]
    fn summary_counts() {
        let batch = test_batch(&[
            (Some("a"), Some("b"), Some("No Conflict")),
            (Some("a"), Some("c"), Some("Cost Conflict")),
            (Some("b"), Some("c"), Some("Cost Conflict")),
        ]);
        let ds = LabeledDataset::from_batches(&batch.schema(), &[batch]).unwrap();
        let s = ds.summary();
        assert_eq!(s.total_pairs, 3);
        assert_eq!(s.distinct_requirements, 3);
        assert_eq!(s.no_conflict_pairs, 1);
        assert_eq!(s.per_category[&ConflictCategory::Cost], 2);
    }

    #[test]
    fn multiple_batches() {
        let b1 = test_batch(&[(Some("a"), Some("b"), Some("Design Conflict"))]);
        let b2 = test_batch(&[(Some("c"), Some("d"), Some("Material Conflict"))]);
        let ds = LabeledDataset::from_batches(&b1.schema(), &[b1, b2]).unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.pairs[1].expected, ConflictCategory::Material);
    }
}
