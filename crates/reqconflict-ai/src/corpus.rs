//! Bulk input corpus extraction from Arrow batches.
//!
//! Two layouts are recognised:
//! - a single requirements column (`Requirements`, `Requirement` or
//!   `Requirement Text`), optionally with `Requirement ID`, in which case each
//!   requirement is rendered as `"<ID>: <Text>"`;
//! - a pairwise layout with `Requirement_1` and `Requirement_2` columns.

use std::collections::HashSet;

use arrow::datatypes::Schema;
use arrow::record_batch::RecordBatch;
use thiserror::Error;
use tracing::{info, warn};

use crate::columns::{column, column_names, find_column, get_string};

pub const REQUIREMENT_COLUMNS: &[&str] = &["Requirements", "Requirement", "Requirement Text"];
pub const REQUIREMENT_ID_COLUMN: &str = "Requirement ID";
pub const PAIR_COLUMNS: [&str; 2] = ["Requirement_1", "Requirement_2"];
pub const EXPECTED_COLUMN: &str = "Conflict_Type";

#[derive(Error, Debug)]
pub enum CorpusError {
    #[error("input must contain {expected}; found columns {found:?}")]
    MissingColumns { expected: String, found: Vec<String> },
    #[error("input contains no requirements")]
    Empty,
}

/// Requirements to classify.
#[derive(Debug, Clone, PartialEq)]
pub enum Corpus {
    /// A list of requirements, classified all-pairs.
    Requirements(Vec<String>),
    /// Explicit pairs, classified in file order.
    Pairs(Vec<(String, String)>),
}

impl Corpus {
    /// Detect the layout from `schema` and extract the corpus.
    ///
    /// Blank cells are skipped. Repeated requirements in the single-column
    /// layout keep their first occurrence only.
    pub fn from_batches(schema: &Schema, batches: &[RecordBatch]) -> Result<Self, CorpusError> {
        if PAIR_COLUMNS
            .iter()
            .all(|name| find_column(schema, &[*name]).is_some())
        {
            info!("detected pairwise requirements layout");
            return Self::pairs_from_batches(batches);
        }

        let Some(text_column) = find_column(schema, REQUIREMENT_COLUMNS) else {
            return Err(CorpusError::MissingColumns {
                expected: format!("one of {REQUIREMENT_COLUMNS:?} or both of {PAIR_COLUMNS:?}"),
                found: column_names(schema),
            });
        };
        let id_column = find_column(schema, &[REQUIREMENT_ID_COLUMN]);
        info!(
            column = text_column,
            with_ids = id_column.is_some(),
            "detected single-column requirements layout"
        );

        let mut seen = HashSet::new();
        let mut requirements = Vec::new();
        let mut duplicates = 0usize;

        for batch in batches {
            let Some(texts) = column(batch, text_column) else {
                continue;
            };
            let ids = id_column.and_then(|name| column(batch, name));

            for row in 0..batch.num_rows() {
                let Some(text) = get_string(texts.as_ref(), row) else {
                    continue;
                };
                let requirement = match ids.and_then(|col| get_string(col.as_ref(), row)) {
                    Some(id) => format!("{id}: {text}"),
                    None => text,
                };
                if seen.insert(requirement.clone()) {
                    requirements.push(requirement);
                } else {
                    duplicates += 1;
                }
            }
        }

        if duplicates > 0 {
            warn!(duplicates, "dropped repeated requirements");
        }
        if requirements.is_empty() {
            return Err(CorpusError::Empty);
        }
        Ok(Self::Requirements(requirements))
    }

    fn pairs_from_batches(batches: &[RecordBatch]) -> Result<Self, CorpusError> {
        let mut pairs = Vec::new();
        for batch in batches {
            let (Some(first), Some(second)) =
                (column(batch, PAIR_COLUMNS[0]), column(batch, PAIR_COLUMNS[1]))
            else {
                continue;
            };
            for row in 0..batch.num_rows() {
                match (
                    get_string(first.as_ref(), row),
                    get_string(second.as_ref(), row),
                ) {
                    (Some(a), Some(b)) => pairs.push((a, b)),
                    _ => warn!(row, "skipping pair with a blank requirement"),
                }
            }
        }
        if pairs.is_empty() {
            return Err(CorpusError::Empty);
        }
        Ok(Self::Pairs(pairs))
    }

    /// Number of requirements or pairs.
    pub fn len(&self) -> usize {
        match self {
            Self::Requirements(r) => r.len(),
            Self::Pairs(p) => p.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Distinct requirement texts in first-seen order.
    ///
    /// This is the "existing requirements" list new requirements are compared
    /// against in incremental mode.
    pub fn requirements(&self) -> Vec<String> {
        match self {
            Self::Requirements(r) => r.clone(),
            Self::Pairs(pairs) => {
                let mut seen = HashSet::new();
                pairs
                    .iter()
                    .flat_map(|(a, b)| [a, b])
                    .filter(|r| seen.insert(r.as_str()))
                    .cloned()
                    .collect()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{ArrayRef, Int64Array, StringArray};
    use arrow::datatypes::{DataType, Field};
    use std::sync::Arc;

    fn batch(columns: Vec<(&str, ArrayRef)>) -> RecordBatch {
        let fields: Vec<Field> = columns
            .iter()
            .map(|(name, arr)| Field::new(*name, arr.data_type().clone(), true))
            .collect();
        RecordBatch::try_new(
            Arc::new(Schema::new(fields)),
            columns.into_iter().map(|(_, a)| a).collect(),
        )
        .unwrap()
    }

    fn strings(values: &[Option<&str>]) -> ArrayRef {
        Arc::new(StringArray::from(values.to_vec()))
    }

    #[test]
    fn single_column_requirements() {
        let b = batch(vec![(
            "Requirements",
            strings(&[Some("Top speed 120 km/h"), None, Some("Fully electric")]),
        )]);
        let corpus = Corpus::from_batches(&b.schema(), &[b]).unwrap();
        assert_eq!(
            corpus,
            Corpus::Requirements(vec!["Top speed 120 km/h".into(), "Fully electric".into()])
        );
    }

    #[test]
    fn id_and_text_columns_are_combined() {
        let b = batch(vec![
            ("Requirement ID", Arc::new(Int64Array::from(vec![1, 2])) as ArrayRef),
            (
                "Requirement Text",
                strings(&[Some("ABS brakes"), Some("Spoked wheels")]),
            ),
        ]);
        let corpus = Corpus::from_batches(&b.schema(), &[b]).unwrap();
        assert_eq!(
            corpus.requirements(),
            vec!["1: ABS brakes".to_string(), "2: Spoked wheels".to_string()]
        );
    }

    #[test]
    fn duplicates_keep_first_occurrence() {
        let b = batch(vec![(
            "Requirement",
            strings(&[Some("a"), Some("b"), Some("a")]),
        )]);
        let corpus = Corpus::from_batches(&b.schema(), &[b]).unwrap();
        assert_eq!(corpus.len(), 2);
    }

    #[test]
    fn pairwise_layout_wins() {
        let b = batch(vec![
            ("Requirement_1", strings(&[Some("a"), Some("b"), None])),
            ("Requirement_2", strings(&[Some("c"), Some("a"), Some("d")])),
            ("Requirements", strings(&[Some("x"), Some("y"), Some("z")])),
        ]);
        let corpus = Corpus::from_batches(&b.schema(), &[b]).unwrap();
        assert_eq!(
            corpus,
            Corpus::Pairs(vec![("a".into(), "c".into()), ("b".into(), "a".into())])
        );
        assert_eq!(corpus.requirements(), vec!["a", "c", "b"]);
    }

    #[test]
    fn missing_columns_is_an_error() {
        let b = batch(vec![("Text", strings(&[Some("a")]))]);
        let err = Corpus::from_batches(&b.schema(), &[b]).unwrap_err();
        match err {
            CorpusError::MissingColumns { found, .. } => assert_eq!(found, vec!["Text"]),
            other => panic!("unexpected: {other}"),
        }
    }

    #[test]
    fn header_only_is_empty() {
        let schema = Schema::new(vec![Field::new("Requirements", DataType::Utf8, true)]);
        assert!(matches!(
            Corpus::from_batches(&schema, &[]),
            Err(CorpusError::Empty)
        ));
    }
}
