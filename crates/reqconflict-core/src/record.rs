//! Classification records shared between the pipeline and the result sink.

use serde::{Deserialize, Serialize};

use crate::taxonomy::ConflictCategory;

/// Reason paired with `No Conflict`.
pub const NO_CONFLICT_REASON: &str = "Requirements are compatible";

/// Resolution text until resolution suggestions are produced.
pub const RESOLUTION_PLACEHOLDER: &str = "Not applicable";

/// Outcome of classifying one requirement pair.
///
/// Created once per evaluation and never updated; a re-evaluation produces a
/// new record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub requirement_1: String,
    pub requirement_2: String,
    pub category: ConflictCategory,
    /// One-line explanation, or the raw model output when parsing fell back.
    pub reason: String,
    pub resolution: String,
}

impl ClassificationResult {
    pub fn new(
        requirement_1: impl Into<String>,
        requirement_2: impl Into<String>,
        category: ConflictCategory,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            requirement_1: requirement_1.into(),
            requirement_2: requirement_2.into(),
            category,
            reason: reason.into(),
            resolution: RESOLUTION_PLACEHOLDER.to_string(),
        }
    }

    pub fn is_conflict(&self) -> bool {
        self.category.is_conflict()
    }
}

/// A requirement pair with its expected category, used by the refinement loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledPair {
    pub requirement_1: String,
    pub requirement_2: String,
    pub expected: ConflictCategory,
}
