/// Arrow schema and batch conversion for classification result tables.
pub mod results {
    use arrow::array::{ArrayRef, StringArray};
    use arrow::datatypes::{DataType, Field, Schema};
    use arrow::error::ArrowError;
    use arrow::record_batch::RecordBatch;
    use std::sync::Arc;

    use crate::record::ClassificationResult;

    pub const REQUIREMENT_1: &str = "Requirement_1";
    pub const REQUIREMENT_2: &str = "Requirement_2";
    pub const CONFLICT_TYPE: &str = "Conflict_Type";
    pub const CONFLICT_REASON: &str = "Conflict_Reason";

    /// Output columns, in order.
    pub const COLUMNS: [&str; 4] = [REQUIREMENT_1, REQUIREMENT_2, CONFLICT_TYPE, CONFLICT_REASON];

    /// Schema for persisted classification results.
    pub fn schema() -> Schema {
        Schema::new(
            COLUMNS
                .iter()
                .map(|name| Field::new(*name, DataType::Utf8, false))
                .collect::<Vec<_>>(),
        )
    }

    /// Build a single RecordBatch from results, preserving their order.
    pub fn to_batch(results: &[ClassificationResult]) -> Result<RecordBatch, ArrowError> {
        let req1: StringArray = results.iter().map(|r| Some(r.requirement_1.as_str())).collect();
        let req2: StringArray = results.iter().map(|r| Some(r.requirement_2.as_str())).collect();
        let kind: StringArray = results.iter().map(|r| Some(r.category.label())).collect();
        let reason: StringArray = results.iter().map(|r| Some(r.reason.as_str())).collect();

        let columns: Vec<ArrayRef> = vec![
            Arc::new(req1),
            Arc::new(req2),
            Arc::new(kind),
            Arc::new(reason),
        ];
        RecordBatch::try_new(Arc::new(schema()), columns)
    }
}
