pub mod pair;
pub mod record;
pub mod schema;
pub mod taxonomy;
pub mod weights;

pub use pair::{CheckedPairs, DedupPolicy, PairKey};
pub use record::{ClassificationResult, LabeledPair, NO_CONFLICT_REASON, RESOLUTION_PLACEHOLDER};
pub use schema::results;
pub use taxonomy::{ConflictCategory, UnknownCategory};
pub use weights::CategoryWeights;
