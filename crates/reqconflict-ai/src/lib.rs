//! Conflict classification layer: prompt rendering, inference, response parsing,
//! pair enumeration, and the weighted refinement loop.

mod columns;

pub mod cache;
pub mod corpus;
pub mod gate;
pub mod inference;
pub mod labels;
pub mod pairing;
pub mod parser;
pub mod prompt;
pub mod refine;

#[cfg(feature = "http")]
pub mod http;

pub use cache::CachedInference;
pub use corpus::{Corpus, CorpusError};
pub use gate::{FixedIntervalGate, NoDelay, RateGate};
pub use inference::{CompletionBackend, Inference, InferenceClient, InferenceError};
pub use labels::LabeledDataset;
pub use pairing::{IncrementalReport, PairingEngine};
pub use parser::{ParsedResponse, parse_response};
pub use prompt::{PromptSubject, build_prompt};
pub use refine::{RefinementConfig, RefinementOutcome, RefinementState, Refiner};

#[cfg(feature = "http")]
pub use http::HttpBackend;
