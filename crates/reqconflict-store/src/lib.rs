//! Storage layer: tabular input (CSV, Parquet) and the result sink (CSV, XLSX, JSON).

mod error;
pub use error::StoreError;

mod read;
pub use read::{Table, read_table};

mod sink;
pub use sink::{ResultSink, SinkPaths, read_weights};
