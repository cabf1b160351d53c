//! Datasets and temporal aggregation for the atlas engine

pub mod cache;
pub mod counting;
pub mod entities;
pub mod histogram;
pub mod layer;
pub mod ranges;
pub mod sources;

use thiserror::Error;
use tokio::task::JoinError;

// Re-exports
pub use cache::{HistogramCache, HistogramKey};
pub use counting::{
    build_alive_counts, build_event_counts, build_work_counts, cumulative_counts, CountOptions,
};
pub use entities::{
    LayerEntity, LayerKind, MilitaryEvent, Person, PointInTime, TemporalEntity, Work,
};
pub use histogram::{Aggregation, Histogram, HistogramBinner};
pub use layer::{DataLayer, MIN_ENTITIES_FOR_COUNTS};
pub use ranges::{clamp_range, union_ranges, valid_range, RangeMode, RangeReducer};
pub use sources::{fetch_into, EntitySource, JsonEntitySource};

/// Errors that can occur in data operations
#[derive(Error, Debug)]
pub enum DataError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unexpected document shape: {0}")]
    Format(String),

    #[error("Join error: {0}")]
    Join(#[from] JoinError),
}
