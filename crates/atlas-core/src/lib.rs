//! Core functionality for the historical atlas engine
//!
//! This crate provides the year model, the viewport controller that keeps
//! the selected year, the visible window and the full data range consistent,
//! and the shared plumbing (events, request generations, settings) used by
//! the data and geo crates.

pub mod events;
pub mod navigation;
pub mod settings;
pub mod sync;
pub mod timeline;

// Re-export commonly used types
pub use navigation::{
    ManualScheduler, PlaybackScheduler, PlaybackState, TimerToken, TokioScheduler,
    Viewport, ViewportController, ViewportSubscriber,
};
pub use settings::{AtlasSettings, SettingsError};
pub use sync::{RequestGate, RequestTicket};
pub use timeline::{coerce_year, Bin, Year, YearCount, YearRange, YearValue};
