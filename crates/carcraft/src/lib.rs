//! Carcraft - Car Price Prediction History
//!
//! Keeps a bounded, persisted history of car price predictions with saved
//! flags, post-hoc accuracy tracking, CSV export, and dashboard statistics.

pub mod client;
pub mod commands;
pub mod config;
pub mod error;
pub mod export;
pub mod medium;
pub mod record;
pub mod stats;
pub mod store;

pub use error::{MediumError, Result, StoreError};
pub use medium::{FileMedium, Medium, MemoryMedium};
pub use record::{CarAttributes, PredictionDetails, PredictionRecord, PriceRange, RecordId};
pub use stats::StatsSummary;
pub use store::{PredictionStore, RETENTION_LIMIT, STORAGE_KEY};
