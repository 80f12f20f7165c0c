//! Core trait and types for the pickup line generator client.
//!
//! This crate provides the shared interface between the HTTP client, the
//! in-memory mocks and the screen flows. It defines:
//!
//! - [`PickupApi`] - The trait every backend implementation must implement
//! - [`PickupLine`], [`Settings`], [`StatsSnapshot`] - The server's data model
//! - [`Style`] - The fixed set of tones, shared by inputs and validation
//! - [`ApiError`] - Error type for backend calls
//!
//! # Example
//!
//! ```rust
//! use pickup_core::{async_trait, ApiError, GenerateRequest, Generated, PickupApi, Style};
//! # use pickup_core::{HistoryPage, HistoryQuery, ModelDescriptor, RecordUpdate, Settings, StatsSnapshot};
//!
//! struct Canned;
//!
//! #[async_trait]
//! impl PickupApi for Canned {
//!     async fn generate(&self, _request: GenerateRequest) -> Result<Generated, ApiError> {
//!         Ok(Generated::new("Are you a map? I keep getting lost in your eyes.", "abc"))
//!     }
//! #   async fn regenerate(&self, _: &str) -> Result<Generated, ApiError> { unimplemented!() }
//! #   async fn update_record(&self, _: &str, _: RecordUpdate) -> Result<(), ApiError> { Ok(()) }
//! #   async fn list_history(&self, _: &HistoryQuery) -> Result<HistoryPage, ApiError> { unimplemented!() }
//! #   async fn delete_history(&self, _: &str) -> Result<(), ApiError> { Ok(()) }
//! #   async fn stats(&self) -> Result<StatsSnapshot, ApiError> { unimplemented!() }
//! #   async fn settings(&self) -> Result<Settings, ApiError> { Ok(Settings::default()) }
//! #   async fn update_settings(&self, _: &Settings) -> Result<(), ApiError> { Ok(()) }
//! #   async fn models(&self) -> Result<Vec<ModelDescriptor>, ApiError> { Ok(vec![]) }
//!
//!     fn name(&self) -> &str {
//!         "Canned"
//!     }
//! }
//! ```

mod api;
mod error;
mod history;
mod settings;
mod stats;
mod style;

pub use api::PickupApi;
pub use error::ApiError;
pub use history::{
    GenerateRequest, Generated, HistoryFilters, HistoryPage, HistoryQuery, PickupLine,
    RecordUpdate, DEFAULT_PER_PAGE,
};
pub use settings::{
    ModelCatalog, ModelDescriptor, Settings, DEFAULT_MODEL, MAX_TOKENS_RANGE, MAX_TOKENS_STEP,
    TEMPERATURE_RANGE, TEMPERATURE_STEP,
};
pub use stats::{ActivityDay, Overview, StatsSnapshot, StyleSuccess};
pub use style::{
    clamp_dirtiness, is_valid_rating, UnknownStyle, Style, DIRTINESS_RANGE, RATING_SCALE,
};

// Re-export async_trait for convenience
pub use async_trait::async_trait;
