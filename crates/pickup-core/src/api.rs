//! The backend trait every flow talks to.

use async_trait::async_trait;

use crate::error::ApiError;
use crate::history::{GenerateRequest, Generated, HistoryPage, HistoryQuery, RecordUpdate};
use crate::settings::{ModelDescriptor, Settings};
use crate::stats::StatsSnapshot;

/// The REST surface of the pickup line backend.
///
/// Implementations range from the real HTTP client to in-memory fakes.
/// This trait is object-safe and is normally used as `Arc<dyn PickupApi>`.
/// Credentials are the implementation's concern; callers never see them.
#[async_trait]
pub trait PickupApi: Send + Sync {
    /// Generate a new line and persist it as a history record.
    async fn generate(&self, request: GenerateRequest) -> Result<Generated, ApiError>;

    /// Generate a new line from the parameters of an existing record.
    ///
    /// The server stores the result as a new record and returns its id;
    /// the originating record is left untouched.
    async fn regenerate(&self, history_id: &str) -> Result<Generated, ApiError>;

    /// Apply a partial update (rating, used, success, notes) to a record.
    async fn update_record(&self, id: &str, update: RecordUpdate) -> Result<(), ApiError>;

    /// Fetch one page of history, newest first.
    async fn list_history(&self, query: &HistoryQuery) -> Result<HistoryPage, ApiError>;

    async fn delete_history(&self, id: &str) -> Result<(), ApiError>;

    async fn stats(&self) -> Result<StatsSnapshot, ApiError>;

    /// Fetch the user's settings. A user without settings yields
    /// [`ApiError::NotFound`].
    async fn settings(&self) -> Result<Settings, ApiError>;

    /// Replace the user's settings wholesale.
    async fn update_settings(&self, settings: &Settings) -> Result<(), ApiError>;

    async fn models(&self) -> Result<Vec<ModelDescriptor>, ApiError>;

    /// Get a human-readable name for this implementation.
    fn name(&self) -> &str;
}
