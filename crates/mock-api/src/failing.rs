//! Failing API - every call returns the same error.

use pickup_core::{
    async_trait, ApiError, GenerateRequest, Generated, HistoryPage, HistoryQuery,
    ModelDescriptor, PickupApi, RecordUpdate, Settings, StatsSnapshot,
};

/// An API whose every call fails.
///
/// Useful for checking that flows surface errors and keep their previous
/// state when the backend is down.
#[derive(Debug, Clone)]
pub struct FailingApi {
    error: ApiError,
}

impl FailingApi {
    /// Fail with the given error.
    pub fn new(error: ApiError) -> Self {
        Self { error }
    }

    /// Fail like a server that answered with `status` and an `{"error": message}` body.
    pub fn with_status(status: u16, message: impl Into<String>) -> Self {
        Self::new(ApiError::from_status(status, Some(message.into())))
    }

    /// Fail like an unreachable server.
    pub fn unreachable() -> Self {
        Self::new(ApiError::Network("connection refused".to_string()))
    }

    fn fail<T>(&self) -> Result<T, ApiError> {
        Err(self.error.clone())
    }
}

#[async_trait]
impl PickupApi for FailingApi {
    async fn generate(&self, _request: GenerateRequest) -> Result<Generated, ApiError> {
        self.fail()
    }

    async fn regenerate(&self, _history_id: &str) -> Result<Generated, ApiError> {
        self.fail()
    }

    async fn update_record(&self, _id: &str, _update: RecordUpdate) -> Result<(), ApiError> {
        self.fail()
    }

    async fn list_history(&self, _query: &HistoryQuery) -> Result<HistoryPage, ApiError> {
        self.fail()
    }

    async fn delete_history(&self, _id: &str) -> Result<(), ApiError> {
        self.fail()
    }

    async fn stats(&self) -> Result<StatsSnapshot, ApiError> {
        self.fail()
    }

    async fn settings(&self) -> Result<Settings, ApiError> {
        self.fail()
    }

    async fn update_settings(&self, _settings: &Settings) -> Result<(), ApiError> {
        self.fail()
    }

    async fn models(&self) -> Result<Vec<ModelDescriptor>, ApiError> {
        self.fail()
    }

    fn name(&self) -> &str {
        "FailingApi"
    }
}
