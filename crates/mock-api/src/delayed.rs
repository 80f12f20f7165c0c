//! Delayed API - wraps another API with artificial latency.

use std::time::Duration;

use pickup_core::{
    async_trait, ApiError, GenerateRequest, Generated, HistoryPage, HistoryQuery,
    ModelDescriptor, PickupApi, RecordUpdate, Settings, StatsSnapshot,
};
use tokio::time::sleep;

/// An API that wraps another API and adds artificial delay to every call.
///
/// Useful for testing in-flight guards and simulating a slow backend.
pub struct DelayedApi<A: PickupApi> {
    inner: A,
    delay: Duration,
}

impl<A: PickupApi> DelayedApi<A> {
    /// Create a new DelayedApi wrapping the given API with the specified delay.
    pub fn new(inner: A, delay: Duration) -> Self {
        Self { inner, delay }
    }

    /// Create an API with a delay in milliseconds.
    pub fn with_millis(inner: A, millis: u64) -> Self {
        Self::new(inner, Duration::from_millis(millis))
    }

    /// The wrapped API.
    pub fn inner(&self) -> &A {
        &self.inner
    }
}

#[async_trait]
impl<A: PickupApi> PickupApi for DelayedApi<A> {
    async fn generate(&self, request: GenerateRequest) -> Result<Generated, ApiError> {
        sleep(self.delay).await;
        self.inner.generate(request).await
    }

    async fn regenerate(&self, history_id: &str) -> Result<Generated, ApiError> {
        sleep(self.delay).await;
        self.inner.regenerate(history_id).await
    }

    async fn update_record(&self, id: &str, update: RecordUpdate) -> Result<(), ApiError> {
        sleep(self.delay).await;
        self.inner.update_record(id, update).await
    }

    async fn list_history(&self, query: &HistoryQuery) -> Result<HistoryPage, ApiError> {
        sleep(self.delay).await;
        self.inner.list_history(query).await
    }

    async fn delete_history(&self, id: &str) -> Result<(), ApiError> {
        sleep(self.delay).await;
        self.inner.delete_history(id).await
    }

    async fn stats(&self) -> Result<StatsSnapshot, ApiError> {
        sleep(self.delay).await;
        self.inner.stats().await
    }

    async fn settings(&self) -> Result<Settings, ApiError> {
        sleep(self.delay).await;
        self.inner.settings().await
    }

    async fn update_settings(&self, settings: &Settings) -> Result<(), ApiError> {
        sleep(self.delay).await;
        self.inner.update_settings(settings).await
    }

    async fn models(&self) -> Result<Vec<ModelDescriptor>, ApiError> {
        sleep(self.delay).await;
        self.inner.models().await
    }

    fn name(&self) -> &str {
        "DelayedApi"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::InMemoryApi;
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn test_delayed_api() {
        let api = DelayedApi::with_millis(InMemoryApi::new(), 100);

        let start = Instant::now();
        let models = api.models().await.unwrap();
        let elapsed = start.elapsed();

        assert_eq!(models.len(), 6);
        assert!(elapsed >= Duration::from_millis(100));
    }

    #[tokio::test]
    async fn test_api_name() {
        let api = DelayedApi::with_millis(InMemoryApi::new(), 0);
        assert_eq!(api.name(), "DelayedApi");
        assert_eq!(api.inner().name(), "InMemoryApi");
    }
}
