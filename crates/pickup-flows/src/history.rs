//! History flow: a filtered, paginated view over past generations.

use std::sync::Arc;

use pickup_core::{
    is_valid_rating, HistoryFilters, HistoryQuery, PickupApi, PickupLine, RecordUpdate,
    DEFAULT_PER_PAGE,
};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::ack::{Acknowledgement, COPY_ACK_WINDOW};
use crate::clipboard::Clipboard;
use crate::error::FlowError;

const LIST_FAILED: &str = "Failed to load history";
const UPDATE_FAILED: &str = "Failed to update pickup line";
const DELETE_FAILED: &str = "Failed to delete pickup line";

/// A notes edit in progress for one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotesDraft {
    pub id: String,
    pub text: String,
}

/// View state of the History screen.
#[derive(Debug, Clone)]
pub struct HistoryState {
    /// Records of the current page, as last returned by the server.
    pub records: Vec<PickupLine>,
    /// 1-indexed.
    pub page: u32,
    /// Total page count from the last listing; 0 when nothing matches.
    pub pages: u32,
    pub per_page: u32,
    pub filters: HistoryFilters,
    /// Free-text search over the current page only.
    pub search: String,
    pub loading: bool,
    pub error: Option<String>,
    pub notes_draft: Option<NotesDraft>,
    pub copied_id: Option<String>,
    pub copied: Acknowledgement,
}

impl Default for HistoryState {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            page: 1,
            pages: 0,
            per_page: DEFAULT_PER_PAGE,
            filters: HistoryFilters::default(),
            search: String::new(),
            loading: false,
            error: None,
            notes_draft: None,
            copied_id: None,
            copied: Acknowledgement::new(COPY_ACK_WINDOW),
        }
    }
}

impl HistoryState {
    /// Records of the current page that match the search text.
    pub fn visible(&self) -> Vec<&PickupLine> {
        search_page(&self.records, &self.search)
    }

    /// Query for the current page and filters.
    pub fn query(&self) -> HistoryQuery {
        HistoryQuery::new(self.page, self.per_page, self.filters.clone())
    }

    pub fn has_next_page(&self) -> bool {
        self.page < self.pages
    }

    pub fn has_previous_page(&self) -> bool {
        self.page > 1
    }

    pub fn is_copied(&self, id: &str) -> bool {
        self.copied.is_active() && self.copied_id.as_deref() == Some(id)
    }
}

/// Case-insensitive search over already fetched records.
///
/// Blank queries match everything. Only the given records are searched;
/// other pages are not consulted.
pub fn search_page<'a>(records: &'a [PickupLine], query: &str) -> Vec<&'a PickupLine> {
    let query = query.trim();
    if query.is_empty() {
        return records.iter().collect();
    }
    records.iter().filter(|record| record.matches(query)).collect()
}

/// Drives the History screen.
///
/// Mutations never patch local records: every successful update or delete
/// is followed by exactly one re-fetch of the current page and filters.
pub struct HistoryFlow {
    api: Arc<dyn PickupApi>,
    state: RwLock<HistoryState>,
}

impl HistoryFlow {
    pub fn new(api: Arc<dyn PickupApi>) -> Self {
        Self::with_per_page(api, DEFAULT_PER_PAGE)
    }

    pub fn with_per_page(api: Arc<dyn PickupApi>, per_page: u32) -> Self {
        Self {
            api,
            state: RwLock::new(HistoryState {
                per_page: per_page.max(1),
                ..HistoryState::default()
            }),
        }
    }

    /// Snapshot of the current view state.
    pub async fn state(&self) -> HistoryState {
        self.state.read().await.clone()
    }

    /// Owned copy of the records [`HistoryState::visible`] would show.
    pub async fn visible(&self) -> Vec<PickupLine> {
        let state = self.state.read().await;
        state.visible().into_iter().cloned().collect()
    }

    /// Fetch the current page with the current filters.
    ///
    /// When the server reports fewer pages than the tracked page, the page
    /// is clamped so the next listing asks for a page that exists.
    pub async fn list(&self) -> Result<(), FlowError> {
        let query = self.state.read().await.query();
        self.fetch(query).await
    }

    /// Move to `page` and fetch it. The tracked page only changes once the
    /// listing succeeds.
    pub async fn set_page(&self, page: u32) -> Result<(), FlowError> {
        let query = {
            let state = self.state.read().await;
            HistoryQuery::new(page.max(1), state.per_page, state.filters.clone())
        };
        self.fetch(query).await
    }

    pub async fn next_page(&self) -> Result<(), FlowError> {
        let page = {
            let state = self.state.read().await;
            if !state.has_next_page() {
                return Ok(());
            }
            state.page + 1
        };
        self.set_page(page).await
    }

    pub async fn previous_page(&self) -> Result<(), FlowError> {
        let page = {
            let state = self.state.read().await;
            if !state.has_previous_page() {
                return Ok(());
            }
            state.page - 1
        };
        self.set_page(page).await
    }

    /// Fetch an arbitrary page with new filters in one request.
    pub async fn open(&self, page: u32, filters: HistoryFilters) -> Result<(), FlowError> {
        let per_page = self.state.read().await.per_page;
        self.fetch(HistoryQuery::new(page.max(1), per_page, filters))
            .await
    }

    /// Replace the filters and fetch page 1 with them.
    pub async fn set_filters(&self, filters: HistoryFilters) -> Result<(), FlowError> {
        let per_page = self.state.read().await.per_page;
        self.fetch(HistoryQuery::new(1, per_page, filters)).await
    }

    async fn fetch(&self, query: HistoryQuery) -> Result<(), FlowError> {
        {
            let mut state = self.state.write().await;
            state.loading = true;
            state.error = None;
        }

        debug!("Listing history page {} ({:?})", query.page, query.filters);
        let result = self.api.list_history(&query).await;

        let mut state = self.state.write().await;
        state.loading = false;
        match result {
            Ok(page) => {
                state.records = page.history;
                state.pages = page.pages;
                state.filters = query.filters;
                let last = page.pages.max(1);
                state.page = if query.page > last {
                    debug!("Page {} no longer exists, clamping to {}", query.page, last);
                    last
                } else {
                    query.page
                };
                Ok(())
            }
            Err(e) => {
                let err = FlowError::request(e, LIST_FAILED);
                warn!("History listing failed: {}", err);
                state.error = Some(err.to_string());
                Err(err)
            }
        }
    }

    /// Narrow the current page locally. Never touches the network.
    pub async fn set_search(&self, search: impl Into<String>) {
        self.state.write().await.search = search.into();
    }

    pub async fn set_rating(&self, id: &str, rating: u8) -> Result<(), FlowError> {
        if !is_valid_rating(rating) {
            return Err(FlowError::validation("Rating must be between 1 and 5"));
        }
        self.update(id, RecordUpdate::rating(rating)).await
    }

    /// Mark a line used or unused. Turning `used` off leaves `success` as is.
    pub async fn toggle_used(&self, id: &str, used: bool) -> Result<(), FlowError> {
        self.update(id, RecordUpdate::used(used)).await
    }

    pub async fn toggle_success(&self, id: &str, success: bool) -> Result<(), FlowError> {
        self.update(id, RecordUpdate::success(success)).await
    }

    pub async fn set_notes(&self, id: &str, notes: impl Into<String>) -> Result<(), FlowError> {
        self.update(id, RecordUpdate::notes(notes)).await
    }

    /// Delete a record, then re-fetch the current page.
    ///
    /// Emptying the last page does not step back on its own; the listing
    /// clamps the tracked page instead.
    pub async fn delete(&self, id: &str) -> Result<(), FlowError> {
        if let Err(e) = self.api.delete_history(id).await {
            return Err(self.fail(FlowError::request(e, DELETE_FAILED)).await);
        }
        info!("Deleted history record {}", id);
        self.after_mutation(id).await;
        self.list().await
    }

    /// Copy a record's line and acknowledge it for two seconds.
    pub async fn copy(&self, id: &str, clipboard: &dyn Clipboard) -> Result<(), FlowError> {
        let mut state = self.state.write().await;
        let text = state
            .records
            .iter()
            .find(|record| record.id == id)
            .map(|record| record.pickup_line.clone())
            .ok_or_else(|| FlowError::validation(format!("No pickup line {} on this page", id)))?;
        clipboard.set_text(&text)?;
        state.copied_id = Some(id.to_string());
        state.copied.trigger();
        Ok(())
    }

    /// Start editing notes for a record, pre-filled with its current notes.
    pub async fn begin_notes(&self, id: &str) -> Result<(), FlowError> {
        let mut state = self.state.write().await;
        let text = state
            .records
            .iter()
            .find(|record| record.id == id)
            .map(|record| record.notes.clone().unwrap_or_default())
            .ok_or_else(|| FlowError::validation(format!("No pickup line {} on this page", id)))?;
        state.notes_draft = Some(NotesDraft {
            id: id.to_string(),
            text,
        });
        Ok(())
    }

    pub async fn edit_notes(&self, text: impl Into<String>) {
        if let Some(draft) = self.state.write().await.notes_draft.as_mut() {
            draft.text = text.into();
        }
    }

    pub async fn cancel_notes(&self) {
        self.state.write().await.notes_draft = None;
    }

    /// Send the draft. The draft is kept if the update fails.
    pub async fn submit_notes(&self) -> Result<(), FlowError> {
        let Some(draft) = self.state.read().await.notes_draft.clone() else {
            return Err(FlowError::validation("No notes are being edited"));
        };
        self.set_notes(&draft.id, draft.text).await
    }

    async fn update(&self, id: &str, update: RecordUpdate) -> Result<(), FlowError> {
        debug!("Updating history record {}: {:?}", id, update);
        if let Err(e) = self.api.update_record(id, update).await {
            return Err(self.fail(FlowError::request(e, UPDATE_FAILED)).await);
        }
        self.after_mutation(id).await;
        self.list().await
    }

    async fn after_mutation(&self, id: &str) {
        let mut state = self.state.write().await;
        if state.notes_draft.as_ref().is_some_and(|draft| draft.id == id) {
            state.notes_draft = None;
        }
    }

    async fn fail(&self, err: FlowError) -> FlowError {
        warn!("History update failed: {}", err);
        self.state.write().await.error = Some(err.to_string());
        err
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clipboard::MemoryClipboard;
    use mock_api::{fixtures, Call, InMemoryApi, Operation};
    use pickup_core::{ApiError, Style};

    async fn listed(api: &Arc<InMemoryApi>) -> HistoryFlow {
        let flow = HistoryFlow::new(api.clone());
        flow.list().await.unwrap();
        api.clear_calls().await;
        flow
    }

    #[test]
    fn test_search_page_is_case_insensitive() {
        let records = vec![
            fixtures::record("a", "Loves HIKING", "Are you a trail?"),
            fixtures::record("b", "plays chess", "Checkmate"),
            fixtures::record("c", "reads", "You must be a Hiking boot"),
        ];

        let ids = |query: &str| -> Vec<String> {
            search_page(&records, query)
                .into_iter()
                .map(|record| record.id.clone())
                .collect()
        };
        assert_eq!(ids("hiking"), vec!["a", "c"]);
        assert_eq!(ids("CHECK"), vec!["b"]);
        assert_eq!(ids("   "), vec!["a", "b", "c"]);
        assert!(ids("surfing").is_empty());
    }

    #[tokio::test]
    async fn test_list_tracks_pages() {
        let api = Arc::new(InMemoryApi::with_records(fixtures::records(25)));
        let flow = HistoryFlow::new(api.clone());

        flow.list().await.unwrap();
        let state = flow.state().await;
        assert_eq!(state.records.len(), 10);
        assert_eq!(state.pages, 3);
        assert_eq!(state.records[0].id, "r25");

        flow.next_page().await.unwrap();
        flow.next_page().await.unwrap();
        flow.next_page().await.unwrap();
        let state = flow.state().await;
        assert_eq!(state.page, 3);
        assert_eq!(state.records.len(), 5);
        assert_eq!(api.call_count(Operation::ListHistory).await, 3);
    }

    #[tokio::test]
    async fn test_search_never_fetches() {
        let api = Arc::new(InMemoryApi::with_records(fixtures::records(3)));
        let flow = listed(&api).await;

        flow.set_search("NUMBER 2").await;
        let visible = flow.visible().await;
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].id, "r2");
        assert!(api.calls().await.is_empty());
    }

    #[tokio::test]
    async fn test_filter_change_resets_page() {
        let api = Arc::new(InMemoryApi::with_records(fixtures::records(25)));
        let flow = HistoryFlow::new(api.clone());
        flow.set_page(2).await.unwrap();

        let filters = HistoryFilters {
            style: Some(Style::Playful),
            ..HistoryFilters::default()
        };
        flow.set_filters(filters.clone()).await.unwrap();

        assert_eq!(
            api.calls().await.last(),
            Some(&Call::ListHistory(HistoryQuery::new(1, 10, filters)))
        );
        assert_eq!(flow.state().await.page, 1);
    }

    #[tokio::test]
    async fn test_open_fetches_once() {
        let api = Arc::new(InMemoryApi::with_records(fixtures::records(25)));
        let flow = HistoryFlow::with_per_page(api.clone(), 5);
        let filters = HistoryFilters {
            used_only: true,
            ..HistoryFilters::default()
        };

        flow.open(3, filters.clone()).await.unwrap();

        // No record is used, so page 3 does not exist.
        assert_eq!(
            api.calls().await,
            vec![Call::ListHistory(HistoryQuery::new(3, 5, filters.clone()))]
        );
        let state = flow.state().await;
        assert_eq!(state.page, 1);
        assert_eq!(state.pages, 0);
        assert_eq!(state.filters, filters);
    }

    #[tokio::test]
    async fn test_mutation_refetches_once() {
        let api = Arc::new(InMemoryApi::with_records(fixtures::records(3)));
        let flow = listed(&api).await;

        flow.set_rating("r2", 4).await.unwrap();

        assert_eq!(
            api.calls().await,
            vec![
                Call::UpdateRecord("r2".into(), RecordUpdate::rating(4)),
                Call::ListHistory(HistoryQuery::default()),
            ]
        );
        let state = flow.state().await;
        let record = state.records.iter().find(|r| r.id == "r2").unwrap();
        assert_eq!(record.rating, Some(4));
    }

    #[tokio::test]
    async fn test_failed_mutation_keeps_page() {
        let api = Arc::new(InMemoryApi::with_records(fixtures::records(3)));
        let flow = listed(&api).await;
        api.fail_on(
            Operation::UpdateRecord,
            ApiError::from_status(400, Some("Rating must be between 1 and 5".into())),
        )
        .await;

        let err = flow.toggle_used("r1", true).await.unwrap_err();
        assert_eq!(err.to_string(), "Rating must be between 1 and 5");
        assert_eq!(api.call_count(Operation::ListHistory).await, 0);

        let state = flow.state().await;
        assert_eq!(state.records.len(), 3);
        assert_eq!(state.error.as_deref(), Some("Rating must be between 1 and 5"));
    }

    #[tokio::test]
    async fn test_unused_keeps_success() {
        let api = Arc::new(InMemoryApi::with_records(fixtures::records(1)));
        let flow = listed(&api).await;

        flow.toggle_used("r1", true).await.unwrap();
        flow.toggle_success("r1", true).await.unwrap();
        flow.toggle_used("r1", false).await.unwrap();

        let record = flow.state().await.records[0].clone();
        assert!(!record.used);
        assert_eq!(record.success, Some(true));
        assert!(!record.offers_success_toggle());
    }

    #[tokio::test]
    async fn test_invalid_rating_is_local() {
        let api = Arc::new(InMemoryApi::with_records(fixtures::records(1)));
        let flow = listed(&api).await;

        assert!(matches!(
            flow.set_rating("r1", 6).await,
            Err(FlowError::Validation(_))
        ));
        assert!(api.calls().await.is_empty());
    }

    #[tokio::test]
    async fn test_notes_draft() {
        let api = Arc::new(InMemoryApi::with_records(fixtures::records(2)));
        let flow = listed(&api).await;

        flow.begin_notes("r1").await.unwrap();
        assert_eq!(
            flow.state().await.notes_draft,
            Some(NotesDraft {
                id: "r1".into(),
                text: String::new()
            })
        );

        flow.edit_notes("worked at the bar").await;
        flow.submit_notes().await.unwrap();

        let state = flow.state().await;
        assert!(state.notes_draft.is_none());
        let record = state.records.iter().find(|r| r.id == "r1").unwrap();
        assert_eq!(record.notes.as_deref(), Some("worked at the bar"));

        flow.begin_notes("r1").await.unwrap();
        flow.cancel_notes().await;
        assert!(flow.state().await.notes_draft.is_none());
        assert!(flow.submit_notes().await.is_err());
    }

    #[tokio::test]
    async fn test_copy_acknowledges_record() {
        let api = Arc::new(InMemoryApi::with_records(fixtures::records(2)));
        let flow = listed(&api).await;
        let clipboard = MemoryClipboard::new();

        flow.copy("r2", &clipboard).await.unwrap();

        assert_eq!(clipboard.contents().as_deref(), Some("pickup line number 2"));
        let state = flow.state().await;
        assert!(state.is_copied("r2"));
        assert!(!state.is_copied("r1"));
        assert!(flow.copy("missing", &clipboard).await.is_err());
    }

    #[tokio::test]
    async fn test_list_failure_keeps_records() {
        let api = Arc::new(InMemoryApi::with_records(fixtures::records(2)));
        let flow = listed(&api).await;
        api.fail_on(Operation::ListHistory, ApiError::Timeout).await;

        assert!(flow.list().await.is_err());
        let state = flow.state().await;
        assert_eq!(state.records.len(), 2);
        assert_eq!(state.error.as_deref(), Some(LIST_FAILED));
        assert!(!state.loading);
    }
}
