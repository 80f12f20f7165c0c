//! In-memory backend that behaves like the real server.

use std::collections::HashMap;

use chrono::{Duration as ChronoDuration, NaiveDate, Utc};
use indexmap::IndexMap;
use pickup_core::{
    async_trait, is_valid_rating, ActivityDay, ApiError, GenerateRequest, Generated,
    HistoryPage, HistoryQuery, ModelDescriptor, Overview, PickupApi, PickupLine, RecordUpdate,
    Settings, StatsSnapshot, StyleSuccess, DIRTINESS_RANGE, MAX_TOKENS_RANGE, TEMPERATURE_RANGE,
};
use tokio::sync::Mutex;
use tracing::debug;

/// Which backend operation a call targeted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Generate,
    Regenerate,
    UpdateRecord,
    ListHistory,
    DeleteHistory,
    Stats,
    Settings,
    UpdateSettings,
    Models,
}

/// A recorded call, with its arguments.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Generate(GenerateRequest),
    Regenerate(String),
    UpdateRecord(String, RecordUpdate),
    ListHistory(HistoryQuery),
    DeleteHistory(String),
    Stats,
    Settings,
    UpdateSettings(Settings),
    Models,
}

impl Call {
    pub fn operation(&self) -> Operation {
        match self {
            Call::Generate(_) => Operation::Generate,
            Call::Regenerate(_) => Operation::Regenerate,
            Call::UpdateRecord(..) => Operation::UpdateRecord,
            Call::ListHistory(_) => Operation::ListHistory,
            Call::DeleteHistory(_) => Operation::DeleteHistory,
            Call::Stats => Operation::Stats,
            Call::Settings => Operation::Settings,
            Call::UpdateSettings(_) => Operation::UpdateSettings,
            Call::Models => Operation::Models,
        }
    }
}

#[derive(Debug, Default)]
struct State {
    /// Newest first.
    records: Vec<PickupLine>,
    settings: Option<Settings>,
    models: Vec<ModelDescriptor>,
    next_id: u64,
    calls: Vec<Call>,
    failures: HashMap<Operation, ApiError>,
}

/// A backend kept entirely in memory.
///
/// Mirrors the server's validation, filtering, pagination and statistics so
/// flows can be exercised end to end. Every call is recorded, including
/// calls that were made to fail with [`InMemoryApi::fail_on`].
#[derive(Debug)]
pub struct InMemoryApi {
    state: Mutex<State>,
}

impl Default for InMemoryApi {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryApi {
    /// Empty history, no saved settings, the default model catalog.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                models: default_catalog(),
                next_id: 1,
                ..State::default()
            }),
        }
    }

    /// Seed with existing records, newest first.
    pub fn with_records(records: Vec<PickupLine>) -> Self {
        Self {
            state: Mutex::new(State {
                models: default_catalog(),
                next_id: records.len() as u64 + 1,
                records,
                ..State::default()
            }),
        }
    }

    /// Seed saved settings.
    pub fn with_settings(self, settings: Settings) -> Self {
        let mut state = self.state.into_inner();
        state.settings = Some(settings);
        Self {
            state: Mutex::new(state),
        }
    }

    /// Make every subsequent call of `operation` fail with `error`.
    pub async fn fail_on(&self, operation: Operation, error: ApiError) {
        self.state.lock().await.failures.insert(operation, error);
    }

    /// Let `operation` succeed again.
    pub async fn clear_failure(&self, operation: Operation) {
        self.state.lock().await.failures.remove(&operation);
    }

    /// Every call made so far, oldest first.
    pub async fn calls(&self) -> Vec<Call> {
        self.state.lock().await.calls.clone()
    }

    /// Number of calls made to `operation`.
    pub async fn call_count(&self, operation: Operation) -> usize {
        self.state
            .lock()
            .await
            .calls
            .iter()
            .filter(|call| call.operation() == operation)
            .count()
    }

    pub async fn clear_calls(&self) {
        self.state.lock().await.calls.clear();
    }

    pub async fn records(&self) -> Vec<PickupLine> {
        self.state.lock().await.records.clone()
    }

    pub async fn record(&self, id: &str) -> Option<PickupLine> {
        self.state
            .lock()
            .await
            .records
            .iter()
            .find(|record| record.id == id)
            .cloned()
    }

    pub async fn saved_settings(&self) -> Option<Settings> {
        self.state.lock().await.settings.clone()
    }

    /// Record the call, then fail if an error was injected for it.
    async fn enter(&self, call: Call) -> Result<tokio::sync::MutexGuard<'_, State>, ApiError> {
        debug!("InMemoryApi call: {:?}", call);
        let mut state = self.state.lock().await;
        let operation = call.operation();
        state.calls.push(call);
        if let Some(error) = state.failures.get(&operation).cloned() {
            return Err(error);
        }
        Ok(state)
    }
}

fn bad_request(message: &str) -> ApiError {
    ApiError::Status {
        status: 400,
        message: Some(message.to_string()),
    }
}

fn now() -> String {
    Utc::now().naive_utc().format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
}

fn create_record(state: &mut State, request: &GenerateRequest) -> Result<Generated, ApiError> {
    if request.person_description.is_empty() {
        return Err(bad_request("Person description is required"));
    }
    if !DIRTINESS_RANGE.contains(&request.dirtiness_level) {
        return Err(bad_request("Dirtiness level must be between 1 and 10"));
    }

    let id = format!("line-{}", state.next_id);
    state.next_id += 1;

    let pickup_line = format!(
        "{} line #{} for someone who {} ({}/10)",
        request.style.label(),
        state.next_id - 1,
        request.person_description,
        request.dirtiness_level
    );
    let model_used = state
        .settings
        .as_ref()
        .map(|settings| settings.preferred_model.clone())
        .unwrap_or_else(|| pickup_core::DEFAULT_MODEL.to_string());

    state.records.insert(
        0,
        PickupLine {
            id: id.clone(),
            person_description: request.person_description.clone(),
            pickup_line: pickup_line.clone(),
            dirtiness_level: request.dirtiness_level,
            style: request.style,
            model_used: Some(model_used),
            rating: None,
            used: false,
            success: None,
            notes: None,
            created_at: now(),
        },
    );

    Ok(Generated {
        pickup_line,
        history_id: id,
        style: Some(request.style),
        dirtiness_level: Some(request.dirtiness_level),
    })
}

fn filter_matches(record: &PickupLine, query: &HistoryQuery) -> bool {
    let filters = &query.filters;
    if let Some(style) = filters.style {
        if record.style != style {
            return false;
        }
    }
    if let Some(min_rating) = filters.min_rating.filter(|min| *min > 0) {
        // Unrated records never satisfy a rating bound.
        if record.rating.map_or(true, |rating| rating < min_rating) {
            return false;
        }
    }
    if filters.used_only && !record.used {
        return false;
    }
    if filters.success_only && !record.is_successful() {
        return false;
    }
    true
}

fn compute_stats(records: &[PickupLine]) -> StatsSnapshot {
    // Oldest first so distributions list styles in first-seen order.
    let chronological: Vec<&PickupLine> = records.iter().rev().collect();

    let total_generated = records.len() as u64;
    let total_used = records.iter().filter(|r| r.used).count() as u64;
    let total_successful = records.iter().filter(|r| r.is_successful()).count() as u64;
    let success_rate = if total_used > 0 {
        total_successful as f64 / total_used as f64 * 100.0
    } else {
        0.0
    };

    let ratings: Vec<f64> = records
        .iter()
        .filter_map(|r| r.rating.filter(|rating| *rating > 0))
        .map(f64::from)
        .collect();
    let average_rating = if ratings.is_empty() {
        None
    } else {
        let mean = ratings.iter().sum::<f64>() / ratings.len() as f64;
        Some((mean * 100.0).round() / 100.0)
    };

    let mut style_distribution = IndexMap::new();
    let mut dirtiness_distribution = IndexMap::new();
    let mut used_by_style: IndexMap<String, (u64, u64)> = IndexMap::new();
    for record in &chronological {
        *style_distribution
            .entry(record.style.as_str().to_string())
            .or_insert(0) += 1;
        *dirtiness_distribution
            .entry(record.dirtiness_level.to_string())
            .or_insert(0) += 1;
        if record.used {
            let entry = used_by_style
                .entry(record.style.as_str().to_string())
                .or_insert((0, 0));
            entry.0 += 1;
            if record.is_successful() {
                entry.1 += 1;
            }
        }
    }

    let success_by_style = used_by_style
        .into_iter()
        .map(|(style, (total, successful))| {
            let rate = if total > 0 {
                successful as f64 / total as f64 * 100.0
            } else {
                0.0
            };
            (
                style,
                StyleSuccess {
                    total,
                    successful: Some(successful),
                    rate,
                },
            )
        })
        .collect();

    let today = Utc::now().date_naive();
    let cutoff = today - ChronoDuration::days(7);
    let mut per_day: IndexMap<NaiveDate, u64> = IndexMap::new();
    for record in &chronological {
        let Some(date) = record
            .created_at
            .get(..10)
            .and_then(|prefix| NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok())
        else {
            continue;
        };
        if date > cutoff {
            *per_day.entry(date).or_insert(0) += 1;
        }
    }
    per_day.sort_keys();
    let recent_activity = per_day
        .into_iter()
        .map(|(date, count)| ActivityDay {
            date: Some(date.format("%Y-%m-%d").to_string()),
            count,
        })
        .collect();

    StatsSnapshot {
        overview: Overview {
            total_generated,
            total_used,
            total_successful: Some(total_successful),
            success_rate,
            average_rating,
        },
        style_distribution,
        dirtiness_distribution,
        success_by_style,
        recent_activity,
    }
}

fn validate_settings(settings: &Settings) -> Result<(), ApiError> {
    if !TEMPERATURE_RANGE.contains(&settings.temperature) {
        return Err(bad_request("Temperature must be between 0 and 2"));
    }
    if !MAX_TOKENS_RANGE.contains(&settings.max_tokens) {
        return Err(bad_request("Max tokens must be between 50 and 500"));
    }
    if !DIRTINESS_RANGE.contains(&settings.default_dirtiness_level) {
        return Err(bad_request("Dirtiness level must be between 1 and 10"));
    }
    Ok(())
}

#[async_trait]
impl PickupApi for InMemoryApi {
    async fn generate(&self, request: GenerateRequest) -> Result<Generated, ApiError> {
        let mut state = self.enter(Call::Generate(request.clone())).await?;
        create_record(&mut state, &request)
    }

    async fn regenerate(&self, history_id: &str) -> Result<Generated, ApiError> {
        let mut state = self.enter(Call::Regenerate(history_id.to_string())).await?;
        let source = state
            .records
            .iter()
            .find(|record| record.id == history_id)
            .ok_or_else(|| ApiError::NotFound(Some("History entry not found".to_string())))?;
        let request = GenerateRequest::new(
            source.person_description.clone(),
            source.dirtiness_level,
            source.style,
        );
        create_record(&mut state, &request)
    }

    async fn update_record(&self, id: &str, update: RecordUpdate) -> Result<(), ApiError> {
        let mut state = self
            .enter(Call::UpdateRecord(id.to_string(), update.clone()))
            .await?;

        if let Some(rating) = update.rating.filter(|rating| *rating != 0) {
            if !is_valid_rating(rating) {
                return Err(bad_request("Rating must be between 1 and 5"));
            }
        }

        let record = state
            .records
            .iter_mut()
            .find(|record| record.id == id)
            .ok_or_else(|| ApiError::NotFound(Some("History entry not found".to_string())))?;

        if let Some(rating) = update.rating.filter(|rating| *rating != 0) {
            record.rating = Some(rating);
        }
        if let Some(used) = update.used {
            record.used = used;
        }
        if let Some(success) = update.success {
            record.success = Some(success);
        }
        if let Some(notes) = update.notes {
            record.notes = Some(notes).filter(|notes| !notes.is_empty());
        }
        Ok(())
    }

    async fn list_history(&self, query: &HistoryQuery) -> Result<HistoryPage, ApiError> {
        let state = self.enter(Call::ListHistory(query.clone())).await?;

        let matching: Vec<&PickupLine> = state
            .records
            .iter()
            .filter(|record| filter_matches(record, query))
            .collect();

        let per_page = query.per_page.max(1);
        let total = matching.len() as u64;
        let pages = total.div_ceil(per_page as u64) as u32;
        let skip = (query.page.max(1) - 1) as usize * per_page as usize;

        Ok(HistoryPage {
            history: matching
                .into_iter()
                .skip(skip)
                .take(per_page as usize)
                .cloned()
                .collect(),
            pages,
            total: Some(total),
            current_page: Some(query.page),
            per_page: Some(per_page),
        })
    }

    async fn delete_history(&self, id: &str) -> Result<(), ApiError> {
        let mut state = self.enter(Call::DeleteHistory(id.to_string())).await?;
        let before = state.records.len();
        state.records.retain(|record| record.id != id);
        if state.records.len() == before {
            return Err(ApiError::NotFound(Some(
                "History item not found".to_string(),
            )));
        }
        Ok(())
    }

    async fn stats(&self) -> Result<StatsSnapshot, ApiError> {
        let state = self.enter(Call::Stats).await?;
        Ok(compute_stats(&state.records))
    }

    async fn settings(&self) -> Result<Settings, ApiError> {
        let state = self.enter(Call::Settings).await?;
        state
            .settings
            .clone()
            .ok_or_else(|| ApiError::NotFound(Some("Settings not found".to_string())))
    }

    async fn update_settings(&self, settings: &Settings) -> Result<(), ApiError> {
        let mut state = self.enter(Call::UpdateSettings(settings.clone())).await?;
        validate_settings(settings)?;
        state.settings = Some(Settings {
            updated_at: Some(now()),
            ..settings.clone()
        });
        Ok(())
    }

    async fn models(&self) -> Result<Vec<ModelDescriptor>, ApiError> {
        let state = self.enter(Call::Models).await?;
        Ok(state.models.clone())
    }

    fn name(&self) -> &str {
        "InMemoryApi"
    }
}

/// The catalog the server curates for pickup line generation.
pub fn default_catalog() -> Vec<ModelDescriptor> {
    vec![
        ModelDescriptor::new(
            "meta-llama/llama-3.2-3b-instruct:free",
            "Llama 3.2 3B (Free)",
            "Fast and free model, good for basic pickup lines",
        ),
        ModelDescriptor::new(
            "nousresearch/hermes-3-llama-3.1-405b:free",
            "Hermes 3 Llama 405B (Free)",
            "Powerful free model, great for creative content",
        ),
        ModelDescriptor::new(
            "google/gemini-flash-1.5",
            "Gemini Flash 1.5",
            "Fast Google model with good creativity",
        ),
        ModelDescriptor::new(
            "anthropic/claude-3-haiku",
            "Claude 3 Haiku",
            "Balanced model with good language understanding",
        ),
        ModelDescriptor::new(
            "openai/gpt-4o-mini",
            "GPT-4o Mini",
            "OpenAI model with excellent creativity",
        ),
        ModelDescriptor::new(
            "mistralai/mistral-large",
            "Mistral Large",
            "Unhinged model, perfect for wild pickup lines",
        ),
    ]
}
