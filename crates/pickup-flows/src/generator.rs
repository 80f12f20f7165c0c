//! Generator flow: one generation, regeneration and rating cycle.

use std::sync::Arc;

use pickup_core::{
    clamp_dirtiness, is_valid_rating, GenerateRequest, Generated, PickupApi, RecordUpdate, Style,
};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::ack::{Acknowledgement, COPY_ACK_WINDOW};
use crate::clipboard::Clipboard;
use crate::error::FlowError;

const EMPTY_DESCRIPTION: &str = "Please describe the person of interest";
const GENERATE_FAILED: &str = "Failed to generate pickup line";
const REGENERATE_FAILED: &str = "Failed to regenerate";

/// The line currently on screen and the parameters that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayedLine {
    pub text: String,
    pub style: Style,
    pub dirtiness_level: u8,
}

impl DisplayedLine {
    /// Labels shown above the line: the style and `Dirtiness: N/10`.
    pub fn chips(&self) -> [String; 2] {
        [
            self.style.as_str().to_string(),
            format!("Dirtiness: {}/10", self.dirtiness_level),
        ]
    }
}

/// View state of the Generator screen.
#[derive(Debug, Clone)]
pub struct GeneratorState {
    pub description: String,
    pub dirtiness_level: u8,
    pub style: Style,
    pub line: Option<DisplayedLine>,
    /// Record behind the displayed line; regenerate derives from it.
    pub history_id: Option<String>,
    pub loading: bool,
    pub error: Option<String>,
    pub copied: Acknowledgement,
    /// Whether defaults were already taken from the user's settings.
    pub seeded: bool,
}

impl Default for GeneratorState {
    fn default() -> Self {
        Self {
            description: String::new(),
            dirtiness_level: 5,
            style: Style::default(),
            line: None,
            history_id: None,
            loading: false,
            error: None,
            copied: Acknowledgement::new(COPY_ACK_WINDOW),
            seeded: false,
        }
    }
}

/// Drives the Generator screen.
///
/// At most one generate/regenerate request is in flight per instance;
/// overlapping calls fail with [`FlowError::Busy`] without touching the
/// network. A failed request never clears the displayed line.
pub struct GeneratorFlow {
    api: Arc<dyn PickupApi>,
    state: RwLock<GeneratorState>,
}

impl GeneratorFlow {
    pub fn new(api: Arc<dyn PickupApi>) -> Self {
        Self {
            api,
            state: RwLock::new(GeneratorState::default()),
        }
    }

    /// Snapshot of the current view state.
    pub async fn state(&self) -> GeneratorState {
        self.state.read().await.clone()
    }

    /// Seed the dirtiness and style inputs from the user's settings.
    ///
    /// Runs once per flow; later calls do nothing, so edits made on the
    /// Settings screen afterwards never change inputs already on screen.
    /// A failed read keeps the built-in defaults.
    pub async fn init(&self) {
        if self.state.read().await.seeded {
            return;
        }

        let result = self.api.settings().await;
        let mut state = self.state.write().await;
        if state.seeded {
            return;
        }
        state.seeded = true;

        match result {
            Ok(settings) => {
                state.dirtiness_level = clamp_dirtiness(settings.default_dirtiness_level.into());
                state.style = settings.preferred_style;
                debug!(
                    "Generator seeded from settings: dirtiness {}, style {}",
                    state.dirtiness_level, state.style
                );
            }
            Err(e) if e.is_not_found() => debug!("No saved settings, using defaults"),
            Err(e) => warn!("Failed to fetch settings: {}", e),
        }
    }

    pub async fn set_description(&self, description: impl Into<String>) {
        self.state.write().await.description = description.into();
    }

    pub async fn set_dirtiness(&self, level: i64) {
        self.state.write().await.dirtiness_level = clamp_dirtiness(level);
    }

    pub async fn set_style(&self, style: Style) {
        self.state.write().await.style = style;
    }

    /// Generate a fresh line from the current inputs.
    pub async fn generate(&self) -> Result<Generated, FlowError> {
        let request = {
            let mut state = self.state.write().await;
            if state.loading {
                return Err(FlowError::Busy);
            }
            let description = state.description.trim().to_string();
            if description.is_empty() {
                state.error = Some(EMPTY_DESCRIPTION.to_string());
                return Err(FlowError::validation(EMPTY_DESCRIPTION));
            }
            begin(&mut state);
            GenerateRequest::new(description, state.dirtiness_level, state.style)
        };

        debug!(
            "Generating {} line at dirtiness {}",
            request.style, request.dirtiness_level
        );
        let result = self.api.generate(request.clone()).await;

        let mut state = self.state.write().await;
        state.loading = false;
        match result {
            Ok(generated) => {
                show(
                    &mut state,
                    &generated,
                    request.style,
                    request.dirtiness_level,
                );
                info!("Generated line {}", generated.history_id);
                Ok(generated)
            }
            Err(e) => Err(fail(&mut state, FlowError::request(e, GENERATE_FAILED))),
        }
    }

    /// Ask for another line from the record behind the displayed one.
    ///
    /// Without a previous generation this is exactly [`Self::generate`].
    pub async fn regenerate(&self) -> Result<Generated, FlowError> {
        let source = {
            let mut state = self.state.write().await;
            if state.loading {
                return Err(FlowError::Busy);
            }
            match state.history_id.clone() {
                Some(history_id) => {
                    begin(&mut state);
                    let previous = state.line.as_ref().map(|line| (line.style, line.dirtiness_level));
                    Some((history_id, previous))
                }
                None => None,
            }
        };

        let Some((history_id, previous)) = source else {
            return self.generate().await;
        };

        debug!("Regenerating from {}", history_id);
        let result = self.api.regenerate(&history_id).await;

        let mut state = self.state.write().await;
        state.loading = false;
        match result {
            Ok(generated) => {
                let (style, dirtiness) =
                    previous.unwrap_or((state.style, state.dirtiness_level));
                show(&mut state, &generated, style, dirtiness);
                info!("Regenerated {} into {}", history_id, generated.history_id);
                Ok(generated)
            }
            Err(e) => Err(fail(&mut state, FlowError::request(e, REGENERATE_FAILED))),
        }
    }

    /// Send a 1-5 star rating for the displayed line.
    ///
    /// Fire and forget: the rating is not kept in view state, and a failure
    /// is logged and returned but not shown on screen.
    pub async fn rate(&self, rating: u8) -> Result<(), FlowError> {
        if !is_valid_rating(rating) {
            return Err(FlowError::validation("Rating must be between 1 and 5"));
        }
        let Some(history_id) = self.state.read().await.history_id.clone() else {
            return Err(FlowError::validation("Generate a pickup line before rating it"));
        };

        self.api
            .update_record(&history_id, RecordUpdate::rating(rating))
            .await
            .map_err(|e| {
                warn!("Failed to rate pickup line {}: {}", history_id, e);
                FlowError::request(e, "Failed to rate pickup line")
            })
    }

    /// Copy the displayed line and show "Copied!" for two seconds.
    pub async fn copy(&self, clipboard: &dyn Clipboard) -> Result<(), FlowError> {
        let mut state = self.state.write().await;
        let Some(line) = state.line.as_ref() else {
            return Err(FlowError::validation("Nothing to copy yet"));
        };
        clipboard.set_text(&line.text)?;
        state.copied.trigger();
        Ok(())
    }

    pub async fn is_copied(&self) -> bool {
        self.state.read().await.copied.is_active()
    }
}

fn begin(state: &mut GeneratorState) {
    state.loading = true;
    state.error = None;
    state.copied.clear();
}

fn show(state: &mut GeneratorState, generated: &Generated, style: Style, dirtiness: u8) {
    state.line = Some(DisplayedLine {
        text: generated.pickup_line.clone(),
        style: generated.style.unwrap_or(style),
        dirtiness_level: generated.dirtiness_level.unwrap_or(dirtiness),
    });
    state.history_id = Some(generated.history_id.clone());
}

fn fail(state: &mut GeneratorState, err: FlowError) -> FlowError {
    warn!("Generation failed: {}", err);
    state.error = Some(err.to_string());
    err
}

#[cfg(test)]
mod tests {
    use super::*;
    use mock_api::{Call, FailingApi, InMemoryApi, Operation};
    use pickup_core::{ApiError, Settings};

    fn flow(api: &Arc<InMemoryApi>) -> GeneratorFlow {
        GeneratorFlow::new(api.clone())
    }

    #[tokio::test]
    async fn test_blank_description_makes_no_call() {
        for description in ["", "   ", "\n\t "] {
            let api = Arc::new(InMemoryApi::new());
            let generator = flow(&api);
            generator.set_description(description).await;

            let err = generator.generate().await.unwrap_err();
            assert!(matches!(err, FlowError::Validation(_)));
            assert!(api.calls().await.is_empty());

            let state = generator.state().await;
            assert_eq!(state.error.as_deref(), Some(EMPTY_DESCRIPTION));
            assert!(!state.loading);
        }
    }

    #[tokio::test]
    async fn test_generate_trims_and_displays() {
        let api = Arc::new(InMemoryApi::new());
        let generator = flow(&api);
        generator.set_description("  loves hiking  ").await;
        generator.set_dirtiness(7).await;
        generator.set_style(Style::Funny).await;

        let generated = generator.generate().await.unwrap();

        assert_eq!(
            api.calls().await,
            vec![Call::Generate(GenerateRequest::new("loves hiking", 7, Style::Funny))]
        );
        let state = generator.state().await;
        let line = state.line.unwrap();
        assert_eq!(line.text, generated.pickup_line);
        assert_eq!(line.chips(), ["funny".to_string(), "Dirtiness: 7/10".to_string()]);
        assert_eq!(state.history_id, Some(generated.history_id));
        assert!(!state.loading);
        assert!(state.error.is_none());
    }

    #[tokio::test]
    async fn test_regenerate_without_history_is_generate() {
        let api = Arc::new(InMemoryApi::new());
        let generator = flow(&api);
        generator.set_description("plays chess").await;
        generator.set_style(Style::Cheesy).await;

        generator.regenerate().await.unwrap();

        let calls = api.calls().await;
        assert_eq!(
            calls,
            vec![Call::Generate(GenerateRequest::new("plays chess", 5, Style::Cheesy))]
        );
    }

    #[tokio::test]
    async fn test_regenerate_uses_tracked_history_id() {
        let api = Arc::new(InMemoryApi::new());
        let generator = flow(&api);
        generator.set_description("plays chess").await;
        let first = generator.generate().await.unwrap();

        // Inputs edited after the first generation do not affect regenerate.
        generator.set_style(Style::Unhinged).await;
        let second = generator.regenerate().await.unwrap();

        assert_eq!(
            api.calls().await.last(),
            Some(&Call::Regenerate(first.history_id.clone()))
        );
        let state = generator.state().await;
        assert_eq!(state.history_id, Some(second.history_id.clone()));
        assert_ne!(first.history_id, second.history_id);
        assert_eq!(state.line.unwrap().style, Style::Playful);

        // The originating record is left untouched.
        let source = api.record(&first.history_id).await.unwrap();
        assert_eq!(source.pickup_line, first.pickup_line);
    }

    #[tokio::test]
    async fn test_failure_keeps_previous_line() {
        let api = Arc::new(InMemoryApi::new());
        let generator = flow(&api);
        generator.set_description("loves hiking").await;
        let first = generator.generate().await.unwrap();

        api.fail_on(
            Operation::Regenerate,
            ApiError::from_status(500, Some("OpenRouter is down".into())),
        )
        .await;
        let err = generator.regenerate().await.unwrap_err();
        assert_eq!(err.to_string(), "OpenRouter is down");

        let state = generator.state().await;
        assert_eq!(state.line.unwrap().text, first.pickup_line);
        assert_eq!(state.history_id, Some(first.history_id));
        assert_eq!(state.error.as_deref(), Some("OpenRouter is down"));
        assert!(!state.loading);
    }

    #[tokio::test]
    async fn test_failure_without_server_message_uses_fallback() {
        let generator = GeneratorFlow::new(Arc::new(FailingApi::unreachable()));
        generator.set_description("loves hiking").await;

        let err = generator.generate().await.unwrap_err();
        assert_eq!(err.to_string(), GENERATE_FAILED);
        assert_eq!(
            generator.state().await.error.as_deref(),
            Some(GENERATE_FAILED)
        );
    }

    #[tokio::test]
    async fn test_new_generate_clears_error() {
        let api = Arc::new(InMemoryApi::new());
        let generator = flow(&api);
        generator.generate().await.unwrap_err();
        assert!(generator.state().await.error.is_some());

        generator.set_description("collects vinyl").await;
        generator.generate().await.unwrap();
        assert!(generator.state().await.error.is_none());
    }

    #[tokio::test]
    async fn test_init_seeds_once() {
        let settings = Settings {
            default_dirtiness_level: 8,
            preferred_style: Style::Romantic,
            ..Settings::default()
        };
        let api = Arc::new(InMemoryApi::new().with_settings(settings.clone()));
        let generator = flow(&api);

        generator.init().await;
        let state = generator.state().await;
        assert_eq!(state.dirtiness_level, 8);
        assert_eq!(state.style, Style::Romantic);

        generator.set_dirtiness(2).await;
        api.update_settings(&Settings {
            default_dirtiness_level: 10,
            ..settings
        })
        .await
        .unwrap();
        generator.init().await;

        assert_eq!(generator.state().await.dirtiness_level, 2);
        assert_eq!(api.call_count(Operation::Settings).await, 1);
    }

    #[tokio::test]
    async fn test_init_without_settings_keeps_defaults() {
        let generator = GeneratorFlow::new(Arc::new(FailingApi::unreachable()));
        generator.init().await;

        let state = generator.state().await;
        assert!(state.seeded);
        assert_eq!(state.dirtiness_level, 5);
        assert_eq!(state.style, Style::Playful);
        assert!(state.error.is_none());
    }

    #[tokio::test]
    async fn test_rate_targets_tracked_record() {
        let api = Arc::new(InMemoryApi::new());
        let generator = flow(&api);

        let err = generator.rate(4).await.unwrap_err();
        assert!(matches!(err, FlowError::Validation(_)));
        assert!(api.calls().await.is_empty());

        generator.set_description("loves hiking").await;
        let generated = generator.generate().await.unwrap();
        generator.rate(4).await.unwrap();

        assert_eq!(
            api.calls().await.last(),
            Some(&Call::UpdateRecord(
                generated.history_id.clone(),
                RecordUpdate::rating(4)
            ))
        );
        assert_eq!(api.record(&generated.history_id).await.unwrap().rating, Some(4));

        assert!(generator.rate(0).await.is_err());
        assert!(generator.rate(6).await.is_err());
    }

    #[tokio::test]
    async fn test_rate_failure_is_not_displayed() {
        let api = Arc::new(InMemoryApi::new());
        let generator = flow(&api);
        generator.set_description("loves hiking").await;
        generator.generate().await.unwrap();

        api.fail_on(Operation::UpdateRecord, ApiError::Timeout).await;
        assert!(generator.rate(5).await.is_err());
        assert!(generator.state().await.error.is_none());
    }
}
