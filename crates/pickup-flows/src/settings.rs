//! Settings flow: load, edit and save the user's generation settings.

use std::sync::Arc;

use pickup_core::{ModelDescriptor, PickupApi, Settings, Style};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::ack::{Acknowledgement, COPY_ACK_WINDOW, SAVE_ACK_WINDOW};
use crate::clipboard::Clipboard;
use crate::error::{FlowError, LoadPart};

const LOAD_FAILED: &str = "Failed to load settings";
const SAVE_FAILED: &str = "Failed to save settings";
const MODELS_FAILED: &str = "Failed to load models";

/// View state of the Settings screen.
#[derive(Debug, Clone)]
pub struct SettingsState {
    pub settings: Settings,
    pub models: Vec<ModelDescriptor>,
    pub loading: bool,
    pub saving: bool,
    pub error: Option<String>,
    pub saved: Acknowledgement,
    pub slug_copied: Acknowledgement,
}

impl Default for SettingsState {
    fn default() -> Self {
        Self {
            settings: Settings::default(),
            models: Vec::new(),
            loading: false,
            saving: false,
            error: None,
            saved: Acknowledgement::new(SAVE_ACK_WINDOW),
            slug_copied: Acknowledgement::new(COPY_ACK_WINDOW),
        }
    }
}

impl SettingsState {
    /// Catalog entry of the selected model, if the catalog lists it.
    pub fn selected_model(&self) -> Option<&ModelDescriptor> {
        self.models
            .iter()
            .find(|model| model.id == self.settings.preferred_model)
    }
}

/// Drives the Settings screen.
///
/// Field setters clamp the way the input widgets do; `save` sends the
/// whole object as is.
pub struct SettingsFlow {
    api: Arc<dyn PickupApi>,
    state: RwLock<SettingsState>,
}

impl SettingsFlow {
    pub fn new(api: Arc<dyn PickupApi>) -> Self {
        Self {
            api,
            state: RwLock::new(SettingsState::default()),
        }
    }

    /// Snapshot of the current view state.
    pub async fn state(&self) -> SettingsState {
        self.state.read().await.clone()
    }

    pub async fn settings(&self) -> Settings {
        self.state.read().await.settings.clone()
    }

    /// Fetch the settings and the model catalog concurrently.
    ///
    /// The two reads are independent: whichever succeeds is applied, the
    /// failed part keeps its defaults. Saved settings that do not exist yet
    /// (404) load as defaults without an error.
    pub async fn load(&self) -> Result<(), FlowError> {
        {
            let mut state = self.state.write().await;
            state.loading = true;
            state.error = None;
        }

        let (settings, models) = tokio::join!(self.api.settings(), self.api.models());

        let mut state = self.state.write().await;
        state.loading = false;

        let settings_err = match settings {
            Ok(settings) => {
                state.settings = settings;
                None
            }
            Err(e) if e.is_not_found() => {
                debug!("No saved settings, showing defaults");
                state.settings = Settings::default();
                None
            }
            Err(e) => {
                let err = FlowError::request(e, LOAD_FAILED);
                warn!("Failed to load settings: {}", err);
                state.error = Some(err.to_string());
                Some(err)
            }
        };

        let models_err = match models {
            Ok(models) => {
                debug!("Loaded {} models", models.len());
                state.models = models;
                None
            }
            Err(e) => {
                warn!("Failed to load model catalog: {}", e);
                state.models.clear();
                Some(e.user_message(MODELS_FAILED))
            }
        };

        match (settings_err, models_err) {
            (None, None) => Ok(()),
            (Some(err), Some(_)) => Err(err),
            (Some(err), None) => Err(FlowError::PartialLoad {
                part: LoadPart::Settings,
                message: err.to_string(),
            }),
            (None, Some(message)) => Err(FlowError::PartialLoad {
                part: LoadPart::Models,
                message,
            }),
        }
    }

    pub async fn set_temperature(&self, value: f64) {
        self.state.write().await.settings.set_temperature(value);
    }

    pub async fn set_max_tokens(&self, value: i64) {
        self.state.write().await.settings.set_max_tokens(value);
    }

    pub async fn set_default_dirtiness(&self, value: i64) {
        self.state.write().await.settings.set_default_dirtiness(value);
    }

    pub async fn set_preferred_style(&self, style: Style) {
        self.state.write().await.settings.preferred_style = style;
    }

    pub async fn set_preferred_model(&self, model: impl Into<String>) {
        self.state.write().await.settings.preferred_model = model.into();
    }

    pub async fn set_include_emojis(&self, include: bool) {
        self.state.write().await.settings.include_emojis = include;
    }

    /// A blank template clears it, so the server falls back to its defaults.
    pub async fn set_prompt_template(&self, template: Option<String>) {
        self.state.write().await.settings.custom_prompt_template =
            template.filter(|template| !template.trim().is_empty());
    }

    /// Arbitrary edit of the working copy.
    pub async fn edit(&self, f: impl FnOnce(&mut Settings)) {
        f(&mut self.state.write().await.settings);
    }

    /// Send the whole settings object.
    ///
    /// Success shows the "saved" indicator for three seconds. Failure
    /// leaves an error on screen until the next load or save.
    pub async fn save(&self) -> Result<(), FlowError> {
        let settings = {
            let mut state = self.state.write().await;
            if state.saving {
                return Err(FlowError::Busy);
            }
            state.saving = true;
            state.error = None;
            state.saved.clear();
            state.settings.clone()
        };

        let result = self.api.update_settings(&settings).await;

        let mut state = self.state.write().await;
        state.saving = false;
        match result {
            Ok(()) => {
                info!("Settings saved (model {})", settings.preferred_model);
                state.saved.trigger();
                Ok(())
            }
            Err(e) => {
                let err = FlowError::request(e, SAVE_FAILED);
                warn!("Failed to save settings: {}", err);
                state.error = Some(err.to_string());
                Err(err)
            }
        }
    }

    pub async fn is_saved(&self) -> bool {
        self.state.read().await.saved.is_active()
    }

    /// Copy the selected model id. Independent of the "saved" indicator.
    pub async fn copy_model_slug(&self, clipboard: &dyn Clipboard) -> Result<(), FlowError> {
        let mut state = self.state.write().await;
        clipboard.set_text(&state.settings.preferred_model)?;
        state.slug_copied.trigger();
        Ok(())
    }

    pub async fn is_slug_copied(&self) -> bool {
        self.state.read().await.slug_copied.is_active()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::clipboard::MemoryClipboard;
    use mock_api::{Call, FailingApi, InMemoryApi, Operation};
    use pickup_core::{ApiError, DEFAULT_MODEL};

    fn saved() -> Settings {
        Settings {
            preferred_model: "anthropic/claude-3-haiku".into(),
            temperature: 1.2,
            preferred_style: Style::Cheesy,
            ..Settings::default()
        }
    }

    #[tokio::test]
    async fn test_load_applies_both_reads() {
        let api = Arc::new(InMemoryApi::new().with_settings(saved()));
        let flow = SettingsFlow::new(api.clone());

        flow.load().await.unwrap();

        let state = flow.state().await;
        assert_eq!(state.settings, saved());
        assert_eq!(state.models.len(), 6);
        assert_eq!(
            state.selected_model().map(|model| model.name.as_str()),
            Some("Claude 3 Haiku")
        );
        assert!(!state.loading);
        assert_eq!(api.call_count(Operation::Settings).await, 1);
        assert_eq!(api.call_count(Operation::Models).await, 1);
    }

    #[tokio::test]
    async fn test_missing_settings_load_as_defaults() {
        let flow = SettingsFlow::new(Arc::new(InMemoryApi::new()));
        flow.load().await.unwrap();

        let state = flow.state().await;
        assert_eq!(state.settings, Settings::default());
        assert_eq!(state.settings.preferred_model, DEFAULT_MODEL);
        assert!(state.error.is_none());
    }

    #[tokio::test]
    async fn test_catalog_failure_does_not_block_settings() {
        let api = Arc::new(InMemoryApi::new().with_settings(saved()));
        api.fail_on(Operation::Models, ApiError::Timeout).await;
        let flow = SettingsFlow::new(api);

        let err = flow.load().await.unwrap_err();
        assert!(matches!(
            err,
            FlowError::PartialLoad {
                part: LoadPart::Models,
                ..
            }
        ));

        let state = flow.state().await;
        assert_eq!(state.settings, saved());
        assert!(state.models.is_empty());
        assert!(state.error.is_none());
    }

    #[tokio::test]
    async fn test_settings_failure_keeps_catalog() {
        let api = Arc::new(InMemoryApi::new());
        api.fail_on(
            Operation::Settings,
            ApiError::from_status(500, Some("database is locked".into())),
        )
        .await;
        let flow = SettingsFlow::new(api);

        let err = flow.load().await.unwrap_err();
        assert!(matches!(
            err,
            FlowError::PartialLoad {
                part: LoadPart::Settings,
                ..
            }
        ));

        let state = flow.state().await;
        assert_eq!(state.models.len(), 6);
        assert_eq!(state.settings, Settings::default());
        assert_eq!(state.error.as_deref(), Some("database is locked"));
    }

    #[tokio::test]
    async fn test_both_reads_failing() {
        let flow = SettingsFlow::new(Arc::new(FailingApi::unreachable()));

        let err = flow.load().await.unwrap_err();
        assert!(matches!(err, FlowError::Request { .. }));
        assert_eq!(err.to_string(), LOAD_FAILED);
    }

    #[tokio::test]
    async fn test_setters_clamp_like_widgets() {
        let flow = SettingsFlow::new(Arc::new(InMemoryApi::new()));

        flow.set_temperature(2.7).await;
        flow.set_max_tokens(12).await;
        flow.set_default_dirtiness(0).await;
        let settings = flow.settings().await;
        assert_eq!(settings.temperature, 2.0);
        assert_eq!(settings.max_tokens, 50);
        assert_eq!(settings.default_dirtiness_level, 1);

        flow.set_temperature(0.84).await;
        flow.set_max_tokens(237).await;
        flow.set_default_dirtiness(42).await;
        let settings = flow.settings().await;
        assert_eq!(settings.temperature, 0.8);
        assert_eq!(settings.max_tokens, 240);
        assert_eq!(settings.default_dirtiness_level, 10);

        flow.set_prompt_template(Some("   ".into())).await;
        assert_eq!(flow.settings().await.custom_prompt_template, None);
    }

    #[tokio::test]
    async fn test_save_sends_whole_object() {
        let api = Arc::new(InMemoryApi::new());
        let flow = SettingsFlow::new(api.clone());
        flow.load().await.unwrap();
        flow.set_preferred_style(Style::Unhinged).await;
        flow.set_include_emojis(false).await;

        flow.save().await.unwrap();

        let expected = Settings {
            preferred_style: Style::Unhinged,
            include_emojis: false,
            ..Settings::default()
        };
        assert_eq!(
            api.calls().await.last(),
            Some(&Call::UpdateSettings(expected.clone()))
        );
        assert_eq!(
            api.saved_settings().await.map(|s| s.preferred_style),
            Some(Style::Unhinged)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_saved_indicator_clears_after_three_seconds() {
        let flow = SettingsFlow::new(Arc::new(InMemoryApi::new()));
        flow.save().await.unwrap();
        assert!(flow.is_saved().await);

        tokio::time::advance(Duration::from_millis(2999)).await;
        assert!(flow.is_saved().await);

        tokio::time::advance(Duration::from_millis(1)).await;
        assert!(!flow.is_saved().await);
    }

    #[tokio::test]
    async fn test_save_failure_is_persistent() {
        let api = Arc::new(InMemoryApi::new());
        api.fail_on(
            Operation::UpdateSettings,
            ApiError::from_status(400, Some("Temperature must be between 0 and 2".into())),
        )
        .await;
        let flow = SettingsFlow::new(api);

        let err = flow.save().await.unwrap_err();
        assert_eq!(err.to_string(), "Temperature must be between 0 and 2");
        let state = flow.state().await;
        assert!(!state.saving);
        assert!(!state.saved.is_active());
        assert_eq!(
            state.error.as_deref(),
            Some("Temperature must be between 0 and 2")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_slug_copy_is_independent_of_save() {
        let flow = SettingsFlow::new(Arc::new(InMemoryApi::new()));
        let clipboard = MemoryClipboard::new();

        flow.copy_model_slug(&clipboard).await.unwrap();
        assert_eq!(clipboard.contents().as_deref(), Some(DEFAULT_MODEL));
        assert!(flow.is_slug_copied().await);
        assert!(!flow.is_saved().await);

        tokio::time::advance(COPY_ACK_WINDOW).await;
        assert!(!flow.is_slug_copied().await);
    }
}
