//! Per-user generation settings and the model catalog.

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use crate::style::{clamp_dirtiness, Style};

/// Model the server falls back to for new users.
pub const DEFAULT_MODEL: &str = "meta-llama/llama-3.2-3b-instruct:free";

/// Temperature bounds, inclusive.
pub const TEMPERATURE_RANGE: RangeInclusive<f64> = 0.0..=2.0;
pub const TEMPERATURE_STEP: f64 = 0.1;

/// Max token bounds, inclusive.
pub const MAX_TOKENS_RANGE: RangeInclusive<u32> = 50..=500;
pub const MAX_TOKENS_STEP: u32 = 10;

const EMOJI_SUFFIX: &str = " Include relevant emojis!";

/// Generation configuration, one per user.
///
/// Always saved wholesale: the client never sends a partial object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// May embed `{description}`, `{dirtiness}` and `{style}`.
    pub custom_prompt_template: Option<String>,
    pub preferred_model: String,
    pub temperature: f64,
    pub max_tokens: u32,
    pub default_dirtiness_level: u8,
    pub include_emojis: bool,
    pub preferred_style: Style,
    /// Server bookkeeping; never sent back.
    #[serde(skip_serializing)]
    pub updated_at: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            custom_prompt_template: None,
            preferred_model: DEFAULT_MODEL.to_string(),
            temperature: 0.8,
            max_tokens: 150,
            default_dirtiness_level: 5,
            include_emojis: true,
            preferred_style: Style::Playful,
            updated_at: None,
        }
    }
}

impl Settings {
    /// Set the temperature, snapped to the slider's range and step.
    pub fn set_temperature(&mut self, value: f64) {
        let clamped = value.clamp(*TEMPERATURE_RANGE.start(), *TEMPERATURE_RANGE.end());
        let steps = (1.0 / TEMPERATURE_STEP).round();
        self.temperature = (clamped * steps).round() / steps;
    }

    /// Set max tokens, snapped to the slider's range and step.
    pub fn set_max_tokens(&mut self, value: i64) {
        let (min, max) = (
            *MAX_TOKENS_RANGE.start() as i64,
            *MAX_TOKENS_RANGE.end() as i64,
        );
        let step = MAX_TOKENS_STEP as i64;
        let snapped = ((value.clamp(min, max) + step / 2) / step) * step;
        self.max_tokens = snapped.clamp(min, max) as u32;
    }

    pub fn set_default_dirtiness(&mut self, value: i64) {
        self.default_dirtiness_level = clamp_dirtiness(value);
    }

    /// The custom template, if one is set and non-blank.
    pub fn template(&self) -> Option<&str> {
        self.custom_prompt_template
            .as_deref()
            .filter(|template| !template.trim().is_empty())
    }

    /// Preview the prompt the server builds for a request with these settings.
    pub fn render_prompt(&self, description: &str, dirtiness: u8, style: Style) -> String {
        let mut prompt = match self.template() {
            Some(template) => template
                .replace("{description}", description)
                .replace("{dirtiness}", &dirtiness.to_string())
                .replace("{style}", style.as_str()),
            None => default_prompt(style)
                .replace("{description}", description)
                .replace("{dirtiness}", &dirtiness.to_string()),
        };
        if self.include_emojis {
            prompt.push_str(EMOJI_SUFFIX);
        }
        prompt
    }
}

fn default_prompt(style: Style) -> &'static str {
    match style {
        Style::Playful => "Generate a playful pickup line for someone who {description}. Dirtiness level: {dirtiness}/10. Make it fun and flirty!",
        Style::Romantic => "Generate a romantic pickup line for someone who {description}. Dirtiness level: {dirtiness}/10. Make it sweet and heartfelt!",
        Style::Funny => "Generate a funny pickup line for someone who {description}. Dirtiness level: {dirtiness}/10. Make it humorous and witty!",
        Style::Cheesy => "Generate a cheesy pickup line for someone who {description}. Dirtiness level: {dirtiness}/10. Make it over-the-top corny!",
        Style::Unhinged => "Generate an unhinged and wild pickup line for someone who {description}. Dirtiness level: {dirtiness}/10. Go crazy and be outrageous!",
    }
}

/// An entry of the server-curated model catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelDescriptor {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

impl ModelDescriptor {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
        }
    }
}

/// Body of `GET /settings/models`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelCatalog {
    pub models: Vec<ModelDescriptor>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert!(settings.custom_prompt_template.is_none());
        assert_eq!(settings.preferred_model, DEFAULT_MODEL);
        assert_eq!(settings.temperature, 0.8);
        assert_eq!(settings.max_tokens, 150);
        assert_eq!(settings.default_dirtiness_level, 5);
        assert!(settings.include_emojis);
        assert_eq!(settings.preferred_style, Style::Playful);
    }

    #[test]
    fn test_temperature_snaps_to_widget() {
        let mut settings = Settings::default();
        settings.set_temperature(2.7);
        assert_eq!(settings.temperature, 2.0);
        settings.set_temperature(-1.0);
        assert_eq!(settings.temperature, 0.0);
        settings.set_temperature(0.34);
        assert_eq!(settings.temperature, 0.3);
    }

    #[test]
    fn test_max_tokens_snaps_to_widget() {
        let mut settings = Settings::default();
        settings.set_max_tokens(10);
        assert_eq!(settings.max_tokens, 50);
        settings.set_max_tokens(9000);
        assert_eq!(settings.max_tokens, 500);
        settings.set_max_tokens(237);
        assert_eq!(settings.max_tokens, 240);
    }

    #[test]
    fn test_default_dirtiness_clamped() {
        let mut settings = Settings::default();
        settings.set_default_dirtiness(11);
        assert_eq!(settings.default_dirtiness_level, 10);
        settings.set_default_dirtiness(0);
        assert_eq!(settings.default_dirtiness_level, 1);
    }

    #[test]
    fn test_updated_at_is_not_sent() {
        let settings: Settings = serde_json::from_value(serde_json::json!({
            "custom_prompt_template": null,
            "preferred_model": "openai/gpt-4o-mini",
            "temperature": 1.2,
            "max_tokens": 200,
            "default_dirtiness_level": 7,
            "include_emojis": false,
            "preferred_style": "unhinged",
            "updated_at": "2024-05-01T10:00:00"
        }))
        .unwrap();
        assert_eq!(settings.updated_at.as_deref(), Some("2024-05-01T10:00:00"));

        let body = serde_json::to_value(&settings).unwrap();
        assert!(body.get("updated_at").is_none());
        assert_eq!(body["preferred_style"], "unhinged");
        assert!(body["custom_prompt_template"].is_null());
    }

    #[test]
    fn test_render_prompt_with_template() {
        let settings = Settings {
            custom_prompt_template: Some(
                "A {style} line for someone who {description} at {dirtiness}/10".into(),
            ),
            include_emojis: false,
            ..Settings::default()
        };
        assert_eq!(
            settings.render_prompt("loves hiking", 7, Style::Funny),
            "A funny line for someone who loves hiking at 7/10"
        );
    }

    #[test]
    fn test_render_prompt_default_with_emojis() {
        let settings = Settings {
            custom_prompt_template: Some("   ".into()),
            ..Settings::default()
        };
        let prompt = settings.render_prompt("reads poetry", 3, Style::Romantic);
        assert!(prompt.starts_with("Generate a romantic pickup line for someone who reads poetry."));
        assert!(prompt.contains("Dirtiness level: 3/10"));
        assert!(prompt.ends_with("Include relevant emojis!"));
    }
}
