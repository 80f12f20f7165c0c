//! Tone tags and the numeric scales shared by inputs and validation.

use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Valid dirtiness levels, inclusive.
pub const DIRTINESS_RANGE: RangeInclusive<u8> = 1..=10;

/// Star values a user can give a pickup line.
pub const RATING_SCALE: [u8; 5] = [1, 2, 3, 4, 5];

/// The tone applied to a generation request and its record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Style {
    #[default]
    Playful,
    Romantic,
    Funny,
    Cheesy,
    Unhinged,
}

impl Style {
    /// Every style, in the order option lists present them.
    pub const ALL: [Style; 5] = [
        Style::Playful,
        Style::Romantic,
        Style::Funny,
        Style::Cheesy,
        Style::Unhinged,
    ];

    /// Wire form, as the server stores it.
    pub fn as_str(&self) -> &'static str {
        match self {
            Style::Playful => "playful",
            Style::Romantic => "romantic",
            Style::Funny => "funny",
            Style::Cheesy => "cheesy",
            Style::Unhinged => "unhinged",
        }
    }

    /// Capitalized display label.
    pub fn label(&self) -> &'static str {
        match self {
            Style::Playful => "Playful",
            Style::Romantic => "Romantic",
            Style::Funny => "Funny",
            Style::Cheesy => "Cheesy",
            Style::Unhinged => "Unhinged",
        }
    }
}

impl fmt::Display for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string is not one of [`Style::ALL`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown style '{0}' (expected one of: playful, romantic, funny, cheesy, unhinged)")]
pub struct UnknownStyle(pub String);

impl FromStr for Style {
    type Err = UnknownStyle;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_lowercase();
        Style::ALL
            .into_iter()
            .find(|style| style.as_str() == needle)
            .ok_or_else(|| UnknownStyle(s.to_string()))
    }
}

/// Snap a dirtiness level into [`DIRTINESS_RANGE`].
pub fn clamp_dirtiness(level: i64) -> u8 {
    level.clamp(*DIRTINESS_RANGE.start() as i64, *DIRTINESS_RANGE.end() as i64) as u8
}

/// Whether `rating` is one of the stars in [`RATING_SCALE`].
pub fn is_valid_rating(rating: u8) -> bool {
    RATING_SCALE.contains(&rating)
}
