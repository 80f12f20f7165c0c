//! Generation requests and history records.

use serde::{Deserialize, Serialize};

use crate::style::Style;

/// Page size the history screen asks for.
pub const DEFAULT_PER_PAGE: u32 = 10;

/// One persisted generation attempt with its feedback fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PickupLine {
    /// Server-assigned, opaque identifier.
    pub id: String,
    pub person_description: String,
    pub pickup_line: String,
    pub dirtiness_level: u8,
    pub style: Style,
    #[serde(default)]
    pub model_used: Option<String>,
    /// 1-5 stars; `None` (or 0) means unrated.
    #[serde(default)]
    pub rating: Option<u8>,
    #[serde(default)]
    pub used: bool,
    /// Only meaningful when `used` is true. The server is the authority on
    /// whether `success` may be set without `used`.
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub notes: Option<String>,
    pub created_at: String,
}

impl PickupLine {
    /// Star count, 0 when unrated.
    pub fn stars(&self) -> u8 {
        self.rating.unwrap_or(0)
    }

    pub fn is_rated(&self) -> bool {
        self.stars() > 0
    }

    pub fn is_successful(&self) -> bool {
        self.success == Some(true)
    }

    /// The "mark success" control is only offered for lines that were used.
    pub fn offers_success_toggle(&self) -> bool {
        self.used
    }

    /// Case-insensitive substring match against the description or the line.
    pub fn matches(&self, query: &str) -> bool {
        let needle = query.to_lowercase();
        self.pickup_line.to_lowercase().contains(&needle)
            || self.person_description.to_lowercase().contains(&needle)
    }
}

/// Body of `POST /pickup/generate`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub person_description: String,
    pub dirtiness_level: u8,
    pub style: Style,
}

impl GenerateRequest {
    pub fn new(person_description: impl Into<String>, dirtiness_level: u8, style: Style) -> Self {
        Self {
            person_description: person_description.into(),
            dirtiness_level,
            style,
        }
    }
}

/// Response of the generate and regenerate endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Generated {
    pub pickup_line: String,
    pub history_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<Style>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dirtiness_level: Option<u8>,
}

impl Generated {
    pub fn new(pickup_line: impl Into<String>, history_id: impl Into<String>) -> Self {
        Self {
            pickup_line: pickup_line.into(),
            history_id: history_id.into(),
            style: None,
            dirtiness_level: None,
        }
    }
}

/// Partial update sent to `POST /pickup/rate/{id}`.
///
/// Unset fields are left out of the body so the server leaves them alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub used: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl RecordUpdate {
    pub fn rating(rating: u8) -> Self {
        Self {
            rating: Some(rating),
            ..Default::default()
        }
    }

    pub fn used(used: bool) -> Self {
        Self {
            used: Some(used),
            ..Default::default()
        }
    }

    pub fn success(success: bool) -> Self {
        Self {
            success: Some(success),
            ..Default::default()
        }
    }

    pub fn notes(notes: impl Into<String>) -> Self {
        Self {
            notes: Some(notes.into()),
            ..Default::default()
        }
    }
}

/// Server-side filters for the history listing. `None` means "all".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryFilters {
    pub style: Option<Style>,
    /// Inclusive lower bound on the rating.
    pub min_rating: Option<u8>,
    pub used_only: bool,
    pub success_only: bool,
}

/// Parameters of `GET /history/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryQuery {
    /// 1-indexed.
    pub page: u32,
    pub per_page: u32,
    pub filters: HistoryFilters,
}

impl Default for HistoryQuery {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: DEFAULT_PER_PAGE,
            filters: HistoryFilters::default(),
        }
    }
}

impl HistoryQuery {
    pub fn new(page: u32, per_page: u32, filters: HistoryFilters) -> Self {
        Self {
            page,
            per_page,
            filters,
        }
    }

    /// Query string pairs; "all" filters are omitted.
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("page", self.page.to_string()),
            ("per_page", self.per_page.to_string()),
        ];
        if let Some(style) = self.filters.style {
            pairs.push(("style", style.as_str().to_string()));
        }
        if let Some(min_rating) = self.filters.min_rating {
            pairs.push(("min_rating", min_rating.to_string()));
        }
        pairs.push(("used_only", self.filters.used_only.to_string()));
        pairs.push(("success_only", self.filters.success_only.to_string()));
        pairs
    }
}

/// One page of history records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoryPage {
    pub history: Vec<PickupLine>,
    /// Total page count; 0 when nothing matches.
    pub pages: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_page: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub per_page: Option<u32>,
}
