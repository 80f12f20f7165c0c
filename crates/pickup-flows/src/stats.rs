//! Stats flow and the pure transforms that shape a snapshot for display.

use std::sync::Arc;

use chrono::NaiveDate;
use pickup_core::{PickupApi, StatsSnapshot};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::error::FlowError;

const LOAD_FAILED: &str = "Failed to load statistics";

/// Shown in place of a value the server did not provide.
pub const NOT_AVAILABLE: &str = "N/A";

/// Upper-case the first character: `"playful"` becomes `"Playful"`.
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// A percentage with one decimal place, without the `%` sign.
pub fn format_rate(rate: f64) -> String {
    format!("{:.1}", rate)
}

/// Short English weekday (`Mon`, `Tue`, ...) for an ISO date.
///
/// Only the leading `YYYY-MM-DD` is read, so full timestamps work too.
/// Unparsable input is shown as is; a missing date becomes `Unknown`.
pub fn weekday_label(date: Option<&str>) -> String {
    let Some(date) = date else {
        return "Unknown".to_string();
    };
    date.get(..10)
        .and_then(|day| NaiveDate::parse_from_str(day, "%Y-%m-%d").ok())
        .map(|day| day.format("%a").to_string())
        .unwrap_or_else(|| date.to_string())
}

/// The average rating as the server sent it, or [`NOT_AVAILABLE`].
pub fn average_rating_label(average: Option<f64>) -> String {
    match average {
        Some(value) => value.to_string(),
        None => NOT_AVAILABLE.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StyleSlice {
    pub label: String,
    pub value: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DirtinessBar {
    /// `Level n`.
    pub label: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SuccessRow {
    pub style: String,
    /// Percentage with one decimal place.
    pub rate: String,
    pub total: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ActivityPoint {
    pub label: String,
    pub count: u64,
}

/// A snapshot shaped for the dashboard.
#[derive(Debug, Clone, PartialEq)]
pub struct StatsView {
    pub total_generated: u64,
    pub total_used: u64,
    /// e.g. `66.7%`.
    pub success_rate: String,
    pub average_rating: String,
    pub styles: Vec<StyleSlice>,
    /// Ordered by level, lowest first.
    pub dirtiness: Vec<DirtinessBar>,
    pub success: Vec<SuccessRow>,
    pub activity: Vec<ActivityPoint>,
}

impl StatsView {
    pub fn from_snapshot(snapshot: &StatsSnapshot) -> Self {
        let overview = &snapshot.overview;

        let styles = snapshot
            .style_distribution
            .iter()
            .map(|(style, count)| StyleSlice {
                label: capitalize(style),
                value: *count,
            })
            .collect();

        let mut levels: Vec<(&String, u64)> = snapshot
            .dirtiness_distribution
            .iter()
            .map(|(level, count)| (level, *count))
            .collect();
        // Numeric keys sort by value; anything else goes last, by text.
        levels.sort_by(|(a, _), (b, _)| {
            match (a.parse::<u32>(), b.parse::<u32>()) {
                (Ok(x), Ok(y)) => x.cmp(&y),
                (Ok(_), Err(_)) => std::cmp::Ordering::Less,
                (Err(_), Ok(_)) => std::cmp::Ordering::Greater,
                (Err(_), Err(_)) => a.cmp(b),
            }
        });
        let dirtiness = levels
            .into_iter()
            .map(|(level, count)| DirtinessBar {
                label: format!("Level {}", level),
                count,
            })
            .collect();

        let success = snapshot
            .success_by_style
            .iter()
            .map(|(style, entry)| SuccessRow {
                style: capitalize(style),
                rate: format_rate(entry.rate),
                total: entry.total,
            })
            .collect();

        let activity = snapshot
            .recent_activity
            .iter()
            .map(|day| ActivityPoint {
                label: weekday_label(day.date.as_deref()),
                count: day.count,
            })
            .collect();

        Self {
            total_generated: overview.total_generated,
            total_used: overview.total_used,
            success_rate: format!("{}%", format_rate(overview.success_rate)),
            average_rating: average_rating_label(overview.average_rating),
            styles,
            dirtiness,
            success,
            activity,
        }
    }
}

/// View state of the Stats screen.
#[derive(Debug, Clone, Default)]
pub struct StatsState {
    pub snapshot: Option<StatsSnapshot>,
    pub loading: bool,
    pub error: Option<String>,
}

/// Read-only dashboard over the server's aggregate snapshot.
pub struct StatsFlow {
    api: Arc<dyn PickupApi>,
    state: RwLock<StatsState>,
}

impl StatsFlow {
    pub fn new(api: Arc<dyn PickupApi>) -> Self {
        Self {
            api,
            state: RwLock::new(StatsState::default()),
        }
    }

    pub async fn state(&self) -> StatsState {
        self.state.read().await.clone()
    }

    /// Fetch a fresh snapshot. A failure keeps the previous one.
    pub async fn load(&self) -> Result<StatsView, FlowError> {
        {
            let mut state = self.state.write().await;
            state.loading = true;
            state.error = None;
        }

        let result = self.api.stats().await;

        let mut state = self.state.write().await;
        state.loading = false;
        match result {
            Ok(snapshot) => {
                debug!(
                    "Loaded stats: {} generated, {} used",
                    snapshot.overview.total_generated, snapshot.overview.total_used
                );
                let view = StatsView::from_snapshot(&snapshot);
                state.snapshot = Some(snapshot);
                Ok(view)
            }
            Err(e) => {
                let err = FlowError::request(e, LOAD_FAILED);
                warn!("Failed to load statistics: {}", err);
                state.error = Some(err.to_string());
                Err(err)
            }
        }
    }

    /// The last loaded snapshot, shaped for display.
    pub async fn view(&self) -> Option<StatsView> {
        self.state
            .read()
            .await
            .snapshot
            .as_ref()
            .map(StatsView::from_snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;
    use mock_api::{fixtures, FailingApi, InMemoryApi, Operation};
    use pickup_core::{ActivityDay, ApiError, Overview, StyleSuccess};

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("playful"), "Playful");
        assert_eq!(capitalize("Funny"), "Funny");
        assert_eq!(capitalize(""), "");
        assert_eq!(capitalize("ünhinged"), "Ünhinged");
    }

    #[test]
    fn test_format_rate() {
        assert_eq!(format_rate(0.0), "0.0");
        assert_eq!(format_rate(66.66666), "66.7");
        assert_eq!(format_rate(100.0), "100.0");
    }

    #[test]
    fn test_weekday_label() {
        assert_eq!(weekday_label(Some("2024-05-06")), "Mon");
        assert_eq!(weekday_label(Some("2024-05-11T08:30:00")), "Sat");
        assert_eq!(weekday_label(Some("yesterday")), "yesterday");
        assert_eq!(weekday_label(None), "Unknown");
    }

    #[test]
    fn test_missing_average_is_not_zero() {
        assert_eq!(average_rating_label(None), NOT_AVAILABLE);
        assert_eq!(average_rating_label(Some(3.5)), "3.5");
        assert_eq!(average_rating_label(Some(4.0)), "4");
    }

    #[test]
    fn test_view_from_snapshot() {
        let snapshot = StatsSnapshot {
            overview: Overview {
                total_generated: 12,
                total_used: 3,
                total_successful: Some(2),
                success_rate: 66.666_666_7,
                average_rating: None,
            },
            style_distribution: IndexMap::from([
                ("funny".to_string(), 7),
                ("romantic".to_string(), 5),
            ]),
            dirtiness_distribution: IndexMap::from([
                ("10".to_string(), 1),
                ("2".to_string(), 4),
                ("7".to_string(), 7),
            ]),
            success_by_style: IndexMap::from([(
                "funny".to_string(),
                StyleSuccess {
                    total: 3,
                    successful: Some(2),
                    rate: 66.666_666_7,
                },
            )]),
            recent_activity: vec![
                ActivityDay {
                    date: Some("2024-05-06".into()),
                    count: 4,
                },
                ActivityDay {
                    date: None,
                    count: 1,
                },
            ],
        };

        let view = StatsView::from_snapshot(&snapshot);
        assert_eq!(view.success_rate, "66.7%");
        assert_eq!(view.average_rating, "N/A");
        assert_eq!(
            view.styles,
            vec![
                StyleSlice {
                    label: "Funny".into(),
                    value: 7
                },
                StyleSlice {
                    label: "Romantic".into(),
                    value: 5
                },
            ]
        );
        let levels: Vec<&str> = view.dirtiness.iter().map(|bar| bar.label.as_str()).collect();
        assert_eq!(levels, vec!["Level 2", "Level 7", "Level 10"]);
        assert_eq!(
            view.success,
            vec![SuccessRow {
                style: "Funny".into(),
                rate: "66.7".into(),
                total: 3
            }]
        );
        assert_eq!(view.activity[0].label, "Mon");
        assert_eq!(view.activity[1].label, "Unknown");
    }

    #[tokio::test]
    async fn test_load_empty_history() {
        let flow = StatsFlow::new(Arc::new(InMemoryApi::new()));
        let view = flow.load().await.unwrap();

        assert_eq!(view.total_generated, 0);
        assert_eq!(view.success_rate, "0.0%");
        assert_eq!(view.average_rating, NOT_AVAILABLE);
        assert!(view.styles.is_empty());
        assert_eq!(flow.view().await, Some(view));
    }

    #[tokio::test]
    async fn test_load_failure_keeps_previous_snapshot() {
        let api = Arc::new(InMemoryApi::with_records(fixtures::records(2)));
        let flow = StatsFlow::new(api.clone());
        flow.load().await.unwrap();

        api.fail_on(Operation::Stats, ApiError::Timeout).await;
        let err = flow.load().await.unwrap_err();
        assert_eq!(err.to_string(), LOAD_FAILED);

        let state = flow.state().await;
        assert_eq!(state.error.as_deref(), Some(LOAD_FAILED));
        assert!(!state.loading);
        assert_eq!(flow.view().await.map(|view| view.total_generated), Some(2));
    }

    #[tokio::test]
    async fn test_server_message_preferred() {
        let flow = StatsFlow::new(Arc::new(FailingApi::with_status(401, "Token has expired")));
        let err = flow.load().await.unwrap_err();
        assert_eq!(err.to_string(), "Token has expired");
        assert!(flow.view().await.is_none());
    }
}
