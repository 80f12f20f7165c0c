//! Aggregate statistics computed by the server over a user's history.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Read-only aggregate view. Recomputed by the server on every request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub overview: Overview,
    /// Style name to record count, in server order.
    #[serde(default)]
    pub style_distribution: IndexMap<String, u64>,
    /// Dirtiness level (as a string key) to record count.
    #[serde(default)]
    pub dirtiness_distribution: IndexMap<String, u64>,
    #[serde(default)]
    pub success_by_style: IndexMap<String, StyleSuccess>,
    /// Per-day counts covering the last 7 days.
    #[serde(default)]
    pub recent_activity: Vec<ActivityDay>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Overview {
    pub total_generated: u64,
    pub total_used: u64,
    #[serde(default)]
    pub total_successful: Option<u64>,
    /// Percentage, 0-100.
    pub success_rate: f64,
    /// Absent until at least one line is rated.
    #[serde(default)]
    pub average_rating: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StyleSuccess {
    pub total: u64,
    #[serde(default)]
    pub successful: Option<u64>,
    /// Percentage, 0-100.
    pub rate: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActivityDay {
    /// ISO date (`YYYY-MM-DD`); the server may send null.
    #[serde(default)]
    pub date: Option<String>,
    pub count: u64,
}
