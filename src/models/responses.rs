//! Response DTOs for the snapshot API
//!
//! Defines the structure of outgoing HTTP response bodies.

use std::sync::Arc;

use serde::Serialize;

use crate::snapshot::{BoardView, PollStats, Snapshot};
use crate::tasks::PollSettings;

/// Whether a snapshot has been received yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapshotStatus {
    /// No poll has succeeded so far
    Loading,
    Ready,
}

/// Response body for GET /snapshot
#[derive(Debug, Clone, Serialize)]
pub struct SnapshotResponse {
    pub status: SnapshotStatus,
    /// Last-known snapshot, absent while loading
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<Arc<Snapshot>>,
    /// Error from the most recent poll, if it failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

impl SnapshotResponse {
    pub fn from_view(view: BoardView) -> Self {
        let status = if view.latest.is_some() {
            SnapshotStatus::Ready
        } else {
            SnapshotStatus::Loading
        };
        Self {
            status,
            snapshot: view.latest,
            last_error: view.last_error,
        }
    }

    /// Response for a snapshot that was just published.
    pub fn fresh(snapshot: Arc<Snapshot>) -> Self {
        Self {
            status: SnapshotStatus::Ready,
            snapshot: Some(snapshot),
            last_error: None,
        }
    }
}

/// Response body for GET and PUT /settings
#[derive(Debug, Clone, Serialize)]
pub struct SettingsResponse {
    pub auto_refresh: bool,
    pub interval_secs: u64,
    /// Intervals a client may choose from
    pub allowed_intervals: Vec<u64>,
}

impl From<PollSettings> for SettingsResponse {
    fn from(settings: PollSettings) -> Self {
        Self {
            auto_refresh: settings.auto_refresh,
            interval_secs: settings.interval.as_secs(),
            allowed_intervals: crate::tasks::RefreshInterval::ALL
                .iter()
                .map(|i| i.as_secs())
                .collect(),
        }
    }
}

/// Response body for GET /stats
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    #[serde(flatten)]
    pub stats: PollStats,
    /// successes / polls
    pub success_rate: f64,
    /// Entry count of the last-known snapshot
    pub entries: usize,
}

impl StatsResponse {
    pub fn new(stats: PollStats, entries: usize) -> Self {
        let success_rate = stats.success_rate();
        Self {
            stats,
            success_rate,
            entries,
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::{Entry, KeyKind};
    use crate::tasks::RefreshInterval;

    fn snapshot() -> Snapshot {
        Snapshot {
            sequence: 7,
            taken_at: chrono::Utc::now(),
            entries: vec![Entry::new("key1", KeyKind::String, "hello")],
            skipped: Vec::new(),
        }
    }

    #[test]
    fn test_loading_response_omits_snapshot() {
        let resp = SnapshotResponse::from_view(BoardView {
            latest: None,
            last_error: None,
        });
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["status"], "loading");
        assert!(json.get("snapshot").is_none());
    }

    #[test]
    fn test_ready_response_serialize() {
        let resp = SnapshotResponse::from_view(BoardView {
            latest: Some(Arc::new(snapshot())),
            last_error: Some("Snapshot timed out".to_string()),
        });
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["status"], "ready");
        assert_eq!(json["snapshot"]["entries"][0]["display"], "hello");
        assert_eq!(json["last_error"], "Snapshot timed out");
    }

    #[test]
    fn test_settings_response() {
        let resp = SettingsResponse::from(PollSettings {
            auto_refresh: false,
            interval: RefreshInterval::Thirty,
        });
        assert_eq!(resp.interval_secs, 30);
        assert_eq!(resp.allowed_intervals, vec![5, 15, 30, 60]);
    }

    #[test]
    fn test_stats_response_flattens() {
        let mut stats = PollStats::new();
        stats.record_failure();
        let json = serde_json::to_value(StatsResponse::new(stats, 0)).unwrap();
        assert_eq!(json["failures"], 1);
        assert_eq!(json["success_rate"], 0.0);
    }

    #[test]
    fn test_health_response_serialize() {
        let resp = HealthResponse::healthy();
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("healthy"));
        assert!(json.contains("timestamp"));
    }

    #[test]
    fn test_error_response_serialize() {
        let resp = ErrorResponse::new("Something went wrong");
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("Something went wrong"));
    }
}
