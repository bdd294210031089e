//! Snapshot Poller Task
//!
//! Background task that takes a keyspace snapshot on every refresh tick and
//! publishes it to the shared board.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{watch, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::{EngineError, Result};
use crate::snapshot::{Publish, Snapshot, SnapshotBoard, SnapshotEngine};

/// Board shared between the poller and the HTTP handlers.
pub type SharedBoard = Arc<RwLock<SnapshotBoard>>;

// == Refresh Interval ==
/// The refresh periods a user can pick from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(into = "u64")]
pub enum RefreshInterval {
    Five,
    #[default]
    Fifteen,
    Thirty,
    Sixty,
}

impl RefreshInterval {
    pub const ALL: [RefreshInterval; 4] = [
        RefreshInterval::Five,
        RefreshInterval::Fifteen,
        RefreshInterval::Thirty,
        RefreshInterval::Sixty,
    ];

    pub fn as_secs(&self) -> u64 {
        match self {
            RefreshInterval::Five => 5,
            RefreshInterval::Fifteen => 15,
            RefreshInterval::Thirty => 30,
            RefreshInterval::Sixty => 60,
        }
    }

    pub fn as_duration(&self) -> Duration {
        Duration::from_secs(self.as_secs())
    }
}

impl From<RefreshInterval> for u64 {
    fn from(interval: RefreshInterval) -> Self {
        interval.as_secs()
    }
}

impl TryFrom<u64> for RefreshInterval {
    type Error = EngineError;

    fn try_from(secs: u64) -> Result<Self> {
        RefreshInterval::ALL
            .into_iter()
            .find(|interval| interval.as_secs() == secs)
            .ok_or_else(|| {
                EngineError::InvalidRequest(format!(
                    "Refresh interval must be one of 5, 15, 30 or 60 seconds, got {}",
                    secs
                ))
            })
    }
}

impl FromStr for RefreshInterval {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        let secs: u64 = s
            .parse()
            .map_err(|_| EngineError::InvalidRequest(format!("Not a number: {}", s)))?;
        RefreshInterval::try_from(secs)
    }
}

impl fmt::Display for RefreshInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}s", self.as_secs())
    }
}

// == Poll Settings ==
/// Scheduling knobs, changed at runtime through a watch channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PollSettings {
    pub auto_refresh: bool,
    pub interval: RefreshInterval,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            auto_refresh: true,
            interval: RefreshInterval::default(),
        }
    }
}

/// Runs one poll and publishes its outcome.
///
/// Uses `try_take_snapshot`, so a poll that would overlap one already in
/// flight is refused with [`EngineError::Busy`] instead of queueing.
///
/// On success returns the snapshot now on the board. That is the one just
/// taken, or a newer one when this result arrived late.
pub async fn poll_once(
    engine: &SnapshotEngine,
    board: &RwLock<SnapshotBoard>,
) -> Result<Arc<Snapshot>> {
    let result = engine.try_take_snapshot().await;

    let (published, latest) = {
        let mut board = board.write().await;
        let published = board.publish(&result);
        (published, board.latest())
    };

    match result {
        Ok(snapshot) => {
            if published == Publish::Stale {
                debug!("Snapshot {} arrived late and was discarded", snapshot.sequence);
            }
            Ok(latest.unwrap_or_else(|| Arc::new(snapshot)))
        }
        Err(EngineError::Busy) => {
            debug!("Poll skipped: previous snapshot still in flight");
            Err(EngineError::Busy)
        }
        Err(err) => {
            warn!("Poll failed, keeping last-known snapshot: {}", err);
            Err(err)
        }
    }
}

/// Spawns the background poller.
///
/// The poller fires immediately, then once per interval while auto-refresh
/// is on. Any settings change restarts the schedule with an immediate poll.
/// Turning auto-refresh off stops new polls; a poll already running is
/// allowed to finish.
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during graceful shutdown. The task also ends when every settings sender
/// is dropped.
pub fn spawn_poller(
    engine: Arc<SnapshotEngine>,
    board: SharedBoard,
    mut settings: watch::Receiver<PollSettings>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!("Starting snapshot poller with {:?}", *settings.borrow());

        loop {
            let current = *settings.borrow_and_update();

            if current.auto_refresh {
                let _ = poll_once(&engine, &board).await;

                tokio::select! {
                    _ = tokio::time::sleep(current.interval.as_duration()) => {}
                    changed = settings.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        info!("Poll settings changed: {:?}", *settings.borrow());
                    }
                }
            } else {
                debug!("Auto-refresh off, waiting for settings change");
                if settings.changed().await.is_err() {
                    break;
                }
                info!("Poll settings changed: {:?}", *settings.borrow());
            }
        }

        info!("Snapshot poller stopped");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::EngineOptions;
    use crate::source::{MemorySource, MemoryValue};

    fn fixture() -> (MemorySource, Arc<SnapshotEngine>, SharedBoard) {
        let source = MemorySource::new();
        source.insert("greeting", MemoryValue::string("hello"));
        let engine = Arc::new(SnapshotEngine::new(source.clone(), EngineOptions::default()));
        let board = Arc::new(RwLock::new(SnapshotBoard::new()));
        (source, engine, board)
    }

    #[test]
    fn test_refresh_interval_choices() {
        assert_eq!(RefreshInterval::default().as_secs(), 15);
        assert_eq!(RefreshInterval::try_from(30).unwrap(), RefreshInterval::Thirty);
        assert!(RefreshInterval::try_from(10).is_err());
        assert_eq!("60".parse::<RefreshInterval>().unwrap(), RefreshInterval::Sixty);
        assert!("soon".parse::<RefreshInterval>().is_err());
    }

    #[test]
    fn test_refresh_interval_serializes_as_seconds() {
        let json = serde_json::to_string(&PollSettings::default()).unwrap();
        assert_eq!(json, r#"{"auto_refresh":true,"interval":15}"#);
    }

    #[tokio::test]
    async fn test_poll_once_publishes() {
        let (_source, engine, board) = fixture();

        let snapshot = poll_once(&engine, &board).await.unwrap();
        assert_eq!(snapshot.len(), 1);

        let latest = board.read().await.latest().unwrap();
        assert_eq!(latest.get("greeting").unwrap().display, "hello");
    }

    #[tokio::test]
    async fn test_poll_once_failure_keeps_previous() {
        let (source, engine, board) = fixture();
        poll_once(&engine, &board).await.unwrap();

        source.set_connected(false);
        let result = poll_once(&engine, &board).await;
        assert_eq!(result.unwrap_err(), EngineError::NoConnection);

        let board = board.read().await;
        assert!(board.latest().is_some());
        assert_eq!(board.stats().failures, 1);
    }

    #[tokio::test]
    async fn test_poll_once_late_result_returns_board_snapshot() {
        let (_source, engine, board) = fixture();
        let newer = Snapshot {
            sequence: 100,
            taken_at: chrono::Utc::now(),
            entries: Vec::new(),
            skipped: Vec::new(),
        };
        board.write().await.publish(&Ok(newer));

        let returned = poll_once(&engine, &board).await.unwrap();
        assert_eq!(returned.sequence, 100);
        assert!(returned.is_empty());

        let board = board.read().await;
        assert_eq!(board.latest().unwrap().sequence, 100);
        assert_eq!(board.stats().stale_discards, 1);
    }

    #[tokio::test]
    async fn test_poller_fires_immediately() {
        let (_source, engine, board) = fixture();
        let (_tx, rx) = watch::channel(PollSettings::default());

        let handle = spawn_poller(engine, board.clone(), rx);
        tokio::time::sleep(Duration::from_millis(200)).await;

        assert!(board.read().await.latest().is_some());
        handle.abort();
    }

    #[tokio::test]
    async fn test_poller_idle_when_auto_refresh_off() {
        let (_source, engine, board) = fixture();
        let (tx, rx) = watch::channel(PollSettings {
            auto_refresh: false,
            interval: RefreshInterval::Five,
        });

        let handle = spawn_poller(engine, board.clone(), rx);
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(board.read().await.latest().is_none());

        // Turning it on triggers a poll right away
        tx.send(PollSettings::default()).unwrap();
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(board.read().await.latest().is_some());

        handle.abort();
    }

    #[tokio::test]
    async fn test_poller_stops_when_settings_dropped() {
        let (_source, engine, board) = fixture();
        let (tx, rx) = watch::channel(PollSettings {
            auto_refresh: false,
            interval: RefreshInterval::Five,
        });

        let handle = spawn_poller(engine, board, rx);
        drop(tx);

        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("poller should stop")
            .unwrap();
    }
}
