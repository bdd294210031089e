//! Snapshot Board Module
//!
//! Caller-side holder of the last-known snapshot. Polls publish into it and
//! readers (the HTTP surface) take cheap `Arc` handles out of it.

use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::error::{EngineError, Result};
use crate::snapshot::{PollStats, Snapshot};

/// Outcome of handing a finished poll to the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Publish {
    Accepted,
    /// A newer snapshot was already on the board
    Stale,
}

// == Snapshot Board ==
#[derive(Debug, Default)]
pub struct SnapshotBoard {
    latest: Option<Arc<Snapshot>>,
    last_error: Option<String>,
    stats: PollStats,
}

/// Read-only copy of the board for rendering.
#[derive(Debug, Clone, Serialize)]
pub struct BoardView {
    pub latest: Option<Arc<Snapshot>>,
    pub last_error: Option<String>,
}

impl SnapshotBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the result of one poll.
    ///
    /// A failure leaves the last-known snapshot in place. A success older
    /// than the current snapshot is dropped.
    pub fn publish(&mut self, result: &Result<Snapshot>) -> Publish {
        match result {
            Ok(snapshot) => {
                self.stats.record_success(snapshot.taken_at);
                self.last_error = None;
                if let Some(current) = &self.latest {
                    if current.sequence >= snapshot.sequence {
                        debug!(
                            "Discarding snapshot {} behind published {}",
                            snapshot.sequence, current.sequence
                        );
                        self.stats.record_stale();
                        return Publish::Stale;
                    }
                }
                self.latest = Some(Arc::new(snapshot.clone()));
                Publish::Accepted
            }
            Err(EngineError::Busy) => {
                self.stats.record_busy();
                Publish::Accepted
            }
            Err(err) => {
                self.stats.record_failure();
                self.last_error = Some(err.to_string());
                Publish::Accepted
            }
        }
    }

    pub fn latest(&self) -> Option<Arc<Snapshot>> {
        self.latest.clone()
    }

    pub fn view(&self) -> BoardView {
        BoardView {
            latest: self.latest.clone(),
            last_error: self.last_error.clone(),
        }
    }

    pub fn stats(&self) -> PollStats {
        self.stats.clone()
    }
}
