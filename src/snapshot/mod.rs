//! Snapshot Module
//!
//! Point-in-time keyspace snapshots: the data model, value rendering, the
//! engine that builds them, and the board that holds the last-known one.

mod board;
mod engine;
mod entry;
mod kind;
pub mod render;
mod stats;


// Re-export public types
pub use board::{BoardView, Publish, SnapshotBoard};
pub use engine::{EngineOptions, FailurePolicy, SnapshotEngine};
pub use entry::{Entry, SkippedKey, Snapshot};
pub use kind::KeyKind;
pub use stats::PollStats;
