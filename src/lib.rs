//! Redis Snapshot - point-in-time views of a Redis keyspace
//!
//! Polls a Redis server, enumerates its keys, renders each value as text,
//! and serves the last complete snapshot over HTTP.

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod snapshot;
pub mod source;
pub mod tasks;

pub use api::AppState;
pub use config::Config;
pub use error::{EngineError, Result};
pub use snapshot::{Entry, KeyKind, Snapshot, SnapshotEngine};
pub use tasks::spawn_poller;
