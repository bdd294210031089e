//! Background Tasks Module
//!
//! Contains the tasks that run periodically while the service is up.
//!
//! # Tasks
//! - Poller: takes a keyspace snapshot on every refresh tick

mod poller;

pub use poller::{poll_once, spawn_poller, PollSettings, RefreshInterval, SharedBoard};
