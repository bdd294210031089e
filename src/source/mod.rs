//! Keyspace Source Module
//!
//! The read-only seam between the snapshot engine and the key-value store.

mod memory;
mod redis_source;

pub use self::memory::{MemorySource, MemoryValue};
pub use self::redis_source::RedisSource;

use async_trait::async_trait;

use crate::error::Result;

/// Raw bytes as stored; decoding is left to the engine.
pub type Bytes = Vec<u8>;

// == Keyspace Source ==
/// Read-only access to a key-value store.
///
/// Methods take `&mut self`: a source is a single connection and callers
/// must serialize their queries against it.
#[async_trait]
pub trait KeyspaceSource: Send {
    /// One SCAN step. Returns the next cursor (0 when done) and a page of keys.
    async fn scan(&mut self, cursor: u64, count: usize) -> Result<(u64, Vec<Bytes>)>;

    /// The type name of a key (`string`, `list`, ... or `none`).
    async fn key_type(&mut self, key: &[u8]) -> Result<String>;

    /// String value, `None` if the key no longer exists.
    async fn get(&mut self, key: &[u8]) -> Result<Option<Bytes>>;

    async fn llen(&mut self, key: &[u8]) -> Result<u64>;

    /// Inclusive index range, as `LRANGE`.
    async fn lrange(&mut self, key: &[u8], start: i64, stop: i64) -> Result<Vec<Bytes>>;

    async fn smembers(&mut self, key: &[u8]) -> Result<Vec<Bytes>>;

    /// Members by rank, inclusive, as `ZRANGE`.
    async fn zrange(&mut self, key: &[u8], start: i64, stop: i64) -> Result<Vec<Bytes>>;

    async fn hgetall(&mut self, key: &[u8]) -> Result<Vec<(Bytes, Bytes)>>;

    async fn xlen(&mut self, key: &[u8]) -> Result<u64>;
}
