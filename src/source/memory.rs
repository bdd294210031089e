//! In-memory keyspace source.
//!
//! Stands in for a Redis server in tests and offline runs. Handles are
//! cheap clones over shared state, so a test can keep one handle to
//! reshape the keyspace or cut the "connection" while the engine owns another.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{EngineError, Result};
use crate::source::{Bytes, KeyspaceSource};

// == Memory Value ==
/// A stored value of any supported shape.
#[derive(Debug, Clone, PartialEq)]
pub enum MemoryValue {
    String(Bytes),
    List(Vec<Bytes>),
    Set(Vec<Bytes>),
    /// Members with scores; ranked by (score, member) like Redis
    SortedSet(Vec<(Bytes, f64)>),
    Hash(Vec<(Bytes, Bytes)>),
    /// Only the length is modelled
    Stream(u64),
    /// Any other type name, e.g. a module type
    Other(String),
}

impl MemoryValue {
    pub fn string(value: impl Into<String>) -> Self {
        MemoryValue::String(value.into().into_bytes())
    }

    pub fn list<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        MemoryValue::List(to_bytes(items))
    }

    pub fn set<I, S>(members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let unique: BTreeSet<Bytes> = to_bytes(members).into_iter().collect();
        MemoryValue::Set(unique.into_iter().collect())
    }

    pub fn sorted_set<I, S>(members: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        MemoryValue::SortedSet(
            members
                .into_iter()
                .map(|(member, score)| (member.into().into_bytes(), score))
                .collect(),
        )
    }

    pub fn hash<I, F, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (F, V)>,
        F: Into<String>,
        V: Into<String>,
    {
        MemoryValue::Hash(
            pairs
                .into_iter()
                .map(|(f, v)| (f.into().into_bytes(), v.into().into_bytes()))
                .collect(),
        )
    }

    fn type_name(&self) -> &str {
        match self {
            MemoryValue::String(_) => "string",
            MemoryValue::List(_) => "list",
            MemoryValue::Set(_) => "set",
            MemoryValue::SortedSet(_) => "zset",
            MemoryValue::Hash(_) => "hash",
            MemoryValue::Stream(_) => "stream",
            MemoryValue::Other(name) => name,
        }
    }
}

fn to_bytes<I, S>(items: I) -> Vec<Bytes>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    items.into_iter().map(|s| s.into().into_bytes()).collect()
}

fn wrong_type(key: &[u8]) -> EngineError {
    EngineError::ValueMissing(format!(
        "WRONGTYPE operation against `{}`",
        String::from_utf8_lossy(key)
    ))
}

/// Resolves Redis-style inclusive indices (negatives count from the end).
fn index_range(len: usize, start: i64, stop: i64) -> std::ops::Range<usize> {
    let len = len as i64;
    let start = if start < 0 { (len + start).max(0) } else { start };
    let stop = if stop < 0 { len + stop } else { stop.min(len - 1) };
    if len == 0 || start > stop {
        return 0..0;
    }
    start as usize..(stop + 1) as usize
}

// == Shared State ==
#[derive(Debug)]
struct State {
    data: BTreeMap<Bytes, MemoryValue>,
    /// Keys returned by SCAN that no longer exist
    ghosts: BTreeSet<Bytes>,
    connected: bool,
    latency: Duration,
    page_size: Option<usize>,
    overlap_pages: bool,
    active: usize,
    max_active: usize,
    ops: u64,
}

/// Decrements the active-operation count even if the caller is cancelled.
struct ActiveGuard(Arc<Mutex<State>>);

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        let mut state = self.0.lock().unwrap_or_else(|e| e.into_inner());
        state.active -= 1;
    }
}

// == Memory Source ==
/// Clonable in-memory implementation of [`KeyspaceSource`].
#[derive(Debug, Clone)]
pub struct MemorySource {
    state: Arc<Mutex<State>>,
}

impl Default for MemorySource {
    fn default() -> Self {
        Self::new()
    }
}

impl MemorySource {
    /// Creates an empty, connected source.
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(State {
                data: BTreeMap::new(),
                ghosts: BTreeSet::new(),
                connected: true,
                latency: Duration::ZERO,
                page_size: None,
                overlap_pages: false,
                active: 0,
                max_active: 0,
                ops: 0,
            })),
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Stores a value under a UTF-8 key, replacing any previous one.
    pub fn insert(&self, key: impl Into<String>, value: MemoryValue) {
        self.insert_raw(key.into().into_bytes(), value);
    }

    /// Stores a value under an arbitrary binary key.
    pub fn insert_raw(&self, key: Bytes, value: MemoryValue) {
        let mut state = self.state();
        state.ghosts.remove(&key);
        state.data.insert(key, value);
    }

    /// Adds a key that SCAN reports but that is gone by the time it is read.
    pub fn insert_ghost(&self, key: impl Into<String>) {
        self.state().ghosts.insert(key.into().into_bytes());
    }

    /// Simulates losing or regaining the connection.
    pub fn set_connected(&self, connected: bool) {
        self.state().connected = connected;
    }

    /// Delay applied to every operation.
    pub fn set_latency(&self, latency: Duration) {
        self.state().latency = latency;
    }

    /// Overrides the SCAN COUNT hint with a fixed page size.
    pub fn set_page_size(&self, page_size: usize) {
        self.state().page_size = Some(page_size.max(1));
    }

    /// Makes each SCAN page repeat the last key of the previous page,
    /// the way a rehashing server may return a key twice.
    pub fn set_overlap_pages(&self, overlap: bool) {
        self.state().overlap_pages = overlap;
    }

    /// Highest number of operations ever executing at the same time.
    pub fn max_concurrent_ops(&self) -> usize {
        self.state().max_active
    }

    /// Total operations served.
    pub fn op_count(&self) -> u64 {
        self.state().ops
    }

    async fn enter(&self) -> Result<ActiveGuard> {
        let latency = {
            let mut state = self.state();
            if !state.connected {
                return Err(EngineError::NoConnection);
            }
            state.active += 1;
            state.max_active = state.max_active.max(state.active);
            state.ops += 1;
            state.latency
        };
        let guard = ActiveGuard(self.state.clone());

        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        if !self.state().connected {
            return Err(EngineError::NoConnection);
        }
        Ok(guard)
    }

    fn value(&self, key: &[u8]) -> Option<MemoryValue> {
        self.state().data.get(key).cloned()
    }
}

#[async_trait]
impl KeyspaceSource for MemorySource {
    async fn scan(&mut self, cursor: u64, count: usize) -> Result<(u64, Vec<Bytes>)> {
        let _guard = self.enter().await?;
        let state = self.state();

        let keys: Vec<&Bytes> = state.data.keys().chain(state.ghosts.iter()).collect();
        let page = state.page_size.unwrap_or(count.max(1));
        let start = (cursor as usize).min(keys.len());
        let end = (start + page).min(keys.len());

        let mut out: Vec<Bytes> = Vec::with_capacity(end - start + 1);
        if state.overlap_pages && start > 0 {
            out.push(keys[start - 1].clone());
        }
        out.extend(keys[start..end].iter().map(|k| (*k).clone()));

        let next = if end >= keys.len() { 0 } else { end as u64 };
        Ok((next, out))
    }

    async fn key_type(&mut self, key: &[u8]) -> Result<String> {
        let _guard = self.enter().await?;
        Ok(self
            .value(key)
            .map(|v| v.type_name().to_string())
            .unwrap_or_else(|| "none".to_string()))
    }

    async fn get(&mut self, key: &[u8]) -> Result<Option<Bytes>> {
        let _guard = self.enter().await?;
        match self.value(key) {
            None => Ok(None),
            Some(MemoryValue::String(value)) => Ok(Some(value)),
            Some(_) => Err(wrong_type(key)),
        }
    }

    async fn llen(&mut self, key: &[u8]) -> Result<u64> {
        let _guard = self.enter().await?;
        match self.value(key) {
            None => Ok(0),
            Some(MemoryValue::List(items)) => Ok(items.len() as u64),
            Some(_) => Err(wrong_type(key)),
        }
    }

    async fn lrange(&mut self, key: &[u8], start: i64, stop: i64) -> Result<Vec<Bytes>> {
        let _guard = self.enter().await?;
        match self.value(key) {
            None => Ok(Vec::new()),
            Some(MemoryValue::List(items)) => {
                let range = index_range(items.len(), start, stop);
                Ok(items[range].to_vec())
            }
            Some(_) => Err(wrong_type(key)),
        }
    }

    async fn smembers(&mut self, key: &[u8]) -> Result<Vec<Bytes>> {
        let _guard = self.enter().await?;
        match self.value(key) {
            None => Ok(Vec::new()),
            // Reverse to mimic the server's unspecified member order
            Some(MemoryValue::Set(members)) => Ok(members.into_iter().rev().collect()),
            Some(_) => Err(wrong_type(key)),
        }
    }

    async fn zrange(&mut self, key: &[u8], start: i64, stop: i64) -> Result<Vec<Bytes>> {
        let _guard = self.enter().await?;
        match self.value(key) {
            None => Ok(Vec::new()),
            Some(MemoryValue::SortedSet(mut members)) => {
                members.sort_by(|(am, ascore), (bm, bscore)| {
                    ascore.total_cmp(bscore).then_with(|| am.cmp(bm))
                });
                let range = index_range(members.len(), start, stop);
                Ok(members[range].iter().map(|(m, _)| m.clone()).collect())
            }
            Some(_) => Err(wrong_type(key)),
        }
    }

    async fn hgetall(&mut self, key: &[u8]) -> Result<Vec<(Bytes, Bytes)>> {
        let _guard = self.enter().await?;
        match self.value(key) {
            None => Ok(Vec::new()),
            Some(MemoryValue::Hash(pairs)) => Ok(pairs),
            Some(_) => Err(wrong_type(key)),
        }
    }

    async fn xlen(&mut self, key: &[u8]) -> Result<u64> {
        let _guard = self.enter().await?;
        match self.value(key) {
            None => Ok(0),
            Some(MemoryValue::Stream(len)) => Ok(len),
            Some(_) => Err(wrong_type(key)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_range() {
        assert_eq!(index_range(3, 0, -1), 0..3);
        assert_eq!(index_range(3, 0, 1), 0..2);
        assert_eq!(index_range(3, 1, 10), 1..3);
        assert_eq!(index_range(3, -2, -1), 1..3);
        assert_eq!(index_range(0, 0, -1), 0..0);
        assert_eq!(index_range(3, 2, 1), 0..0);
    }

    #[tokio::test]
    async fn test_scan_pages_until_cursor_zero() {
        let mut source = MemorySource::new();
        for i in 0..5 {
            source.insert(format!("k{}", i), MemoryValue::string("v"));
        }
        source.set_page_size(2);

        let mut cursor = 0;
        let mut seen = Vec::new();
        loop {
            let (next, keys) = source.scan(cursor, 100).await.unwrap();
            seen.extend(keys);
            cursor = next;
            if cursor == 0 {
                break;
            }
        }
        assert_eq!(seen.len(), 5);
    }

    #[tokio::test]
    async fn test_overlapping_pages_repeat_keys() {
        let mut source = MemorySource::new();
        for i in 0..4 {
            source.insert(format!("k{}", i), MemoryValue::string("v"));
        }
        source.set_page_size(2);
        source.set_overlap_pages(true);

        let (next, first) = source.scan(0, 10).await.unwrap();
        let (_, second) = source.scan(next, 10).await.unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(second.len(), 3);
        assert_eq!(second[0], first[1]);
    }

    #[tokio::test]
    async fn test_disconnected_source_fails() {
        let mut source = MemorySource::new();
        source.set_connected(false);
        assert_eq!(source.scan(0, 10).await, Err(EngineError::NoConnection));
        assert_eq!(source.op_count(), 0);
    }

    #[tokio::test]
    async fn test_ghost_key_has_type_none() {
        let mut source = MemorySource::new();
        source.insert_ghost("gone");
        let (_, keys) = source.scan(0, 10).await.unwrap();
        assert_eq!(keys, vec![b"gone".to_vec()]);
        assert_eq!(source.key_type(b"gone").await.unwrap(), "none");
    }

    #[tokio::test]
    async fn test_wrong_type_access() {
        let mut source = MemorySource::new();
        source.insert("s", MemoryValue::string("v"));
        assert!(matches!(
            source.llen(b"s").await,
            Err(EngineError::ValueMissing(_))
        ));
    }

    #[tokio::test]
    async fn test_zrange_orders_by_score() {
        let mut source = MemorySource::new();
        source.insert(
            "z",
            MemoryValue::sorted_set([("c", 3.0), ("a", 1.0), ("b", 1.0)]),
        );
        let members = source.zrange(b"z", 0, -1).await.unwrap();
        assert_eq!(members, vec![b"a".to_vec(), b"b".to_vec(), b"c".to_vec()]);
    }
}
