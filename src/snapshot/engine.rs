//! Snapshot Engine Module
//!
//! Enumerates the keyspace, classifies every key and renders its value into
//! a [`Snapshot`] that is handed to the caller only once it is complete.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::{EngineError, Result};
use crate::snapshot::{render, Entry, KeyKind, SkippedKey, Snapshot};
use crate::source::{Bytes, KeyspaceSource};

// == Failure Policy ==
/// What to do when a single key cannot be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Abort the whole snapshot on the first error
    #[default]
    FailFast,
    /// Skip the key, record it, and keep going; connection errors still abort
    SkipKey,
}

// == Engine Options ==
#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// COUNT hint for each SCAN step
    pub scan_count: usize,
    /// Upper bound on one poll, including time spent queued
    pub poll_timeout: Duration,
    /// Display cap in characters; `None` renders values in full
    pub max_display_chars: Option<usize>,
    pub policy: FailurePolicy,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            scan_count: 100,
            poll_timeout: Duration::from_secs(10),
            max_display_chars: Some(4096),
            policy: FailurePolicy::FailFast,
        }
    }
}

// == Snapshot Engine ==
/// Produces keyspace snapshots over a single store connection.
///
/// At most one poll talks to the connection at a time: `take_snapshot`
/// waits its turn, `try_take_snapshot` refuses with [`EngineError::Busy`].
pub struct SnapshotEngine {
    source: Mutex<Box<dyn KeyspaceSource>>,
    options: EngineOptions,
    sequence: AtomicU64,
}

impl SnapshotEngine {
    pub fn new(source: impl KeyspaceSource + 'static, options: EngineOptions) -> Self {
        Self {
            source: Mutex::new(Box::new(source)),
            options,
            sequence: AtomicU64::new(0),
        }
    }

    // == Take Snapshot ==
    /// Takes a snapshot, queueing behind any poll already in flight.
    pub async fn take_snapshot(&self) -> Result<Snapshot> {
        let timeout = self.options.poll_timeout;
        tokio::time::timeout(timeout, async {
            let mut source = self.source.lock().await;
            self.collect(&mut **source).await
        })
        .await
        .map_err(|_| {
            warn!("Snapshot exceeded its {:?} bound", timeout);
            EngineError::Timeout(Some(timeout))
        })?
    }

    // == Try Take Snapshot ==
    /// Takes a snapshot unless another one is in flight.
    pub async fn try_take_snapshot(&self) -> Result<Snapshot> {
        let mut source = self.source.try_lock().map_err(|_| EngineError::Busy)?;
        let timeout = self.options.poll_timeout;
        tokio::time::timeout(timeout, self.collect(&mut **source))
            .await
            .map_err(|_| {
                warn!("Snapshot exceeded its {:?} bound", timeout);
                EngineError::Timeout(Some(timeout))
            })?
    }

    async fn collect(&self, source: &mut dyn KeyspaceSource) -> Result<Snapshot> {
        let sequence = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        let taken_at = Utc::now();
        debug!(sequence, "Snapshot started");

        let keys = self.scan_all(source).await?;
        let mut entries = Vec::with_capacity(keys.len());
        let mut skipped = Vec::new();

        for raw in keys {
            let outcome = match String::from_utf8(raw) {
                Ok(key) => self.read_entry(source, key.clone()).await.map_err(|e| (key, e)),
                Err(err) => {
                    let key = String::from_utf8_lossy(err.as_bytes()).into_owned();
                    let reason =
                        EngineError::ValueMissing(format!("key `{}` is not valid UTF-8", key));
                    Err((key, reason))
                }
            };

            match outcome {
                Ok(Some(entry)) => entries.push(entry),
                Ok(None) => {}
                Err((key, err))
                    if err.is_per_key() && self.options.policy == FailurePolicy::SkipKey =>
                {
                    warn!(key = %key, "Skipping key: {}", err);
                    skipped.push(SkippedKey {
                        key,
                        reason: err.to_string(),
                    });
                }
                Err((key, err)) => {
                    warn!(key = %key, sequence, "Snapshot aborted: {}", err);
                    return Err(err);
                }
            }
        }

        info!(
            sequence,
            entries = entries.len(),
            skipped = skipped.len(),
            "Snapshot complete"
        );

        Ok(Snapshot {
            sequence,
            taken_at,
            entries,
            skipped,
        })
    }

    /// Iterates SCAN to completion; the set removes keys returned twice.
    async fn scan_all(&self, source: &mut dyn KeyspaceSource) -> Result<BTreeSet<Bytes>> {
        let mut keys = BTreeSet::new();
        let mut cursor = 0;
        loop {
            let (next, page) = source.scan(cursor, self.options.scan_count).await?;
            keys.extend(page);
            if next == 0 {
                break;
            }
            cursor = next;
        }
        Ok(keys)
    }

    /// Reads one key. `None` means the key vanished after it was scanned.
    async fn read_entry(
        &self,
        source: &mut dyn KeyspaceSource,
        key: String,
    ) -> Result<Option<Entry>> {
        let raw = key.as_bytes();
        let type_name = source.key_type(raw).await?;
        if type_name == "none" {
            debug!(key = %key, "Key vanished before it could be read");
            return Ok(None);
        }
        let kind = type_name
            .parse::<KeyKind>()
            .map_err(|msg| EngineError::ValueMissing(format!("{} for key `{}`", msg, key)))?;

        let display = match kind {
            KeyKind::String => match source.get(raw).await? {
                Some(value) => render::decode(&key, value)?,
                None => return Ok(None),
            },
            KeyKind::List => {
                let len = source.llen(raw).await?;
                let items = if len == 0 {
                    Vec::new()
                } else {
                    source.lrange(raw, 0, len as i64 - 1).await?
                };
                render::listing(&render::decode_all(&key, items)?)
            }
            KeyKind::Set => {
                let members = source.smembers(raw).await?;
                render::sorted_listing(render::decode_all(&key, members)?)
            }
            KeyKind::SortedSet => {
                let members = source.zrange(raw, 0, -1).await?;
                render::listing(&render::decode_all(&key, members)?)
            }
            KeyKind::Hash => {
                let pairs = source
                    .hgetall(raw)
                    .await?
                    .into_iter()
                    .map(|(field, value)| {
                        Ok((render::decode(&key, field)?, render::decode(&key, value)?))
                    })
                    .collect::<Result<Vec<_>>>()?;
                render::hash_listing(pairs)
            }
            KeyKind::Stream => render::stream_placeholder(source.xlen(raw).await?),
        };

        let display = render::truncate(display, self.options.max_display_chars);
        Ok(Some(Entry { key, kind, display }))
    }
}
