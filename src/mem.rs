//! In-memory source implementation.
//!
//! This is not a good implementation for production use, but is useful for
//! testing.

use crate::{
    facade::{Classify, TargetKind},
    model::{Cursor, CursorResult, Source},
};
use bytes::Bytes;
use core::fmt;
use parking_lot::RwLock;
use std::{
    collections::BTreeMap,
    future::Future,
    num::NonZeroU32,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};
use tokio::task::yield_now;

/// One record in a cursor snapshot.
#[derive(Debug, Clone)]
struct Record {
    key: Bytes,
    primary: Bytes,
    value: Bytes,
}

#[derive(Default)]
struct Inner {
    records: RwLock<BTreeMap<Bytes, Bytes>>,
    aborted: AtomicBool,
}

/// A simple in-memory ordered store using a [`BTreeMap`].
///
/// Records are ordered by their byte key; iterated in primary order, a
/// cursor's key and primary key coincide. Cursors snapshot the records at
/// open time, so writes made while a cursor is live are not observed by
/// it.
///
/// The store is cheaply cloneable; clones share the same records.
#[derive(Clone, Default)]
pub struct MemStore {
    inner: Arc<Inner>,
}

impl MemStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record, returning the previously stored value if any.
    pub fn insert(&self, key: impl Into<Bytes>, value: impl Into<Bytes>) -> Option<Bytes> {
        self.inner.records.write().insert(key.into(), value.into())
    }

    /// Remove a record by key.
    pub fn remove(&self, key: &[u8]) -> Option<Bytes> {
        self.inner.records.write().remove(key)
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.inner.records.read().len()
    }

    /// Whether the store holds no records.
    pub fn is_empty(&self) -> bool {
        self.inner.records.read().is_empty()
    }

    /// Mark the store aborted.
    ///
    /// Every subsequent open or advance fails with [`MemError::Aborted`],
    /// the way an aborted store transaction would fail live cursors.
    pub fn abort(&self) {
        self.inner.aborted.store(true, Ordering::Relaxed);
    }

    /// Create a secondary ordering view over this store.
    ///
    /// `extract` maps a `(primary key, value)` record to its index key,
    /// or `None` to leave the record out of the view. View cursors are
    /// ordered by `(index key, primary key)`.
    pub fn index<F>(&self, extract: F) -> MemIndex
    where
        F: Fn(&Bytes, &Bytes) -> Option<Bytes> + Send + Sync + 'static,
    {
        MemIndex { store: self.clone(), extract: Arc::new(extract) }
    }

    fn snapshot(&self) -> Vec<Record> {
        self.inner
            .records
            .read()
            .iter()
            .map(|(k, v)| Record { key: k.clone(), primary: k.clone(), value: v.clone() })
            .collect()
    }
}

impl fmt::Debug for MemStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemStore").finish()
    }
}

impl<K: Into<Bytes>, V: Into<Bytes>> FromIterator<(K, V)> for MemStore {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let store = Self::new();
        for (key, value) in iter {
            store.insert(key, value);
        }
        store
    }
}

impl Source for MemStore {
    type Cursor = MemCursor;

    fn open_cursor(&self) -> impl Future<Output = CursorResult<MemCursor>> + Send {
        let rows: Arc<[Record]> = self.snapshot().into();
        let origin = self.inner.clone();
        open(rows, origin)
    }
}

impl Classify for MemStore {
    fn classify(&self) -> Option<TargetKind> {
        Some(TargetKind::Store)
    }
}

type ExtractFn = dyn Fn(&Bytes, &Bytes) -> Option<Bytes> + Send + Sync;

/// A secondary ordering view over a [`MemStore`].
///
/// Created with [`MemStore::index`]. Shares the records of the store it
/// was created from; cursors snapshot at open time, like store cursors.
#[derive(Clone)]
pub struct MemIndex {
    store: MemStore,
    extract: Arc<ExtractFn>,
}

impl MemIndex {
    fn snapshot(&self) -> Vec<Record> {
        let records = self.store.inner.records.read();
        let mut rows: Vec<Record> = records
            .iter()
            .filter_map(|(k, v)| {
                (self.extract)(k, v)
                    .map(|key| Record { key, primary: k.clone(), value: v.clone() })
            })
            .collect();
        rows.sort_by(|a, b| (&a.key, &a.primary).cmp(&(&b.key, &b.primary)));
        rows
    }
}

impl fmt::Debug for MemIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemIndex").finish_non_exhaustive()
    }
}

impl Source for MemIndex {
    type Cursor = MemCursor;

    fn open_cursor(&self) -> impl Future<Output = CursorResult<MemCursor>> + Send {
        let rows: Arc<[Record]> = self.snapshot().into();
        let origin = self.store.inner.clone();
        open(rows, origin)
    }
}

impl Classify for MemIndex {
    fn classify(&self) -> Option<TargetKind> {
        Some(TargetKind::Index)
    }
}

async fn open(rows: Arc<[Record]>, origin: Arc<Inner>) -> CursorResult<MemCursor> {
    yield_now().await;
    if origin.aborted.load(Ordering::Relaxed) {
        return Err(MemError::Aborted);
    }
    if rows.is_empty() {
        return Ok(None);
    }
    Ok(Some(MemCursor { rows, pos: 0, origin }))
}

/// Error type for in-memory store operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum MemError {
    /// The store was aborted while the cursor was live.
    #[error("store aborted")]
    Aborted,

    /// A seek target does not lie strictly ahead of the cursor.
    #[error("seek target is not ahead of the cursor position")]
    SeekOrder,
}

/// Cursor over a snapshot of a [`MemStore`] or [`MemIndex`].
pub struct MemCursor {
    rows: Arc<[Record]>,
    pos: usize,
    origin: Arc<Inner>,
}

impl MemCursor {
    fn row(&self) -> &Record {
        &self.rows[self.pos]
    }

    /// First position at or past `from` matching `pred`, in snapshot
    /// order.
    fn scan_from(&self, from: usize, pred: impl Fn(&Record) -> bool) -> Option<usize> {
        self.rows.get(from..)?.iter().position(pred).map(|i| from + i)
    }

    /// Resolve an advance to `pos`, or past the end for `None`.
    async fn jump(self, pos: Option<usize>) -> CursorResult<Self> {
        yield_now().await;
        if self.origin.aborted.load(Ordering::Relaxed) {
            return Err(MemError::Aborted);
        }
        Ok(pos.filter(|&p| p < self.rows.len()).map(|pos| Self { pos, ..self }))
    }
}

impl fmt::Debug for MemCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemCursor").field("pos", &self.pos).finish_non_exhaustive()
    }
}

impl Cursor for MemCursor {
    type Key = Bytes;
    type PrimaryKey = Bytes;
    type Value = Bytes;
    type Error = MemError;

    fn key(&self) -> &Bytes {
        &self.row().key
    }

    fn primary_key(&self) -> &Bytes {
        &self.row().primary
    }

    fn value(&self) -> &Bytes {
        &self.row().value
    }

    fn step(self) -> impl Future<Output = CursorResult<Self>> + Send {
        let pos = self.pos + 1;
        self.jump(Some(pos))
    }

    fn seek(self, key: Bytes) -> impl Future<Output = CursorResult<Self>> + Send {
        async move {
            if key <= self.row().key {
                return Err(MemError::SeekOrder);
            }
            let pos = self.scan_from(self.pos + 1, |r| r.key >= key);
            self.jump(pos).await
        }
    }

    fn seek_primary(
        self,
        key: Bytes,
        primary: Bytes,
    ) -> impl Future<Output = CursorResult<Self>> + Send {
        async move {
            if (&key, &primary) <= (&self.row().key, &self.row().primary) {
                return Err(MemError::SeekOrder);
            }
            let pos = self.scan_from(self.pos + 1, |r| (&r.key, &r.primary) >= (&key, &primary));
            self.jump(pos).await
        }
    }

    fn step_by(self, count: NonZeroU32) -> impl Future<Output = CursorResult<Self>> + Send {
        let pos = self.pos + count.get() as usize;
        self.jump(Some(pos))
    }
}

impl Classify for MemCursor {
    fn classify(&self) -> Option<TargetKind> {
        Some(TargetKind::Cursor)
    }
}
