use crate::model::CursorResult;
use core::fmt;
use std::{future::Future, num::NonZeroU32};

/// A positional handle over an ordered sequence of records.
///
/// A cursor always sits on a record; its key, primary key, and value are
/// readable for as long as the cursor exists. Repositioning happens only
/// through the advance operations, all of which consume the cursor and
/// resolve to a fresh one (or to `None` past the end of the sequence).
///
/// For a store iterated in its primary order, [`key`](Cursor::key) and
/// [`primary_key`](Cursor::primary_key) coincide. For a secondary
/// ordering view they differ: records are ordered by `(key, primary_key)`
/// and [`seek_primary`](Cursor::seek_primary) can position within a run
/// of records sharing the same key.
pub trait Cursor: Sized + Send + 'static {
    /// The ordering key at the cursor's position.
    type Key: Ord + Clone + fmt::Debug + Send + Sync + 'static;

    /// The primary key of the record at the cursor's position.
    type PrimaryKey: Ord + Clone + fmt::Debug + Send + Sync + 'static;

    /// The value of the record at the cursor's position.
    type Value: Clone + Send + Sync + 'static;

    /// Error type for advance operations.
    type Error: core::error::Error + Send + Sync + 'static;

    /// The ordering key of the current record.
    fn key(&self) -> &Self::Key;

    /// The primary key of the current record.
    fn primary_key(&self) -> &Self::PrimaryKey;

    /// The value of the current record.
    fn value(&self) -> &Self::Value;

    /// Advance to the next position.
    fn step(self) -> impl Future<Output = CursorResult<Self>> + Send;

    /// Advance to the first position with key at or above `key`.
    ///
    /// `key` must lie strictly ahead of the current position; backends
    /// reject targets at or behind the cursor.
    fn seek(self, key: Self::Key) -> impl Future<Output = CursorResult<Self>> + Send;

    /// Advance to the first position with `(key, primary_key)` at or
    /// above the given pair.
    ///
    /// The pair must lie strictly ahead of the current position. This is
    /// the compound-key variant of [`seek`](Cursor::seek), useful on
    /// secondary ordering views where several records share a key.
    fn seek_primary(
        self,
        key: Self::Key,
        primary: Self::PrimaryKey,
    ) -> impl Future<Output = CursorResult<Self>> + Send;

    /// Advance over `count` positions.
    ///
    /// `step_by(1)` is equivalent to [`step`](Cursor::step). The count is
    /// nonzero by construction; an advance always moves the cursor.
    fn step_by(self, count: NonZeroU32) -> impl Future<Output = CursorResult<Self>> + Send;
}

/// Anything able to open a cursor over an ordered sequence of records.
///
/// Implemented by ordered stores and by secondary ordering views over
/// them.
pub trait Source: Send + Sync {
    /// The cursor type produced by [`open_cursor`](Source::open_cursor).
    type Cursor: Cursor;

    /// Open a cursor at the first position of the sequence.
    ///
    /// Resolves to `Ok(None)` if the sequence is empty.
    fn open_cursor(&self) -> impl Future<Output = CursorResult<Self::Cursor>> + Send;
}
