//! Per-session shared state and the consumer-facing cursor handle.

use crate::model::{Cursor, CursorResult};
use core::fmt;
use parking_lot::Mutex;
use std::{future::Future, num::NonZeroU32, pin::Pin, sync::Arc};

/// A boxed advance operation waiting to be driven.
pub(super) type AdvanceFuture<C> = Pin<Box<dyn Future<Output = CursorResult<C>> + Send>>;

/// State shared between a [`CursorStream`] and its [`StreamCursor`].
///
/// `current` holds the physical cursor the session currently fronts;
/// `pending` holds the advance the consumer recorded during the current
/// step, if any. Recording withdraws the cursor from `current`, so at any
/// moment at most one of the two slots is populated with a live position.
/// Neither slot refers back to the handle; dropping the stream and all
/// handle clones frees the session and everything it owns.
///
/// [`CursorStream`]: super::CursorStream
pub(super) struct Session<C: Cursor> {
    current: Mutex<Option<C>>,
    pending: Mutex<Option<AdvanceFuture<C>>>,
}

impl<C: Cursor> Session<C> {
    pub(super) const fn new() -> Self {
        Self { current: Mutex::new(None), pending: Mutex::new(None) }
    }

    /// Bind the physical cursor the session fronts.
    pub(super) fn bind(&self, cursor: C) {
        *self.current.lock() = Some(cursor);
    }

    /// Withdraw the current physical cursor, if any.
    pub(super) fn take_current(&self) -> Option<C> {
        self.current.lock().take()
    }

    /// Consume the advance recorded this step, clearing the slot.
    pub(super) fn take_pending(&self) -> Option<AdvanceFuture<C>> {
        self.pending.lock().take()
    }

    /// Record an advance for the driver to perform.
    ///
    /// Lock order is `pending` before `current`, matching the driver's
    /// access order.
    fn record(&self, make: impl FnOnce(C) -> AdvanceFuture<C>) -> Result<(), AdvanceError> {
        let mut pending = self.pending.lock();
        if pending.is_some() {
            return Err(AdvanceError::AlreadyRecorded);
        }
        let cursor = self.current.lock().take().ok_or(AdvanceError::Detached)?;
        *pending = Some(make(cursor));
        Ok(())
    }

    /// Read through the current physical cursor, if one is bound.
    fn read<R>(&self, f: impl FnOnce(&C) -> R) -> Option<R> {
        self.current.lock().as_ref().map(f)
    }
}

/// Error from recording an advance on a [`StreamCursor`].
///
/// These are consumer-protocol errors; none of them reach the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AdvanceError {
    /// An advance was already recorded for this step.
    ///
    /// Recording consumes the cursor position, so a second advance in the
    /// same step has nothing left to act on and is rejected rather than
    /// silently replacing the first.
    #[error("an advance is already recorded for this step")]
    AlreadyRecorded,

    /// The session holds no live cursor.
    ///
    /// Either the stream has ended, or the handle outlived its stream.
    #[error("cursor session holds no live position")]
    Detached,
}

/// The handle yielded by a [`CursorStream`] on every step.
///
/// Reads go straight through to the record the session currently sits on.
/// The advance methods record how the *next* step is taken instead of
/// performing it; the stream drives the recorded advance (or a default
/// [`step`](Cursor::step)) when it is next polled. Cloning the handle
/// does not clone the session: all clones share one position and one
/// pending-advance slot.
///
/// [`CursorStream`]: super::CursorStream
pub struct StreamCursor<C: Cursor> {
    pub(super) session: Arc<Session<C>>,
}

impl<C: Cursor> StreamCursor<C> {
    pub(super) const fn new(session: Arc<Session<C>>) -> Self {
        Self { session }
    }

    /// The ordering key of the current record, if the session holds one.
    ///
    /// Returns `None` after an advance has been recorded this step and
    /// after the stream has ended.
    pub fn key(&self) -> Option<C::Key> {
        self.session.read(|c| c.key().clone())
    }

    /// The primary key of the current record, if the session holds one.
    pub fn primary_key(&self) -> Option<C::PrimaryKey> {
        self.session.read(|c| c.primary_key().clone())
    }

    /// The value of the current record, if the session holds one.
    pub fn value(&self) -> Option<C::Value> {
        self.session.read(|c| c.value().clone())
    }

    /// Whether the session currently sits on a record.
    pub fn is_positioned(&self) -> bool {
        self.session.read(|_| ()).is_some()
    }

    /// Record a plain single-position step for the next advance.
    pub fn step(&self) -> Result<(), AdvanceError> {
        self.session.record(|c| Box::pin(c.step()))
    }

    /// Record a seek to the first key at or above `key`.
    pub fn seek(&self, key: C::Key) -> Result<(), AdvanceError> {
        self.session.record(move |c| Box::pin(c.seek(key)))
    }

    /// Record a seek to the first `(key, primary_key)` pair at or above
    /// the given pair.
    pub fn seek_primary(&self, key: C::Key, primary: C::PrimaryKey) -> Result<(), AdvanceError> {
        self.session.record(move |c| Box::pin(c.seek_primary(key, primary)))
    }

    /// Record an advance over `count` positions.
    pub fn step_by(&self, count: NonZeroU32) -> Result<(), AdvanceError> {
        self.session.record(move |c| Box::pin(c.step_by(count)))
    }
}

impl<C: Cursor> Clone for StreamCursor<C> {
    fn clone(&self) -> Self {
        Self { session: self.session.clone() }
    }
}

impl<C: Cursor> fmt::Debug for StreamCursor<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamCursor").field("positioned", &self.is_positioned()).finish()
    }
}
