//! The iteration driver: a pull-based stream over a cursor chain.

use super::session::{AdvanceFuture, Session, StreamCursor};
use crate::model::{Cursor, CursorResult, Source};
use core::fmt;
use std::{
    future::Future,
    pin::Pin,
    sync::Arc,
    task::{ready, Context, Poll},
};
use tokio_stream::Stream;
use tracing::{debug, trace};

/// A lazy stream of [`StreamCursor`] handles over one cursor chain.
///
/// Each poll that yields an item hands the consumer the session's handle,
/// positioned on the next record. Between yields the driver performs
/// exactly one advance: the one the consumer recorded on the handle, or a
/// default [`step`](Cursor::step) if the consumer recorded nothing. The
/// stream ends when an advance resolves past the end of the sequence, or,
/// after surfacing the error once, when an advance fails.
///
/// Every stream is its own session. Streams are not restartable; open a
/// new one to iterate again. Dropping a stream mid-iteration simply stops
/// driving the chain: no further store operations are issued.
pub struct CursorStream<C: Cursor> {
    session: Arc<Session<C>>,
    handle: StreamCursor<C>,
    state: State<C>,
}

enum State<C: Cursor> {
    /// Awaiting the source's initial cursor.
    Opening(AdvanceFuture<C>),
    /// A cursor is bound; yield the handle on the next poll.
    Yield,
    /// The consumer's step is over; pick the next advance.
    Resume,
    /// Awaiting an advance operation.
    Advancing(AdvanceFuture<C>),
    /// The sequence has ended.
    Done,
}

impl<C: Cursor> CursorStream<C> {
    /// Open a cursor on `source` and stream it.
    ///
    /// An empty source produces an empty stream.
    pub fn open<S>(source: S) -> Self
    where
        S: Source<Cursor = C> + 'static,
    {
        let fut: AdvanceFuture<C> = Box::pin(async move { source.open_cursor().await });
        Self::new(State::Opening(fut))
    }

    /// Stream an already-open cursor, starting at its current position.
    pub fn resume(cursor: C) -> Self {
        let stream = Self::new(State::Yield);
        stream.session.bind(cursor);
        stream
    }

    fn new(state: State<C>) -> Self {
        let session = Arc::new(Session::new());
        let handle = StreamCursor::new(session.clone());
        Self { session, handle, state }
    }
}

impl<C: Cursor> Stream for CursorStream<C> {
    type Item = Result<StreamCursor<C>, C::Error>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        loop {
            match &mut this.state {
                State::Opening(fut) => match ready!(fut.as_mut().poll(cx)) {
                    Ok(Some(cursor)) => {
                        this.session.bind(cursor);
                        this.state = State::Yield;
                    }
                    Ok(None) => {
                        trace!("source opened with no records");
                        this.state = State::Done;
                        return Poll::Ready(None);
                    }
                    Err(e) => {
                        debug!(error = %e, "failed to open cursor");
                        this.state = State::Done;
                        return Poll::Ready(Some(Err(e)));
                    }
                },
                State::Yield => {
                    this.state = State::Resume;
                    return Poll::Ready(Some(Ok(this.handle.clone())));
                }
                State::Resume => {
                    let fut = match this.session.take_pending() {
                        // The consumer chose how this step is taken.
                        Some(fut) => fut,
                        None => match this.session.take_current() {
                            // No recorded advance; step on the consumer's
                            // behalf.
                            Some(cursor) => {
                                let fut: AdvanceFuture<C> = Box::pin(cursor.step());
                                fut
                            }
                            // The position was withdrawn without a recorded
                            // advance. Nothing left to drive.
                            None => {
                                this.state = State::Done;
                                return Poll::Ready(None);
                            }
                        },
                    };
                    this.state = State::Advancing(fut);
                }
                State::Advancing(fut) => match ready!(fut.as_mut().poll(cx)) {
                    Ok(Some(cursor)) => {
                        this.session.bind(cursor);
                        this.state = State::Yield;
                    }
                    Ok(None) => {
                        trace!("cursor chain exhausted");
                        this.state = State::Done;
                        return Poll::Ready(None);
                    }
                    Err(e) => {
                        debug!(error = %e, "cursor advance failed");
                        this.state = State::Done;
                        return Poll::Ready(Some(Err(e)));
                    }
                },
                State::Done => return Poll::Ready(None),
            }
        }
    }
}

impl<C: Cursor> fmt::Debug for CursorStream<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CursorStream").field("state", &self.state).finish()
    }
}

impl<C: Cursor> fmt::Debug for State<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Opening(_) => "Opening",
            Self::Yield => "Yield",
            Self::Resume => "Resume",
            Self::Advancing(_) => "Advancing",
            Self::Done => "Done",
        })
    }
}

/// Streaming entry point for sources.
pub trait SourceExt: Source {
    /// Open a cursor on this source and stream it.
    ///
    /// Each call starts an independent session.
    fn cursor_stream(&self) -> CursorStream<Self::Cursor>
    where
        Self: Clone + 'static,
    {
        CursorStream::open(self.clone())
    }
}

impl<S: Source> SourceExt for S {}

/// Streaming entry point for cursors.
pub trait CursorExt: Cursor {
    /// Stream this cursor, starting at its current position.
    fn into_stream(self) -> CursorStream<Self> {
        CursorStream::resume(self)
    }
}

impl<C: Cursor> CursorExt for C {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::AdvanceError;
    use std::{
        convert::Infallible,
        num::NonZeroU32,
        sync::atomic::{AtomicU32, Ordering},
    };
    use tokio_stream::StreamExt;

    /// Cursor over the keys `1..=len`, counting advance operations.
    struct Probe {
        at: u32,
        len: u32,
        advances: Arc<AtomicU32>,
    }

    impl Probe {
        async fn goto(self, at: u32) -> CursorResult<Self> {
            self.advances.fetch_add(1, Ordering::Relaxed);
            let in_range = at <= self.len;
            Ok(in_range.then(|| Self { at, ..self }))
        }
    }

    impl Cursor for Probe {
        type Key = u32;
        type PrimaryKey = u32;
        type Value = u32;
        type Error = Infallible;

        fn key(&self) -> &u32 {
            &self.at
        }

        fn primary_key(&self) -> &u32 {
            &self.at
        }

        fn value(&self) -> &u32 {
            &self.at
        }

        fn step(self) -> impl Future<Output = CursorResult<Self>> + Send {
            let at = self.at + 1;
            self.goto(at)
        }

        fn seek(self, key: u32) -> impl Future<Output = CursorResult<Self>> + Send {
            self.goto(key)
        }

        fn seek_primary(self, key: u32, _primary: u32) -> impl Future<Output = CursorResult<Self>> + Send {
            self.goto(key)
        }

        fn step_by(self, count: NonZeroU32) -> impl Future<Output = CursorResult<Self>> + Send {
            let at = self.at + count.get();
            self.goto(at)
        }
    }

    #[derive(Clone)]
    struct ProbeSource {
        len: u32,
        advances: Arc<AtomicU32>,
    }

    impl ProbeSource {
        fn new(len: u32) -> Self {
            Self { len, advances: Arc::new(AtomicU32::new(0)) }
        }
    }

    impl Source for ProbeSource {
        type Cursor = Probe;

        fn open_cursor(&self) -> impl Future<Output = CursorResult<Probe>> + Send {
            let source = self.clone();
            async move {
                if source.len == 0 {
                    return Ok(None);
                }
                Ok(Some(Probe { at: 1, len: source.len, advances: source.advances }))
            }
        }
    }

    fn by(n: u32) -> NonZeroU32 {
        NonZeroU32::new(n).unwrap()
    }

    #[tokio::test]
    async fn yields_every_position_by_default() {
        let source = ProbeSource::new(3);
        let mut stream = source.cursor_stream();

        let mut keys = Vec::new();
        while let Some(cursor) = stream.next().await {
            keys.push(cursor.unwrap().key().unwrap());
        }
        assert_eq!(keys, [1, 2, 3]);
        // Three default steps: the last one resolves past the end.
        assert_eq!(source.advances.load(Ordering::Relaxed), 3);
    }

    #[tokio::test]
    async fn empty_source_yields_nothing() {
        let source = ProbeSource::new(0);
        let mut stream = source.cursor_stream();
        assert!(stream.next().await.is_none());
        assert_eq!(source.advances.load(Ordering::Relaxed), 0);
    }

    #[tokio::test]
    async fn recorded_advance_replaces_default_step() {
        let source = ProbeSource::new(5);
        let mut stream = source.cursor_stream();

        let cursor = stream.next().await.unwrap().unwrap();
        assert_eq!(cursor.key(), Some(1));
        cursor.step_by(by(3)).unwrap();

        // One advance, three positions: 2 and 3 are never yielded.
        let cursor = stream.next().await.unwrap().unwrap();
        assert_eq!(cursor.key(), Some(4));

        // Back to default stepping.
        let cursor = stream.next().await.unwrap().unwrap();
        assert_eq!(cursor.key(), Some(5));
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn handle_identity_is_stable_across_steps() {
        let mut stream = ProbeSource::new(2).cursor_stream();
        let first = stream.next().await.unwrap().unwrap();
        let second = stream.next().await.unwrap().unwrap();
        assert!(Arc::ptr_eq(&first.session, &second.session));
    }

    #[tokio::test]
    async fn second_advance_in_one_step_is_rejected() {
        let mut stream = ProbeSource::new(3).cursor_stream();
        let cursor = stream.next().await.unwrap().unwrap();

        cursor.step().unwrap();
        assert_eq!(cursor.step_by(by(2)), Err(AdvanceError::AlreadyRecorded));
        // Recording withdrew the position; reads return nothing.
        assert_eq!(cursor.key(), None);

        // The first recorded advance still drives the next step.
        assert_eq!(stream.next().await.unwrap().unwrap().key(), Some(2));
    }

    #[tokio::test]
    async fn handle_detaches_when_stream_ends() {
        let mut stream = ProbeSource::new(1).cursor_stream();
        let cursor = stream.next().await.unwrap().unwrap();
        assert!(stream.next().await.is_none());

        assert!(!cursor.is_positioned());
        assert_eq!(cursor.key(), None);
        assert_eq!(cursor.step(), Err(AdvanceError::Detached));
    }

    #[tokio::test]
    async fn abandoning_issues_no_further_advances() {
        let source = ProbeSource::new(5);
        let mut stream = source.cursor_stream();

        let cursor = stream.next().await.unwrap().unwrap();
        drop(stream);

        // Opening positioned the cursor; no advance ever ran, and none
        // will.
        assert_eq!(source.advances.load(Ordering::Relaxed), 0);
        assert_eq!(cursor.key(), Some(1));
    }

    #[tokio::test]
    async fn dropping_stream_and_handle_frees_the_session() {
        let mut stream = ProbeSource::new(3).cursor_stream();
        let cursor = stream.next().await.unwrap().unwrap();
        let session = Arc::downgrade(&cursor.session);

        drop(stream);
        assert!(session.upgrade().is_some());
        drop(cursor);
        assert!(session.upgrade().is_none());
    }

    #[tokio::test]
    async fn sessions_are_independent() {
        let source = ProbeSource::new(4);
        let mut a = source.cursor_stream();
        let mut b = source.cursor_stream();

        let on_a = a.next().await.unwrap().unwrap();
        assert_eq!(b.next().await.unwrap().unwrap().key(), Some(1));
        on_a.step_by(by(2)).unwrap();

        assert_eq!(a.next().await.unwrap().unwrap().key(), Some(3));
        // The advance recorded on `a` never touches `b`.
        assert_eq!(b.next().await.unwrap().unwrap().key(), Some(2));
    }

    #[tokio::test]
    async fn resume_streams_from_the_cursor_position() {
        let advances = Arc::new(AtomicU32::new(0));
        let cursor = Probe { at: 3, len: 5, advances };

        let mut keys = Vec::new();
        let mut stream = cursor.into_stream();
        while let Some(cursor) = stream.next().await {
            keys.push(cursor.unwrap().key().unwrap());
        }
        assert_eq!(keys, [3, 4, 5]);
    }
}
