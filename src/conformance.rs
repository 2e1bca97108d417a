//! Conformance tests for cursor sources.
//!
//! Generic tests any byte-keyed [`Source`] implementation should pass.
//! Each test takes a factory building a fresh source holding the given
//! `(key, value)` entries in key order; [`conformance`] runs the whole
//! suite. Backends with richer key types can still reuse the suite
//! through an adapter source that maps its keys to bytes.

use crate::{
    model::{Cursor, Source},
    stream::SourceExt,
};
use bytes::Bytes;
use std::num::NonZeroU32;
use tokio_stream::StreamExt;

/// Standard fixture: five records in key order.
const ENTRIES: &[(&str, &str)] =
    &[("01", "a"), ("02", "b"), ("03", "c"), ("04", "d"), ("05", "e")];

fn b(s: &str) -> Bytes {
    Bytes::copy_from_slice(s.as_bytes())
}

fn by(n: u32) -> NonZeroU32 {
    NonZeroU32::new(n).expect("nonzero step count")
}

/// Run all conformance tests against a [`Source`] factory.
pub async fn conformance<S, F>(factory: F)
where
    S: Source + Clone + 'static,
    S::Cursor: Cursor<Key = Bytes, PrimaryKey = Bytes, Value = Bytes>,
    F: Fn(&[(&str, &str)]) -> S,
{
    test_stream_yields_in_order(&factory).await;
    test_empty_source_streams_nothing(&factory).await;
    test_default_advance_is_single_step(&factory).await;
    test_step_by_skips_entries(&factory).await;
    test_seek_positions_at_target(&factory).await;
    test_seek_primary_positions_at_pair(&factory).await;
    test_sessions_are_independent(&factory).await;
}

/// Test that a full pass yields every record, in order, exactly once.
pub async fn test_stream_yields_in_order<S, F>(factory: &F)
where
    S: Source + Clone + 'static,
    S::Cursor: Cursor<Key = Bytes, PrimaryKey = Bytes, Value = Bytes>,
    F: Fn(&[(&str, &str)]) -> S,
{
    let source = factory(ENTRIES);
    let mut stream = source.cursor_stream();

    let mut seen = Vec::new();
    while let Some(cursor) = stream.next().await {
        let cursor = cursor.expect("advance should succeed");
        seen.push((cursor.key().unwrap(), cursor.value().unwrap()));
    }

    let expected: Vec<_> = ENTRIES.iter().map(|(k, v)| (b(k), b(v))).collect();
    assert_eq!(seen, expected, "stream should yield every record in key order");
    assert!(stream.next().await.is_none(), "an exhausted stream stays exhausted");
}

/// Test that an empty source produces an empty stream.
pub async fn test_empty_source_streams_nothing<S, F>(factory: &F)
where
    S: Source + Clone + 'static,
    S::Cursor: Cursor<Key = Bytes, PrimaryKey = Bytes, Value = Bytes>,
    F: Fn(&[(&str, &str)]) -> S,
{
    let source = factory(&[]);
    let mut stream = source.cursor_stream();
    assert!(stream.next().await.is_none(), "empty source should yield nothing");
}

/// Test that the driver's default advance equals a plain cursor step.
pub async fn test_default_advance_is_single_step<S, F>(factory: &F)
where
    S: Source + Clone + 'static,
    S::Cursor: Cursor<Key = Bytes, PrimaryKey = Bytes, Value = Bytes>,
    F: Fn(&[(&str, &str)]) -> S,
{
    let source = factory(ENTRIES);

    let mut streamed = Vec::new();
    let mut stream = source.cursor_stream();
    while let Some(cursor) = stream.next().await {
        streamed.push(cursor.expect("advance should succeed").key().unwrap());
    }

    let mut stepped = Vec::new();
    let mut cursor = source.open_cursor().await.expect("open should succeed");
    while let Some(c) = cursor {
        stepped.push(c.key().clone());
        cursor = c.step().await.expect("step should succeed");
    }

    assert_eq!(streamed, stepped, "default advance should match stepping the cursor by hand");
}

/// Test that `step_by(k)` skips exactly `k - 1` records.
pub async fn test_step_by_skips_entries<S, F>(factory: &F)
where
    S: Source + Clone + 'static,
    S::Cursor: Cursor<Key = Bytes, PrimaryKey = Bytes, Value = Bytes>,
    F: Fn(&[(&str, &str)]) -> S,
{
    let source = factory(ENTRIES);
    let mut stream = source.cursor_stream();

    let cursor = stream.next().await.unwrap().expect("open should succeed");
    assert_eq!(cursor.key(), Some(b("01")));
    cursor.step_by(by(2)).unwrap();

    let cursor = stream.next().await.unwrap().expect("step_by should succeed");
    assert_eq!(cursor.key(), Some(b("03")), "step_by(2) should skip one record");

    // No advance recorded: back to single steps.
    let cursor = stream.next().await.unwrap().expect("step should succeed");
    assert_eq!(cursor.key(), Some(b("04")));
}

/// Test that `seek` lands on the first key at or above the target.
pub async fn test_seek_positions_at_target<S, F>(factory: &F)
where
    S: Source + Clone + 'static,
    S::Cursor: Cursor<Key = Bytes, PrimaryKey = Bytes, Value = Bytes>,
    F: Fn(&[(&str, &str)]) -> S,
{
    let source = factory(ENTRIES);
    let mut stream = source.cursor_stream();

    let cursor = stream.next().await.unwrap().expect("open should succeed");
    cursor.seek(b("04")).unwrap();
    let cursor = stream.next().await.unwrap().expect("seek should succeed");
    assert_eq!(cursor.key(), Some(b("04")), "seek to an existing key should land on it");

    // A target between keys lands on the next populated one.
    let source = factory(ENTRIES);
    let mut stream = source.cursor_stream();
    let cursor = stream.next().await.unwrap().expect("open should succeed");
    cursor.seek(b("035")).unwrap();
    let cursor = stream.next().await.unwrap().expect("seek should succeed");
    assert_eq!(cursor.key(), Some(b("04")), "seek between keys should land on the next key");
}

/// Test that `seek_primary` lands on the first pair at or above the
/// target pair.
pub async fn test_seek_primary_positions_at_pair<S, F>(factory: &F)
where
    S: Source + Clone + 'static,
    S::Cursor: Cursor<Key = Bytes, PrimaryKey = Bytes, Value = Bytes>,
    F: Fn(&[(&str, &str)]) -> S,
{
    let source = factory(ENTRIES);
    let mut stream = source.cursor_stream();

    let cursor = stream.next().await.unwrap().expect("open should succeed");
    cursor.seek_primary(b("03"), b("03")).unwrap();
    let cursor = stream.next().await.unwrap().expect("seek_primary should succeed");
    assert_eq!(cursor.key(), Some(b("03")));
    assert_eq!(cursor.primary_key(), Some(b("03")));
}

/// Test that sessions over the same source do not share state.
pub async fn test_sessions_are_independent<S, F>(factory: &F)
where
    S: Source + Clone + 'static,
    S::Cursor: Cursor<Key = Bytes, PrimaryKey = Bytes, Value = Bytes>,
    F: Fn(&[(&str, &str)]) -> S,
{
    let source = factory(ENTRIES);
    let mut left = source.cursor_stream();
    let mut right = source.cursor_stream();

    let on_left = left.next().await.unwrap().expect("open should succeed");
    let on_right = right.next().await.unwrap().expect("open should succeed");
    assert_eq!(on_left.key(), Some(b("01")));
    assert_eq!(on_right.key(), Some(b("01")));

    on_left.step_by(by(3)).unwrap();
    assert_eq!(left.next().await.unwrap().unwrap().key(), Some(b("04")));

    // The advance recorded on the left session never reaches the right
    // one, and the right handle still reads its own position.
    assert_eq!(on_right.key(), Some(b("01")));
    assert_eq!(right.next().await.unwrap().unwrap().key(), Some(b("02")));
}
