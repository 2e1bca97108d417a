//! End-to-end tests driving the in-memory backend through the public API.

use bytes::Bytes;
use std::num::NonZeroU32;
use stride::{
    facade::{Classify, Member, MemberTraps, TrapChain},
    mem::{MemError, MemStore},
    stream::{register, SourceExt, CURSOR_STREAM},
};
use tokio_stream::StreamExt;

fn b(s: &str) -> Bytes {
    Bytes::copy_from_slice(s.as_bytes())
}

fn abc_store() -> MemStore {
    [("1", "a"), ("2", "b"), ("3", "c")].into_iter().collect()
}

#[tokio::test]
async fn yields_each_record_in_order() {
    let store = abc_store();
    let mut stream = store.cursor_stream();

    let mut seen = Vec::new();
    while let Some(cursor) = stream.next().await {
        let cursor = cursor.expect("advance should succeed");
        seen.push((cursor.key().unwrap(), cursor.value().unwrap()));
    }
    assert_eq!(seen, [(b("1"), b("a")), (b("2"), b("b")), (b("3"), b("c"))]);
    assert!(stream.next().await.is_none());
}

#[tokio::test]
async fn step_by_two_skips_the_middle_record() {
    let store = abc_store();
    let mut stream = store.cursor_stream();

    let cursor = stream.next().await.unwrap().unwrap();
    assert_eq!(cursor.key(), Some(b("1")));
    cursor.step_by(NonZeroU32::new(2).unwrap()).unwrap();

    let cursor = stream.next().await.unwrap().unwrap();
    assert_eq!(cursor.key(), Some(b("3")), "record 2 should be skipped");
    assert!(stream.next().await.is_none());
}

/// Stand-in for the binding layer's own member resolution.
struct BaseTraps;

impl MemberTraps for BaseTraps {
    fn get(&self, _target: &dyn Classify, member: &str) -> Option<Member> {
        (member == "open_cursor").then_some(Member::Native)
    }
}

/// Something the capability predicate rejects.
struct NotAStore;

impl Classify for NotAStore {
    fn classify(&self) -> Option<stride::facade::TargetKind> {
        None
    }
}

#[tokio::test]
async fn entry_point_resolves_through_the_facade() {
    let mut chain = TrapChain::new();
    chain.add_traps(BaseTraps);
    register(&mut chain);

    let store = abc_store();
    assert!(chain.has(&store, CURSOR_STREAM));
    assert_eq!(chain.get(&NotAStore, CURSOR_STREAM), None);
    // Members the base layer owned still resolve the same way.
    assert_eq!(chain.get(&store, "open_cursor"), Some(Member::Native));

    // Resolving the member and invoking the entry point it names.
    let keys: Vec<_> = match chain.get(&store, CURSOR_STREAM) {
        Some(Member::CursorStream) => {
            store
                .cursor_stream()
                .map(|cursor| cursor.unwrap().key().unwrap())
                .collect()
                .await
        }
        other => panic!("expected the cursor-stream member, got {other:?}"),
    };
    assert_eq!(keys, [b("1"), b("2"), b("3")]);
}

#[tokio::test]
async fn store_failure_ends_the_stream() {
    let store = abc_store();
    let mut stream = store.cursor_stream();

    assert_eq!(stream.next().await.unwrap().unwrap().key(), Some(b("1")));
    store.abort();

    assert!(matches!(stream.next().await, Some(Err(MemError::Aborted))));
    assert!(stream.next().await.is_none());
}
