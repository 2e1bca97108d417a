//! Advance-aware cursor streaming for asynchronous ordered key-value stores.
//!
//! Some stores expose iteration only through a cursor that must be
//! repositioned with explicit asynchronous advance operations: a plain
//! step, a seek to a (compound) key, or a step over several positions.
//! Each advance invalidates the cursor it was called on and resolves to a
//! fresh cursor at the new position, or to nothing once the sequence is
//! exhausted.
//!
//! This crate turns such a cursor into a pull-based [`Stream`] while still
//! letting the consumer pick, record by record, how the *next* step is
//! taken. Every item yielded by the stream is a [`StreamCursor`] handle;
//! calling one of its advance methods does not touch the store directly,
//! it records the chosen advance for the driver to perform when the
//! stream is next polled. If the consumer records nothing, the driver
//! performs a plain step on its behalf. Exactly one advance runs per
//! step, never zero and never two.
//!
//! # Quick Start
//!
//! ```ignore
//! use stride::{Source, SourceExt, StreamCursor};
//! use tokio_stream::StreamExt;
//!
//! async fn sum_every_other<S: Source + Clone + 'static>(source: &S) {
//!     let mut records = source.cursor_stream();
//!     while let Some(cursor) = records.next().await {
//!         let cursor = cursor.expect("store failure");
//!         // Read the current record through the handle.
//!         let _key = cursor.key();
//!         // Skip the following record; without this call the stream
//!         // would take a single step instead.
//!         cursor.step_by(2.try_into().unwrap()).unwrap();
//!     }
//! }
//! ```
//!
//! # Structure
//!
//! ```text
//! Source            ← opens the initial Cursor
//!   └─ Cursor           ← async advance operations, consumed per step
//!        └─ CursorStream    ← the iteration driver (one session per call)
//!             └─ StreamCursor   ← handle yielded each step; records advances
//! facade::TrapChain ← member lookup layers; stream::register() installs
//!                     the cursor-stream entry point for qualifying targets
//! ```
//!
//! Sessions are independent: every call to [`CursorStream::open`],
//! [`CursorStream::resume`], or the [`SourceExt`]/[`CursorExt`] sugar
//! starts a fresh session with its own handle and pending-advance state.
//! Dropping a stream mid-iteration issues no further store operations.
//!
//! # Feature Flags
//!
//! - **`in-memory`**: Enables the [`mem`] module, providing an in-memory
//!   [`Source`] backend for testing.
//! - **`test-utils`**: Enables the [`conformance`] module with source
//!   conformance tests. Implies `in-memory`.
//!
//! [`Stream`]: tokio_stream::Stream
//! [`SourceExt`]: stream::SourceExt
//! [`CursorExt`]: stream::CursorExt

#![warn(
    missing_copy_implementations,
    missing_debug_implementations,
    missing_docs,
    unreachable_pub,
    clippy::missing_const_for_fn,
    rustdoc::all
)]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![deny(unused_must_use, rust_2018_idioms)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod facade;

pub mod model;
pub use model::{Cursor, CursorResult, Source};

pub mod stream;
pub use stream::{AdvanceError, CursorExt, CursorStream, SourceExt, StreamCursor};

/// Conformance tests for cursor sources.
#[cfg(any(test, feature = "test-utils"))]
pub mod conformance;

#[cfg(any(test, feature = "in-memory"))]
pub mod mem;
