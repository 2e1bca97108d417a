//! Store model traits.
//!
//! The [`Cursor`] trait describes a positional handle over an ordered
//! sequence of records. A cursor is only repositioned through its advance
//! operations, each of which consumes the cursor and asynchronously
//! resolves to a new cursor at the updated position, or to `None` once the
//! sequence is exhausted. Consuming `self` encodes the store rule that an
//! advance invalidates the position it was called on: there is no way to
//! read through a cursor that has already been advanced.
//!
//! The [`Source`] trait describes anything able to open an initial cursor:
//! an ordered store, or a secondary ordering view over one. An empty
//! source opens no cursor at all.
//!
//! Backends implement both traits; the [`stream`](crate::stream) module
//! consumes them. See the [`mem`](crate::mem) module for a reference
//! backend.

mod traits;
pub use traits::{Cursor, Source};

/// Result of opening or advancing a cursor.
///
/// `Ok(None)` is the terminal value: the sequence holds no (further)
/// records. Errors are backend-defined and end iteration abnormally.
pub type CursorResult<C> = Result<Option<C>, <C as Cursor>::Error>;
