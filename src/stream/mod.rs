//! Cursor iteration sessions.
//!
//! A session turns a [`Cursor`](crate::Cursor) chain into a pull-based
//! [`Stream`](tokio_stream::Stream) of [`StreamCursor`] handles. The
//! handle has the same read surface as the cursor it fronts, but its
//! advance methods do not reach the store directly: they *record* the
//! chosen advance, and the driver performs it when the stream is next
//! polled. A step where the consumer records nothing gets a plain
//! [`step`](crate::Cursor::step) by default.
//!
//! One handle exists per session. Its identity is stable across steps;
//! only the physical cursor it fronts changes as the session advances.
//! Sessions never share state: two streams over the same source advance
//! independently.
//!
//! [`register`] extends a façade [`TrapChain`](crate::facade::TrapChain)
//! so that qualifying store objects advertise the cursor-stream entry
//! point under the [`CURSOR_STREAM`] member name.

mod driver;
pub use driver::{CursorExt, CursorStream, SourceExt};

mod session;
pub use session::{AdvanceError, StreamCursor};

mod traps;
pub use traps::{register, CURSOR_STREAM};
