//! Member-resolution façade shared with store bindings.
//!
//! Binding layers that expose store objects dynamically resolve their
//! members (operations, capabilities) through an ordered list of
//! interceptor layers rather than through a fixed table. Each layer
//! implements [`MemberTraps`]: a `get` hook resolving a member name on a
//! target, and a `has` hook answering membership checks. A [`TrapChain`]
//! holds the layers; registration appends, lookup consults the newest
//! layer first and falls through to older ones on a miss, so an extension
//! can add members without disturbing what previous layers resolve.
//!
//! Targets are classified, not downcast: the [`Classify`] predicate
//! reports whether an object is a store, a secondary ordering view, or a
//! cursor. Layers use the classification to decide which targets carry
//! their members. See [`stream::register`](crate::stream::register) for
//! the layer this crate installs.

use core::fmt;

/// Kind of store object a façade target is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    /// An ordered store.
    Store,
    /// A secondary ordering view over a store.
    Index,
    /// A cursor over either.
    Cursor,
}

/// Capability-detection predicate for façade targets.
///
/// Returns the target's kind, or `None` for objects that are not store
/// objects at all. Backends implement this for their store, view, and
/// cursor types.
#[auto_impl::auto_impl(&, Arc, Box)]
pub trait Classify {
    /// Classify this object, if it is a store object.
    fn classify(&self) -> Option<TargetKind>;
}

/// What a member lookup resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Member {
    /// The cursor-stream entry point provided by this crate.
    CursorStream,
    /// A member owned by the façade itself.
    Native,
}

/// One member-resolution layer.
///
/// `get` returns `None` to defer to older layers; `has` defaults to
/// "resolvable here".
pub trait MemberTraps: Send + Sync {
    /// Resolve `member` on `target`, or defer with `None`.
    fn get(&self, target: &dyn Classify, member: &str) -> Option<Member>;

    /// Whether this layer exposes `member` on `target`.
    fn has(&self, target: &dyn Classify, member: &str) -> bool {
        self.get(target, member).is_some()
    }
}

/// An ordered list of member-resolution layers.
///
/// Layers are appended with [`add_traps`](TrapChain::add_traps) and
/// consulted newest-first. A lookup misses only if every layer defers.
#[derive(Default)]
pub struct TrapChain {
    layers: Vec<Box<dyn MemberTraps>>,
}

impl TrapChain {
    /// Create an empty chain.
    pub const fn new() -> Self {
        Self { layers: Vec::new() }
    }

    /// Append a layer. The new layer shadows older ones for the members
    /// it resolves and defers to them for everything else.
    pub fn add_traps<T: MemberTraps + 'static>(&mut self, layer: T) {
        self.layers.push(Box::new(layer));
    }

    /// Resolve `member` on `target` through the chain.
    pub fn get(&self, target: &dyn Classify, member: &str) -> Option<Member> {
        self.layers.iter().rev().find_map(|layer| layer.get(target, member))
    }

    /// Whether any layer exposes `member` on `target`.
    pub fn has(&self, target: &dyn Classify, member: &str) -> bool {
        self.layers.iter().rev().any(|layer| layer.has(target, member))
    }

    /// Number of registered layers.
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// Whether the chain holds no layers.
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

impl fmt::Debug for TrapChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrapChain").field("layers", &self.layers.len()).finish()
    }
}
