//! Capability registration for the cursor-stream entry point.

use crate::facade::{Classify, Member, MemberTraps, TrapChain};

/// Well-known member name under which the cursor-stream entry point is
/// advertised.
pub const CURSOR_STREAM: &str = "cursor_stream";

/// Layer advertising [`CURSOR_STREAM`] on every classified target.
///
/// Stores, secondary ordering views, and cursors all qualify; anything
/// the [`Classify`] predicate rejects is deferred to older layers, as is
/// every other member name.
struct CursorStreamTraps;

impl MemberTraps for CursorStreamTraps {
    fn get(&self, target: &dyn Classify, member: &str) -> Option<Member> {
        (member == CURSOR_STREAM && target.classify().is_some()).then_some(Member::CursorStream)
    }
}

/// Install the cursor-stream entry point on a façade chain.
///
/// Appends a layer; members resolved by previously registered layers keep
/// resolving as before.
pub fn register(chain: &mut TrapChain) {
    chain.add_traps(CursorStreamTraps);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facade::TargetKind;

    struct Target(Option<TargetKind>);

    impl Classify for Target {
        fn classify(&self) -> Option<TargetKind> {
            self.0
        }
    }

    /// Stand-in for the façade's own resolution layer.
    struct Base;

    impl MemberTraps for Base {
        fn get(&self, _target: &dyn Classify, member: &str) -> Option<Member> {
            (member == "open_cursor").then_some(Member::Native)
        }
    }

    #[test]
    fn entry_point_is_advertised_for_every_target_kind() {
        let mut chain = TrapChain::new();
        register(&mut chain);

        for kind in [TargetKind::Store, TargetKind::Index, TargetKind::Cursor] {
            let target = Target(Some(kind));
            assert_eq!(chain.get(&target, CURSOR_STREAM), Some(Member::CursorStream));
            assert!(chain.has(&target, CURSOR_STREAM));
        }
    }

    #[test]
    fn unclassified_targets_are_left_alone() {
        let mut chain = TrapChain::new();
        register(&mut chain);

        let target = Target(None);
        assert_eq!(chain.get(&target, CURSOR_STREAM), None);
        assert!(!chain.has(&target, CURSOR_STREAM));
    }

    #[test]
    fn registration_extends_rather_than_replaces() {
        let mut chain = TrapChain::new();
        chain.add_traps(Base);
        register(&mut chain);

        let store = Target(Some(TargetKind::Store));
        assert_eq!(chain.get(&store, "open_cursor"), Some(Member::Native));
        assert_eq!(chain.get(&store, CURSOR_STREAM), Some(Member::CursorStream));
        assert_eq!(chain.get(&store, "delete"), None);
    }
}
