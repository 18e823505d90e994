//! Registry of notification targets
//!
//! Targets are added on first contact and never removed. The registry is a
//! cheap cloneable handle; the chat front end inserts while the notifier reads
//! snapshots, both behind the same lock.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// Opaque subscriber identifier (a chat id for the Telegram front end)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TargetId(pub i64);

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Default)]
struct RegistryState {
    order: Vec<TargetId>,
    seen: HashSet<TargetId>,
}

#[derive(Debug, Clone, Default)]
pub struct TargetRegistry {
    state: Arc<RwLock<RegistryState>>,
}

impl TargetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` only the first time a target is seen
    pub fn register(&self, target: TargetId) -> bool {
        let mut state = self.state.write();
        if !state.seen.insert(target) {
            return false;
        }
        state.order.push(target);
        true
    }

    pub fn contains(&self, target: TargetId) -> bool {
        self.state.read().seen.contains(&target)
    }

    /// Targets in registration order
    pub fn snapshot(&self) -> Vec<TargetId> {
        self.state.read().order.clone()
    }

    pub fn len(&self) -> usize {
        self.state.read().order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registers_once_per_target() {
        let registry = TargetRegistry::new();
        assert!(registry.register(TargetId(7)));
        assert!(!registry.register(TargetId(7)));
        assert!(registry.register(TargetId(-100200)));
        assert_eq!(registry.len(), 2);
        assert!(registry.contains(TargetId(-100200)));
        assert!(!registry.contains(TargetId(8)));
    }

    #[test]
    fn snapshot_keeps_first_contact_order() {
        let registry = TargetRegistry::new();
        for id in [3, 1, 3, 2, 1] {
            registry.register(TargetId(id));
        }
        assert_eq!(
            registry.snapshot(),
            vec![TargetId(3), TargetId(1), TargetId(2)]
        );
    }

    #[test]
    fn clones_share_state() {
        let registry = TargetRegistry::new();
        let handle = registry.clone();
        handle.register(TargetId(42));
        assert!(registry.contains(TargetId(42)));
        assert!(!registry.is_empty());
    }

    #[test]
    fn concurrent_inserts_deduplicate() {
        let registry = TargetRegistry::new();
        let threads: Vec<_> = (0..8)
            .map(|_| {
                let registry = registry.clone();
                std::thread::spawn(move || {
                    (0..100)
                        .filter(|id| registry.register(TargetId(*id)))
                        .count()
                })
            })
            .collect();

        let inserted: usize = threads.into_iter().map(|t| t.join().unwrap()).sum();
        assert_eq!(inserted, 100);
        assert_eq!(registry.len(), 100);
    }
}
