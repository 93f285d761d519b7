//! Bounded cache of already-seen messages.
//!
//! Maps a [`MessageIdentity`] to the last normalized text observed for it.
//! Eviction is strictly insertion-ordered: the bound protects the memory of
//! a long-running process, it does not track read recency. Overwriting an
//! existing entry (an edit) neither reorders it nor creates eviction
//! pressure.

use std::collections::{HashMap, VecDeque};

use tracing::trace;

use crate::identity::MessageIdentity;

/// Default capacity; roughly a day of very busy group-chat traffic.
pub const DEFAULT_CAPACITY: usize = 5000;

/// Insertion-order-bounded map of identity → last-known normalized text.
pub struct SeenSet {
    entries: HashMap<MessageIdentity, String>,
    order: VecDeque<MessageIdentity>,
    capacity: usize,
}

impl SeenSet {
    /// Create a seen-set holding at most `capacity` entries. A zero capacity
    /// is clamped to one; an unbounded or empty cache would defeat the point.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            order: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    /// Record `text` as the latest content for `key`.
    ///
    /// Existing keys are overwritten in place. New keys are appended to the
    /// eviction order, evicting the oldest insertion once the bound is
    /// exceeded.
    pub fn remember(&mut self, key: MessageIdentity, text: String) {
        if let Some(entry) = self.entries.get_mut(&key) {
            *entry = text;
            return;
        }

        self.entries.insert(key.clone(), text);
        self.order.push_back(key);

        while self.order.len() > self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                trace!("evicting {oldest} from seen-set");
                self.entries.remove(&oldest);
            }
        }
    }

    /// Last recorded text for `key`, if any.
    pub fn lookup(&self, key: &MessageIdentity) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn key(n: usize) -> MessageIdentity {
        MessageIdentity::Durable {
            source: "id".to_string(),
            value: format!("m{n}"),
        }
    }

    #[test]
    fn test_lookup_absent() {
        let set = SeenSet::new(10);
        assert_eq!(set.lookup(&key(1)), None);
    }

    #[test]
    fn test_remember_and_lookup() {
        let mut set = SeenSet::new(10);
        set.remember(key(1), "hello".to_string());
        assert_eq!(set.lookup(&key(1)), Some("hello"));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_overwrite_in_place() {
        let mut set = SeenSet::new(2);
        set.remember(key(1), "a".to_string());
        set.remember(key(2), "b".to_string());
        // Updating key 1 must not push it to the back of the eviction order.
        set.remember(key(1), "a2".to_string());
        set.remember(key(3), "c".to_string());

        assert_eq!(set.lookup(&key(1)), None, "oldest insertion evicted");
        assert_eq!(set.lookup(&key(2)), Some("b"));
        assert_eq!(set.lookup(&key(3)), Some("c"));
    }

    #[test]
    fn test_capacity_bound() {
        let capacity = 5;
        let mut set = SeenSet::new(capacity);
        for n in 0..=capacity {
            set.remember(key(n), format!("text {n}"));
        }
        assert_eq!(set.len(), capacity);
        assert_eq!(set.lookup(&key(0)), None, "first insertion evicted");
        for n in 1..=capacity {
            assert!(set.lookup(&key(n)).is_some());
        }
    }

    #[test]
    fn test_zero_capacity_clamped() {
        let mut set = SeenSet::new(0);
        assert_eq!(set.capacity(), 1);
        set.remember(key(1), "a".to_string());
        assert_eq!(set.lookup(&key(1)), Some("a"));
    }

    proptest! {
        #[test]
        fn prop_never_exceeds_capacity(
            capacity in 1usize..32,
            inserts in proptest::collection::vec(0usize..64, 0..128)
        ) {
            let mut set = SeenSet::new(capacity);
            for n in inserts {
                set.remember(key(n), format!("t{n}"));
                prop_assert!(set.len() <= capacity);
            }
        }
    }
}
