//! Pair identity and the checked-pairs ledger.

use std::collections::HashSet;

/// How two requirement texts are combined into a dedup key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DedupPolicy {
    /// Texts kept in the order first seen: `(A, B)` and `(B, A)` are distinct.
    #[default]
    Ordered,
    /// Texts sorted lexicographically: `(A, B)` and `(B, A)` share a key.
    Symmetric,
}

/// Identity of an evaluated pair.
///
/// Texts are compared byte for byte. No trimming or case folding.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PairKey {
    first: String,
    second: String,
}

impl PairKey {
    pub fn new(a: &str, b: &str, policy: DedupPolicy) -> Self {
        let (first, second) = match policy {
            DedupPolicy::Symmetric if b < a => (b, a),
            _ => (a, b),
        };
        Self {
            first: first.to_string(),
            second: second.to_string(),
        }
    }

    pub fn first(&self) -> &str {
        &self.first
    }

    pub fn second(&self) -> &str {
        &self.second
    }
}

/// Ledger of pairs already sent for inference in the current run.
#[derive(Debug, Clone, Default)]
pub struct CheckedPairs {
    policy: DedupPolicy,
    seen: HashSet<PairKey>,
}

impl CheckedPairs {
    pub fn new(policy: DedupPolicy) -> Self {
        Self {
            policy,
            seen: HashSet::new(),
        }
    }

    pub fn policy(&self) -> DedupPolicy {
        self.policy
    }

    pub fn contains(&self, a: &str, b: &str) -> bool {
        self.seen.contains(&PairKey::new(a, b, self.policy))
    }

    /// Record a pair. Returns `false` if it was already present.
    pub fn mark(&mut self, a: &str, b: &str) -> bool {
        self.seen.insert(PairKey::new(a, b, self.policy))
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
