//! Structural equality between nodes of two independently decoded
//! containers.
//!
//! Type graphs contain cycles (a struct holding a pointer to itself), so
//! the walk keeps two pieces of state keyed by the `(left id, right id)`
//! pair:
//!
//! - the in-flight set: pairs currently on the recursion stack. Meeting one
//!   again means we are inside a cycle and the pair is assumed equal; a real
//!   mismatch elsewhere on the cycle is still found by the outer walk.
//! - the [`CompareCache`]: finished verdicts. It is meant to be shared by
//!   every comparison between the same two containers, and must never be
//!   reused for a different pair of containers.
//!
//! The in-flight check happens before descending into children, which is
//! what bounds the recursion on cyclic input.
//!
//! Verdicts reached while a pair was assumed equal are cached as final.
//! A pair first entered through a cycle can therefore keep a `true` verdict
//! even when the outer walk later finds a mismatch on that cycle: with
//! `struct node { node *next; int v; }` on one side and `double v` on the
//! other, comparing `node` first caches `node * == node *` as equal, and a
//! later variable of type `node *` then reports no change.

use std::collections::{HashMap, HashSet};

use tracing::trace;

use crate::config::CompareOptions;
use crate::types::{Member, TypeData, TypeId, TypeRef};

type PairKey = (TypeId, TypeId);

/// Memoized comparison verdicts for one pair of containers.
#[derive(Debug, Default)]
pub struct CompareCache {
    results: HashMap<PairKey, bool>,
    evaluations: usize,
}

impl CompareCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Cached verdict for a pair of IDs, if one has been computed.
    pub fn get(&self, left: TypeId, right: TypeId) -> Option<bool> {
        self.results.get(&(left, right)).copied()
    }

    /// Number of times a kind-specific comparison actually ran.
    pub fn evaluations(&self) -> usize {
        self.evaluations
    }
}

/// Compare two nodes for shape equality.
///
/// `left` and `right` may (and usually do) belong to different containers.
pub fn compare(
    left: TypeRef<'_>,
    right: TypeRef<'_>,
    options: &CompareOptions,
    cache: &mut CompareCache,
) -> bool {
    let mut walk = Walk { options, cache, in_flight: HashSet::new() };
    walk.nodes(left, right)
}

/// Compare two lists of nodes pairwise; lengths must match.
pub fn compare_all(
    left: &[TypeRef<'_>],
    right: &[TypeRef<'_>],
    options: &CompareOptions,
    cache: &mut CompareCache,
) -> bool {
    left.len() == right.len()
        && left.iter().zip(right).all(|(l, r)| compare(*l, *r, options, cache))
}

struct Walk<'w> {
    options: &'w CompareOptions,
    cache: &'w mut CompareCache,
    in_flight: HashSet<PairKey>,
}

impl Walk<'_> {
    fn nodes(&mut self, left: TypeRef<'_>, right: TypeRef<'_>) -> bool {
        let (Some(left), Some(right)) = (self.skip_ignored(left), self.skip_ignored(right)) else {
            return false;
        };

        if left.kind() != right.kind() {
            return false;
        }

        let key = (left.id(), right.id());
        if self.in_flight.contains(&key) {
            trace!(left = key.0, right = key.1, "cycle detected, assuming equal");
            return true;
        }
        if let Some(verdict) = self.cache.get(key.0, key.1) {
            return verdict;
        }

        self.in_flight.insert(key);
        self.cache.evaluations += 1;
        let verdict = self.data(left, right);
        self.in_flight.remove(&key);
        self.cache.results.insert(key, verdict);

        verdict
    }

    /// Resolve two child IDs, each in its own parent's container.
    fn child(
        &mut self,
        left_parent: TypeRef<'_>,
        right_parent: TypeRef<'_>,
        left_id: TypeId,
        right_id: TypeId,
    ) -> bool {
        match (left_parent.child(left_id), right_parent.child(right_id)) {
            (Some(left), Some(right)) => self.nodes(left, right),
            _ => {
                trace!(left_id, right_id, "unresolved child reference");
                false
            }
        }
    }

    /// Follow ignored qualifiers down to the first node that is compared.
    fn skip_ignored<'a>(&self, mut node: TypeRef<'a>) -> Option<TypeRef<'a>> {
        // A malformed qualifier chain can loop; it cannot be longer than
        // the container without doing so.
        for _ in 0..=node.container().len() {
            if !self.options.is_ignored(node.kind()) {
                return Some(node);
            }
            node = node.child(node.data().qualified()?)?;
        }
        None
    }

    fn data(&mut self, left: TypeRef<'_>, right: TypeRef<'_>) -> bool {
        match (left.data(), right.data()) {
            (TypeData::VaArg, TypeData::VaArg) => true,
            (TypeData::Integer(l), TypeData::Integer(r))
            | (TypeData::Float(l), TypeData::Float(r)) => l == r,
            (
                TypeData::Array { contents: lc, index: li, count: ln },
                TypeData::Array { contents: rc, index: ri, count: rn },
            ) => {
                ln == rn && self.child(left, right, *li, *ri) && self.child(left, right, *lc, *rc)
            }
            (TypeData::Function { ret: lr, args: la }, TypeData::Function { ret: rr, args: ra }) => {
                la.len() == ra.len()
                    && self.child(left, right, *lr, *rr)
                    && la.iter().zip(ra).all(|(l, r)| self.child(left, right, *l, *r))
            }
            (
                TypeData::Struct { size: ls, members: lm },
                TypeData::Struct { size: rs, members: rm },
            )
            | (
                TypeData::Union { size: ls, members: lm },
                TypeData::Union { size: rs, members: rm },
            ) => {
                ls == rs && self.members(left, right, lm, rm)
            }
            (TypeData::Enum(l), TypeData::Enum(r)) => {
                l.len() == r.len()
                    && l.iter().zip(r).all(|(l, r)| l.name == r.name && l.value == r.value)
            }
            (TypeData::Forward(_), TypeData::Forward(_)) => left.name() == right.name(),
            (l, r) => match (l.qualified(), r.qualified()) {
                (Some(l_ref), Some(r_ref)) => self.child(left, right, l_ref, r_ref),
                // Unknown never compares equal, not even to itself.
                _ => false,
            },
        }
    }

    fn members(
        &mut self,
        left: TypeRef<'_>,
        right: TypeRef<'_>,
        left_members: &[Member],
        right_members: &[Member],
    ) -> bool {
        left_members.len() == right_members.len()
            && left_members.iter().zip(right_members).all(|(l, r)| {
                l.offset == r.offset && self.child(left, right, l.type_id, r.type_id)
            })
    }
}
