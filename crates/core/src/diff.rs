//! Symbol-level diff of two containers.
//!
//! Both containers keep their function and variable lists sorted by name,
//! so each list pair is merged with two cursors. A one-sided name is
//! reported only when its type resolves in its own container; matched
//! names are reported on both sides when their types differ.

use std::cmp::Ordering;

use serde::Serialize;
use tracing::debug;

use crate::compare::{compare, compare_all, CompareCache};
use crate::config::CompareOptions;
use crate::container::{Container, FunctionEntry, VariableEntry};
use crate::types::TypeRef;

/// Why an entry shows up in the diff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffReason {
    /// The name exists on this side only.
    Missing,
    /// The name exists on both sides with different type shapes.
    TypeMismatch,
}

/// One reported symbol together with its resolved type(s).
#[derive(Debug, Clone)]
pub struct DiffEntry<'a, T> {
    pub name: &'a str,
    pub types: T,
    pub slot: u32,
    pub reason: DiffReason,
}

/// A function entry: return type first, then parameters.
pub type FunctionDiff<'a> = DiffEntry<'a, Vec<TypeRef<'a>>>;
/// A variable entry.
pub type VariableDiff<'a> = DiffEntry<'a, TypeRef<'a>>;

/// Per-list counters. Their sum is the number of distinct names.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DiffSummary {
    pub left_only: usize,
    pub right_only: usize,
    pub changed: usize,
    pub unchanged: usize,
    /// Names left out of the report because no side's type resolved.
    pub suppressed: usize,
}

impl DiffSummary {
    pub fn total(&self) -> usize {
        self.left_only + self.right_only + self.changed + self.unchanged + self.suppressed
    }
}

/// Left-only and right-only entries for one symbol list.
#[derive(Debug, Clone)]
pub struct SectionDiff<'a, T> {
    pub left: Vec<DiffEntry<'a, T>>,
    pub right: Vec<DiffEntry<'a, T>>,
    pub summary: DiffSummary,
}

impl<T> Default for SectionDiff<'_, T> {
    fn default() -> Self {
        Self { left: Vec::new(), right: Vec::new(), summary: DiffSummary::default() }
    }
}

impl<T> SectionDiff<'_, T> {
    pub fn is_empty(&self) -> bool {
        self.left.is_empty() && self.right.is_empty()
    }
}

/// Result of diffing two containers.
#[derive(Debug, Clone)]
pub struct SymbolDiff<'a> {
    pub functions: SectionDiff<'a, Vec<TypeRef<'a>>>,
    pub variables: SectionDiff<'a, TypeRef<'a>>,
}

impl SymbolDiff<'_> {
    pub fn is_empty(&self) -> bool {
        self.functions.is_empty() && self.variables.is_empty()
    }
}

/// Diff functions then variables of `left` against `right` with a fresh cache.
pub fn diff_containers<'a>(
    left: &'a Container,
    right: &'a Container,
    options: &CompareOptions,
) -> SymbolDiff<'a> {
    let mut cache = CompareCache::new();
    diff_containers_with_cache(left, right, options, &mut cache)
}

/// Like [`diff_containers`] with a caller-owned cache.
///
/// The cache must only ever have been used with this same pair of
/// containers.
pub fn diff_containers_with_cache<'a>(
    left: &'a Container,
    right: &'a Container,
    options: &CompareOptions,
    cache: &mut CompareCache,
) -> SymbolDiff<'a> {
    let functions = diff_functions(left, right, options, cache);
    let variables = diff_variables(left, right, options, cache);

    debug!(
        functions = ?functions.summary,
        variables = ?variables.summary,
        cached_pairs = cache.len(),
        "diffed containers"
    );

    SymbolDiff { functions, variables }
}

pub fn diff_functions<'a>(
    left: &'a Container,
    right: &'a Container,
    options: &CompareOptions,
    cache: &mut CompareCache,
) -> SectionDiff<'a, Vec<TypeRef<'a>>> {
    merge_diff(
        left.functions(),
        right.functions(),
        |entry: &'a FunctionEntry| (entry.name.as_str(), entry.slot),
        |entry| resolve_all(left, entry),
        |entry| resolve_all(right, entry),
        |l, r| compare_all(l, r, options, cache),
    )
}

pub fn diff_variables<'a>(
    left: &'a Container,
    right: &'a Container,
    options: &CompareOptions,
    cache: &mut CompareCache,
) -> SectionDiff<'a, TypeRef<'a>> {
    merge_diff(
        left.variables(),
        right.variables(),
        |entry: &'a VariableEntry| (entry.name.as_str(), entry.slot),
        |entry| left.node(entry.type_id),
        |entry| right.node(entry.type_id),
        |l, r| compare(*l, *r, options, cache),
    )
}

fn resolve_all<'a>(container: &'a Container, entry: &FunctionEntry) -> Option<Vec<TypeRef<'a>>> {
    entry.type_ids.iter().map(|id| container.node(*id)).collect()
}

/// Two-cursor merge of two name-sorted lists.
fn merge_diff<'a, E, T>(
    lhs: &'a [E],
    rhs: &'a [E],
    key: impl Fn(&'a E) -> (&'a str, u32),
    resolve_left: impl Fn(&'a E) -> Option<T>,
    resolve_right: impl Fn(&'a E) -> Option<T>,
    mut equal: impl FnMut(&T, &T) -> bool,
) -> SectionDiff<'a, T> {
    let mut out = SectionDiff::default();
    let entry = |e: &'a E, types: T, reason: DiffReason| {
        let (name, slot) = key(e);
        DiffEntry { name, types, slot, reason }
    };

    let (mut l_idx, mut r_idx) = (0, 0);
    while l_idx < lhs.len() && r_idx < rhs.len() {
        let (l, r) = (&lhs[l_idx], &rhs[r_idx]);
        match key(l).0.cmp(key(r).0) {
            Ordering::Less => {
                push_one_sided(&mut out, true, l, resolve_left(l), &entry, &key);
                l_idx += 1;
            }
            Ordering::Greater => {
                push_one_sided(&mut out, false, r, resolve_right(r), &entry, &key);
                r_idx += 1;
            }
            Ordering::Equal => {
                let (l_types, r_types) = (resolve_left(l), resolve_right(r));
                let same = match (&l_types, &r_types) {
                    (Some(lt), Some(rt)) => equal(lt, rt),
                    _ => false,
                };

                if same {
                    out.summary.unchanged += 1;
                } else if l_types.is_none() && r_types.is_none() {
                    debug!(name = key(l).0, "dropping entry unresolvable on both sides");
                    out.summary.suppressed += 1;
                } else {
                    out.summary.changed += 1;
                    if let Some(types) = l_types {
                        out.left.push(entry(l, types, DiffReason::TypeMismatch));
                    }
                    if let Some(types) = r_types {
                        out.right.push(entry(r, types, DiffReason::TypeMismatch));
                    }
                }
                l_idx += 1;
                r_idx += 1;
            }
        }
    }

    for l in &lhs[l_idx..] {
        push_one_sided(&mut out, true, l, resolve_left(l), &entry, &key);
    }
    for r in &rhs[r_idx..] {
        push_one_sided(&mut out, false, r, resolve_right(r), &entry, &key);
    }

    out
}

fn push_one_sided<'a, E, T>(
    out: &mut SectionDiff<'a, T>,
    is_left: bool,
    e: &'a E,
    types: Option<T>,
    entry: &impl Fn(&'a E, T, DiffReason) -> DiffEntry<'a, T>,
    key: &impl Fn(&'a E) -> (&'a str, u32),
) {
    let Some(types) = types else {
        debug!(name = key(e).0, "dropping one-sided entry with unresolvable type");
        out.summary.suppressed += 1;
        return;
    };

    if is_left {
        out.summary.left_only += 1;
        out.left.push(entry(e, types, DiffReason::Missing));
    } else {
        out.summary.right_only += 1;
        out.right.push(entry(e, types, DiffReason::Missing));
    }
}
