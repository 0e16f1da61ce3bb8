//! Desired-vs-existing set comparison.
//!
//! Pairwise scans over the resource's own equality function; no hashing,
//! since equality is multi-field and some fields are lists. Resource counts
//! are dozens, not thousands, so O(n*m) is fine and scale is a non-goal.

/// Outcome of comparing a desired collection against an existing one.
/// `extras` keep the existing collection's order, `missing` the desired one's.
#[derive(Debug, Clone, PartialEq)]
pub struct Delta<D, E> {
    /// Present remotely, absent from desired, and within pruning scope.
    pub extras: Vec<E>,
    /// Desired, absent remotely.
    pub missing: Vec<D>,
}

impl<D, E> Delta<D, E> {
    pub fn is_empty(&self) -> bool {
        self.extras.is_empty() && self.missing.is_empty()
    }
}

/// Pure function of its inputs; neither collection is mutated.
pub fn diff_sets<D, E>(
    desired: &[D],
    existing: &[E],
    same: impl Fn(&D, &E) -> bool,
    in_scope: impl Fn(&E) -> bool,
) -> Delta<D, E>
where
    D: Clone,
    E: Clone,
{
    let extras = existing
        .iter()
        .filter(|e| in_scope(e) && !desired.iter().any(|d| same(d, e)))
        .cloned()
        .collect();
    let missing = desired
        .iter()
        .filter(|d| !existing.iter().any(|e| same(d, e)))
        .cloned()
        .collect();
    Delta { extras, missing }
}

/// Elements present in both collections by identity key where the desired
/// side would change the existing one, paired as (existing, desired patch).
/// Output keeps the desired collection's order.
pub fn diff_updates<D, E>(
    desired: &[D],
    existing: &[E],
    same_key: impl Fn(&D, &E) -> bool,
    needs_update: impl Fn(&D, &E) -> bool,
) -> Vec<(E, D)>
where
    D: Clone,
    E: Clone,
{
    desired
        .iter()
        .filter_map(|d| {
            existing
                .iter()
                .find(|e| same_key(d, e))
                .filter(|e| needs_update(d, e))
                .map(|e| (e.clone(), d.clone()))
        })
        .collect()
}
