//! Determinism utilities: stable ranking and identity deduplication.
//!
//! I/O-free. Every ordering the engine relies on goes through here so that
//! equal inputs always produce equal outputs:
//! - rank by count descending, ties in input order (stable sort)
//! - dedup by id, first occurrence wins

use core::cmp::Ordering;
use std::collections::BTreeSet;

use crate::entities::CandidateOption;
use crate::ids::OptionId;

/* -------------------------------------------------------------------------- */
/*                                  Ranking                                   */
/* -------------------------------------------------------------------------- */

/// Compare two counts so that larger sorts first.
#[inline]
pub fn cmp_count_desc(a: u64, b: u64) -> Ordering {
    b.cmp(&a)
}

/// Stable copy of `xs` ordered by `count(x)` descending.
///
/// `slice::sort_by` is stable, so equal counts keep their input order. Callers
/// rely on this for the tie-break.
pub fn rank_by_count<T, F>(xs: &[T], mut count: F) -> Vec<T>
where
    T: Clone,
    F: FnMut(&T) -> u64,
{
    let mut keyed: Vec<(u64, T)> = xs.iter().map(|x| (count(x), x.clone())).collect();
    keyed.sort_by(|a, b| cmp_count_desc(a.0, b.0));
    keyed.into_iter().map(|(_, x)| x).collect()
}

/* -------------------------------------------------------------------------- */
/*                                   Dedup                                    */
/* -------------------------------------------------------------------------- */

/// Something with an option identity.
pub trait HasOptionId {
    fn option_id(&self) -> &OptionId;
}

impl HasOptionId for CandidateOption {
    #[inline]
    fn option_id(&self) -> &OptionId {
        &self.id
    }
}

impl HasOptionId for OptionId {
    #[inline]
    fn option_id(&self) -> &OptionId {
        self
    }
}

/// Remove later entries whose id was already seen. Order is otherwise preserved.
pub fn dedup_by_id<T: HasOptionId>(xs: Vec<T>) -> Vec<T> {
    let mut seen: BTreeSet<OptionId> = BTreeSet::new();
    xs.into_iter()
        .filter(|x| seen.insert(x.option_id().clone()))
        .collect()
}

/// True when no id repeats.
pub fn all_distinct<'a, I>(ids: I) -> bool
where
    I: IntoIterator<Item = &'a OptionId>,
{
    let mut seen = BTreeSet::new();
    ids.into_iter().all(|id| seen.insert(id))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn o(id: &str) -> CandidateOption {
        CandidateOption::new(id.parse().unwrap(), id)
    }

    #[test]
    fn rank_is_stable_on_ties() {
        let xs = vec![o("side_salad"), o("curry"), o("rice_bowl"), o("soup")];
        let counts = |x: &CandidateOption| match x.id.as_str() {
            "side_salad" | "curry" => 2,
            "soup" => 5,
            _ => 0,
        };
        let ranked: Vec<String> = rank_by_count(&xs, counts).into_iter().map(|x| x.name).collect();
        assert_eq!(ranked, vec!["soup", "side_salad", "curry", "rice_bowl"]);
    }

    #[test]
    fn dedup_keeps_first() {
        let xs = vec![o("a"), o("b"), o("a"), o("c"), o("b")];
        let ids: Vec<String> = dedup_by_id(xs).into_iter().map(|x| x.name).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn distinct_check() {
        let a: OptionId = "a".parse().unwrap();
        let b: OptionId = "b".parse().unwrap();
        assert!(all_distinct([&a, &b]));
        assert!(!all_distinct([&a, &b, &a]));
        assert!(all_distinct(std::iter::empty::<&OptionId>()));
    }
}
