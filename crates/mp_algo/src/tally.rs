//! Vote tally: option id → number of ballots naming it.
//!
//! A ballot contributes at most 1 to any option, even when its own ids repeat
//! (a duplicated vegetarian pick, or the same id in two slots). Missing ids are
//! skipped. Ids nobody voted for are absent and read as 0.

use std::collections::BTreeMap;

use mp_core::{Ballot, OptionId};

/// Per-run counts. Built fresh from a ballot snapshot; never persisted.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VoteTally {
    counts: BTreeMap<OptionId, u64>,
    ballots: u64,
}

impl VoteTally {
    #[inline]
    pub fn count(&self, id: &OptionId) -> u64 {
        self.counts.get(id).copied().unwrap_or(0)
    }

    /// Number of ballots tallied (including ones that named nothing).
    #[inline]
    pub fn ballots(&self) -> u64 {
        self.ballots
    }

    /// Non-zero counts in id order.
    pub fn iter(&self) -> impl Iterator<Item = (&OptionId, u64)> {
        self.counts.iter().map(|(k, v)| (k, *v))
    }

    pub fn as_map(&self) -> &BTreeMap<OptionId, u64> {
        &self.counts
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    fn add_ballot(&mut self, b: &Ballot) {
        for id in b.named_ids() {
            *self.counts.entry(id.clone()).or_insert(0) += 1;
        }
        self.ballots += 1;
    }
}

/// Tally a ballot snapshot.
pub fn tally(ballots: &[Ballot]) -> VoteTally {
    let mut t = VoteTally::default();
    for b in ballots {
        t.add_ballot(b);
    }
    tracing::debug!(ballots = t.ballots, options = t.counts.len(), "tally complete");
    t
}

#[cfg(test)]
mod tests {
    use super::*;

    fn oid(s: &str) -> OptionId {
        s.parse().unwrap()
    }

    fn ballot(name: &str, meat: Option<&str>, fish: Option<&str>, veg: &[&str]) -> Ballot {
        Ballot {
            guest_name: name.into(),
            meat_option_id: meat.map(oid),
            fish_option_id: fish.map(oid),
            vegetarian_option_ids: veg.iter().map(|v| oid(v)).collect(),
        }
    }

    #[test]
    fn counts_each_slot_once() {
        let t = tally(&[
            ballot("a", Some("burger_combo"), Some("cod_combo"), &["curry", "side_salad"]),
            ballot("b", Some("burger_combo"), Some("cod_combo"), &["curry", "rice_bowl"]),
            ballot("c", Some("steak_combo"), Some("cod_combo"), &["side_salad", "rice_bowl"]),
        ]);
        assert_eq!(t.ballots(), 3);
        assert_eq!(t.count(&oid("burger_combo")), 2);
        assert_eq!(t.count(&oid("steak_combo")), 1);
        assert_eq!(t.count(&oid("cod_combo")), 3);
        assert_eq!(t.count(&oid("curry")), 2);
        assert_eq!(t.count(&oid("side_salad")), 2);
        assert_eq!(t.count(&oid("rice_bowl")), 2);
        assert_eq!(t.count(&oid("soup")), 0);
    }

    #[test]
    fn malformed_ballots_count_at_most_once() {
        let t = tally(&[
            ballot("dup", Some("m"), Some("f"), &["curry", "curry"]),
            ballot("empty", None, None, &[]),
        ]);
        assert_eq!(t.count(&oid("curry")), 1);
        assert_eq!(t.count(&oid("m")), 1);
        assert_eq!(t.ballots(), 2);
        assert_eq!(t.iter().count(), 3);
    }

    #[test]
    fn empty_snapshot() {
        let t = tally(&[]);
        assert!(t.is_empty());
        assert_eq!(t.ballots(), 0);
    }
}
