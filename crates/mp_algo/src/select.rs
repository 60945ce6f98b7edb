//! Popularity selection: top-n by tally, ties in option-list order.
//!
//! Knows nothing about combos or conflicts.

use mp_core::determinism::{dedup_by_id, rank_by_count};
use mp_core::{CandidateOption, Category, OptionSet};

use crate::tally::VoteTally;
use crate::ResolveError;

/// First `n` of `options` ranked by count descending. Stable: equal counts keep
/// input order. Empty input gives an empty result.
pub fn select_top(options: &[CandidateOption], tally: &VoteTally, n: usize) -> Vec<CandidateOption> {
    let mut ranked = rank_by_count(options, |o| tally.count(&o.id));
    ranked.truncate(n);
    ranked
}

/// Like [`select_top`] but skips repeated ids before taking `n`.
pub fn select_top_distinct(
    options: &[CandidateOption],
    tally: &VoteTally,
    n: usize,
) -> Vec<CandidateOption> {
    let mut ranked = dedup_by_id(rank_by_count(options, |o| tally.count(&o.id)));
    ranked.truncate(n);
    ranked
}

/// Provisional weekly picks, before conflict resolution.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Selection {
    pub meat: CandidateOption,
    pub fish: CandidateOption,
    /// Up to two; fewer only when the category has fewer options.
    pub vegetarian: Vec<CandidateOption>,
}

fn top1(options: &OptionSet, tally: &VoteTally, c: Category) -> Result<CandidateOption, ResolveError> {
    select_top(options.category(c), tally, 1)
        .into_iter()
        .next()
        .ok_or(ResolveError::NoCandidate { category: c })
}

/// Top-1 meat, top-1 fish, top-2 vegetarian.
pub fn pick(options: &OptionSet, tally: &VoteTally) -> Result<Selection, ResolveError> {
    let meat = top1(options, tally, Category::Meat)?;
    let fish = top1(options, tally, Category::Fish)?;
    let vegetarian = select_top_distinct(
        options.vegetarian(),
        tally,
        Category::Vegetarian.slots(),
    );
    if vegetarian.is_empty() {
        return Err(ResolveError::NoCandidate { category: Category::Vegetarian });
    }
    tracing::debug!(
        meat = %meat.id,
        fish = %fish.id,
        vegetarian = ?vegetarian.iter().map(|o| o.id.as_str()).collect::<Vec<_>>(),
        "provisional picks"
    );
    Ok(Selection { meat, fish, vegetarian })
}
