//! Conflict detection and resolution between combo counterparts and the
//! standalone vegetarian picks.
//!
//! A conflict exists when the vegetarian dish bundled in the selected meat or
//! fish combo is also one of the two vegetarian picks: the same dish would be
//! served twice in one week.
//!
//! Resolution widens the candidate pool in a fixed order until two distinct
//! ids are found:
//!
//! | tier | candidates |
//! |------|------------|
//! | 1 `Excluding` | vegetarian pool minus both mains' counterparts |
//! | 2 `ReadmitSelection` | picks that are no counterpart, then tier 1 |
//! | 3 `FullPool` | the whole vegetarian pool (a conflict may remain) |
//!
//! Tiers 1 and 2 filter against the counterparts of *both* mains, not only the
//! ones already picked, so a replacement can never be the other combo's side.
//! Every tier ranks by tally (ties in pool order) and dedups by id. If the
//! whole pool has fewer than two distinct ids the run fails. A result that
//! still contains a counterpart is rejected under [`ConflictPolicy::Strict`]
//! and accepted with a warning under `Lenient`.

use std::collections::BTreeSet;

use mp_core::determinism::dedup_by_id;
use mp_core::{CandidateOption, Category, ConflictPolicy, OptionId};

use crate::catalog::CatalogIndex;
use crate::select::select_top_distinct;
use crate::tally::VoteTally;
use crate::ResolveError;

/// Counterparts of the selected mains, and which of them were picked.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConflictReport {
    /// Counterpart ids found in the vegetarian picks.
    pub conflicting: BTreeSet<OptionId>,
    /// Counterpart ids of the meat and fish picks, picked or not.
    pub excluded: BTreeSet<OptionId>,
}

impl ConflictReport {
    #[inline]
    pub fn has_conflict(&self) -> bool {
        !self.conflicting.is_empty()
    }

    /// True when `id` is a counterpart of either selected main.
    #[inline]
    pub fn is_excluded(&self, id: &OptionId) -> bool {
        self.excluded.contains(id)
    }
}

/// Which fallback produced the final vegetarian pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResolutionTier {
    /// No conflict; the provisional picks stand.
    None,
    Excluding,
    ReadmitSelection,
    FullPool,
}

impl ResolutionTier {
    pub fn as_str(self) -> &'static str {
        match self {
            ResolutionTier::None => "none",
            ResolutionTier::Excluding => "excluding",
            ResolutionTier::ReadmitSelection => "readmit_selection",
            ResolutionTier::FullPool => "full_pool",
        }
    }
}

/// Outcome of [`resolve`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Resolved {
    pub vegetarian: [CandidateOption; 2],
    pub tier: ResolutionTier,
    /// Counterpart ids still present in `vegetarian` (lenient only).
    pub residual: BTreeSet<OptionId>,
}

/// Check the meat and fish picks independently for a counterpart among `veg`.
pub fn detect_conflicts(
    index: &CatalogIndex,
    meat: &CandidateOption,
    fish: &CandidateOption,
    veg: &[CandidateOption],
) -> ConflictReport {
    let excluded: BTreeSet<OptionId> = [meat, fish]
        .into_iter()
        .filter_map(|main| index.vegetarian_counterpart(&main.id))
        .map(|side| side.id.clone())
        .collect();
    let conflicting = veg.iter().filter(|v| excluded.contains(&v.id)).map(|v| v.id.clone()).collect();
    ConflictReport { conflicting, excluded }
}

fn into_pair(mut xs: Vec<CandidateOption>) -> Option<[CandidateOption; 2]> {
    if xs.len() < 2 {
        return None;
    }
    xs.truncate(2);
    <[CandidateOption; 2]>::try_from(xs).ok()
}

fn distinct_count(pool: &[CandidateOption]) -> usize {
    pool.iter().map(|o| &o.id).collect::<BTreeSet<_>>().len()
}

/// Produce two distinct vegetarian options free of `report`'s conflicts.
///
/// `pool` is the full (deduplicated) vegetarian option list; `selection` is the
/// provisional top-2.
pub fn resolve(
    pool: &[CandidateOption],
    tally: &VoteTally,
    report: &ConflictReport,
    selection: &[CandidateOption],
    policy: ConflictPolicy,
) -> Result<Resolved, ResolveError> {
    let n = Category::Vegetarian.slots();

    if !report.has_conflict() {
        let picks = dedup_by_id(selection.to_vec());
        return match into_pair(picks) {
            Some(vegetarian) => Ok(Resolved {
                vegetarian,
                tier: ResolutionTier::None,
                residual: BTreeSet::new(),
            }),
            None => Err(shortfall(pool, report)),
        };
    }

    // Tier 1
    let allowed: Vec<CandidateOption> =
        pool.iter().filter(|o| !report.is_excluded(&o.id)).cloned().collect();
    let picked = match into_pair(select_top_distinct(&allowed, tally, n)) {
        Some(pair) => Some((pair, ResolutionTier::Excluding)),
        None => {
            // Tier 2
            let mut widened: Vec<CandidateOption> =
                selection.iter().filter(|o| !report.is_excluded(&o.id)).cloned().collect();
            widened.extend(allowed);
            into_pair(select_top_distinct(&widened, tally, n)).map(|pair| (pair, ResolutionTier::ReadmitSelection))
        }
    };

    // Tier 3
    let (vegetarian, tier) = match picked {
        Some(found) => found,
        None => match into_pair(select_top_distinct(pool, tally, n)) {
            Some(pair) => (pair, ResolutionTier::FullPool),
            None => return Err(shortfall(pool, report)),
        },
    };
    let residual: BTreeSet<OptionId> = vegetarian
        .iter()
        .filter(|o| report.is_excluded(&o.id))
        .map(|o| o.id.clone())
        .collect();

    if !residual.is_empty() {
        match policy {
            ConflictPolicy::Strict => {
                return Err(ResolveError::UnresolvableConflict {
                    conflicting: residual.into_iter().collect(),
                    available: distinct_count(pool),
                });
            }
            ConflictPolicy::Lenient => {
                tracing::warn!(
                    residual = ?residual.iter().map(OptionId::as_str).collect::<Vec<_>>(),
                    "accepting vegetarian pair that repeats a combo side"
                );
            }
        }
    }
    Ok(Resolved { vegetarian, tier, residual })
}

/// Failure when the pool cannot yield two distinct ids at all.
fn shortfall(pool: &[CandidateOption], report: &ConflictReport) -> ResolveError {
    let clean = pool.iter().filter(|o| !report.is_excluded(&o.id)).count();
    if clean == 0 {
        ResolveError::NoCandidate { category: Category::Vegetarian }
    } else {
        ResolveError::UnresolvableConflict {
            conflicting: report.conflicting.iter().cloned().collect(),
            available: distinct_count(pool),
        }
    }
}
