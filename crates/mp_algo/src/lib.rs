// crates/mp_algo/src/lib.rs
//! Menu resolution engine.
//!
//! Pure functions over immutable snapshots: nothing here reads files, holds
//! shared state, or looks at the clock (the generation timestamp is passed in).
//!
//! Stage order, as driven by `mp_pipeline`:
//! 1. [`CatalogIndex::build`] once per catalog generation
//! 2. [`tally`] over the ballot snapshot
//! 3. [`select::pick`] top-1 meat, top-1 fish, top-2 vegetarian
//! 4. [`conflict::detect_conflicts`] + [`conflict::resolve`]
//! 5. [`assemble::assemble`] enforces the four-distinct-ids rule

#![forbid(unsafe_code)]

use core::fmt;

use mp_core::{Category, OptionId};

pub mod assemble;
pub mod catalog;
pub mod conflict;
pub mod select;
pub mod tally;

pub use assemble::assemble;
pub use catalog::{CatalogError, CatalogIndex, OptionKind};
pub use conflict::{detect_conflicts, resolve, ConflictReport, Resolved, ResolutionTier};
pub use select::{pick, select_top, Selection};
pub use tally::{tally, VoteTally};

// ----------------------------- Engine failures -----------------------------

/// Terminal failures of one resolution run. No partial plan is produced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResolveError {
    /// The category's option list is empty.
    NoCandidate { category: Category },
    /// Fewer ballots than the configured minimum.
    InsufficientVotes { required: u64, found: u64 },
    /// Fallback tiers could not yield two distinct conflict-free vegetarian ids.
    UnresolvableConflict {
        conflicting: Vec<OptionId>,
        available: usize,
    },
    /// The four weekday ids are not pairwise distinct. `ids` lists the repeats.
    NonUniquePlan { ids: Vec<OptionId> },
}

impl ResolveError {
    /// Stable machine code.
    pub fn code(&self) -> &'static str {
        match self {
            ResolveError::NoCandidate { .. } => "no_candidate",
            ResolveError::InsufficientVotes { .. } => "insufficient_votes",
            ResolveError::UnresolvableConflict { .. } => "unresolvable_conflict",
            ResolveError::NonUniquePlan { .. } => "non_unique_plan",
        }
    }
}

fn join_ids(ids: &[OptionId]) -> String {
    ids.iter().map(OptionId::as_str).collect::<Vec<_>>().join(", ")
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolveError::NoCandidate { category } => {
                write!(f, "no {category} options available for selection")
            }
            ResolveError::InsufficientVotes { required, found } => {
                write!(f, "at least {required} ballots required, found {found}")
            }
            ResolveError::UnresolvableConflict { conflicting, available } => {
                if conflicting.is_empty() {
                    write!(f, "need two distinct vegetarian options, only {available} available")
                } else {
                    write!(
                        f,
                        "cannot pick two vegetarian options without repeating a combo side ({}); {available} available",
                        join_ids(conflicting)
                    )
                }
            }
            ResolveError::NonUniquePlan { ids } => {
                write!(f, "the four weekday meals must be different (repeated: {})", join_ids(ids))
            }
        }
    }
}

impl std::error::Error for ResolveError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        let id: OptionId = "side_salad".parse().unwrap();
        let cases = [
            (ResolveError::NoCandidate { category: Category::Meat }, "no_candidate"),
            (ResolveError::InsufficientVotes { required: 3, found: 1 }, "insufficient_votes"),
            (
                ResolveError::UnresolvableConflict { conflicting: vec![id.clone()], available: 1 },
                "unresolvable_conflict",
            ),
            (ResolveError::NonUniquePlan { ids: vec![id] }, "non_unique_plan"),
        ];
        for (e, code) in cases {
            assert_eq!(e.code(), code);
            assert!(!e.to_string().is_empty());
        }
    }

    #[test]
    fn messages_name_the_problem() {
        let e = ResolveError::NoCandidate { category: Category::Fish };
        assert_eq!(e.to_string(), "no fish options available for selection");
        let e = ResolveError::NonUniquePlan { ids: vec!["curry".parse().unwrap()] };
        assert!(e.to_string().contains("curry"));
    }
}
