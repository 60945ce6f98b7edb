//! crates/mp_pipeline/src/resolve_week.rs
//! SELECT + RESOLVE stages: provisional top picks, then conflict resolution
//! for the vegetarian pair. Every stage leaves its trace in the
//! [`ResolutionAudit`], including on failure.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use mp_algo::{detect_conflicts, pick, resolve, CatalogIndex, ResolveError, VoteTally};
use mp_core::{CandidateOption, ConflictPolicy, OptionId, OptionSet};

/// Final picks, ready for assembly.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WeekPicks {
    pub meat: CandidateOption,
    pub fish: CandidateOption,
    pub vegetarian: [CandidateOption; 2],
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvisionalPicks {
    pub meat: String,
    pub fish: String,
    pub vegetarian: Vec<String>,
}

/// How a run arrived at its plan (or where it stopped).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionAudit {
    pub policy: ConflictPolicy,
    pub ballot_count: u64,
    /// Non-zero counts, keyed by option id.
    pub tally: BTreeMap<String, u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provisional: Option<ProvisionalPicks>,
    pub conflicts: Vec<String>,
    /// `none` | `excluding` | `readmit_selection` | `full_pool`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tier: Option<String>,
    /// Counterparts left in the final pair (lenient policy only).
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub residual_conflicts: Vec<String>,
}

impl ResolutionAudit {
    pub fn new(policy: ConflictPolicy) -> Self {
        Self { policy, ..Self::default() }
    }

    pub fn record_tally(&mut self, tally: &VoteTally) {
        self.ballot_count = tally.ballots();
        self.tally = tally.iter().map(|(id, n)| (id.to_string(), n)).collect();
    }
}

fn ids<'a>(xs: impl IntoIterator<Item = &'a OptionId>) -> Vec<String> {
    xs.into_iter().map(OptionId::to_string).collect()
}

/// Pick and de-conflict the week.
pub fn resolve_week(
    index: &CatalogIndex,
    options: &OptionSet,
    tally: &VoteTally,
    policy: ConflictPolicy,
    audit: &mut ResolutionAudit,
) -> Result<WeekPicks, ResolveError> {
    let selection = pick(options, tally)?;
    audit.provisional = Some(ProvisionalPicks {
        meat: selection.meat.id.to_string(),
        fish: selection.fish.id.to_string(),
        vegetarian: ids(selection.vegetarian.iter().map(|o| &o.id)),
    });

    let report = detect_conflicts(index, &selection.meat, &selection.fish, &selection.vegetarian);
    audit.conflicts = ids(&report.conflicting);
    if report.has_conflict() {
        tracing::debug!(conflicts = ?audit.conflicts, "combo side picked as a vegetarian day");
    }

    let resolved = resolve(options.vegetarian(), tally, &report, &selection.vegetarian, policy)?;
    audit.tier = Some(resolved.tier.as_str().to_string());
    audit.residual_conflicts = ids(&resolved.residual);

    Ok(WeekPicks { meat: selection.meat, fish: selection.fish, vegetarian: resolved.vegetarian })
}

#[cfg(test)]
mod tests {
    use super::*;
    use mp_algo::tally;
    use mp_core::{Ballot, Catalog, Category, Combo, Dish};

    fn oid(s: &str) -> OptionId {
        s.parse().unwrap()
    }

    fn opt(id: &str) -> CandidateOption {
        CandidateOption::new(oid(id), id)
    }

    fn index() -> CatalogIndex {
        let d = |id: &str, c| Dish { id: oid(id), name: id.into(), category: c, vegan: false };
        CatalogIndex::build(&Catalog {
            dishes: vec![d("curry", Category::Vegetarian), d("rice_bowl", Category::Vegetarian)],
            combos: vec![
                Combo {
                    id: oid("burger_combo"),
                    name: "burger_combo".into(),
                    constituent_dishes: vec![d("burger", Category::Meat), d("side_salad", Category::Vegetarian)],
                },
                Combo {
                    id: oid("cod_combo"),
                    name: "cod_combo".into(),
                    constituent_dishes: vec![d("cod", Category::Fish)],
                },
            ],
        })
        .unwrap()
    }

    fn vote(veg: [&str; 2]) -> Ballot {
        Ballot {
            guest_name: format!("{}-{}", veg[0], veg[1]),
            meat_option_id: Some(oid("burger_combo")),
            fish_option_id: Some(oid("cod_combo")),
            vegetarian_option_ids: vec![oid(veg[0]), oid(veg[1])],
        }
    }

    #[test]
    fn audit_records_every_stage() {
        let options = OptionSet::new(
            vec![opt("burger_combo")],
            vec![opt("cod_combo")],
            vec![opt("side_salad"), opt("curry"), opt("rice_bowl")],
        );
        let t = tally(&[vote(["side_salad", "curry"]), vote(["side_salad", "curry"])]);
        let mut audit = ResolutionAudit::new(ConflictPolicy::Strict);
        audit.record_tally(&t);

        let week = resolve_week(&index(), &options, &t, ConflictPolicy::Strict, &mut audit).unwrap();
        let names: Vec<&str> = week.vegetarian.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(names, vec!["curry", "rice_bowl"]);

        assert_eq!(audit.ballot_count, 2);
        assert_eq!(audit.tally.get("side_salad"), Some(&2));
        assert_eq!(
            audit.provisional.as_ref().map(|p| p.vegetarian.clone()),
            Some(vec!["side_salad".to_string(), "curry".to_string()])
        );
        assert_eq!(audit.conflicts, vec!["side_salad".to_string()]);
        assert_eq!(audit.tier.as_deref(), Some("excluding"));
        assert!(audit.residual_conflicts.is_empty());
    }

    #[test]
    fn failure_keeps_partial_audit() {
        let options = OptionSet::new(vec![opt("burger_combo")], vec![opt("cod_combo")], vec![opt("side_salad")]);
        let t = tally(&[]);
        let mut audit = ResolutionAudit::new(ConflictPolicy::Strict);
        let err = resolve_week(&index(), &options, &t, ConflictPolicy::Strict, &mut audit).unwrap_err();
        assert_eq!(err, ResolveError::NoCandidate { category: Category::Vegetarian });
        assert!(audit.provisional.is_some());
        assert_eq!(audit.conflicts, vec!["side_salad".to_string()]);
        assert_eq!(audit.tier, None);
    }
}
