//! crates/mp_pipeline/src/build_plan.rs
//! ASSEMBLE stage for both paths.
//!
//! The automatic path hands over resolved [`WeekPicks`]. The manual path takes
//! four operator-chosen ids, checks each against its weekday's category, then
//! goes through the same uniqueness gate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use mp_algo::{assemble, ResolveError};
use mp_core::{CandidateOption, Category, OptionId, OptionSet, WeeklyPlan};

use crate::resolve_week::WeekPicks;
use crate::validate::{EntityRef, ValidationIssue, ValidationReport};
use crate::PipelineError;

pub fn build_plan(picks: &WeekPicks, generated_at: DateTime<Utc>) -> Result<WeeklyPlan, ResolveError> {
    assemble(&picks.meat, &picks.fish, &picks.vegetarian, generated_at)
}

/// Operator's choice for Monday..Thursday.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManualSelection {
    pub monday: OptionId,
    pub tuesday: OptionId,
    pub wednesday: OptionId,
    pub thursday: OptionId,
}

impl ManualSelection {
    fn slots(&self) -> [(&'static str, Category, &OptionId); 4] {
        [
            ("monday", Category::Meat, &self.monday),
            ("tuesday", Category::Fish, &self.tuesday),
            ("wednesday", Category::Vegetarian, &self.wednesday),
            ("thursday", Category::Vegetarian, &self.thursday),
        ]
    }
}

/// Each slot must name an option offered this week in that slot's category.
pub fn check_manual(options: &OptionSet, sel: &ManualSelection) -> ValidationReport {
    let issues = sel
        .slots()
        .into_iter()
        .filter(|(_, c, id)| options.find(*c, id).is_none())
        .map(|(day, c, id)| {
            ValidationIssue::error(
                "manual.not_offered",
                EntityRef::Field(day),
                format!("{id} is not one of this week's {c} options"),
            )
        })
        .collect();
    ValidationReport::from_issues(issues)
}

/// Category check, then the four-distinct-ids check.
pub fn build_manual_plan(
    options: &OptionSet,
    sel: &ManualSelection,
    generated_at: DateTime<Utc>,
) -> Result<WeeklyPlan, PipelineError> {
    let report = check_manual(options, sel);
    if !report.pass {
        return Err(PipelineError::Validate(report));
    }

    let mut picked: Vec<CandidateOption> = Vec::with_capacity(4);
    for (_, c, id) in sel.slots() {
        if let Some(o) = options.find(c, id) {
            picked.push(o.clone());
        }
    }
    let [meat, fish, wed, thu]: [CandidateOption; 4] = picked
        .try_into()
        .map_err(|_| PipelineError::Build("manual selection lost a slot".into()))?;

    let plan = assemble(&meat, &fish, &[wed, thu], generated_at)?;
    tracing::info!(monday = %sel.monday, tuesday = %sel.tuesday, "manual plan assembled");
    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn oid(s: &str) -> OptionId {
        s.parse().unwrap()
    }

    fn opt(id: &str, name: &str) -> CandidateOption {
        CandidateOption::new(oid(id), name)
    }

    fn options() -> OptionSet {
        OptionSet::new(
            vec![opt("burger_combo", "Burger Combo")],
            vec![opt("cod_combo", "Cod Combo")],
            vec![opt("curry", "Curry"), opt("rice_bowl", "Rice Bowl")],
        )
    }

    fn sel(mon: &str, tue: &str, wed: &str, thu: &str) -> ManualSelection {
        ManualSelection { monday: oid(mon), tuesday: oid(tue), wednesday: oid(wed), thursday: oid(thu) }
    }

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 3, 9, 0, 0).unwrap()
    }

    #[test]
    fn manual_plan_uses_option_names() {
        let plan = build_manual_plan(&options(), &sel("burger_combo", "cod_combo", "rice_bowl", "curry"), at())
            .unwrap();
        assert_eq!(plan.monday.as_deref(), Some("Burger Combo"));
        assert_eq!(plan.wednesday.as_deref(), Some("Rice Bowl"));
        assert_eq!(plan.thursday.as_deref(), Some("Curry"));
        assert_eq!(plan.friday, None);
        assert_eq!(plan.generated_at, Some(at()));
    }

    #[test]
    fn wrong_category_is_a_validation_error() {
        let err = build_manual_plan(&options(), &sel("cod_combo", "cod_combo", "curry", "burger_combo"), at())
            .unwrap_err();
        match err {
            PipelineError::Validate(r) => {
                let where_: Vec<String> = r.issues.iter().map(|i| i.where_.to_string()).collect();
                assert_eq!(where_, vec!["monday", "thursday"]);
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn repeated_vegetarian_is_non_unique() {
        let err = build_manual_plan(&options(), &sel("burger_combo", "cod_combo", "curry", "curry"), at())
            .unwrap_err();
        assert_eq!(err.code(), "non_unique_plan");
    }
}
