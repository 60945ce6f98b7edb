//! Plan assembly: four picks → Monday..Thursday, Friday left empty.
//!
//! The only gate both the automatic and the manual path go through.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use mp_core::{CandidateOption, OptionId, WeeklyPlan};

use crate::ResolveError;

/// Build the weekly plan, or fail if any id repeats.
///
/// meat → Monday, fish → Tuesday, `veg[0]` → Wednesday, `veg[1]` → Thursday.
pub fn assemble(
    meat: &CandidateOption,
    fish: &CandidateOption,
    veg: &[CandidateOption; 2],
    generated_at: DateTime<Utc>,
) -> Result<WeeklyPlan, ResolveError> {
    let week = [meat, fish, &veg[0], &veg[1]];

    let mut seen: BTreeSet<&OptionId> = BTreeSet::new();
    let mut repeated: BTreeSet<OptionId> = BTreeSet::new();
    for o in week {
        if !seen.insert(&o.id) {
            repeated.insert(o.id.clone());
        }
    }
    if !repeated.is_empty() {
        return Err(ResolveError::NonUniquePlan { ids: repeated.into_iter().collect() });
    }

    Ok(WeeklyPlan {
        monday: Some(meat.name.clone()),
        tuesday: Some(fish.name.clone()),
        wednesday: Some(veg[0].name.clone()),
        thursday: Some(veg[1].name.clone()),
        friday: None,
        generated_at: Some(generated_at),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn opt(id: &str, name: &str) -> CandidateOption {
        CandidateOption::new(id.parse().unwrap(), name)
    }

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 3, 9, 0, 0).unwrap()
    }

    #[test]
    fn maps_days_in_order() {
        let plan = assemble(
            &opt("burger_combo", "Burger Combo"),
            &opt("cod_combo", "Cod Combo"),
            &[opt("curry", "Curry"), opt("rice_bowl", "Rice Bowl")],
            at(),
        )
        .unwrap();
        assert_eq!(plan.monday.as_deref(), Some("Burger Combo"));
        assert_eq!(plan.tuesday.as_deref(), Some("Cod Combo"));
        assert_eq!(plan.wednesday.as_deref(), Some("Curry"));
        assert_eq!(plan.thursday.as_deref(), Some("Rice Bowl"));
        assert_eq!(plan.friday, None);
        assert_eq!(plan.generated_at, Some(at()));
    }

    #[test]
    fn repeated_id_is_rejected() {
        let curry = opt("curry", "Curry");
        let err = assemble(
            &opt("burger_combo", "Burger Combo"),
            &opt("cod_combo", "Cod Combo"),
            &[curry.clone(), curry],
            at(),
        )
        .unwrap_err();
        assert_eq!(err, ResolveError::NonUniquePlan { ids: vec!["curry".parse().unwrap()] });
    }

    #[test]
    fn same_name_different_id_is_allowed() {
        // Uniqueness is by id; names are display data.
        let plan = assemble(
            &opt("a", "Dish"),
            &opt("b", "Dish"),
            &[opt("c", "Dish"), opt("d", "Dish")],
            at(),
        );
        assert!(plan.is_ok());
    }
}
