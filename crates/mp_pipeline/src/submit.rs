//! crates/mp_pipeline/src/submit.rs
//! Guest ballot submission.
//!
//! A ballot is accepted only when it names exactly one offered meat option,
//! one offered fish option and two different offered vegetarian options, under
//! a guest name nobody has used yet. Names are trimmed before both the
//! uniqueness check and storage.

use std::collections::BTreeSet;

use mp_core::{Ballot, Category, OptionId, OptionSet};
use mp_io::store::Store;

use crate::validate::{EntityRef, ValidationIssue, ValidationReport};
use crate::PipelineError;

fn check_single(
    options: &OptionSet,
    c: Category,
    field: &'static str,
    id: Option<&OptionId>,
    issues: &mut Vec<ValidationIssue>,
) {
    match id {
        None => issues.push(ValidationIssue::error(
            "ballot.missing_choice",
            EntityRef::Field(field),
            format!("select one {c} option"),
        )),
        Some(id) if options.find(c, id).is_none() => issues.push(ValidationIssue::error(
            "ballot.not_offered",
            EntityRef::Field(field),
            format!("{id} is not one of this week's {c} options"),
        )),
        Some(_) => {}
    }
}

/// Check `ballot` against this week's options and the ballots already cast.
pub fn check_ballot(options: &OptionSet, existing: &[Ballot], ballot: &Ballot) -> ValidationReport {
    let mut issues = Vec::new();

    let name = ballot.guest_name.trim();
    if name.is_empty() {
        issues.push(ValidationIssue::error("ballot.empty_name", EntityRef::Field("guestName"), "enter your name"));
    } else if existing.iter().any(|b| b.guest_name == name) {
        issues.push(ValidationIssue::error(
            "ballot.duplicate_name",
            EntityRef::Field("guestName"),
            format!("a vote from {name:?} already exists"),
        ));
    }

    check_single(options, Category::Meat, "meatOptionId", ballot.meat_option_id.as_ref(), &mut issues);
    check_single(options, Category::Fish, "fishOptionId", ballot.fish_option_id.as_ref(), &mut issues);

    let veg = &ballot.vegetarian_option_ids;
    let distinct: BTreeSet<&OptionId> = veg.iter().collect();
    if veg.len() != 2 {
        issues.push(ValidationIssue::error(
            "ballot.vegetarian_count",
            EntityRef::Field("vegetarianOptionIds"),
            format!("select exactly two vegetarian options (got {})", veg.len()),
        ));
    } else if distinct.len() != 2 {
        issues.push(ValidationIssue::error(
            "ballot.vegetarian_duplicate",
            EntityRef::Field("vegetarianOptionIds"),
            "select two different vegetarian options",
        ));
    }
    for id in distinct {
        if options.find(Category::Vegetarian, id).is_none() {
            issues.push(ValidationIssue::error(
                "ballot.not_offered",
                EntityRef::Field("vegetarianOptionIds"),
                format!("{id} is not one of this week's vegetarian options"),
            ));
        }
    }

    ValidationReport::from_issues(issues)
}

/// Validate and append under the store lock. Returns the new ballot count.
pub fn submit_ballot(store: &Store, ballot: Ballot) -> Result<usize, PipelineError> {
    let lock = store.lock()?;
    let options = store.options()?;
    let existing = store.ballots()?;

    let report = check_ballot(&options, &existing, &ballot);
    if !report.pass {
        tracing::info!(code = report.first_error_code().unwrap_or(""), "ballot rejected");
        return Err(PipelineError::Validate(report));
    }

    let ballot = Ballot { guest_name: ballot.guest_name.trim().to_string(), ..ballot };
    let count = store.append_ballot(&lock, ballot)?;
    tracing::info!(ballots = count, "ballot recorded");
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mp_core::CandidateOption;

    fn oid(s: &str) -> OptionId {
        s.parse().unwrap()
    }

    fn opt(id: &str) -> CandidateOption {
        CandidateOption::new(oid(id), id)
    }

    fn options() -> OptionSet {
        OptionSet::new(
            vec![opt("burger_combo")],
            vec![opt("cod_combo")],
            vec![opt("curry"), opt("rice_bowl"), opt("side_salad")],
        )
    }

    fn ballot(name: &str, veg: &[&str]) -> Ballot {
        Ballot {
            guest_name: name.into(),
            meat_option_id: Some(oid("burger_combo")),
            fish_option_id: Some(oid("cod_combo")),
            vegetarian_option_ids: veg.iter().map(|v| oid(v)).collect(),
        }
    }

    fn codes(r: &ValidationReport) -> Vec<&'static str> {
        r.issues.iter().map(|i| i.code).collect()
    }

    #[test]
    fn valid_ballot_passes() {
        let r = check_ballot(&options(), &[], &ballot("Ada", &["curry", "rice_bowl"]));
        assert!(r.pass, "{:?}", r.issues);
    }

    #[test]
    fn name_rules() {
        let existing = vec![ballot("Ada", &["curry", "rice_bowl"])];
        let r = check_ballot(&options(), &existing, &ballot("  Ada ", &["curry", "rice_bowl"]));
        assert_eq!(codes(&r), vec!["ballot.duplicate_name"]);
        let r = check_ballot(&options(), &existing, &ballot("   ", &["curry", "rice_bowl"]));
        assert_eq!(codes(&r), vec!["ballot.empty_name"]);
    }

    #[test]
    fn vegetarian_rules() {
        let r = check_ballot(&options(), &[], &ballot("Ada", &["curry"]));
        assert_eq!(codes(&r), vec!["ballot.vegetarian_count"]);
        let r = check_ballot(&options(), &[], &ballot("Ada", &["curry", "curry"]));
        assert_eq!(codes(&r), vec!["ballot.vegetarian_duplicate"]);
        let r = check_ballot(&options(), &[], &ballot("Ada", &["curry", "burger_combo"]));
        assert_eq!(codes(&r), vec!["ballot.not_offered"]);
    }

    #[test]
    fn main_choices_must_be_offered() {
        let mut b = ballot("Ada", &["curry", "rice_bowl"]);
        b.meat_option_id = Some(oid("cod_combo"));
        b.fish_option_id = None;
        let r = check_ballot(&options(), &[], &b);
        assert_eq!(codes(&r), vec!["ballot.missing_choice", "ballot.not_offered"]);
    }

    #[test]
    fn submit_trims_and_appends() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path()).unwrap();
        {
            let lock = store.lock().unwrap();
            store.write_options(&lock, &options()).unwrap();
        }
        assert_eq!(submit_ballot(&store, ballot(" Ada ", &["curry", "rice_bowl"])).unwrap(), 1);
        let err = submit_ballot(&store, ballot("Ada", &["curry", "side_salad"])).unwrap_err();
        assert_eq!(err.code(), "validation");
        let stored = store.ballots().unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].guest_name, "Ada");
    }
}
