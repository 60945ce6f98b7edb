//! mp_report/src/lib.rs: pure offline report model + renderers (JSON/HTML).
//!
//! Determinism rules:
//! - No I/O here. Callers pass the option set, the tally and the plan in memory.
//! - Rows are ordered by votes descending, ties in option-set order.
//! - Stable section order and field names.
//!
//! Display names may drop a trailing `" Combo"`; stored names never change.

#![deny(unsafe_code)]

use chrono::SecondsFormat;
use mp_algo::VoteTally;
use mp_core::determinism::rank_by_count;
use mp_core::{Category, OptionSet, Weekday, WeeklyPlan};

#[cfg(feature = "render_html")]
pub mod render_html;
#[cfg(feature = "render_json")]
pub mod render_json;

// ===== Errors =====
#[derive(Debug)]
pub enum ReportError {
    Serialize(String),
}

impl std::fmt::Display for ReportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportError::Serialize(m) => write!(f, "report serialization failed: {m}"),
        }
    }
}

impl std::error::Error for ReportError {}

/// Suffix dropped from combo names on display.
pub const COMBO_SUFFIX: &str = " Combo";

/// Shown for a day without a meal.
pub const LEFTOVERS: &str = "Leftovers";

// ===== Model =====
#[cfg_attr(feature = "render_json", derive(serde::Serialize))]
#[cfg_attr(feature = "render_json", serde(rename_all = "camelCase"))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VoteResults {
    pub total_ballots: u64,
    pub categories: Vec<CategoryResults>,
}

#[cfg_attr(feature = "render_json", derive(serde::Serialize))]
#[cfg_attr(feature = "render_json", serde(rename_all = "camelCase"))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CategoryResults {
    pub category: &'static str, // "meat" | "fish" | "vegetarian"
    pub title: &'static str,
    pub rows: Vec<ResultRow>,
}

#[cfg_attr(feature = "render_json", derive(serde::Serialize))]
#[cfg_attr(feature = "render_json", serde(rename_all = "camelCase"))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResultRow {
    pub id: String,
    pub name: String,
    pub display_name: String,
    pub votes: u64,
}

#[cfg_attr(feature = "render_json", derive(serde::Serialize))]
#[cfg_attr(feature = "render_json", serde(rename_all = "camelCase"))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlanView {
    pub days: Vec<PlanDay>,
    pub generated_at: Option<String>,
}

#[cfg_attr(feature = "render_json", derive(serde::Serialize))]
#[cfg_attr(feature = "render_json", serde(rename_all = "camelCase"))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlanDay {
    pub day: &'static str,
    pub meal: String,
    /// False when `meal` is the leftovers placeholder.
    pub planned: bool,
}

// ===== API =====

/// `name` as shown to guests.
pub fn display_name(name: &str, strip_combo_suffix: bool) -> String {
    if strip_combo_suffix {
        if let Some(base) = name.strip_suffix(COMBO_SUFFIX) {
            return base.to_string();
        }
    }
    name.to_string()
}

fn title_of(c: Category) -> &'static str {
    match c {
        Category::Meat => "Meat Options",
        Category::Fish => "Fish Options",
        Category::Vegetarian => "Vegetarian Options",
    }
}

/// Every offered option with its vote count, per category.
pub fn build_vote_results(options: &OptionSet, tally: &VoteTally, strip_combo_suffix: bool) -> VoteResults {
    let categories = Category::ALL
        .into_iter()
        .map(|c| {
            let rows = rank_by_count(options.category(c), |o| tally.count(&o.id))
                .into_iter()
                .map(|o| ResultRow {
                    votes: tally.count(&o.id),
                    display_name: display_name(&o.name, strip_combo_suffix),
                    id: o.id.to_string(),
                    name: o.name,
                })
                .collect();
            CategoryResults { category: c.as_str(), title: title_of(c), rows }
        })
        .collect();
    VoteResults { total_ballots: tally.ballots(), categories }
}

/// Monday..Friday with display names; empty days read "Leftovers".
pub fn build_plan_view(plan: &WeeklyPlan, strip_combo_suffix: bool) -> PlanView {
    let days = Weekday::ALL
        .into_iter()
        .map(|d| match plan.day(d) {
            Some(name) => PlanDay { day: d.as_str(), meal: display_name(name, strip_combo_suffix), planned: true },
            None => PlanDay { day: d.as_str(), meal: LEFTOVERS.to_string(), planned: false },
        })
        .collect();
    PlanView {
        days,
        generated_at: plan
            .generated_at
            .map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mp_algo::tally;
    use mp_core::{Ballot, CandidateOption, OptionId};

    fn oid(s: &str) -> OptionId {
        s.parse().unwrap()
    }

    fn options() -> OptionSet {
        OptionSet::new(
            vec![
                CandidateOption::new(oid("steak_combo"), "Steak Combo"),
                CandidateOption::new(oid("burger_combo"), "Burger Combo"),
            ],
            vec![CandidateOption::new(oid("cod_combo"), "Cod Combo")],
            vec![
                CandidateOption::new(oid("side_salad"), "Side Salad"),
                CandidateOption::new(oid("curry"), "Curry"),
                CandidateOption::new(oid("rice_bowl"), "Rice Bowl"),
            ],
        )
    }

    fn ballot(meat: &str, veg: [&str; 2]) -> Ballot {
        Ballot {
            guest_name: format!("{meat}{}{}", veg[0], veg[1]),
            meat_option_id: Some(oid(meat)),
            fish_option_id: Some(oid("cod_combo")),
            vegetarian_option_ids: vec![oid(veg[0]), oid(veg[1])],
        }
    }

    #[test]
    fn display_name_strips_only_trailing_suffix() {
        assert_eq!(display_name("Burger Combo", true), "Burger");
        assert_eq!(display_name("Burger Combo", false), "Burger Combo");
        assert_eq!(display_name("Combo Platter", true), "Combo Platter");
        assert_eq!(display_name("Curry", true), "Curry");
    }

    #[test]
    fn results_rank_by_votes_then_option_order() {
        let t = tally(&[
            ballot("burger_combo", ["curry", "rice_bowl"]),
            ballot("burger_combo", ["side_salad", "curry"]),
        ]);
        let r = build_vote_results(&options(), &t, true);
        assert_eq!(r.total_ballots, 2);

        let meat: Vec<(&str, u64)> = r.categories[0].rows.iter().map(|x| (x.id.as_str(), x.votes)).collect();
        assert_eq!(meat, vec![("burger_combo", 2), ("steak_combo", 0)]);
        assert_eq!(r.categories[0].rows[0].display_name, "Burger");

        let veg: Vec<&str> = r.categories[2].rows.iter().map(|x| x.id.as_str()).collect();
        // side_salad and rice_bowl tie at 1; option order decides.
        assert_eq!(veg, vec!["curry", "side_salad", "rice_bowl"]);
    }

    #[test]
    fn plan_view_fills_leftovers() {
        let plan = WeeklyPlan {
            monday: Some("Burger Combo".into()),
            tuesday: Some("Cod Combo".into()),
            wednesday: Some("Curry".into()),
            thursday: Some("Rice Bowl".into()),
            ..WeeklyPlan::default()
        };
        let v = build_plan_view(&plan, true);
        let meals: Vec<&str> = v.days.iter().map(|d| d.meal.as_str()).collect();
        assert_eq!(meals, vec!["Burger", "Cod", "Curry", "Rice Bowl", "Leftovers"]);
        assert!(!v.days[4].planned);
        assert_eq!(v.generated_at, None);
    }
}
