//! crates/mp_pipeline/src/validate.rs
//! Structural & cross-record validation before any computation.
//!
//! Checks that need more than one record (options against the catalog, ballots
//! against the options) live here; shape checks already happened in `mp_io`.
//! Empty option categories are only a warning: the engine reports them as
//! `NoCandidate` when a run is attempted.

use std::collections::BTreeSet;
use std::fmt;

use mp_algo::CatalogIndex;
use mp_core::{Ballot, Catalog, Category, OptionId, OptionSet, Params};

/// What VALIDATE looks at. Borrowed from the snapshot; nothing is copied.
#[derive(Clone, Copy, Debug)]
pub struct InputsView<'a> {
    pub catalog: &'a Catalog,
    pub options: &'a OptionSet,
    pub ballots: &'a [Ballot],
    pub params: &'a Params,
}

/// Issue severity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
        }
    }
}

/// Where the issue occurred.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EntityRef {
    Root,
    Param(&'static str),
    /// A field of a submitted record (ballot form, manual selection).
    Field(&'static str),
    Catalog(OptionId),
    Option(Category, OptionId),
    /// Position in the stored ballot list.
    Ballot(usize),
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityRef::Root => f.write_str("/"),
            EntityRef::Param(p) => write!(f, "params.{p}"),
            EntityRef::Field(n) => f.write_str(n),
            EntityRef::Catalog(id) => write!(f, "catalog:{id}"),
            EntityRef::Option(c, id) => write!(f, "options.{c}:{id}"),
            EntityRef::Ballot(i) => write!(f, "ballots[{i}]"),
        }
    }
}

/// One validation finding.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidationIssue {
    pub severity: Severity,
    pub code: &'static str,
    pub message: String,
    pub where_: EntityRef,
}

impl ValidationIssue {
    pub fn error(code: &'static str, where_: EntityRef, message: impl Into<String>) -> Self {
        Self { severity: Severity::Error, code, message: message.into(), where_ }
    }

    pub fn warning(code: &'static str, where_: EntityRef, message: impl Into<String>) -> Self {
        Self { severity: Severity::Warning, code, message: message.into(), where_ }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} at {}: {}", self.severity.as_str(), self.code, self.where_, self.message)
    }
}

/// Deterministic report: pass = (no Error); ordering of issues is stable.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidationReport {
    pub pass: bool,
    pub issues: Vec<ValidationIssue>,
}

impl Default for ValidationReport {
    fn default() -> Self {
        Self { pass: true, issues: Vec::new() }
    }
}

impl ValidationReport {
    pub fn from_issues(mut issues: Vec<ValidationIssue>) -> Self {
        sort_issues_stably(&mut issues);
        ValidationReport {
            pass: !issues.iter().any(|i| i.severity == Severity::Error),
            issues,
        }
    }

    pub fn errors(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(|i| i.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(|i| i.severity == Severity::Warning)
    }

    /// First error code, if any.
    pub fn first_error_code(&self) -> Option<&'static str> {
        self.errors().next().map(|i| i.code)
    }
}

/// Top-level entry point.
pub fn validate(ctx: &InputsView<'_>) -> ValidationReport {
    let mut issues: Vec<ValidationIssue> = Vec::new();

    issues.extend(check_params(ctx.params));

    let catalog_issues = check_catalog(ctx.catalog);
    let catalog_ok = catalog_issues.is_empty();
    issues.extend(catalog_issues);

    // Options can only be checked against a catalog that indexes cleanly.
    if catalog_ok {
        if let Ok(index) = CatalogIndex::build(ctx.catalog) {
            issues.extend(check_options_against_catalog(&index, ctx.options));
            issues.extend(check_counterparts_offered(&index, ctx.options));
        }
    }
    issues.extend(check_options_complete(ctx.options));
    issues.extend(check_ballots(ctx.options, ctx.ballots));

    let report = ValidationReport::from_issues(issues);
    tracing::debug!(
        pass = report.pass,
        errors = report.errors().count(),
        warnings = report.warnings().count(),
        "validated inputs"
    );
    report
}

// ------------------------------------------------------------------------------------------------
// Checks
// ------------------------------------------------------------------------------------------------

fn check_params(params: &Params) -> Vec<ValidationIssue> {
    match params.validate_domains() {
        Ok(()) => Vec::new(),
        Err(e) => vec![ValidationIssue::error(
            "params.out_of_range",
            EntityRef::Param("min_ballots"),
            e.to_string(),
        )],
    }
}

fn check_catalog(catalog: &Catalog) -> Vec<ValidationIssue> {
    CatalogIndex::problems(catalog)
        .into_iter()
        .map(|p| ValidationIssue::error(p.code(), EntityRef::Catalog(p.id().clone()), p.to_string()))
        .collect()
}

/// Errors:
/// - "options.unknown_id" when an option is not in the catalog
/// - "options.wrong_category" when the catalog files it under another category
///
/// Warnings:
/// - "options.name_mismatch" when the option name differs from the catalog name
fn check_options_against_catalog(index: &CatalogIndex, options: &OptionSet) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    for c in Category::ALL {
        for o in options.category(c) {
            let here = || EntityRef::Option(c, o.id.clone());
            let Some(actual) = index.category_of(&o.id) else {
                issues.push(ValidationIssue::error(
                    "options.unknown_id",
                    here(),
                    format!("{} is not in the catalog", o.id),
                ));
                continue;
            };
            if actual != c {
                issues.push(ValidationIssue::error(
                    "options.wrong_category",
                    here(),
                    format!("{} is a {actual} entry, offered as {c}", o.id),
                ));
                continue;
            }
            let catalog_name = match index.lookup(&o.id) {
                Some(mp_algo::OptionKind::Dish(d)) => d.name.as_str(),
                Some(mp_algo::OptionKind::Combo(k)) => k.name.as_str(),
                None => continue,
            };
            if catalog_name != o.name {
                issues.push(ValidationIssue::warning(
                    "options.name_mismatch",
                    here(),
                    format!("offered as {:?}, catalog says {:?}", o.name, catalog_name),
                ));
            }
        }
    }
    issues
}

/// Warnings:
/// - "options.missing_counterpart" when an offered combo's vegetarian side is
///   not itself a vegetarian option
fn check_counterparts_offered(index: &CatalogIndex, options: &OptionSet) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    for c in [Category::Meat, Category::Fish] {
        for o in options.category(c) {
            // Misfiled options already carry an error.
            if index.category_of(&o.id) != Some(c) {
                continue;
            }
            let Some(side) = index.vegetarian_counterpart(&o.id) else {
                continue;
            };
            if options.find(Category::Vegetarian, &side.id).is_none() {
                issues.push(ValidationIssue::warning(
                    "options.missing_counterpart",
                    EntityRef::Option(c, o.id.clone()),
                    format!("{} comes with {}, which is not offered as a vegetarian option", o.id, side.id),
                ));
            }
        }
    }
    issues
}

fn check_options_complete(options: &OptionSet) -> Vec<ValidationIssue> {
    if options.is_complete() {
        return Vec::new();
    }
    Category::ALL
        .into_iter()
        .filter(|c| options.category(*c).is_empty())
        .map(|c| {
            ValidationIssue::warning(
                "options.empty_category",
                EntityRef::Root,
                format!("no {c} options offered"),
            )
        })
        .collect()
}

/// Warnings only: stored ballots were accepted once and are still counted.
fn check_ballots(options: &OptionSet, ballots: &[Ballot]) -> Vec<ValidationIssue> {
    let offered: BTreeSet<&OptionId> = Category::ALL
        .into_iter()
        .flat_map(|c| options.category(c).iter().map(|o| &o.id))
        .collect();

    let mut issues = Vec::new();
    let mut names: BTreeSet<&str> = BTreeSet::new();
    for (i, b) in ballots.iter().enumerate() {
        if !names.insert(b.guest_name.as_str()) {
            issues.push(ValidationIssue::warning(
                "ballots.duplicate_guest",
                EntityRef::Ballot(i),
                format!("{:?} has voted more than once", b.guest_name),
            ));
        }
        let named = b
            .meat_option_id
            .iter()
            .chain(b.fish_option_id.iter())
            .chain(b.vegetarian_option_ids.iter());
        for id in named {
            if !offered.contains(id) {
                issues.push(ValidationIssue::warning(
                    "ballots.unknown_option",
                    EntityRef::Ballot(i),
                    format!("{id} is not offered this week"),
                ));
            }
        }
    }
    issues
}

// ------------------------------------------------------------------------------------------------
// Utilities
// ------------------------------------------------------------------------------------------------

fn sort_issues_stably(issues: &mut [ValidationIssue]) {
    use core::cmp::Ordering;
    issues.sort_by(|a, b| match a.code.cmp(b.code) {
        Ordering::Equal => match cmp_where(&a.where_, &b.where_) {
            Ordering::Equal => a.message.cmp(&b.message),
            o => o,
        },
        o => o,
    });
}

fn cmp_where(a: &EntityRef, b: &EntityRef) -> core::cmp::Ordering {
    use core::cmp::Ordering::*;
    use EntityRef::*;
    match (a, b) {
        (Root, Root) => Equal,
        (Root, _) => Less,
        (_, Root) => Greater,
        (Param(pa), Param(pb)) => pa.cmp(pb),
        (Param(_), _) => Less,
        (_, Param(_)) => Greater,
        (Field(fa), Field(fb)) => fa.cmp(fb),
        (Field(_), _) => Less,
        (_, Field(_)) => Greater,
        (Catalog(ia), Catalog(ib)) => ia.cmp(ib),
        (Catalog(_), _) => Less,
        (_, Catalog(_)) => Greater,
        (Option(ca, ia), Option(cb, ib)) => match ca.cmp(cb) {
            Equal => ia.cmp(ib),
            o => o,
        },
        (Option(..), _) => Less,
        (_, Option(..)) => Greater,
        (Ballot(ia), Ballot(ib)) => ia.cmp(ib),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mp_core::{CandidateOption, Combo, Dish};

    fn oid(s: &str) -> OptionId {
        s.parse().unwrap()
    }

    fn dish(id: &str, name: &str, c: Category) -> Dish {
        Dish { id: oid(id), name: name.into(), category: c, vegan: false }
    }

    fn catalog() -> Catalog {
        Catalog {
            dishes: vec![dish("curry", "Curry", Category::Vegetarian)],
            combos: vec![
                Combo {
                    id: oid("burger_combo"),
                    name: "Burger Combo".into(),
                    constituent_dishes: vec![
                        dish("burger", "Burger", Category::Meat),
                        dish("side_salad", "Side Salad", Category::Vegetarian),
                    ],
                },
                Combo {
                    id: oid("cod_combo"),
                    name: "Cod Combo".into(),
                    constituent_dishes: vec![dish("cod", "Cod", Category::Fish)],
                },
            ],
        }
    }

    fn opt(id: &str, name: &str) -> CandidateOption {
        CandidateOption::new(oid(id), name)
    }

    fn good_options() -> OptionSet {
        OptionSet::new(
            vec![opt("burger_combo", "Burger Combo")],
            vec![opt("cod_combo", "Cod Combo")],
            vec![opt("curry", "Curry"), opt("side_salad", "Side Salad")],
        )
    }

    fn run(catalog: &Catalog, options: &OptionSet, ballots: &[Ballot]) -> ValidationReport {
        let params = Params::default();
        validate(&InputsView { catalog, options, ballots, params: &params })
    }

    #[test]
    fn clean_inputs_pass() {
        let r = run(&catalog(), &good_options(), &[]);
        assert!(r.pass);
        assert!(r.issues.is_empty());
    }

    #[test]
    fn options_checked_against_catalog() {
        let options = OptionSet::new(
            vec![opt("cod_combo", "Cod Combo"), opt("lamb", "Lamb")],
            vec![opt("cod_combo", "Cod Combo")],
            vec![opt("curry", "Thai Curry")],
        );
        let r = run(&catalog(), &options, &[]);
        assert!(!r.pass);
        let codes: Vec<&str> = r.issues.iter().map(|i| i.code).collect();
        assert_eq!(codes, vec!["options.name_mismatch", "options.unknown_id", "options.wrong_category"]);
        assert_eq!(r.first_error_code(), Some("options.unknown_id"));
        assert_eq!(r.issues[2].where_, EntityRef::Option(Category::Meat, oid("cod_combo")));
    }

    #[test]
    fn broken_catalog_skips_option_checks() {
        let mut cat = catalog();
        cat.combos.push(Combo { id: oid("empty_combo"), name: "Empty".into(), constituent_dishes: vec![] });
        let options = OptionSet::new(vec![opt("nope", "Nope")], vec![], vec![]);
        let r = run(&cat, &options, &[]);
        assert!(!r.pass);
        assert!(r.issues.iter().any(|i| i.code == "catalog.combo_without_main"));
        assert!(!r.issues.iter().any(|i| i.code == "options.unknown_id"));
    }

    #[test]
    fn empty_category_and_ballot_oddities_are_warnings() {
        let options = OptionSet::new(vec![opt("burger_combo", "Burger Combo")], vec![], vec![]);
        let b = Ballot {
            guest_name: "Ada".into(),
            meat_option_id: Some(oid("burger_combo")),
            fish_option_id: Some(oid("cod_combo")),
            vegetarian_option_ids: vec![],
        };
        let r = run(&catalog(), &options, &[b.clone(), b]);
        assert!(r.pass);
        let codes: Vec<&str> = r.warnings().map(|i| i.code).collect();
        assert_eq!(
            codes,
            vec![
                "ballots.duplicate_guest",
                "ballots.unknown_option",
                "ballots.unknown_option",
                "options.empty_category",
                "options.empty_category",
                "options.missing_counterpart",
            ]
        );
    }

    #[test]
    fn combo_side_missing_from_vegetarian_options_is_a_warning() {
        let options = OptionSet::new(
            vec![opt("burger_combo", "Burger Combo")],
            vec![opt("cod_combo", "Cod Combo")],
            vec![opt("curry", "Curry")],
        );
        let r = run(&catalog(), &options, &[]);
        assert!(r.pass);
        let warnings: Vec<_> = r.warnings().collect();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].code, "options.missing_counterpart");
        assert_eq!(warnings[0].where_, EntityRef::Option(Category::Meat, oid("burger_combo")));
        assert!(warnings[0].message.contains("side_salad"));

        // Offering the side clears it.
        assert!(run(&catalog(), &good_options(), &[]).issues.is_empty());
    }

    #[test]
    fn out_of_range_params_fail() {
        let params = Params { min_ballots: mp_core::variables::MIN_BALLOTS_MAX + 1, ..Params::default() };
        let r = validate(&InputsView {
            catalog: &catalog(),
            options: &good_options(),
            ballots: &[],
            params: &params,
        });
        assert_eq!(r.first_error_code(), Some("params.out_of_range"));
    }

    #[test]
    fn sort_is_stable_by_code_then_location() {
        let mut v = vec![
            ValidationIssue::warning("b", EntityRef::Ballot(2), "x"),
            ValidationIssue::warning("b", EntityRef::Root, "y"),
            ValidationIssue::error("a", EntityRef::Ballot(0), "z"),
        ];
        sort_issues_stably(&mut v);
        let order: Vec<(&str, &EntityRef)> = v.iter().map(|i| (i.code, &i.where_)).collect();
        assert_eq!(
            order,
            vec![("a", &EntityRef::Ballot(0)), ("b", &EntityRef::Root), ("b", &EntityRef::Ballot(2))]
        );
    }
}
