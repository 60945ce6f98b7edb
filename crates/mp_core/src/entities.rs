//! Catalog, weekly options, ballots and the weekly plan.
//!
//! Wire names are camelCase (`constituentDishes`, `meatOptions`, `guestName`,
//! `generatedAt`). Legacy snake_case inputs are mapped by the loader in `mp_io`,
//! not here.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::determinism::dedup_by_id;
use crate::ids::OptionId;

/// Dish category. A combo takes the category of its meat-or-fish constituent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Category {
    Meat,
    Fish,
    Vegetarian,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Meat, Category::Fish, Category::Vegetarian];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Meat => "meat",
            Category::Fish => "fish",
            Category::Vegetarian => "vegetarian",
        }
    }

    /// Picks per week for this category (Mon meat, Tue fish, Wed/Thu vegetarian).
    pub fn slots(self) -> usize {
        match self {
            Category::Meat | Category::Fish => 1,
            Category::Vegetarian => 2,
        }
    }

    #[inline]
    pub fn is_main(self) -> bool {
        matches!(self, Category::Meat | Category::Fish)
    }
}

impl core::fmt::Display for Category {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single dish of the catalog.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Dish {
    pub id: OptionId,
    pub name: String,
    pub category: Category,
    #[cfg_attr(feature = "serde", serde(default))]
    pub vegan: bool,
}

/// A named bundle: one meat-or-fish dish plus, optionally, its vegetarian counterpart.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct Combo {
    pub id: OptionId,
    pub name: String,
    pub constituent_dishes: Vec<Dish>,
}

impl Combo {
    /// Constituents that are meat or fish. Well-formed combos have exactly one.
    pub fn main_dishes(&self) -> impl Iterator<Item = &Dish> {
        self.constituent_dishes.iter().filter(|d| d.category.is_main())
    }

    /// Vegetarian constituents. Well-formed combos have at most one.
    pub fn vegetarian_dishes(&self) -> impl Iterator<Item = &Dish> {
        self.constituent_dishes
            .iter()
            .filter(|d| d.category == Category::Vegetarian)
    }

    /// Category of the combo's single meat-or-fish constituent; `None` when
    /// there is no main or more than one.
    pub fn category(&self) -> Option<Category> {
        let mut mains = self.main_dishes();
        match (mains.next(), mains.next()) {
            (Some(main), None) => Some(main.category),
            _ => None,
        }
    }
}

/// Full dish/combo catalog for one generation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Catalog {
    #[cfg_attr(feature = "serde", serde(default))]
    pub dishes: Vec<Dish>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub combos: Vec<Combo>,
}

/// The unit the engine operates on: a bare vegetarian dish or a combo.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CandidateOption {
    pub id: OptionId,
    pub name: String,
}

impl CandidateOption {
    pub fn new(id: OptionId, name: impl Into<String>) -> Self {
        Self { id, name: name.into() }
    }
}

/// The restaurant's weekly candidates. Every list is deduplicated by id
/// (first occurrence wins); construct through [`OptionSet::new`] to keep that.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct OptionSet {
    #[cfg_attr(feature = "serde", serde(rename = "meatOptions"))]
    meat: Vec<CandidateOption>,
    #[cfg_attr(feature = "serde", serde(rename = "fishOptions"))]
    fish: Vec<CandidateOption>,
    #[cfg_attr(feature = "serde", serde(rename = "vegetarianOptions"))]
    vegetarian: Vec<CandidateOption>,
}

impl OptionSet {
    pub fn new(
        meat: Vec<CandidateOption>,
        fish: Vec<CandidateOption>,
        vegetarian: Vec<CandidateOption>,
    ) -> Self {
        Self {
            meat: dedup_by_id(meat),
            fish: dedup_by_id(fish),
            vegetarian: dedup_by_id(vegetarian),
        }
    }

    pub fn meat(&self) -> &[CandidateOption] {
        &self.meat
    }

    pub fn fish(&self) -> &[CandidateOption] {
        &self.fish
    }

    pub fn vegetarian(&self) -> &[CandidateOption] {
        &self.vegetarian
    }

    pub fn category(&self, c: Category) -> &[CandidateOption] {
        match c {
            Category::Meat => &self.meat,
            Category::Fish => &self.fish,
            Category::Vegetarian => &self.vegetarian,
        }
    }

    pub fn find(&self, c: Category, id: &OptionId) -> Option<&CandidateOption> {
        self.category(c).iter().find(|o| &o.id == id)
    }

    /// Non-empty in all three categories (precondition for resolution).
    pub fn is_complete(&self) -> bool {
        Category::ALL.iter().all(|&c| !self.category(c).is_empty())
    }

    pub fn is_empty(&self) -> bool {
        Category::ALL.iter().all(|&c| self.category(c).is_empty())
    }
}

/// One guest's vote.
///
/// Ids are optional because stored data may be incomplete; the tally skips
/// missing ids. Submission-time validation requires all of them.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct Ballot {
    pub guest_name: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub meat_option_id: Option<OptionId>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub fish_option_id: Option<OptionId>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub vegetarian_option_ids: Vec<OptionId>,
}

impl Ballot {
    /// Every id the ballot names, across all slots, each once.
    pub fn named_ids(&self) -> BTreeSet<&OptionId> {
        self.meat_option_id
            .iter()
            .chain(self.fish_option_id.iter())
            .chain(self.vegetarian_option_ids.iter())
            .collect()
    }
}

/// Plan slots, Monday first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
}

impl Weekday {
    pub const ALL: [Weekday; 5] = [
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Weekday::Monday => "Monday",
            Weekday::Tuesday => "Tuesday",
            Weekday::Wednesday => "Wednesday",
            Weekday::Thursday => "Thursday",
            Weekday::Friday => "Friday",
        }
    }
}

/// The published week. Days hold option *names*; Friday is always `None`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct WeeklyPlan {
    pub monday: Option<String>,
    pub tuesday: Option<String>,
    pub wednesday: Option<String>,
    pub thursday: Option<String>,
    pub friday: Option<String>,
    pub generated_at: Option<DateTime<Utc>>,
}

impl WeeklyPlan {
    pub fn day(&self, d: Weekday) -> Option<&str> {
        match d {
            Weekday::Monday => self.monday.as_deref(),
            Weekday::Tuesday => self.tuesday.as_deref(),
            Weekday::Wednesday => self.wednesday.as_deref(),
            Weekday::Thursday => self.thursday.as_deref(),
            Weekday::Friday => self.friday.as_deref(),
        }
    }

    /// True for the empty default (no run yet, or after a reset).
    pub fn is_empty(&self) -> bool {
        Weekday::ALL.iter().all(|&d| self.day(d).is_none()) && self.generated_at.is_none()
    }
}
