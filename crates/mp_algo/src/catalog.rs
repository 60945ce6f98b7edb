//! CatalogIndex: O(1) lookups over one catalog generation.
//!
//! Answers "is this id a combo, and which vegetarian dish does it bundle?".
//! Combo-vs-dish is resolved once at build time into [`OptionKind`]; callers
//! never inspect constituents themselves.

use std::collections::HashMap;
use std::fmt;

use mp_core::{Catalog, Category, Combo, Dish, OptionId};

/// What an option id refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OptionKind<'a> {
    Dish(&'a Dish),
    Combo(&'a Combo),
}

/// Structural problems found while indexing a catalog.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CatalogError {
    /// Two different entries share one id.
    DuplicateId(OptionId),
    /// Combo has no meat or fish constituent.
    ComboWithoutMain(OptionId),
    /// Combo has more than one meat-or-fish constituent.
    ComboWithMultipleMains(OptionId),
    /// Combo has more than one vegetarian constituent.
    MultipleCounterparts(OptionId),
}

impl CatalogError {
    pub fn code(&self) -> &'static str {
        match self {
            CatalogError::DuplicateId(_) => "catalog.duplicate_id",
            CatalogError::ComboWithoutMain(_) => "catalog.combo_without_main",
            CatalogError::ComboWithMultipleMains(_) => "catalog.combo_multiple_mains",
            CatalogError::MultipleCounterparts(_) => "catalog.combo_multiple_counterparts",
        }
    }

    pub fn id(&self) -> &OptionId {
        match self {
            CatalogError::DuplicateId(id)
            | CatalogError::ComboWithoutMain(id)
            | CatalogError::ComboWithMultipleMains(id)
            | CatalogError::MultipleCounterparts(id) => id,
        }
    }
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogError::DuplicateId(id) => write!(f, "id {id} is used by two different catalog entries"),
            CatalogError::ComboWithoutMain(id) => write!(f, "combo {id} has no meat or fish dish"),
            CatalogError::ComboWithMultipleMains(id) => {
                write!(f, "combo {id} has more than one meat or fish dish")
            }
            CatalogError::MultipleCounterparts(id) => {
                write!(f, "combo {id} has more than one vegetarian dish")
            }
        }
    }
}

impl std::error::Error for CatalogError {}

#[derive(Clone, Debug)]
struct ComboEntry {
    combo: Combo,
    category: Category,
    counterpart: Option<Dish>,
}

/// Lookup structure built once per catalog generation.
#[derive(Clone, Debug, Default)]
pub struct CatalogIndex {
    dishes: HashMap<OptionId, Dish>,
    combos: HashMap<OptionId, ComboEntry>,
}

impl CatalogIndex {
    /// Index `catalog`, failing on the first structural problem.
    pub fn build(catalog: &Catalog) -> Result<Self, CatalogError> {
        let (index, mut problems) = Self::build_collecting(catalog);
        if problems.is_empty() {
            Ok(index)
        } else {
            Err(problems.swap_remove(0))
        }
    }

    /// Every structural problem of `catalog`, in catalog order.
    pub fn problems(catalog: &Catalog) -> Vec<CatalogError> {
        Self::build_collecting(catalog).1
    }

    fn build_collecting(catalog: &Catalog) -> (Self, Vec<CatalogError>) {
        let mut index = CatalogIndex::default();
        let mut problems = Vec::new();

        for d in &catalog.dishes {
            index.insert_dish(d, &mut problems);
        }
        for c in &catalog.combos {
            // Constituents are dishes in their own right.
            for d in &c.constituent_dishes {
                index.insert_dish(d, &mut problems);
            }

            let category = match c.category() {
                Some(category) => category,
                None if c.main_dishes().next().is_none() => {
                    problems.push(CatalogError::ComboWithoutMain(c.id.clone()));
                    continue;
                }
                None => {
                    problems.push(CatalogError::ComboWithMultipleMains(c.id.clone()));
                    continue;
                }
            };

            let mut vegs = c.vegetarian_dishes();
            let counterpart = match (vegs.next(), vegs.next()) {
                (_, Some(_)) => {
                    problems.push(CatalogError::MultipleCounterparts(c.id.clone()));
                    continue;
                }
                (v, None) => v.cloned(),
            };

            if index.dishes.contains_key(&c.id) || index.combos.contains_key(&c.id) {
                problems.push(CatalogError::DuplicateId(c.id.clone()));
                continue;
            }
            index.combos.insert(
                c.id.clone(),
                ComboEntry { combo: c.clone(), category, counterpart },
            );
        }

        (index, problems)
    }

    fn insert_dish(&mut self, d: &Dish, problems: &mut Vec<CatalogError>) {
        if self.combos.contains_key(&d.id) {
            problems.push(CatalogError::DuplicateId(d.id.clone()));
            return;
        }
        match self.dishes.get(&d.id) {
            // The same dish listed twice (e.g. a side shared by two combos) is fine.
            Some(existing) if existing.name == d.name && existing.category == d.category => {}
            Some(_) => problems.push(CatalogError::DuplicateId(d.id.clone())),
            None => {
                self.dishes.insert(d.id.clone(), d.clone());
            }
        }
    }

    pub fn lookup(&self, id: &OptionId) -> Option<OptionKind<'_>> {
        if let Some(e) = self.combos.get(id) {
            return Some(OptionKind::Combo(&e.combo));
        }
        self.dishes.get(id).map(OptionKind::Dish)
    }

    #[inline]
    pub fn is_combo(&self, id: &OptionId) -> bool {
        self.combos.contains_key(id)
    }

    /// The vegetarian dish bundled in combo `id`; `None` for non-combos and
    /// combos without a vegetarian constituent.
    pub fn vegetarian_counterpart(&self, id: &OptionId) -> Option<&Dish> {
        self.combos.get(id).and_then(|e| e.counterpart.as_ref())
    }

    /// Category of a dish or combo.
    pub fn category_of(&self, id: &OptionId) -> Option<Category> {
        if let Some(e) = self.combos.get(id) {
            return Some(e.category);
        }
        self.dishes.get(id).map(|d| d.category)
    }
}
