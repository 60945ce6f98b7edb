//! Loader: read local JSON records, validate them against the Draft 2020-12
//! schemas, map legacy field names, and decode into `mp_core` types.
//!
//! Every `load_*` has a `parse_*` twin taking an already-read `Value`, so the
//! store and the CLI share one decoding path.

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use mp_core::{
    Ballot, CandidateOption, Catalog, Category, Combo, Dish, OptionId, OptionSet, Params,
    WeeklyPlan,
};

use crate::schema::{self, SchemaKind};
use crate::{IoError, IoResult};

/// Inputs larger than this are rejected before parsing.
pub const MAX_INPUT_BYTES: u64 = 16 * 1024 * 1024;

// ----------------------------- Raw wire shapes -----------------------------

#[derive(Deserialize)]
struct RawDish {
    #[serde(default)]
    id: Option<String>,
    name: String,
    #[serde(default)]
    category: Option<Category>,
    #[serde(default)]
    vegan: bool,
}

#[derive(Deserialize)]
struct RawCombo {
    #[serde(default)]
    id: Option<String>,
    name: String,
    #[serde(default, rename = "constituentDishes", alias = "meals")]
    constituent_dishes: Vec<RawDish>,
}

#[derive(Deserialize)]
struct RawCatalog {
    #[serde(default, alias = "meals")]
    dishes: Vec<RawDish>,
    #[serde(default, alias = "meal_combinations")]
    combos: Vec<RawCombo>,
}

#[derive(Deserialize)]
struct RawOptionSet {
    #[serde(default, rename = "meatOptions", alias = "meat_options")]
    meat: Vec<CandidateOption>,
    #[serde(default, rename = "fishOptions", alias = "fish_options")]
    fish: Vec<CandidateOption>,
    #[serde(default, rename = "vegetarianOptions", alias = "vegetarian_options")]
    vegetarian: Vec<CandidateOption>,
}

/// A ballot slot as stored: a bare id, or `{id, name}` (legacy).
#[derive(Deserialize)]
#[serde(untagged)]
enum RawRef {
    Id(String),
    Obj { id: String },
}

impl RawRef {
    fn into_id(self) -> IoResult<OptionId> {
        let s = match self {
            RawRef::Id(s) | RawRef::Obj { id: s } => s,
        };
        Ok(OptionId::try_from(s)?)
    }
}

#[derive(Deserialize)]
struct RawBallot {
    #[serde(rename = "guestName", alias = "guest_name")]
    guest_name: String,
    #[serde(default, rename = "meatOptionId", alias = "meat_option")]
    meat: Option<RawRef>,
    #[serde(default, rename = "fishOptionId", alias = "fish_option")]
    fish: Option<RawRef>,
    #[serde(default, rename = "vegetarianOptionIds", alias = "vegetarian_options")]
    vegetarian: Vec<Option<RawRef>>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawBallots {
    List(Vec<RawBallot>),
    Wrapped { votes: Vec<RawBallot> },
}

#[derive(Deserialize)]
struct RawPlan {
    #[serde(default)]
    monday: Option<String>,
    #[serde(default)]
    tuesday: Option<String>,
    #[serde(default)]
    wednesday: Option<String>,
    #[serde(default)]
    thursday: Option<String>,
    #[serde(default)]
    friday: Option<String>,
    #[serde(default, rename = "generatedAt", alias = "generated_at")]
    generated_at: Option<DateTime<Utc>>,
}

// ----------------------------- Reading -----------------------------

/// Read and parse a JSON file, refusing anything over [`MAX_INPUT_BYTES`].
pub fn read_json_value_with_limits(path: &Path) -> IoResult<Value> {
    let f = File::open(path).map_err(|e| IoError::Path(format!("{}: {e}", path.display())))?;
    let len = f.metadata()?.len();
    if len > MAX_INPUT_BYTES {
        return Err(IoError::Limit(format!(
            "{} is {len} bytes (max {MAX_INPUT_BYTES})",
            path.display()
        )));
    }
    let mut buf = Vec::with_capacity(len as usize);
    f.take(MAX_INPUT_BYTES + 1).read_to_end(&mut buf)?;
    let v: Value = serde_json::from_slice(&buf).map_err(|e| IoError::Json {
        pointer: "/".into(),
        msg: format!("{}: {e}", path.display()),
    })?;
    Ok(v)
}

fn decode<T: for<'de> Deserialize<'de>>(kind: SchemaKind, v: Value) -> IoResult<T> {
    schema::validate_value(kind, &v)?;
    serde_json::from_value(v).map_err(|e| IoError::Json {
        pointer: "/".into(),
        msg: format!("{}: {e}", kind.name()),
    })
}

// ----------------------------- Catalog -----------------------------

/// Assigns ids to dishes that lack one. A name seen before keeps its id.
#[derive(Default)]
struct DishIds {
    by_name: HashMap<String, OptionId>,
}

impl DishIds {
    fn dish(&mut self, raw: RawDish) -> IoResult<Dish> {
        let id = match raw.id {
            Some(s) => OptionId::try_from(s)?,
            None => self
                .by_name
                .get(&raw.name)
                .cloned()
                .unwrap_or_else(|| OptionId::from_name(&raw.name)),
        };
        self.by_name.insert(raw.name.clone(), id.clone());
        Ok(Dish {
            id,
            name: raw.name,
            category: raw.category.unwrap_or(Category::Vegetarian),
            vegan: raw.vegan,
        })
    }
}

pub fn parse_catalog(v: Value) -> IoResult<Catalog> {
    let raw: RawCatalog = decode(SchemaKind::Catalog, v)?;
    let mut ids = DishIds::default();

    let dishes = raw
        .dishes
        .into_iter()
        .map(|d| ids.dish(d))
        .collect::<IoResult<Vec<_>>>()?;

    let mut combos = Vec::with_capacity(raw.combos.len());
    for c in raw.combos {
        let id = match c.id {
            Some(s) => OptionId::try_from(s)?,
            None => OptionId::from_name(&c.name),
        };
        let constituent_dishes = c
            .constituent_dishes
            .into_iter()
            .map(|d| ids.dish(d))
            .collect::<IoResult<Vec<_>>>()?;
        combos.push(Combo { id, name: c.name, constituent_dishes });
    }

    tracing::debug!(dishes = dishes.len(), combos = combos.len(), "catalog decoded");
    Ok(Catalog { dishes, combos })
}

pub fn load_catalog(path: &Path) -> IoResult<Catalog> {
    parse_catalog(read_json_value_with_limits(path)?)
}

// ----------------------------- Weekly options -----------------------------

pub fn parse_option_set(v: Value) -> IoResult<OptionSet> {
    let raw: RawOptionSet = decode(SchemaKind::OptionSet, v)?;
    Ok(OptionSet::new(raw.meat, raw.fish, raw.vegetarian))
}

pub fn load_option_set(path: &Path) -> IoResult<OptionSet> {
    parse_option_set(read_json_value_with_limits(path)?)
}

// ----------------------------- Ballots -----------------------------

fn ballot_from_raw(raw: RawBallot) -> IoResult<Ballot> {
    Ok(Ballot {
        guest_name: raw.guest_name,
        meat_option_id: raw.meat.map(RawRef::into_id).transpose()?,
        fish_option_id: raw.fish.map(RawRef::into_id).transpose()?,
        vegetarian_option_ids: raw
            .vegetarian
            .into_iter()
            .flatten()
            .map(RawRef::into_id)
            .collect::<IoResult<Vec<_>>>()?,
    })
}

/// Accepts a bare array or `{"votes": [...]}`.
pub fn parse_ballots(v: Value) -> IoResult<Vec<Ballot>> {
    let raw: RawBallots = decode(SchemaKind::Ballots, v)?;
    let list = match raw {
        RawBallots::List(l) | RawBallots::Wrapped { votes: l } => l,
    };
    list.into_iter().map(ballot_from_raw).collect()
}

pub fn load_ballots(path: &Path) -> IoResult<Vec<Ballot>> {
    parse_ballots(read_json_value_with_limits(path)?)
}

// ----------------------------- Params & plan -----------------------------

pub fn parse_params(v: Value) -> IoResult<Params> {
    let p: Params = decode(SchemaKind::Params, v)?;
    p.validate_domains()?;
    Ok(p)
}

pub fn load_params(path: &Path) -> IoResult<Params> {
    parse_params(read_json_value_with_limits(path)?)
}

pub fn parse_plan(v: Value) -> IoResult<WeeklyPlan> {
    let raw: RawPlan = decode(SchemaKind::Plan, v)?;
    Ok(WeeklyPlan {
        monday: raw.monday,
        tuesday: raw.tuesday,
        wednesday: raw.wednesday,
        thursday: raw.thursday,
        friday: raw.friday,
        generated_at: raw.generated_at,
    })
}

pub fn load_plan(path: &Path) -> IoResult<WeeklyPlan> {
    parse_plan(read_json_value_with_limits(path)?)
}
