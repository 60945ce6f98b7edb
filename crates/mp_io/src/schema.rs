//! Embedded JSON Schemas (Draft 2020-12) for every input record.
//!
//! Schemas check shape only and accept both the camelCase wire names and the
//! legacy snake_case names; cross-record rules (ids present in the catalog,
//! categories) are checked after decoding.

use serde_json::{json, Value};

use crate::{IoError, IoResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SchemaKind {
    Catalog,
    OptionSet,
    Ballots,
    Params,
    Plan,
}

impl SchemaKind {
    pub fn name(self) -> &'static str {
        match self {
            SchemaKind::Catalog => "catalog",
            SchemaKind::OptionSet => "weekly_options",
            SchemaKind::Ballots => "guest_votes",
            SchemaKind::Params => "params",
            SchemaKind::Plan => "meal_plan",
        }
    }

    pub fn schema(self) -> Value {
        match self {
            SchemaKind::Catalog => catalog_schema(),
            SchemaKind::OptionSet => option_set_schema(),
            SchemaKind::Ballots => ballots_schema(),
            SchemaKind::Params => params_schema(),
            SchemaKind::Plan => plan_schema(),
        }
    }
}

const ID_PATTERN: &str = "^[A-Za-z0-9_.:-]{1,64}$";
const DRAFT: &str = "https://json-schema.org/draft/2020-12/schema";

fn defs() -> Value {
    json!({
        "id": { "type": "string", "pattern": ID_PATTERN },
        "name": { "type": "string", "minLength": 1 },
        "category": { "enum": ["meat", "fish", "vegetarian"] },
        "dish": {
            "type": "object",
            "required": ["name"],
            "properties": {
                "id": { "$ref": "#/$defs/id" },
                "name": { "$ref": "#/$defs/name" },
                "category": { "$ref": "#/$defs/category" },
                "vegan": { "type": "boolean" },
                "vegetarian": { "type": "boolean" }
            }
        },
        "option": {
            "type": "object",
            "required": ["id", "name"],
            "properties": {
                "id": { "$ref": "#/$defs/id" },
                "name": { "$ref": "#/$defs/name" }
            }
        },
        "optionList": { "type": "array", "items": { "$ref": "#/$defs/option" } },
        "optionRef": {
            "oneOf": [
                { "$ref": "#/$defs/id" },
                {
                    "type": "object",
                    "required": ["id"],
                    "properties": { "id": { "$ref": "#/$defs/id" }, "name": { "type": ["string", "null"] } }
                },
                { "type": "null" }
            ]
        }
    })
}

fn catalog_schema() -> Value {
    let combo = json!({
        "type": "object",
        "required": ["name"],
        "properties": {
            "id": { "$ref": "#/$defs/id" },
            "name": { "$ref": "#/$defs/name" },
            "constituentDishes": { "type": "array", "items": { "$ref": "#/$defs/dish" } },
            "meals": { "type": "array", "items": { "$ref": "#/$defs/dish" } }
        }
    });
    json!({
        "$schema": DRAFT,
        "$defs": defs(),
        "type": "object",
        "properties": {
            "dishes": { "type": "array", "items": { "$ref": "#/$defs/dish" } },
            "meals": { "type": "array", "items": { "$ref": "#/$defs/dish" } },
            "combos": { "type": "array", "items": combo.clone() },
            "meal_combinations": { "type": "array", "items": combo }
        }
    })
}

fn option_set_schema() -> Value {
    json!({
        "$schema": DRAFT,
        "$defs": defs(),
        "type": "object",
        "properties": {
            "meatOptions": { "$ref": "#/$defs/optionList" },
            "fishOptions": { "$ref": "#/$defs/optionList" },
            "vegetarianOptions": { "$ref": "#/$defs/optionList" },
            "meat_options": { "$ref": "#/$defs/optionList" },
            "fish_options": { "$ref": "#/$defs/optionList" },
            "vegetarian_options": { "$ref": "#/$defs/optionList" }
        }
    })
}

fn ballots_schema() -> Value {
    let ballot = json!({
        "type": "object",
        "anyOf": [ { "required": ["guestName"] }, { "required": ["guest_name"] } ],
        "properties": {
            "guestName": { "type": "string" },
            "guest_name": { "type": "string" },
            "meatOptionId": { "$ref": "#/$defs/optionRef" },
            "fishOptionId": { "$ref": "#/$defs/optionRef" },
            "meat_option": { "$ref": "#/$defs/optionRef" },
            "fish_option": { "$ref": "#/$defs/optionRef" },
            "vegetarianOptionIds": { "type": "array", "items": { "$ref": "#/$defs/optionRef" } },
            "vegetarian_options": { "type": "array", "items": { "$ref": "#/$defs/optionRef" } }
        }
    });
    json!({
        "$schema": DRAFT,
        "$defs": defs(),
        "oneOf": [
            { "type": "array", "items": ballot.clone() },
            {
                "type": "object",
                "required": ["votes"],
                "properties": { "votes": { "type": "array", "items": ballot } }
            }
        ]
    })
}

fn params_schema() -> Value {
    json!({
        "$schema": DRAFT,
        "type": "object",
        "additionalProperties": false,
        "properties": {
            "conflict_policy": { "enum": ["strict", "lenient"] },
            "min_ballots": { "type": "integer", "minimum": 0, "maximum": mp_core::variables::MIN_BALLOTS_MAX },
            "strip_combo_suffix": { "type": "boolean" }
        }
    })
}

fn plan_schema() -> Value {
    let day = json!({ "type": ["string", "null"] });
    json!({
        "$schema": DRAFT,
        "type": "object",
        "properties": {
            "monday": day.clone(),
            "tuesday": day.clone(),
            "wednesday": day.clone(),
            "thursday": day.clone(),
            "friday": day,
            "generatedAt": { "type": ["string", "null"] },
            "generated_at": { "type": ["string", "null"] }
        }
    })
}

/// Validate `instance` against the schema for `kind`. Reports the first violation.
#[cfg(feature = "schemaval")]
pub fn validate_value(kind: SchemaKind, instance: &Value) -> IoResult<()> {
    use jsonschema::{Draft, JSONSchema};

    let schema = kind.schema();
    let compiled = JSONSchema::options()
        .with_draft(Draft::Draft202012)
        .compile(&schema)
        .map_err(|e| IoError::Schema {
            pointer: "/".into(),
            msg: format!("{} schema does not compile: {e}", kind.name()),
        })?;

    if let Err(mut errors) = compiled.validate(instance) {
        if let Some(err) = errors.next() {
            let ptr = err.instance_path.to_string();
            return Err(IoError::Schema {
                pointer: if ptr.is_empty() { "/".into() } else { ptr },
                msg: format!("{}: {err}", kind.name()),
            });
        }
    }
    Ok(())
}

#[cfg(not(feature = "schemaval"))]
#[inline]
pub fn validate_value(_kind: SchemaKind, _instance: &Value) -> IoResult<()> {
    Ok(())
}

#[cfg(all(test, feature = "schemaval"))]
mod tests {
    use super::*;

    #[test]
    fn catalog_accepts_both_spellings() {
        let wire = json!({
            "dishes": [{"id": "curry", "name": "Curry", "category": "vegetarian"}],
            "combos": [{"name": "Burger Combo", "constituentDishes": [{"name": "Burger", "category": "meat"}]}]
        });
        let legacy = json!({
            "meals": [{"name": "Curry", "vegetarian": true}],
            "meal_combinations": [{"id": "burger_combo", "name": "Burger Combo", "meals": [{"name": "Burger", "category": "meat"}]}]
        });
        assert!(validate_value(SchemaKind::Catalog, &wire).is_ok());
        assert!(validate_value(SchemaKind::Catalog, &legacy).is_ok());
    }

    #[test]
    fn bad_category_reports_pointer() {
        let v = json!({"dishes": [{"name": "Soup", "category": "dessert"}]});
        match validate_value(SchemaKind::Catalog, &v) {
            Err(IoError::Schema { pointer, .. }) => assert_eq!(pointer, "/dishes/0/category"),
            other => panic!("expected schema error, got {other:?}"),
        }
    }

    #[test]
    fn ballots_array_or_wrapped() {
        let arr = json!([{"guestName": "Ada", "meatOptionId": "burger_combo", "fishOptionId": "cod_combo", "vegetarianOptionIds": ["curry", "rice_bowl"]}]);
        let wrapped = json!({"votes": [{"guest_name": "Ada", "meat_option": {"id": "burger_combo", "name": "Burger Combo"}, "vegetarian_options": ["curry"]}]});
        assert!(validate_value(SchemaKind::Ballots, &arr).is_ok());
        assert!(validate_value(SchemaKind::Ballots, &wrapped).is_ok());
        assert!(validate_value(SchemaKind::Ballots, &json!([{"meatOptionId": "x"}])).is_err());
    }

    #[test]
    fn params_reject_unknown_keys() {
        assert!(validate_value(SchemaKind::Params, &json!({"conflict_policy": "lenient"})).is_ok());
        assert!(validate_value(SchemaKind::Params, &json!({"tie_seed": 3})).is_err());
        assert!(validate_value(SchemaKind::Params, &json!({"min_ballots": -1})).is_err());
    }
}
