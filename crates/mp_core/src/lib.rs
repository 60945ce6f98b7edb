//! mp_core: core types, domains and ordering helpers for the menu planner.
//!
//! This crate is **I/O-free**. It defines the stable types used across the
//! workspace (`mp_algo`, `mp_io`, `mp_pipeline`, `mp_report`, `mp_cli`).
//!
//! - Option tokens: `OptionId` (dishes and combos share one id space)
//! - Catalog entities: `Dish`, `Combo`, `Catalog`
//! - Weekly inputs: `CandidateOption`, `OptionSet`, `Ballot`
//! - Output: `WeeklyPlan` (Mon–Thu assigned, Friday is leftovers)
//! - Params: `ConflictPolicy`, `min_ballots`, display toggles
//! - Deterministic ordering helpers (stable rank by count, dedup by id)
//!
//! Serialization derives are gated behind the `serde` feature.

#![forbid(unsafe_code)]

pub mod errors {
    use core::fmt;

    /// Minimal error set for core-domain validation & parsing.
    #[derive(Clone, Debug, Eq, PartialEq)]
    pub enum CoreError {
        InvalidId(String),
        EmptyName,
        DomainOutOfRange(&'static str),
    }

    impl fmt::Display for CoreError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            match self {
                CoreError::InvalidId(s) => write!(f, "invalid option id: {s:?}"),
                CoreError::EmptyName => write!(f, "empty name"),
                CoreError::DomainOutOfRange(k) => write!(f, "domain out of range: {k}"),
            }
        }
    }

    impl std::error::Error for CoreError {}
}

pub mod determinism;
pub mod entities;
pub mod ids;
pub mod variables;

pub use entities::{
    Ballot, CandidateOption, Catalog, Category, Combo, Dish, OptionSet, Weekday, WeeklyPlan,
};
pub use errors::CoreError;
pub use ids::OptionId;
pub use variables::{ConflictPolicy, Params};
