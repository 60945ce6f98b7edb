//! variables.rs
//! Run parameters with safe defaults, wire tokens, and domain checks.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::errors::CoreError;

// ------------ Macros ------------

/// Define an enum with explicit wire tokens plus `as_str`/`FromStr`.
macro_rules! serde_enum {
    ($(#[$meta:meta])* $name:ident => { $($variant:ident = $token:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
        pub enum $name {
            $(
                #[cfg_attr(feature = "serde", serde(rename = $token))]
                $variant,
            )+
        }

        impl $name {
            pub fn as_str(self) -> &'static str {
                match self {
                    $( $name::$variant => $token, )+
                }
            }
        }

        impl core::str::FromStr for $name {
            type Err = CoreError;
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $( $token => Ok($name::$variant), )+
                    _ => Err(CoreError::DomainOutOfRange(stringify!($name))),
                }
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

// ------------ Canonical enums (wire tokens explicit) ------------

serde_enum!(
    /// What to do when the widest fallback tier still leaves a combo's
    /// counterpart among the vegetarian picks.
    ConflictPolicy => {
        Strict  = "strict",
        Lenient = "lenient"
    }
);

impl Default for ConflictPolicy {
    fn default() -> Self {
        ConflictPolicy::Strict
    }
}

/// Upper bound for `min_ballots`; anything larger is a typo, not a quorum.
pub const MIN_BALLOTS_MAX: u32 = 100_000;

// ------------ Params ------------
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default, deny_unknown_fields))]
pub struct Params {
    /// Enters the engine.
    pub conflict_policy: ConflictPolicy,
    /// Automatic resolution refuses to run on fewer ballots.
    pub min_ballots: u32,

    // Presentation only; never affects stored plan names.
    pub strip_combo_suffix: bool,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            conflict_policy: ConflictPolicy::Strict,
            min_ballots: 0,
            strip_combo_suffix: true,
        }
    }
}

impl Params {
    /// Validate numeric domains.
    pub fn validate_domains(&self) -> Result<(), CoreError> {
        if self.min_ballots > MIN_BALLOTS_MAX {
            return Err(CoreError::DomainOutOfRange("min_ballots"));
        }
        Ok(())
    }

    #[inline]
    pub fn is_strict(&self) -> bool {
        self.conflict_policy == ConflictPolicy::Strict
    }
}
