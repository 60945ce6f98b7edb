//! crates/mp_core/src/ids.rs
//! Option tokens shared by dishes and combos, plus name→id derivation.
//! Deterministic, ASCII-only, strict shapes; no I/O.

use core::fmt;
use core::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::errors::CoreError;

const TOKEN_MAX_LEN: usize = 64;

/// Token for OptionId: ^[A-Za-z0-9_.:-]{1,64}$ (ASCII only)
#[inline]
pub fn is_valid_token(s: &str) -> bool {
    let bs = s.as_bytes();
    let len = bs.len();
    if len == 0 || len > TOKEN_MAX_LEN {
        return false;
    }
    bs.iter().all(|&b| {
        b.is_ascii_alphanumeric() || b == b'_' || b == b'.' || b == b':' || b == b'-'
    })
}

/// Identifier of a dish or combo. Unique within one catalog generation.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "String", into = "String"))]
pub struct OptionId(String);

impl OptionId {
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Derive an id from a display name: lowercase, runs of anything that is
    /// not `[a-z0-9]` collapse to one `_`, no leading/trailing `_`.
    /// An empty result maps to `"unknown"`.
    pub fn from_name(name: &str) -> OptionId {
        let mut out = String::with_capacity(name.len());
        let mut pending_sep = false;
        for c in name.trim().chars().flat_map(char::to_lowercase) {
            if c.is_ascii_lowercase() || c.is_ascii_digit() {
                if pending_sep && !out.is_empty() {
                    out.push('_');
                }
                pending_sep = false;
                out.push(c);
            } else {
                pending_sep = true;
            }
        }
        out.truncate(TOKEN_MAX_LEN);
        while out.ends_with('_') {
            out.pop();
        }
        if out.is_empty() {
            out.push_str("unknown");
        }
        OptionId(out)
    }
}

impl fmt::Display for OptionId {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for OptionId {
    type Err = CoreError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if is_valid_token(s) {
            Ok(OptionId(s.to_owned()))
        } else {
            Err(CoreError::InvalidId(s.to_owned()))
        }
    }
}

impl TryFrom<String> for OptionId {
    type Error = CoreError;
    fn try_from(value: String) -> Result<Self, Self::Error> {
        if is_valid_token(&value) {
            Ok(OptionId(value))
        } else {
            Err(CoreError::InvalidId(value))
        }
    }
}

impl TryFrom<&str> for OptionId {
    type Error = CoreError;
    #[inline]
    fn try_from(value: &str) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<OptionId> for String {
    fn from(id: OptionId) -> String {
        id.0
    }
}

impl AsRef<str> for OptionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
