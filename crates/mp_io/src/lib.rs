//! crates/mp_io/src/lib.rs
//! Files in, files out.
//!
//! - `loader`: read JSON (size-limited), validate against Draft 2020-12 schemas,
//!   map legacy field names, derive missing ids, decode into `mp_core` types.
//! - `canonical_json`: sorted keys, compact, atomic writes.
//! - `hasher`: SHA-256 over canonical bytes, `RUN:` ids.
//! - `store`: the data directory (catalog, weekly options, ballots, plan) with
//!   a single-writer lock.
//!
//! One shared error type, [`IoError`], with `From` conversions used across modules.

#![forbid(unsafe_code)]

use std::path::PathBuf;

use thiserror::Error;

/// Unified error for mp_io.
#[derive(Debug, Error)]
pub enum IoError {
    /// Filesystem / path errors (open, create_dir_all, rename, fsync).
    #[error("io/path error: {0}")]
    Path(String),

    /// JSON parse/decode errors with a JSON Pointer where known.
    #[error("json error at {pointer}: {msg}")]
    Json { pointer: String, msg: String },

    /// JSON Schema validation failures (first failing instance path).
    #[error("schema error at {pointer}: {msg}")]
    Schema { pointer: String, msg: String },

    /// Hashing / canonicalization problems.
    #[error("hash error: {0}")]
    Hash(String),

    /// Input is well-formed JSON but violates a domain rule.
    #[error("invalid: {0}")]
    Invalid(String),

    /// Input exceeds the configured read limit.
    #[error("limit exceeded: {0}")]
    Limit(String),

    /// Another writer holds the store lock.
    #[error("data directory is locked by another process ({})", .0.display())]
    Locked(PathBuf),
}

pub type IoResult<T> = Result<T, IoError>;

/* ---------------- From conversions (used by file modules) ---------------- */

impl From<std::io::Error> for IoError {
    fn from(e: std::io::Error) -> Self {
        IoError::Path(e.to_string())
    }
}

impl From<serde_json::Error> for IoError {
    fn from(e: serde_json::Error) -> Self {
        // serde_json reports line/column, not a pointer.
        IoError::Json { pointer: "/".to_string(), msg: e.to_string() }
    }
}

impl From<mp_core::CoreError> for IoError {
    fn from(e: mp_core::CoreError) -> Self {
        IoError::Invalid(e.to_string())
    }
}

pub mod canonical_json;
pub mod hasher;
pub mod loader;
pub mod schema;
pub mod store;

pub mod prelude {
    pub use crate::canonical_json::{to_canonical_bytes, write_canonical_file};
    pub use crate::hasher::{run_id, sha256_canonical, sha256_hex};
    pub use crate::store::{Store, StoreLock};
    pub use crate::{IoError, IoResult};
}
