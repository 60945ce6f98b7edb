//! crates/mp_io/src/hasher.rs
//!
//! SHA-256 digests and run ids.
//!
//! - `sha256_canonical(..)` for JSON values/structs (goes through canonical_json).
//! - `sha256_hex(..)` / `sha256_file(..)` for raw bytes.
//! - `RUN:<timestamp>-<hex>` uses RFC3339 UTC seconds plus the hash of the
//!   canonical run payload.
//!
//! Hex digests are lowercase.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::canonical_json::{to_canonical_bytes, to_canonical_bytes_of};
use crate::IoResult;

/// SHA-256 over raw bytes.
pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// SHA-256 over a file's raw bytes.
pub fn sha256_file(path: &Path) -> IoResult<String> {
    let mut r = BufReader::new(File::open(path)?);
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; 64 * 1024];
    loop {
        let n = r.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// SHA-256 over the canonical JSON bytes of any serializable value.
pub fn sha256_canonical<T: Serialize>(value: &T) -> IoResult<String> {
    Ok(sha256_hex(&to_canonical_bytes_of(value)?))
}

/// SHA-256 over an already-parsed JSON value.
pub fn sha256_canonical_value(v: &Value) -> IoResult<String> {
    Ok(sha256_hex(&to_canonical_bytes(v)?))
}

/// Canonical RFC3339 UTC with whole seconds and a trailing `Z`.
pub fn rfc3339_seconds(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// `RUN:<timestamp>-<hex>` from the canonical bytes of `payload`.
pub fn run_id<T: Serialize>(generated_at: &DateTime<Utc>, payload: &T) -> IoResult<String> {
    let hex = sha256_canonical(payload)?;
    Ok(format!("RUN:{}-{hex}", rfc3339_seconds(generated_at)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn hex_encoding_is_lowercase() {
        let h = sha256_hex(b"abc");
        assert_eq!(h, "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad");
    }

    #[test]
    fn canonical_hash_ignores_key_order() {
        let a = json!({"monday": "Burger Combo", "friday": null});
        let b = json!({"friday": null, "monday": "Burger Combo"});
        assert_eq!(sha256_canonical_value(&a).unwrap(), sha256_canonical_value(&b).unwrap());
        assert_eq!(sha256_canonical(&a).unwrap(), sha256_canonical_value(&a).unwrap());
    }

    #[test]
    fn run_id_shape() {
        let ts = Utc.with_ymd_and_hms(2025, 3, 3, 9, 30, 0).unwrap();
        let id = run_id(&ts, &json!({"k": 1})).unwrap();
        assert!(id.starts_with("RUN:2025-03-03T09:30:00Z-"));
        assert_eq!(id.len(), "RUN:2025-03-03T09:30:00Z-".len() + 64);
    }

    #[test]
    fn file_hash_matches_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("x.json");
        std::fs::write(&p, b"{\"a\":1}").unwrap();
        assert_eq!(sha256_file(&p).unwrap(), sha256_hex(b"{\"a\":1}"));
    }
}
