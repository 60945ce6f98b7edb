//! File-backed store: one canonical JSON file per record in a data directory.
//!
//! ```text
//! <root>/catalog.json         dishes + combos
//! <root>/weekly_options.json  this week's candidates
//! <root>/guest_votes.json     ballots (array)
//! <root>/meal_plan.json       last published plan
//! <root>/params.json          optional run parameters
//! <root>/.lock                held while mutating
//! ```
//!
//! Missing files read as the empty default. Every mutation requires a
//! [`StoreLock`], which serializes writers across processes.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use serde_json::Value;

use mp_core::{Ballot, Catalog, OptionSet, Params, WeeklyPlan};

use crate::canonical_json::write_canonical;
use crate::loader;
use crate::{IoError, IoResult};

pub const CATALOG_FILE: &str = "catalog.json";
pub const OPTIONS_FILE: &str = "weekly_options.json";
pub const BALLOTS_FILE: &str = "guest_votes.json";
pub const PLAN_FILE: &str = "meal_plan.json";
pub const PARAMS_FILE: &str = "params.json";
pub const LOCK_FILE: &str = ".lock";

/// Exclusive writer lock on a data directory. Released on drop.
#[derive(Debug)]
pub struct StoreLock {
    path: PathBuf,
}

impl StoreLock {
    fn acquire(root: &Path) -> IoResult<Self> {
        let path = root.join(LOCK_FILE);
        match Self::create(&path) {
            Err(IoError::Locked(_)) if Self::cleanup_stale(&path)? => Self::create(&path),
            other => other,
        }
    }

    fn create(path: &Path) -> IoResult<Self> {
        let io_err = |e: std::io::Error| IoError::Path(format!("{}: {e}", path.display()));
        match OpenOptions::new().write(true).create_new(true).open(path) {
            Ok(mut f) => {
                let lock = StoreLock { path: path.to_path_buf() };
                // Dropping `lock` on failure removes the half-written file.
                writeln!(f, "{}", std::process::id()).map_err(io_err)?;
                Ok(lock)
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                tracing::warn!(lock = %path.display(), "data directory is locked");
                Err(IoError::Locked(path.to_path_buf()))
            }
            Err(e) => Err(io_err(e)),
        }
    }

    /// Removes the lock when the process that wrote it is gone.
    ///
    /// Returns `Ok(true)` if a stale lock was removed. A lock without a
    /// readable pid counts as held.
    fn cleanup_stale(path: &Path) -> IoResult<bool> {
        let contents = match fs::read_to_string(path) {
            Ok(s) => s,
            // Released between our attempt and this read.
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(true),
            Err(e) => return Err(IoError::Path(format!("{}: {e}", path.display()))),
        };
        let Ok(pid) = contents.trim().parse::<u32>() else {
            return Ok(false);
        };
        if pid == std::process::id() || is_process_running(pid) {
            return Ok(false);
        }
        tracing::warn!(lock = %path.display(), pid, "removing stale lock (process no longer running)");
        match fs::remove_file(path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(true),
            Err(e) => Err(IoError::Path(format!("{}: {e}", path.display()))),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            tracing::warn!(lock = %self.path.display(), error = %e, "failed to release lock");
        }
    }
}

/// Whether a process with this pid exists.
#[cfg(unix)]
pub fn is_process_running(pid: u32) -> bool {
    use std::process::{Command, Stdio};

    // Signal 0 checks existence without delivering anything.
    Command::new("kill")
        .arg("-0")
        .arg(pid.to_string())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Without a portable check, every recorded pid is treated as alive.
#[cfg(not(unix))]
pub fn is_process_running(_pid: u32) -> bool {
    true
}

/// Everything a resolution run reads, taken in one go.
#[derive(Clone, Debug, Default)]
pub struct Snapshot {
    pub catalog: Catalog,
    pub options: OptionSet,
    pub ballots: Vec<Ballot>,
    pub params: Params,
}

#[derive(Clone, Debug)]
pub struct Store {
    root: PathBuf,
}

impl Store {
    /// Open (and create if needed) the data directory at `root`.
    pub fn open(root: impl Into<PathBuf>) -> IoResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|e| IoError::Path(format!("{}: {e}", root.display())))?;
        Ok(Store { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_of(&self, file: &str) -> PathBuf {
        self.root.join(file)
    }

    pub fn lock(&self) -> IoResult<StoreLock> {
        StoreLock::acquire(&self.root)
    }

    fn check_lock(&self, lock: &StoreLock) -> IoResult<()> {
        if lock.path != self.root.join(LOCK_FILE) {
            return Err(IoError::Invalid(format!(
                "lock {} does not belong to {}",
                lock.path.display(),
                self.root.display()
            )));
        }
        Ok(())
    }

    fn read_or_default<T: Default>(
        &self,
        file: &str,
        parse: impl FnOnce(Value) -> IoResult<T>,
    ) -> IoResult<T> {
        let p = self.path_of(file);
        if !p.exists() {
            return Ok(T::default());
        }
        parse(loader::read_json_value_with_limits(&p)?)
    }

    // ----------------------------- Reads -----------------------------

    pub fn catalog(&self) -> IoResult<Catalog> {
        self.read_or_default(CATALOG_FILE, loader::parse_catalog)
    }

    pub fn options(&self) -> IoResult<OptionSet> {
        self.read_or_default(OPTIONS_FILE, loader::parse_option_set)
    }

    pub fn ballots(&self) -> IoResult<Vec<Ballot>> {
        self.read_or_default(BALLOTS_FILE, loader::parse_ballots)
    }

    pub fn plan(&self) -> IoResult<WeeklyPlan> {
        self.read_or_default(PLAN_FILE, loader::parse_plan)
    }

    pub fn params(&self) -> IoResult<Params> {
        self.read_or_default(PARAMS_FILE, loader::parse_params)
    }

    /// Read catalog, options, ballots and params. Callers that go on to write
    /// a plan should hold the lock while taking the snapshot.
    pub fn snapshot(&self) -> IoResult<Snapshot> {
        Ok(Snapshot {
            catalog: self.catalog()?,
            options: self.options()?,
            ballots: self.ballots()?,
            params: self.params()?,
        })
    }

    // ----------------------------- Writes -----------------------------

    /// Install a new catalog generation. Options, ballots and the plan refer to
    /// the old generation and are cleared.
    pub fn replace_catalog(&self, lock: &StoreLock, catalog: &Catalog) -> IoResult<()> {
        self.check_lock(lock)?;
        write_canonical(&self.path_of(CATALOG_FILE), catalog)?;
        self.clear_weekly(lock)?;
        tracing::info!(
            dishes = catalog.dishes.len(),
            combos = catalog.combos.len(),
            "catalog replaced; weekly data cleared"
        );
        Ok(())
    }

    pub fn write_options(&self, lock: &StoreLock, options: &OptionSet) -> IoResult<()> {
        self.check_lock(lock)?;
        write_canonical(&self.path_of(OPTIONS_FILE), options)
    }

    pub fn write_ballots(&self, lock: &StoreLock, ballots: &[Ballot]) -> IoResult<()> {
        self.check_lock(lock)?;
        write_canonical(&self.path_of(BALLOTS_FILE), &ballots)
    }

    /// Append one ballot; returns the new ballot count.
    pub fn append_ballot(&self, lock: &StoreLock, ballot: Ballot) -> IoResult<usize> {
        self.check_lock(lock)?;
        let mut all = self.ballots()?;
        all.push(ballot);
        self.write_ballots(lock, &all)?;
        Ok(all.len())
    }

    pub fn write_plan(&self, lock: &StoreLock, plan: &WeeklyPlan) -> IoResult<()> {
        self.check_lock(lock)?;
        write_canonical(&self.path_of(PLAN_FILE), plan)
    }

    pub fn write_params(&self, lock: &StoreLock, params: &Params) -> IoResult<()> {
        self.check_lock(lock)?;
        params.validate_domains()?;
        write_canonical(&self.path_of(PARAMS_FILE), params)
    }

    /// Clear options, ballots and plan. The catalog is kept.
    pub fn reset(&self, lock: &StoreLock) -> IoResult<()> {
        self.check_lock(lock)?;
        self.clear_weekly(lock)?;
        tracing::info!(root = %self.root.display(), "weekly data reset");
        Ok(())
    }

    fn clear_weekly(&self, lock: &StoreLock) -> IoResult<()> {
        self.write_options(lock, &OptionSet::default())?;
        self.write_ballots(lock, &[])?;
        self.write_plan(lock, &WeeklyPlan::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_store_reads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path().join("data")).unwrap();
        assert_eq!(store.catalog().unwrap(), Catalog::default());
        assert!(store.options().unwrap().is_empty());
        assert!(store.ballots().unwrap().is_empty());
        assert!(store.plan().unwrap().is_empty());
        assert_eq!(store.params().unwrap(), Params::default());
    }

    #[test]
    fn lock_is_exclusive_and_released_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path()).unwrap();
        let lock = store.lock().unwrap();
        assert!(matches!(store.lock(), Err(IoError::Locked(_))));
        drop(lock);
        assert!(store.lock().is_ok());
    }

    #[cfg(unix)]
    #[test]
    fn running_process_detection() {
        assert!(is_process_running(std::process::id()));
        assert!(!is_process_running(4_194_304));
    }

    #[test]
    fn foreign_lock_is_rejected() {
        let a = tempfile::tempdir().unwrap();
        let b = tempfile::tempdir().unwrap();
        let sa = Store::open(a.path()).unwrap();
        let sb = Store::open(b.path()).unwrap();
        let lock_b = sb.lock().unwrap();
        assert!(matches!(sa.write_ballots(&lock_b, &[]), Err(IoError::Invalid(_))));
    }
}
