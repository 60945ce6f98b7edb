//! mp_pipeline: deterministic pipeline surface (validate → tabulate → select → resolve → assemble → record)
//! This crate stays free of file formats: `mp_io` owns JSON, hashing and the store,
//! `mp_algo` owns the engine. Stages here wire them together and keep the audit trail.
//!
//! Two entry points per path:
//! - [`run_with_ctx`] / [`build_plan::build_manual_plan`] over an in-memory snapshot;
//! - [`run_from_store`] / [`manual_from_store`] which hold the store lock from
//!   snapshot to plan write. A failed run leaves the stored plan untouched.

#![forbid(unsafe_code)]

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use mp_algo::{CatalogIndex, ResolveError};
use mp_core::{Params, WeeklyPlan};
use mp_io::store::{Snapshot, Store};

pub mod build_plan;
pub mod build_run_record;
pub mod resolve_week;
pub mod submit;
pub mod tabulate;
pub mod validate;

pub use build_plan::ManualSelection;
pub use build_run_record::RunRecord;
pub use resolve_week::ResolutionAudit;
pub use submit::{check_ballot, submit_ballot};
pub use validate::{InputsView, Severity, ValidationIssue, ValidationReport};

/// Engine identifiers echoed into every run record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineMeta {
    pub name: String,
    pub version: String,
}

impl Default for EngineMeta {
    fn default() -> Self {
        EngineMeta { name: "menu-planner".into(), version: env!("CARGO_PKG_VERSION").into() }
    }
}

/// Pipeline context: one consistent snapshot plus the run's clock reading.
#[derive(Debug, Clone)]
pub struct PipelineCtx {
    pub snapshot: Snapshot,
    pub engine_meta: EngineMeta,
    pub generated_at: DateTime<Utc>,
}

impl PipelineCtx {
    pub fn view(&self) -> InputsView<'_> {
        InputsView {
            catalog: &self.snapshot.catalog,
            options: &self.snapshot.options,
            ballots: &self.snapshot.ballots,
            params: &self.snapshot.params,
        }
    }
}

/// Outputs of one automatic run. The engine outcome is a value, not an error:
/// a failed resolution still produces an audit and a run record.
#[derive(Debug, Clone)]
pub struct PipelineOutputs {
    pub plan: Result<WeeklyPlan, ResolveError>,
    pub audit: ResolutionAudit,
    pub run_record: RunRecord,
    /// Warnings raised by VALIDATE (errors abort before this point).
    pub validation: ValidationReport,
}

/// Single error surface for the pipeline orchestration.
#[derive(Debug)]
pub enum PipelineError {
    Io(String),
    Schema(String),
    Locked(String),
    Validate(ValidationReport),
    Resolve(ResolveError),
    Build(String),
}

impl PipelineError {
    /// Stable machine code; engine failures keep their own codes.
    pub fn code(&self) -> &'static str {
        match self {
            PipelineError::Io(_) => "io",
            PipelineError::Schema(_) => "schema",
            PipelineError::Locked(_) => "locked",
            PipelineError::Validate(_) => "validation",
            PipelineError::Resolve(e) => e.code(),
            PipelineError::Build(_) => "build",
        }
    }
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::Io(m) => write!(f, "io: {m}"),
            PipelineError::Schema(m) => write!(f, "schema: {m}"),
            PipelineError::Locked(m) => f.write_str(m),
            PipelineError::Validate(r) => {
                let n = r.errors().count();
                match r.errors().next() {
                    Some(first) if n > 1 => write!(f, "validation failed ({n} errors); first: {first}"),
                    Some(first) => write!(f, "validation failed: {first}"),
                    None => f.write_str("validation failed"),
                }
            }
            PipelineError::Resolve(e) => write!(f, "{e}"),
            PipelineError::Build(m) => write!(f, "build: {m}"),
        }
    }
}

impl std::error::Error for PipelineError {}

impl From<mp_io::IoError> for PipelineError {
    fn from(e: mp_io::IoError) -> Self {
        use mp_io::IoError as E;
        match e {
            E::Schema { pointer, msg } => PipelineError::Schema(format!("{pointer}: {msg}")),
            E::Json { pointer, msg } => PipelineError::Schema(format!("json {pointer}: {msg}")),
            E::Invalid(m) => PipelineError::Schema(format!("invalid: {m}")),
            e @ E::Locked(_) => PipelineError::Locked(e.to_string()),
            E::Hash(m) => PipelineError::Build(format!("hash: {m}")),
            E::Path(m) => PipelineError::Io(format!("path: {m}")),
            E::Limit(m) => PipelineError::Io(format!("limit: {m}")),
        }
    }
}

impl From<ResolveError> for PipelineError {
    fn from(e: ResolveError) -> Self {
        PipelineError::Resolve(e)
    }
}

// -------------------------------------- Public API --------------------------------------

/// TABULATE → SELECT/RESOLVE → ASSEMBLE. Fills `audit` as it goes.
fn run_engine(
    ctx: &PipelineCtx,
    index: &CatalogIndex,
    audit: &mut ResolutionAudit,
) -> Result<WeeklyPlan, ResolveError> {
    let snap = &ctx.snapshot;
    audit.ballot_count = snap.ballots.len() as u64;

    let t = tabulate::tabulate(&snap.ballots, &snap.params)?;
    audit.record_tally(&t);

    let picks = resolve_week::resolve_week(index, &snap.options, &t, snap.params.conflict_policy, audit)?;
    build_plan::build_plan(&picks, ctx.generated_at)
}

/// Orchestrate an automatic run over a preloaded snapshot.
pub fn run_with_ctx(ctx: &PipelineCtx) -> Result<PipelineOutputs, PipelineError> {
    let view = ctx.view();

    // --- VALIDATE ---
    let validation = validate::validate(&view);
    if !validation.pass {
        return Err(PipelineError::Validate(validation));
    }
    for w in validation.warnings() {
        tracing::debug!(code = w.code, at = %w.where_, "{}", w.message);
    }

    let index = CatalogIndex::build(&ctx.snapshot.catalog)
        .map_err(|e| PipelineError::Build(format!("catalog index: {e}")))?;

    // --- ENGINE ---
    let mut audit = resolve_week::ResolutionAudit::new(ctx.snapshot.params.conflict_policy);
    let plan = run_engine(ctx, &index, &mut audit);

    // --- RUN RECORD ---
    let run_record = build_run_record::build_run_record(
        &view,
        &ctx.engine_meta,
        ctx.generated_at,
        &audit,
        plan.as_ref(),
    )?;

    match &plan {
        Ok(_) => tracing::info!(run = %run_record.id, tier = audit.tier.as_deref().unwrap_or("none"), "plan resolved"),
        Err(e) => tracing::info!(run = %run_record.id, code = e.code(), "resolution failed: {e}"),
    }

    Ok(PipelineOutputs { plan, audit, run_record, validation })
}

/// Lock the store, snapshot it, run, and publish the plan on success.
///
/// `params` replaces the stored params when given (CLI overrides).
pub fn run_from_store(
    store: &Store,
    params: Option<Params>,
    engine_meta: EngineMeta,
    generated_at: DateTime<Utc>,
) -> Result<PipelineOutputs, PipelineError> {
    let lock = store.lock()?;
    let mut snapshot = store.snapshot()?;
    if let Some(p) = params {
        snapshot.params = p;
    }

    let ctx = PipelineCtx { snapshot, engine_meta, generated_at };
    let out = run_with_ctx(&ctx)?;
    if let Ok(plan) = &out.plan {
        store.write_plan(&lock, plan)?;
    }
    Ok(out)
}

/// Manual path against the store. The plan is written only if it passes both checks.
pub fn manual_from_store(
    store: &Store,
    selection: &ManualSelection,
    generated_at: DateTime<Utc>,
) -> Result<WeeklyPlan, PipelineError> {
    let lock = store.lock()?;
    let options = store.options()?;
    let plan = build_plan::build_manual_plan(&options, selection, generated_at)?;
    store.write_plan(&lock, &plan)?;
    Ok(plan)
}
