// crates/mp_pipeline/src/build_run_record.rs
//
// Provenance for one resolution run.
//
// - Input digests are SHA-256 over the canonical JSON (sorted keys, compact)
//   of the typed catalog, option set and ballot list, so legacy spellings of
//   the same data hash identically.
// - Run ID = "RUN:<generatedAt>-<sha256>" where the hash covers every field of
//   the record except `id` itself.
// - Failed runs get a record too; `outcome` then carries the failure code.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use mp_algo::ResolveError;
use mp_core::{Params, WeeklyPlan};
use mp_io::hasher::{rfc3339_seconds, run_id, sha256_canonical};
use mp_io::IoResult;

use crate::resolve_week::ResolutionAudit;
use crate::validate::InputsView;
use crate::EngineMeta;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunRecord {
    pub id: String,            // "RUN:<ts>-<hex64>"
    pub generated_at: String,  // RFC3339, seconds, Z
    pub engine: EngineMeta,
    pub params: Params,
    pub inputs: RunInputs,
    pub outcome: RunOutcome,
    pub audit: ResolutionAudit,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunInputs {
    pub catalog_sha256: String,
    pub options_sha256: String,
    pub ballots_sha256: String,
    pub ballot_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunOutcome {
    /// "ok" | "failed"
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub plan_sha256: Option<String>,
    /// Stable failure code (`no_candidate`, ...).
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub failure: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub message: Option<String>,
}

impl RunOutcome {
    pub fn is_ok(&self) -> bool {
        self.status == "ok"
    }
}

pub fn digest_inputs(inputs: &InputsView<'_>) -> IoResult<RunInputs> {
    Ok(RunInputs {
        catalog_sha256: sha256_canonical(inputs.catalog)?,
        options_sha256: sha256_canonical(inputs.options)?,
        ballots_sha256: sha256_canonical(&inputs.ballots)?,
        ballot_count: inputs.ballots.len() as u64,
    })
}

fn outcome_of(result: Result<&WeeklyPlan, &ResolveError>) -> IoResult<RunOutcome> {
    Ok(match result {
        Ok(plan) => RunOutcome {
            status: "ok".into(),
            plan_sha256: Some(sha256_canonical(plan)?),
            failure: None,
            message: None,
        },
        Err(e) => RunOutcome {
            status: "failed".into(),
            plan_sha256: None,
            failure: Some(e.code().to_string()),
            message: Some(e.to_string()),
        },
    })
}

/// Assemble the record and derive its id.
pub fn build_run_record(
    inputs: &InputsView<'_>,
    engine: &EngineMeta,
    generated_at: DateTime<Utc>,
    audit: &ResolutionAudit,
    result: Result<&WeeklyPlan, &ResolveError>,
) -> IoResult<RunRecord> {
    #[derive(Serialize)]
    #[serde(rename_all = "camelCase")]
    struct RecordNoId<'a> {
        generated_at: &'a str,
        engine: &'a EngineMeta,
        params: &'a Params,
        inputs: &'a RunInputs,
        outcome: &'a RunOutcome,
        audit: &'a ResolutionAudit,
    }

    let generated = rfc3339_seconds(&generated_at);
    let run_inputs = digest_inputs(inputs)?;
    let outcome = outcome_of(result)?;

    let id = run_id(
        &generated_at,
        &RecordNoId {
            generated_at: &generated,
            engine,
            params: inputs.params,
            inputs: &run_inputs,
            outcome: &outcome,
            audit,
        },
    )?;

    Ok(RunRecord {
        id,
        generated_at: generated,
        engine: engine.clone(),
        params: inputs.params.clone(),
        inputs: run_inputs,
        outcome,
        audit: audit.clone(),
    })
}
