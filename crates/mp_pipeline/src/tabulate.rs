//! crates/mp_pipeline/src/tabulate.rs
//! TABULATE stage: ballots → [`VoteTally`], gated by `min_ballots`.

use mp_algo::{tally, ResolveError, VoteTally};
use mp_core::{Ballot, Params};

/// Tally `ballots`, refusing to proceed below the configured minimum.
pub fn tabulate(ballots: &[Ballot], params: &Params) -> Result<VoteTally, ResolveError> {
    let required = u64::from(params.min_ballots);
    let found = ballots.len() as u64;
    if found < required {
        tracing::info!(required, found, "not enough ballots to resolve");
        return Err(ResolveError::InsufficientVotes { required, found });
    }
    Ok(tally(ballots))
}
