// crates/mp_cli/src/args.rs
//
// Argument surface for `mp`. One data directory per invocation; every
// subcommand reads or writes the store under it.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};

use mp_core::{ConflictPolicy, OptionId};

#[derive(Debug, Parser, Clone)]
#[command(
    name = "mp",
    version,
    disable_help_subcommand = true,
    about = "Offline, deterministic weekly menu planner"
)]
pub struct Args {
    /// Data directory holding catalog, options, votes and plan.
    #[arg(long, global = true, default_value = "data")]
    pub data_dir: PathBuf,

    /// More logging (-v debug, -vv trace with targets, -vvv thread ids and lines).
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Only warnings and errors on stderr; no summaries on stdout.
    #[arg(long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Install a catalog. Clears weekly options, votes and the plan.
    Init {
        /// Catalog JSON (dishes + combos).
        catalog: PathBuf,
    },

    /// Set this week's options.
    Options {
        /// Option set JSON (meat, fish, vegetarian).
        file: PathBuf,
    },

    /// Record a guest vote.
    Vote(VoteArgs),

    /// Vote counts per category, plus the current plan if one exists.
    Results {
        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,
        /// Write to this file instead of stdout.
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Resolve the weekly plan from the votes.
    Plan(PlanArgs),

    /// Set the plan by hand.
    Manual(ManualArgs),

    /// Print the stored plan.
    Show {
        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Clear options, votes and plan. The catalog is kept.
    Reset,

    /// Check the stored catalog, options, votes and params.
    Validate,
}

#[derive(Debug, clap::Args, Clone)]
pub struct VoteArgs {
    /// Guest name (must be unique this week).
    #[arg(long, required_unless_present = "file")]
    pub name: Option<String>,
    #[arg(long, value_parser = parse_option_id, requires = "name")]
    pub meat: Option<OptionId>,
    #[arg(long, value_parser = parse_option_id, requires = "name")]
    pub fish: Option<OptionId>,
    /// Vegetarian choice; give exactly two.
    #[arg(long = "veg", value_parser = parse_option_id, requires = "name")]
    pub vegetarian: Vec<OptionId>,
    /// Submit every ballot in a ballots JSON file, in order.
    #[arg(long, conflicts_with_all = ["name", "meat", "fish", "vegetarian"])]
    pub file: Option<PathBuf>,
}

#[derive(Debug, clap::Args, Clone)]
pub struct PlanArgs {
    /// Params JSON used instead of the stored params.
    #[arg(long)]
    pub params: Option<PathBuf>,
    /// Overrides `conflict_policy`.
    #[arg(long, value_parser = parse_policy)]
    pub conflict_policy: Option<ConflictPolicy>,
    /// Overrides `min_ballots`.
    #[arg(long)]
    pub min_ballots: Option<u32>,
    /// Generation time stamped on the plan (RFC 3339). Defaults to now.
    #[arg(long, value_parser = parse_timestamp)]
    pub timestamp: Option<DateTime<Utc>>,
    /// Also write the run record (canonical JSON) to this path.
    #[arg(long)]
    pub record: Option<PathBuf>,
}

#[derive(Debug, clap::Args, Clone)]
pub struct ManualArgs {
    #[arg(long, value_parser = parse_option_id)]
    pub monday: OptionId,
    #[arg(long, value_parser = parse_option_id)]
    pub tuesday: OptionId,
    #[arg(long, value_parser = parse_option_id)]
    pub wednesday: OptionId,
    #[arg(long, value_parser = parse_option_id)]
    pub thursday: OptionId,
    #[arg(long, value_parser = parse_timestamp)]
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Text,
    Json,
    Html,
}

pub fn parse_option_id(s: &str) -> Result<OptionId, String> {
    s.trim().parse::<OptionId>().map_err(|e| e.to_string())
}

pub fn parse_policy(s: &str) -> Result<ConflictPolicy, String> {
    s.trim()
        .parse::<ConflictPolicy>()
        .map_err(|_| format!("expected `strict` or `lenient`, got {s:?}"))
}

/// RFC 3339 with any offset; normalised to UTC.
pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(s.trim())
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| format!("invalid RFC 3339 timestamp {s:?}: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use clap::CommandFactory;

    #[test]
    fn command_definition_is_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn timestamps_normalise_to_utc() {
        let t = parse_timestamp("2025-03-03T10:00:00+01:00").unwrap();
        assert_eq!(t, Utc.with_ymd_and_hms(2025, 3, 3, 9, 0, 0).unwrap());
        assert!(parse_timestamp("monday").is_err());
    }

    #[test]
    fn policy_tokens() {
        assert_eq!(parse_policy("lenient"), Ok(ConflictPolicy::Lenient));
        assert!(parse_policy("loose").unwrap_err().contains("strict"));
    }

    #[test]
    fn vote_flags_parse() {
        let a = Args::try_parse_from([
            "mp", "--data-dir", "/tmp/d", "vote", "--name", "Ada", "--meat", "burger_combo", "--fish",
            "cod_combo", "--veg", "curry", "--veg", "rice_bowl",
        ])
        .unwrap();
        match a.command {
            Command::Vote(v) => {
                assert_eq!(v.name.as_deref(), Some("Ada"));
                assert_eq!(v.vegetarian.len(), 2);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn vote_needs_name_or_file() {
        assert!(Args::try_parse_from(["mp", "vote", "--meat", "burger_combo"]).is_err());
        assert!(Args::try_parse_from(["mp", "vote", "--file", "b.json", "--name", "Ada"]).is_err());
    }
}
