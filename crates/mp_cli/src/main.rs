// crates/mp_cli/src/main.rs
//
// `mp`: exit codes, typed error mapping, logging setup and subcommand dispatch.
// All state lives in the data directory; every mutation goes through the store lock.

mod args;

mod exitcodes {
    pub const OK: i32 = 0;
    /// Usage errors (clap exits with 2 itself), schema and validation failures.
    pub const VALIDATION: i32 = 2;
    /// The engine could not produce a plan.
    pub const RESOLUTION: i32 = 3;
    /// Read/write failures and a held lock.
    pub const IO: i32 = 4;
}

use std::fmt;
use std::fs;
use std::path::Path;
use std::process::ExitCode;

use chrono::Utc;
use clap::Parser;
use tracing::{debug, trace};

use args::{Args, Command, Format, ManualArgs, PlanArgs, VoteArgs};

use mp_algo::CatalogIndex;
use mp_core::{Ballot, Params, WeeklyPlan};
use mp_io::store::Store;
use mp_io::{canonical_json, loader, IoError};
use mp_pipeline::validate::validate;
use mp_pipeline::{
    manual_from_store, run_from_store, submit_ballot, EngineMeta, InputsView, ManualSelection, PipelineError,
    ValidationReport,
};
use mp_report::{build_plan_view, build_vote_results, PlanView, ReportError, VoteResults};

/// Central error type for CLI → exit-code mapping.
#[derive(Debug)]
enum MainError {
    /// Schema / JSON shape / domain and validation failures
    Validation(String),
    /// NoCandidate, InsufficientVotes, UnresolvableConflict, NonUniquePlan
    Resolution(String),
    /// I/O errors (read/write/path/limits/lock)
    Io(String),
    /// Report build or output
    Render(String),
}

impl fmt::Display for MainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MainError::Validation(m) | MainError::Resolution(m) | MainError::Io(m) => f.write_str(m),
            MainError::Render(m) => write!(f, "render: {m}"),
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose, args.quiet);

    let rc = match run(&args) {
        Ok(()) => exitcodes::OK,
        Err(e) => {
            eprintln!("mp: error: {e}");
            map_error(&e)
        }
    };
    ExitCode::from(rc as u8)
}

/// Logs go to stderr so that stdout stays clean for JSON/HTML output.
fn init_tracing(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => "warn",
        (false, 0) => "info",
        (false, 1) => "debug",
        (false, _) => "trace",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbose >= 2)
        .with_thread_ids(verbose >= 3)
        .with_line_number(verbose >= 3)
        .init();

    debug!("mp started with verbosity level: {verbose}");
    trace!("Full CLI args: {:?}", std::env::args().collect::<Vec<_>>());
}

fn map_error(e: &MainError) -> i32 {
    use exitcodes::*;
    match e {
        MainError::Validation(_) => VALIDATION,
        MainError::Resolution(_) => RESOLUTION,
        MainError::Io(_) => IO,
        MainError::Render(_) => IO,
    }
}

/// Translate mp_io::IoError into MainError buckets.
fn map_mpio_err(e: IoError) -> MainError {
    use IoError::*;
    match e {
        Schema { .. } | Json { .. } | Invalid(_) => MainError::Validation(e.to_string()),
        Path(_) | Limit(_) | Hash(_) | Locked(_) => MainError::Io(e.to_string()),
    }
}

fn map_pipeline_err(e: PipelineError) -> MainError {
    use PipelineError::*;
    match e {
        Schema(m) => MainError::Validation(m),
        Validate(r) => MainError::Validation(describe_failures(&r)),
        Resolve(r) => MainError::Resolution(format!("{} ({})", r, r.code())),
        Io(m) | Locked(m) | Build(m) => MainError::Io(m),
    }
}

fn map_report_err(e: ReportError) -> MainError {
    MainError::Render(e.to_string())
}

/// One line per error, first line is the summary.
fn describe_failures(r: &ValidationReport) -> String {
    let mut out = format!("validation failed ({} errors)", r.errors().count());
    for i in r.errors() {
        out.push_str(&format!("\n  [{}] {}: {}", i.code, i.where_, i.message));
    }
    out
}

fn engine_meta() -> EngineMeta {
    EngineMeta {
        name: option_env!("MP_ENGINE_NAME").unwrap_or("menu-planner").to_string(),
        version: option_env!("MP_ENGINE_VERSION")
            .unwrap_or(env!("CARGO_PKG_VERSION"))
            .to_string(),
    }
}

fn open_store(args: &Args) -> Result<Store, MainError> {
    Store::open(&args.data_dir).map_err(map_mpio_err)
}

fn run(args: &Args) -> Result<(), MainError> {
    let store = open_store(args)?;
    debug!(data_dir = %store.root().display(), "store opened");

    match &args.command {
        Command::Init { catalog } => cmd_init(&store, catalog, args.quiet),
        Command::Options { file } => cmd_options(&store, file, args.quiet),
        Command::Vote(v) => cmd_vote(&store, v, args.quiet),
        Command::Results { format, out } => cmd_results(&store, *format, out.as_deref()),
        Command::Plan(p) => cmd_plan(&store, p, args.quiet),
        Command::Manual(m) => cmd_manual(&store, m, args.quiet),
        Command::Show { format, out } => cmd_show(&store, *format, out.as_deref()),
        Command::Reset => cmd_reset(&store, args.quiet),
        Command::Validate => cmd_validate(&store, args.quiet),
    }
}

// ----------------------------- Subcommands -----------------------------

fn cmd_init(store: &Store, path: &Path, quiet: bool) -> Result<(), MainError> {
    let catalog = loader::load_catalog(path).map_err(map_mpio_err)?;
    let problems = CatalogIndex::problems(&catalog);
    if !problems.is_empty() {
        let mut msg = format!("catalog rejected ({} problems)", problems.len());
        for p in &problems {
            msg.push_str(&format!("\n  [{}] {p}", p.code()));
        }
        return Err(MainError::Validation(msg));
    }

    let lock = store.lock().map_err(map_mpio_err)?;
    store.replace_catalog(&lock, &catalog).map_err(map_mpio_err)?;
    if !quiet {
        println!("catalog installed: {} dishes, {} combos", catalog.dishes.len(), catalog.combos.len());
    }
    Ok(())
}

fn cmd_options(store: &Store, path: &Path, quiet: bool) -> Result<(), MainError> {
    let options = loader::load_option_set(path).map_err(map_mpio_err)?;

    let lock = store.lock().map_err(map_mpio_err)?;
    let catalog = store.catalog().map_err(map_mpio_err)?;
    let params = store.params().map_err(map_mpio_err)?;
    let report = validate(&InputsView { catalog: &catalog, options: &options, ballots: &[], params: &params });
    if !report.pass {
        return Err(MainError::Validation(describe_failures(&report)));
    }
    print_warnings(&report, quiet);

    store.write_options(&lock, &options).map_err(map_mpio_err)?;
    if !quiet {
        println!(
            "options set: {} meat, {} fish, {} vegetarian",
            options.meat().len(),
            options.fish().len(),
            options.vegetarian().len()
        );
    }
    Ok(())
}

fn cmd_vote(store: &Store, v: &VoteArgs, quiet: bool) -> Result<(), MainError> {
    let ballots = match &v.file {
        Some(path) => loader::load_ballots(path).map_err(map_mpio_err)?,
        None => vec![Ballot {
            guest_name: v.name.clone().unwrap_or_default(),
            meat_option_id: v.meat.clone(),
            fish_option_id: v.fish.clone(),
            vegetarian_option_ids: v.vegetarian.clone(),
        }],
    };

    // Stops at the first rejected ballot; earlier ones stay recorded.
    for b in ballots {
        let name = b.guest_name.trim().to_string();
        let count = submit_ballot(store, b).map_err(map_pipeline_err)?;
        if !quiet {
            println!("vote recorded for {name} ({count} total)");
        }
    }
    Ok(())
}

fn cmd_results(store: &Store, format: Format, out: Option<&Path>) -> Result<(), MainError> {
    let snap = store.snapshot().map_err(map_mpio_err)?;
    let strip = snap.params.strip_combo_suffix;
    let tally = mp_algo::tally(&snap.ballots);
    let results = build_vote_results(&snap.options, &tally, strip);

    let plan = store.plan().map_err(map_mpio_err)?;
    let view = (!plan.is_empty()).then(|| build_plan_view(&plan, strip));

    let body = match format {
        Format::Text => {
            let mut s = text_results(&results);
            if let Some(v) = &view {
                s.push('\n');
                s.push_str(&text_plan(v));
            }
            s
        }
        Format::Json => mp_report::render_json::render_report_json(&results, view.as_ref()).map_err(map_report_err)?,
        Format::Html => render_html(&results, view.as_ref())?,
    };
    emit(out, &body)
}

fn cmd_plan(store: &Store, p: &PlanArgs, quiet: bool) -> Result<(), MainError> {
    let mut params = match &p.params {
        Some(path) => loader::load_params(path).map_err(map_mpio_err)?,
        None => store.params().map_err(map_mpio_err)?,
    };
    if let Some(policy) = p.conflict_policy {
        params.conflict_policy = policy;
    }
    if let Some(n) = p.min_ballots {
        params.min_ballots = n;
    }
    params
        .validate_domains()
        .map_err(|e| MainError::Validation(format!("params: {e}")))?;

    let strip = params.strip_combo_suffix;
    let at = p.timestamp.unwrap_or_else(Utc::now);
    let outs = run_from_store(store, Some(params), engine_meta(), at).map_err(map_pipeline_err)?;
    print_warnings(&outs.validation, quiet);

    if let Some(path) = &p.record {
        canonical_json::write_canonical(path, &outs.run_record).map_err(map_mpio_err)?;
    }

    match outs.plan {
        Ok(plan) => {
            if !quiet {
                print!("{}", text_plan(&build_plan_view(&plan, strip)));
            }
            Ok(())
        }
        Err(e) => Err(map_pipeline_err(e.into())),
    }
}

fn cmd_manual(store: &Store, m: &ManualArgs, quiet: bool) -> Result<(), MainError> {
    let selection = ManualSelection {
        monday: m.monday.clone(),
        tuesday: m.tuesday.clone(),
        wednesday: m.wednesday.clone(),
        thursday: m.thursday.clone(),
    };
    let at = m.timestamp.unwrap_or_else(Utc::now);
    let plan = manual_from_store(store, &selection, at).map_err(map_pipeline_err)?;
    if !quiet {
        print!("{}", text_plan(&plan_view(store, &plan)?));
    }
    Ok(())
}

fn cmd_show(store: &Store, format: Format, out: Option<&Path>) -> Result<(), MainError> {
    let plan = store.plan().map_err(map_mpio_err)?;
    let view = plan_view(store, &plan)?;
    let body = match format {
        Format::Text => text_plan(&view),
        Format::Json => mp_report::render_json::render_plan_json(&view).map_err(map_report_err)?,
        Format::Html => render_plan_html(&view)?,
    };
    emit(out, &body)
}

fn cmd_reset(store: &Store, quiet: bool) -> Result<(), MainError> {
    let lock = store.lock().map_err(map_mpio_err)?;
    store.reset(&lock).map_err(map_mpio_err)?;
    if !quiet {
        println!("weekly data cleared");
    }
    Ok(())
}

fn cmd_validate(store: &Store, quiet: bool) -> Result<(), MainError> {
    let snap = store.snapshot().map_err(map_mpio_err)?;
    let report = validate(&InputsView {
        catalog: &snap.catalog,
        options: &snap.options,
        ballots: &snap.ballots,
        params: &snap.params,
    });
    if !report.pass {
        print_warnings(&report, quiet);
        return Err(MainError::Validation(describe_failures(&report)));
    }
    print_warnings(&report, quiet);
    if !quiet {
        println!("ok: {} ballots, {} warnings", snap.ballots.len(), report.warnings().count());
    }
    Ok(())
}

// ----------------------------- Output helpers -----------------------------

fn print_warnings(report: &ValidationReport, quiet: bool) {
    if quiet {
        return;
    }
    for w in report.warnings() {
        eprintln!("mp: warning: [{}] {}: {}", w.code, w.where_, w.message);
    }
}

fn plan_view(store: &Store, plan: &WeeklyPlan) -> Result<PlanView, MainError> {
    let params: Params = store.params().map_err(map_mpio_err)?;
    Ok(build_plan_view(plan, params.strip_combo_suffix))
}

fn text_plan(view: &PlanView) -> String {
    let mut s = String::new();
    for d in &view.days {
        s.push_str(&format!("{:<10} {}\n", d.day, d.meal));
    }
    s
}

fn text_results(results: &VoteResults) -> String {
    let mut s = String::new();
    for c in &results.categories {
        s.push_str(c.title);
        s.push('\n');
        if c.rows.is_empty() {
            s.push_str("  (none offered)\n");
        }
        for r in &c.rows {
            s.push_str(&format!("  {:<30} {}\n", r.display_name, r.votes));
        }
    }
    s.push_str(&format!("Total ballots: {}\n", results.total_ballots));
    s
}

fn render_html(results: &VoteResults, plan: Option<&PlanView>) -> Result<String, MainError> {
    #[cfg(feature = "report-html")]
    {
        Ok(mp_report::render_html::render_report_html(results, plan))
    }
    #[cfg(not(feature = "report-html"))]
    {
        let _ = (results, plan);
        Err(MainError::Render("html renderer not enabled (build with feature `report-html`)".into()))
    }
}

fn render_plan_html(view: &PlanView) -> Result<String, MainError> {
    #[cfg(feature = "report-html")]
    {
        Ok(mp_report::render_html::render_plan_html(view))
    }
    #[cfg(not(feature = "report-html"))]
    {
        let _ = view;
        Err(MainError::Render("html renderer not enabled (build with feature `report-html`)".into()))
    }
}

fn emit(out: Option<&Path>, body: &str) -> Result<(), MainError> {
    match out {
        Some(path) => {
            fs::write(path, body).map_err(|e| MainError::Io(format!("write {}: {e}", path.display())))
        }
        None => {
            print!("{body}");
            Ok(())
        }
    }
}
