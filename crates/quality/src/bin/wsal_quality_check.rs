//! Quality check runner for one recorded sim23 iteration.
//!
//! Usage:
//!   wsal-quality-check [OPTIONS] <EVENTS_FILE> <WINDOWS_FILE> <SIM_USER> <TIMEZONE>
//!
//! Loads the converted audit events and ground-truth behavior windows of one
//! iteration, runs every configured quality check and writes the verdicts to
//! the quality log. Match failures are findings, not program errors: a run
//! that completes exits 0 regardless of how many checks failed.

use std::path::PathBuf;
use std::process::ExitCode;

use chrono::{DateTime, Utc};
use tracing::{error, info, warn};
use wsal_quality::dispatcher::{run_quality_checks, verify_check_count, CheckContext};
use wsal_quality::{load_events, load_windows, logging, PatternCatalog, RunConfig};

struct Args {
    events_file: PathBuf,
    windows_file: PathBuf,
    sim_user: String,
    timezone: String,
    next_events_file: Option<PathBuf>,
    log_path: Option<PathBuf>,
    config_path: Option<PathBuf>,
    iteration_end: Option<DateTime<Utc>>,
}

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();

    if args.len() >= 2 && matches!(args[1].as_str(), "help" | "--help" | "-h") {
        print_usage();
        return ExitCode::SUCCESS;
    }

    let args = match parse_args(&args[1..]) {
        Ok(args) => args,
        Err(message) => {
            eprintln!("Error: {message}");
            print_usage();
            return ExitCode::from(1);
        }
    };

    let config = RunConfig::load_or_default(args.config_path.as_deref());
    let log_path = match config.require_log_path(args.log_path.clone()) {
        Ok(path) => path,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::from(1);
        }
    };

    // held until exit so the quality log is flushed
    let _guard = match logging::init_logging(&log_path) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Error: cannot open quality log {}: {e}", log_path.display());
            return ExitCode::from(1);
        }
    };

    run(&args, &config)
}

fn run(args: &Args, config: &RunConfig) -> ExitCode {
    let windows = match load_windows(&args.windows_file) {
        Ok(windows) => windows,
        Err(e) => {
            error!(error = %e, "cannot load behavior windows");
            return ExitCode::from(1);
        }
    };

    let mut events = match load_events(&args.events_file) {
        Ok(events) => events,
        Err(e) => {
            error!(error = %e, "cannot load audit events");
            return ExitCode::from(1);
        }
    };

    // events of the final windows can bleed into the next iteration's first
    // archived file; pull that head in before slicing
    if let Some(next_path) = &args.next_events_file {
        let end = args
            .iteration_end
            .or_else(|| windows.iter().map(|w| w.end).max());
        match (load_events(next_path), end) {
            (Ok(next), Some(end)) => events.append_continuation(next, end),
            (Ok(_), None) => {
                warn!("no iteration end bound available, skipping continuation");
            }
            (Err(e), _) => {
                warn!(
                    path = %next_path.display(),
                    error = %e,
                    "next iteration's event file not usable, checking without continuation"
                );
            }
        }
    }

    events.retain_user(&args.sim_user);
    info!(
        events = events.len(),
        windows = windows.len(),
        sim_user = %args.sim_user,
        timezone = %args.timezone,
        "iteration loaded"
    );

    let catalog = PatternCatalog::builtin();
    let ctx = CheckContext {
        catalog: &catalog,
        sim_user: &args.sim_user,
        timezone: &args.timezone,
    };

    match run_quality_checks(&windows, &events, &ctx) {
        Ok(performed) => {
            verify_check_count(performed, config.evaluation.expected_checks_per_iteration);
        }
        Err(e) => {
            // a catalog/data mismatch voids this iteration's tally but must
            // not break the surrounding batch loop
            error!(error = %e, "quality checks aborted for this iteration");
        }
    }

    ExitCode::SUCCESS
}

fn parse_args(args: &[String]) -> Result<Args, String> {
    let mut positional: Vec<String> = Vec::new();
    let mut next_events_file = None;
    let mut log_path = None;
    let mut config_path = None;
    let mut iteration_end = None;

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--next" => {
                i += 1;
                let value = args.get(i).ok_or("--next requires a file argument")?;
                next_events_file = Some(PathBuf::from(value));
            }
            "--log" => {
                i += 1;
                let value = args.get(i).ok_or("--log requires a file argument")?;
                log_path = Some(PathBuf::from(value));
            }
            "--config" => {
                i += 1;
                let value = args.get(i).ok_or("--config requires a file argument")?;
                config_path = Some(PathBuf::from(value));
            }
            "--iteration-end" => {
                i += 1;
                let value = args
                    .get(i)
                    .ok_or("--iteration-end requires a timestamp argument")?;
                let ts = value
                    .parse::<DateTime<Utc>>()
                    .map_err(|e| format!("bad --iteration-end timestamp: {e}"))?;
                iteration_end = Some(ts);
            }
            arg if arg.starts_with('-') => {
                return Err(format!("unknown option: {arg}"));
            }
            arg => positional.push(arg.to_string()),
        }
        i += 1;
    }

    let [events_file, windows_file, sim_user, timezone]: [String; 4] =
        positional.try_into().map_err(|extra: Vec<String>| {
            format!("expected 4 positional arguments, got {}", extra.len())
        })?;
    Ok(Args {
        events_file: PathBuf::from(events_file),
        windows_file: PathBuf::from(windows_file),
        sim_user,
        timezone,
        next_events_file,
        log_path,
        config_path,
        iteration_end,
    })
}

fn print_usage() {
    eprintln!(
        r#"wsal-quality-check - quality evaluation for one sim23 iteration

USAGE:
    wsal-quality-check [OPTIONS] <EVENTS_FILE> <WINDOWS_FILE> <SIM_USER> <TIMEZONE>

ARGS:
    EVENTS_FILE     JSON-lines converted audit event table
    WINDOWS_FILE    JSON-lines ground-truth behavior windows
    SIM_USER        simulation user the recording belongs to (e.g. SimUser001)
    TIMEZONE        timezone tag of the recording setup (e.g. CET, CEST)

OPTIONS:
    --next <FILE>            next iteration's event file, for events that
                             bleed past the iteration boundary
    --log <FILE>             quality log destination (overrides the config)
    --config <FILE>          TOML run configuration
    --iteration-end <TS>     RFC3339 end bound for the continuation head
                             (default: latest behavior window end)

EXAMPLES:
    wsal-quality-check --log quality.log events_042.jsonl windows_042.jsonl SimUser001 CET

    wsal-quality-check --config run.toml --next events_043.jsonl \
        events_042.jsonl windows_042.jsonl SimUser003 CEST
"#
    );
}
