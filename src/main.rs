//! A command line interface to the healthcenter planner.

use anyhow::{anyhow, bail, Context, Result};
use clap::{arg, value_parser, ArgAction, ArgMatches, Command};
use healthcenter::instance::read_instance;
use healthcenter::locate::solver::{HighsSolver, SolverConfig};
use healthcenter::plan::{plan, Plan, PlanConfig};
use log::{Level, LevelFilter, Log, Metadata, Record};
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::process;
use std::time::Duration;

fn cli() -> Command {
    Command::new("healthcenter")
        .about("Deploys healthcenters and packs ambulance routes")
        .arg(arg!(<INSTANCE> "Path to the instance file").value_parser(value_parser!(PathBuf)))
        .arg(
            arg!(--neighbors <K> "Number of nearest sites a community may be assigned to")
                .default_value("2000")
                .value_parser(value_parser!(usize)),
        )
        .arg(
            arg!(--"vehicle-capacity" <Q> "Ambulance equipment capacity")
                .default_value("10000")
                .value_parser(value_parser!(u64)),
        )
        .arg(arg!(--"time-limit" <SECONDS> "Solver wall-clock limit").value_parser(value_parser!(f64)))
        .arg(arg!(--gap <RATIO> "Relative MIP gap tolerance").value_parser(value_parser!(f64)))
        .arg(
            arg!(--"large-threshold" <N> "Community count from which the large-instance profile is used")
                .value_parser(value_parser!(usize)),
        )
        .arg(
            arg!(--format <FORMAT> "Report format")
                .default_value("text")
                .value_parser(["text", "json"]),
        )
        .arg(arg!(-v --verbose "Increases log verbosity").action(ArgAction::Count))
}

fn main() {
    if let Err(err) = run(cli().get_matches()) {
        eprintln!("error: {:#}", err);
        process::exit(1);
    }
}

fn run(matches: ArgMatches) -> Result<()> {
    let verbosity = matches.get_count("verbose");
    init_logger(verbosity)?;

    let path = matches.get_one::<PathBuf>("INSTANCE").ok_or_else(|| anyhow!("missing instance path"))?;
    let file = File::open(path).with_context(|| format!("cannot open instance '{}'", path.display()))?;
    let instance = read_instance(BufReader::new(file)).with_context(|| format!("cannot read '{}'", path.display()))?;

    let config = create_config(&matches)?;
    let solver = HighsSolver { verbose: verbosity >= 2 };

    let plan = plan(&instance, &config, &solver)?;

    match matches.get_one::<String>("format").map(String::as_str) {
        Some("json") => println!("{}", serde_json::to_string_pretty(&plan)?),
        _ => print!("{}", format_report(&plan)),
    }

    Ok(())
}

fn create_config(matches: &ArgMatches) -> Result<PlanConfig> {
    let mut solver = SolverConfig::default();
    if let Some(&seconds) = matches.get_one::<f64>("time-limit") {
        let limit = Duration::try_from_secs_f64(seconds).map_err(|err| anyhow!("invalid time limit: {}", err))?;
        solver = solver.with_time_limit(limit);
    }
    if let Some(&gap) = matches.get_one::<f64>("gap") {
        solver = solver.with_mip_rel_gap(gap);
    }
    if let Some(&threshold) = matches.get_one::<usize>("large-threshold") {
        solver = solver.with_large_threshold(threshold);
    }

    let neighbors = *matches.get_one::<usize>("neighbors").ok_or_else(|| anyhow!("missing neighbor cutoff"))?;
    if neighbors == 0 {
        bail!("neighbor cutoff must be positive");
    }
    let capacity = *matches.get_one::<u64>("vehicle-capacity").ok_or_else(|| anyhow!("missing vehicle capacity"))?;

    Ok(PlanConfig::default().with_neighbor_cutoff(neighbors).with_vehicle_capacity(capacity).with_solver(solver))
}

/// Renders the plan the way operators read it: 1-based community ids.
fn format_report(plan: &Plan) -> String {
    let solution = &plan.solution;
    let mut out = String::new();

    out.push_str(&format!("Max Population-Weighted Distance (Z): {}\n", solution.bottleneck));
    out.push_str("\nStage-1:\n");
    for &site in &solution.facilities {
        let members: Vec<String> = solution.members(site).iter().map(|n| (n + 1).to_string()).collect();
        let line = format!("Healthcenter deployed at {}: Communities Assigned = [{}]\n", site + 1, members.join(", "));
        out.push_str(&line);
    }
    out.push_str(&format!("Objective Value: {}\n", solution.bottleneck));

    out.push_str("\nStage-2:\n");
    for (idx, route) in plan.routes.routes.iter().enumerate() {
        let stops: String = route.stops.iter().map(|site| format!(" -> Healthcenter at {}", site + 1)).collect();
        out.push_str(&format!("Route {}: Depot{} -> Depot\n", idx + 1, stops));
    }
    out.push_str(&format!("Objective Value: {:.2}\n", plan.routes.total_distance));

    out
}

/// Writes log records to stderr, filtered by the global max level.
struct StderrLogger;

static LOGGER: StderrLogger = StderrLogger;

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            eprintln!("[{}] {}", record.level(), record.args());
        }
    }

    fn flush(&self) {}
}

fn log_level(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => Level::Warn,
        1 => Level::Info,
        _ => Level::Debug,
    }
    .to_level_filter()
}

fn init_logger(verbosity: u8) -> Result<()> {
    log::set_logger(&LOGGER).map_err(|err| anyhow!("cannot install logger: {}", err))?;
    log::set_max_level(log_level(verbosity));

    Ok(())
}
