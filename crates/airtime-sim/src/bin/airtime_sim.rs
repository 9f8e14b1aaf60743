//! # Airtime Simulator
//!
//! Runs the allocation engine over a number of beacon intervals and writes
//! one JSON line per finalized schedule.
//!
//! ## Usage
//!
//! ```bash
//! # Replay a scenario file
//! airtime-sim --scenario crates/airtime-sim/scenarios/basic.toml
//!
//! # Random request stream, 500 intervals, written to a file
//! airtime-sim --random 7 --intervals 500 --output schedules.jsonl
//! ```

use std::fs::File;
use std::io::{BufWriter, Write};

use airtime_core::{build_policy, SchedulerConfig};
use airtime_sim::driver::IntervalDriver;
use airtime_sim::generator::{GeneratorConfig, RequestGenerator};
use airtime_sim::scenario::Scenario;
use airtime_sim::sink::JsonLinesSink;
use anyhow::Context;

fn main() -> anyhow::Result<()> {
    // ── Logging ─────────────────────────────────────────────────
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(true)
        .compact()
        .init();

    // ── Parse CLI ───────────────────────────────────────────────
    let args = parse_args()?;

    // ── Output sink ─────────────────────────────────────────────
    let out: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("failed to create {path}"))?,
        )),
        None => Box::new(std::io::stdout().lock()),
    };
    let mut sink = JsonLinesSink::new(out);

    // ── Run ─────────────────────────────────────────────────────
    let reports = match args.mode {
        Mode::Scenario(path) => {
            let scenario = Scenario::load(&path)?;
            let intervals = args.intervals.unwrap_or(scenario.intervals);
            tracing::info!(
                scenario = %path,
                intervals,
                policy = scenario.config.policy.as_str(),
                requests = scenario.requests.len(),
                "airtime-sim starting"
            );
            scenario.driver()?.run(intervals, &mut sink)?
        }
        Mode::Random(seed) => {
            let config = match &args.config {
                Some(path) => {
                    let text = std::fs::read_to_string(path)
                        .with_context(|| format!("failed to read config {path}"))?;
                    SchedulerConfig::from_toml_str(&text)?
                }
                None => SchedulerConfig::default(),
            };
            let intervals = args.intervals.unwrap_or(100);
            let beacon_interval_us = u64::from(config.interval_length) * 1024 / 1000;
            tracing::info!(
                seed,
                intervals,
                stations = args.stations,
                policy = config.policy.as_str(),
                interval_length_us = config.interval_length,
                "airtime-sim starting"
            );
            let mut generator = RequestGenerator::new(GeneratorConfig {
                seed,
                stations: args.stations,
                ..GeneratorConfig::default()
            });
            let mut driver = IntervalDriver::new(build_policy(config)?, beacon_interval_us)?;
            driver.run_generated(&mut generator, intervals, &mut sink)?
        }
    };

    // ── Summary ─────────────────────────────────────────────────
    let accepted: u64 = reports.iter().map(|r| u64::from(r.accepted)).sum();
    let rejected: u64 = reports.iter().map(|r| u64::from(r.rejected)).sum();
    tracing::info!(
        intervals = reports.len(),
        accepted,
        rejected,
        "airtime-sim finished"
    );
    sink.into_inner().flush()?;

    Ok(())
}

// ─── CLI Parsing ────────────────────────────────────────────────────────────

enum Mode {
    Scenario(String),
    Random(u64),
}

struct Args {
    mode: Mode,
    config: Option<String>,
    intervals: Option<u64>,
    output: Option<String>,
    stations: u8,
}

fn parse_args() -> anyhow::Result<Args> {
    let args: Vec<String> = std::env::args().collect();
    let mut scenario = None;
    let mut seed = None;
    let mut config = None;
    let mut intervals = None;
    let mut output = None;
    let mut stations = GeneratorConfig::default().stations;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--scenario" | "-s" => {
                i += 1;
                scenario = Some(
                    args.get(i)
                        .ok_or_else(|| anyhow::anyhow!("--scenario requires a value"))?
                        .clone(),
                );
            }
            "--random" | "-r" => {
                i += 1;
                let val = args
                    .get(i)
                    .ok_or_else(|| anyhow::anyhow!("--random requires a seed"))?;
                seed = Some(
                    val.parse()
                        .map_err(|e| anyhow::anyhow!("invalid seed '{}': {}", val, e))?,
                );
            }
            "--config" | "-c" => {
                i += 1;
                config = Some(
                    args.get(i)
                        .ok_or_else(|| anyhow::anyhow!("--config requires a value"))?
                        .clone(),
                );
            }
            "--intervals" | "-n" => {
                i += 1;
                let val = args
                    .get(i)
                    .ok_or_else(|| anyhow::anyhow!("--intervals requires a value"))?;
                intervals = Some(
                    val.parse()
                        .map_err(|e| anyhow::anyhow!("invalid interval count '{}': {}", val, e))?,
                );
            }
            "--output" | "-o" => {
                i += 1;
                output = Some(
                    args.get(i)
                        .ok_or_else(|| anyhow::anyhow!("--output requires a value"))?
                        .clone(),
                );
            }
            "--stations" => {
                i += 1;
                let val = args
                    .get(i)
                    .ok_or_else(|| anyhow::anyhow!("--stations requires a value"))?;
                stations = val
                    .parse()
                    .map_err(|e| anyhow::anyhow!("invalid station count '{}': {}", val, e))?;
            }
            "--help" | "-h" => {
                print_help();
                std::process::exit(0);
            }
            other => {
                anyhow::bail!("unknown argument: {other}\nRun with --help for usage.");
            }
        }
        i += 1;
    }

    // Fallback: env vars
    if scenario.is_none() && seed.is_none() {
        scenario = std::env::var("AIRTIME_SCENARIO")
            .ok()
            .filter(|s| !s.is_empty());
    }

    let mode = match (scenario, seed) {
        (Some(_), Some(_)) => {
            anyhow::bail!("--scenario and --random are mutually exclusive")
        }
        (Some(path), None) => Mode::Scenario(path),
        (None, Some(seed)) => Mode::Random(seed),
        (None, None) => anyhow::bail!(
            "no request source. Use --scenario, --random or AIRTIME_SCENARIO env var.\nRun with --help for usage."
        ),
    };
    if config.is_some() && matches!(mode, Mode::Scenario(_)) {
        anyhow::bail!("--config only applies to --random; scenarios carry a [scheduler] table");
    }

    Ok(Args {
        mode,
        config,
        intervals,
        output,
        stations,
    })
}

fn print_help() {
    eprintln!(
        r#"airtime-sim: drive the airtime allocation engine over beacon intervals

USAGE:
  airtime-sim --scenario <FILE> [OPTIONS]
  airtime-sim --random <SEED> [OPTIONS]

OPTIONS:
  --scenario, -s <file>   TOML scenario (scheduler table plus timed requests)
  --random, -r <seed>     Seeded random request stream
  --config, -c <file>     Scheduler TOML for --random (default: built-in)
  --intervals, -n <n>     Intervals to run (default: scenario value, or 100)
  --stations <n>          Stations in the random stream (default: 8)
  --output, -o <path>     Write JSON lines to a file instead of stdout
  --help, -h              Show this help

ENVIRONMENT VARIABLES:
  AIRTIME_SCENARIO   Scenario path (fallback for --scenario)
  RUST_LOG           Log level filter (e.g. info, airtime_core=debug)
"#
    );
}
