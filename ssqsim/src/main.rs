//! Single-server queue simulation application.
#![warn(
    missing_docs,
    trivial_casts,
    trivial_numeric_casts,
    unused_import_braces,
    unused_qualifications
)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions, clippy::default_trait_access)]

use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;

use clap::Parser;
use eyre::{bail, eyre, WrapErr};
use serde::Serialize;

use ssqsim::{write_from_channel, Report, RngSource, RunParameters, Simulation};

/// Runs a single-server queue simulation until the required number of customers have been
/// delayed, and prints the summary measures.
///
/// Parameters are read from `input.txt` unless given otherwise.
#[derive(Parser)]
#[clap(version, author)]
struct Opt {
    /// Path to a file with three numbers: mean interarrival time, mean service time,
    /// and the required number of delays.
    #[clap(long, conflicts_with = "params")]
    input: Option<PathBuf>,

    /// Path to a JSON file with run parameters.
    #[clap(long)]
    params: Option<PathBuf>,

    /// Mean interarrival time; overrides the input file.
    #[clap(long)]
    mean_interarrival: Option<f64>,

    /// Mean service time; overrides the input file.
    #[clap(long)]
    mean_service: Option<f64>,

    /// Required number of delayed customers; overrides the input file.
    #[clap(long)]
    delays: Option<f64>,

    /// Capacity of the waiting line.
    #[clap(long)]
    queue_limit: Option<usize>,

    /// Random seed. If not given, the generator is seeded from the operating system.
    #[clap(long)]
    seed: Option<u64>,

    /// Write the report to this file instead of the standard output.
    #[clap(short, long)]
    output: Option<PathBuf>,

    /// Write the event trace to this file.
    #[clap(long)]
    trace: Option<PathBuf>,

    /// Print the report as JSON.
    #[clap(long)]
    json: bool,

    /// Verbosity.
    #[clap(short, long, parse(from_occurrences))]
    verbose: i32,

    /// Store the logs in this file.
    #[clap(long)]
    log_output: Option<PathBuf>,

    /// Do not log to the stderr.
    #[clap(long)]
    no_stderr: bool,
}

impl Opt {
    /// Loads the run parameters from the flags, the JSON file, or the input file, in this order.
    fn parameters(&self) -> eyre::Result<RunParameters> {
        let params = match (self.mean_interarrival, self.mean_service, self.delays) {
            (Some(mean_interarrival), Some(mean_service), Some(delays)) => {
                RunParameters::new(mean_interarrival, mean_service, delays)?
            }
            (None, None, None) => {
                if let Some(path) = &self.params {
                    let file = File::open(path)
                        .wrap_err_with(|| format!("unable to open {}", path.display()))?;
                    RunParameters::from_json(file)
                        .wrap_err_with(|| format!("unable to load {}", path.display()))?
                } else {
                    let path = self
                        .input
                        .clone()
                        .unwrap_or_else(|| PathBuf::from("input.txt"));
                    let input = std::fs::read_to_string(&path)
                        .wrap_err_with(|| format!("unable to read {}", path.display()))?;
                    RunParameters::from_text(&input)
                        .wrap_err_with(|| format!("unable to load {}", path.display()))?
                }
            }
            _ => bail!("--mean-interarrival, --mean-service, and --delays must be given together"),
        };
        match self.queue_limit {
            Some(limit) => Ok(params.with_queue_limit(limit)?),
            None => Ok(params),
        }
    }
}

/// Everything printed with `--json`. Exactly one of `report` and `error` is present.
#[derive(Serialize)]
struct Summary<'a> {
    parameters: &'a RunParameters,
    #[serde(skip_serializing_if = "Option::is_none")]
    report: Option<&'a Report>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    events: usize,
    arrivals: usize,
    departures: usize,
}

impl<'a> Summary<'a> {
    fn new<S>(
        parameters: &'a RunParameters,
        result: &'a ssqsim::Result<Report>,
        sim: &Simulation<S>,
    ) -> Self {
        let (report, error) = match result {
            Ok(report) => (Some(report), None),
            Err(err) => (None, Some(err.to_string())),
        };
        Self {
            parameters,
            report,
            error,
            events: sim.events_processed(),
            arrivals: sim.arrivals(),
            departures: sim.departures(),
        }
    }
}

/// Set up a logger based on the given user options.
fn set_up_logger(opt: &Opt) -> Result<(), fern::InitError> {
    let log_level = match opt.verbose {
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        3 => log::LevelFilter::Trace,
        _ => log::LevelFilter::Warn,
    };
    let dispatch = fern::Dispatch::new()
        .format(|out, message, record| out.finish(format_args!("[{}] {}", record.level(), message)))
        .level(log_level);
    let dispatch = if let Some(path) = &opt.log_output {
        dispatch.chain(
            std::fs::OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(path)?,
        )
    } else {
        dispatch
    };
    let dispatch = if opt.no_stderr {
        dispatch
    } else {
        dispatch.chain(io::stderr())
    };
    dispatch.apply()?;
    Ok(())
}

fn output(opt: &Opt) -> eyre::Result<Box<dyn Write>> {
    Ok(match &opt.output {
        Some(path) => Box::new(io::BufWriter::new(
            File::create(path).wrap_err_with(|| format!("unable to create {}", path.display()))?,
        )),
        None => Box::new(io::stdout()),
    })
}

fn run(opt: &Opt) -> eyre::Result<()> {
    let params = opt.parameters()?;
    let source = match opt.seed {
        Some(seed) => RngSource::seeded(seed),
        None => RngSource::from_entropy(),
    };
    let mut sim = Simulation::new(params.clone(), source);

    let trace_writer = if let Some(path) = &opt.trace {
        let file =
            File::create(path).wrap_err_with(|| format!("unable to create {}", path.display()))?;
        let (sender, receiver) = std::sync::mpsc::channel();
        sim = sim.trace_sender(sender);
        Some(write_from_channel(io::BufWriter::new(file), receiver))
    } else {
        None
    };

    let result = sim.run();
    let summary = Summary::new(&params, &result, &sim);
    drop(sim);
    if let Some(handle) = trace_writer {
        handle
            .join()
            .map_err(|_| eyre!("trace writer panicked"))?
            .wrap_err("unable to write trace")?;
    }

    let mut out = output(opt)?;
    if opt.json {
        serde_json::to_writer_pretty(&mut out, &summary)?;
        writeln!(out)?;
    } else {
        write!(out, "{}\n\n\n", params)?;
        match &result {
            Ok(report) => write!(out, "{}", report)?,
            Err(err) => writeln!(out, "{}", err)?,
        }
    }
    out.flush()?;
    log::info!(
        "Processed {} events ({} arrivals, {} departures)",
        summary.events,
        summary.arrivals,
        summary.departures
    );
    result.map(|_| ()).wrap_err("simulation did not complete")
}

fn main() -> eyre::Result<()> {
    color_eyre::install()?;
    let opt = Opt::parse();
    set_up_logger(&opt)?;
    run(&opt)
}
