// Multithreaded test program for debugger integration tests
//
// Workers and the main thread meet at a reusable barrier before each worker
// increments a shared counter. Source markers for breakpoints live next to the
// code they name, in `rendezvous_core::coordinator`.

use std::process;
use std::sync::Arc;

use clap::Parser;
use rendezvous_core::coordinator::{DEFAULT_ROUNDS, DEFAULT_WORKERS};
use rendezvous_core::{Coordinator, FixtureConfig, InitializationError, RendezvousError, StdoutSink};
use rendezvous_utils::{error, info, init_logging, init_logging_with_level, LogLevel, LoggingGuard};

/// Multithreaded barrier fixture for debugger integration tests.
#[derive(Parser, Debug)]
#[command(name = "threaded")]
#[command(version)]
#[command(about = "Workers rendezvous at a barrier, then increment a shared counter", long_about = None)]
struct Cli
{
    /// Number of worker threads (the barrier also waits for the main thread)
    #[arg(short, long, default_value_t = DEFAULT_WORKERS)]
    workers: usize,

    /// Times every participant goes through the barrier (0 skips it entirely)
    #[arg(short, long, default_value_t = DEFAULT_ROUNDS)]
    rounds: usize,

    /// Log level for stderr output (overrides RUST_LOG)
    #[arg(long)]
    log_level: Option<LogLevel>,
}

impl From<&Cli> for FixtureConfig
{
    fn from(cli: &Cli) -> Self
    {
        FixtureConfig { workers: cli.workers, rounds: cli.rounds }
    }
}

fn main()
{
    let cli = Cli::parse();

    let _guard: LoggingGuard = match cli.log_level.map_or_else(init_logging, |level| init_logging_with_level(level, None)) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            process::exit(1);
        }
    };

    let coordinator = Coordinator::new(FixtureConfig::from(&cli), Arc::new(StdoutSink));
    match coordinator.run() {
        Ok(summary) => {
            info!(final_value = summary.final_value, phases = summary.phases.0, "fixture finished");
        }
        Err(e) => {
            report_failure(&e);
            // Workers already parked at the barrier die with the process
            process::exit(1);
        }
    }
}

fn report_failure(e: &RendezvousError)
{
    error!(error = %e, "fixture failed");
    match e {
        RendezvousError::Initialization(
            InitializationError::ZeroCapacity | InitializationError::TooManyWorkers { .. },
        ) => {
            eprintln!("Failed to initialize barrier");
        }
        RendezvousError::Initialization(InitializationError::ThreadSpawn { index, .. }) => {
            eprintln!("Failed to create thread {index}");
        }
        RendezvousError::Usage(usage) => {
            eprintln!("Error: {usage}");
        }
    }
}
