//! # scheduler: interactive priority event scheduler
//!
//! Runs the processing loop in the background and a numbered menu on
//! stdin/stdout in the foreground. Engine reports (processing, completed,
//! halted, ...) are printed as they happen; logs go to stderr.
//!
//! ## Startup Sequence
//!
//! 1. Parse arguments and initialise logging (`RUST_LOG` overrides the
//!    default `warn` level, `--verbose` lowers it to `info`).
//! 2. Spawn the processing loop and the report printer.
//! 3. Run the console until the scheduler is stopped or stdin closes.
//! 4. Wait for the loop to finish its in-flight event and exit.

mod console;

use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use scheduler_engine::config::DEFAULT_TICK_INTERVAL_SECS;
use scheduler_engine::{EngineConfig, EngineLoop};
use tokio::io::BufReader;
use tracing::info;
use tracing_subscriber::EnvFilter;

use console::{Console, ReportFormat};

#[derive(Parser)]
#[command(name = "scheduler", about = "Interactive priority event scheduler")]
struct Args {
    /// Outer tick in seconds; each event is processed for this many sub-ticks
    #[arg(
        long,
        default_value_t = DEFAULT_TICK_INTERVAL_SECS,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    tick_secs: u32,

    /// Real duration of one sub-tick, in milliseconds
    #[arg(long, default_value_t = 1000, value_parser = clap::value_parser!(u64).range(1..))]
    sub_tick_ms: u64,

    /// Minutes of remaining time removed per cycle [default: tick-secs / 60]
    #[arg(long)]
    decay_minutes: Option<u32>,

    /// Start processing events immediately
    #[arg(long)]
    autostart: bool,

    /// How engine reports are printed
    #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
    report_format: ReportFormat,

    /// Log at info level unless RUST_LOG is set
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn engine_config(&self) -> EngineConfig {
        let config = EngineConfig::new(self.tick_secs)
            .with_sub_tick(Duration::from_millis(self.sub_tick_ms));
        match self.decay_minutes {
            Some(minutes) => config.with_decay_minutes(minutes),
            None => config,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let default_filter = if args.verbose { "info" } else { "warn" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()),
        )
        .init();

    let (engine, reports) = EngineLoop::new(args.engine_config());
    let scheduler = engine.scheduler();
    let engine_task = tokio::spawn(engine.run());
    let printer = tokio::spawn(console::print_reports(reports, args.report_format));

    if args.autostart {
        scheduler.start().await;
    }

    let mut console = Console::new(
        BufReader::new(tokio::io::stdin()),
        std::io::stdout(),
        scheduler.clone(),
    );
    let session = console.run().await;

    // An I/O failure leaves the menu without stopping; make sure the loop ends.
    scheduler.stop().await;
    let dispatched = engine_task.await?;
    printer.await?;
    info!(dispatched, "scheduler exited");

    session?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_args() {
        let args = Args::parse_from(["scheduler"]);
        assert_eq!(args.tick_secs, 10);
        assert_eq!(args.report_format, ReportFormat::Text);
        assert!(!args.autostart);
        assert_eq!(args.engine_config(), EngineConfig::default());
    }

    #[test]
    fn test_engine_config_from_args() {
        let args = Args::parse_from([
            "scheduler",
            "--tick-secs",
            "120",
            "--sub-tick-ms",
            "50",
            "--decay-minutes",
            "3",
            "--report-format",
            "json",
        ]);
        let config = args.engine_config();
        assert_eq!(config.tick_interval_secs, 120);
        assert_eq!(config.sub_tick, Duration::from_millis(50));
        assert_eq!(config.decay_per_cycle(), 3);
        assert_eq!(args.report_format, ReportFormat::Json);
    }

    #[test]
    fn test_huge_sub_tick_builds_config() {
        let max = u64::MAX.to_string();
        let args = Args::parse_from(["scheduler", "--tick-secs", "4000", "--sub-tick-ms", &max]);
        assert_eq!(args.engine_config().idle_wait(), Duration::MAX);
    }

    #[test]
    fn test_zero_tick_rejected() {
        assert!(Args::try_parse_from(["scheduler", "--tick-secs", "0"]).is_err());
    }
}
