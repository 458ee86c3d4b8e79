use anyhow::{Context, Result};
use clap::Parser;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use sysopt::cli::{Cli, OutputFormat};
use sysopt::config::OptimizerConfig;
use sysopt::feed::{EventReplay, SimulatedFeed, BURST_EVENTS, SIMULATION_INTERVAL};
use sysopt::optimizer::SyscallOptimizer;
use sysopt::report::Report;
use sysopt::resources::{FixedSampler, ResourceSampler, SysinfoSampler};
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber; `--debug` forces TRACE, otherwise RUST_LOG or warn
fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::from_default_env().add_directive(tracing::Level::TRACE.into())
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Config file (or defaults) with command-line overrides applied
fn load_config(args: &Cli) -> Result<OptimizerConfig> {
    let mut config = match &args.config {
        Some(path) => OptimizerConfig::from_file(path)?,
        None => OptimizerConfig::default(),
    };

    if let Some(threshold) = args.threshold {
        config.performance_threshold = threshold;
    }
    if let Some(interval) = args.refresh_interval {
        config.refresh_interval_secs = interval;
    }
    if args.no_backend {
        config.backend.enabled = false;
    }

    config.validate()?;
    Ok(config)
}

fn main() -> Result<()> {
    let args = Cli::parse();

    if args.rounds == 0 {
        anyhow::bail!("Invalid value for --rounds: 0 (must be >= 1)");
    }

    init_tracing(args.debug);

    let config = load_config(&args)?;

    let sampler: Arc<dyn ResourceSampler> = if args.no_sampling {
        Arc::new(FixedSampler::default())
    } else {
        Arc::new(SysinfoSampler::new())
    };
    let optimizer = SyscallOptimizer::with_sampler(&config, sampler)?;
    let refresher = optimizer.start_baseline_refresher()?;

    if let Some(path) = &args.events {
        let stats = EventReplay::replay_file(path, optimizer.store())
            .with_context(|| format!("Failed to replay events from {}", path.display()))?;
        tracing::info!(
            "replayed {} events from {} ({} rejected)",
            stats.recorded,
            path.display(),
            stats.rejected
        );
    }

    if args.burst {
        SimulatedFeed::for_burst().burst(optimizer.store(), &mut rand::thread_rng(), BURST_EVENTS);
    }

    let feed = if args.simulate {
        tracing::debug!("starting simulated feed");
        Some(SimulatedFeed::default().spawn(optimizer.store().clone(), SIMULATION_INTERVAL)?)
    } else {
        None
    };

    let interval = Duration::from_secs(optimizer.refresh_interval());
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    for round in 1..=args.rounds {
        if round > 1 {
            std::thread::sleep(interval);
        }
        let report = Report::collect(&optimizer, round);
        match args.format {
            OutputFormat::Text => report.write_text(&mut out)?,
            OutputFormat::Json => report.write_json(&mut out)?,
        }
        out.flush()?;
    }

    if let Some(feed) = feed {
        tracing::debug!("stopping simulated feed");
        feed.stop();
    }
    refresher.stop();

    Ok(())
}
