use anyhow::Context;
use clap::Parser;
use skiload::{ask_for_params, report, Overrides, RunConfig, DEFAULT_HOST};
use std::io;
#[cfg(feature = "metrics")]
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Worker count of the peak phase
    #[arg(short = 't', long)]
    max_workers: Option<usize>,

    #[arg(short, long)]
    skiers: Option<u32>,

    #[arg(short, long)]
    lifts: Option<u32>,

    /// Mean number of lift rides per skier per day
    #[arg(short, long = "runs")]
    runs_per_day: Option<u32>,

    #[arg(short, long)]
    port: Option<u16>,

    /// Take defaults for everything not given on the command line instead of asking
    #[arg(long)]
    no_prompt: bool,

    #[arg(long, default_value = DEFAULT_HOST)]
    host: String,

    /// Path prefix of the lift ride API on the target
    #[arg(long, default_value = "")]
    base_path: String,

    /// Where to write one CSV row per request
    #[arg(short, long, default_value = "lift_rides.csv")]
    output: PathBuf,

    /// Serve Prometheus metrics on this address while the run lasts
    #[cfg(feature = "metrics")]
    #[arg(long)]
    metrics_addr: Option<SocketAddr>,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            max_workers: self.max_workers,
            skiers: self.skiers,
            lifts: self.lifts,
            runs_per_day: self.runs_per_day,
            port: self.port,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("skiload=info"));
    FmtSubscriber::builder().with_env_filter(filter).init();

    let cli = Cli::parse();

    let base = RunConfig {
        host: cli.host.clone(),
        base_path: cli.base_path.clone(),
        ..Default::default()
    };
    let config = if cli.no_prompt {
        cli.overrides().apply(base)
    } else {
        ask_for_params(io::stdin().lock(), io::stdout(), base, &cli.overrides())?
    };
    config.validate()?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.max_workers)
        .enable_all()
        .build()
        .context("Unable to start the async runtime")?;

    let summary = runtime.block_on(async {
        #[cfg(feature = "metrics")]
        if let Some(addr) = cli.metrics_addr {
            metrics_exporter_prometheus::PrometheusBuilder::new()
                .with_http_listener(addr)
                .install()
                .context("Unable to install the Prometheus exporter")?;
        }

        skiload::run_to_file(&config, &cli.output)
            .await
            .context("Load test failed")
    })?;

    report(&summary, io::stdout().lock())?;
    Ok(())
}
