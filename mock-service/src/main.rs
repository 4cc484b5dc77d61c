use clap::Parser;
use metrics_exporter_prometheus::PrometheusBuilder;
use mock_service::MockConfig;
use std::net::SocketAddr;
use std::num::NonZeroU32;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    #[arg(short, long, default_value = "0.0.0.0:8080")]
    addr: SocketAddr,

    #[arg(long, default_value = "")]
    base_path: String,

    /// Mean delay before answering, in milliseconds
    #[arg(long, default_value_t = 0)]
    delay_ms: u64,

    /// Standard deviation of the delay, in milliseconds
    #[arg(long)]
    jitter_ms: Option<u64>,

    #[arg(long)]
    fail_every: Option<u64>,

    #[arg(long)]
    max_skier: Option<u32>,

    #[arg(long)]
    max_tps: Option<NonZeroU32>,

    #[arg(long)]
    metrics_addr: Option<SocketAddr>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("mock_service=info,tower_http=info"));
    FmtSubscriber::builder().with_env_filter(filter).init();

    let cli = Cli::parse();

    if let Some(addr) = cli.metrics_addr {
        PrometheusBuilder::new().with_http_listener(addr).install()?;
    }

    let config = MockConfig {
        base_path: cli.base_path,
        delay: Duration::from_millis(cli.delay_ms),
        jitter: cli.jitter_ms.map(Duration::from_millis),
        fail_every: cli.fail_every,
        max_skier: cli.max_skier,
        max_tps: cli.max_tps,
    };

    let listener = TcpListener::bind(cli.addr).await?;
    tracing::info!("Listening on {}", listener.local_addr()?);
    mock_service::serve(listener, config).await?;
    Ok(())
}
