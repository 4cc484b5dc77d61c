use metrics_exporter_prometheus::PrometheusBuilder;
use mock_service::{MockConfig, MockService};
use skiload::{Plan, RunConfig, RunSummary};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::OnceLock;
use tracing::error;
use tracing_subscriber::FmtSubscriber;

#[allow(unused)]
pub fn init() {
    static ONCE_LOCK: OnceLock<()> = OnceLock::new();

    ONCE_LOCK.get_or_init(|| {
        let default_panic = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            default_panic(info);
            error!("Panic occurred: {info:?}");
            std::process::exit(1);
        }));

        FmtSubscriber::builder()
            .with_env_filter("skiload=info,mock_service=info")
            .init();

        PrometheusBuilder::new().install_recorder().unwrap();
    });
}

/// A small run against `port`: 20 rides per skier over the three phases.
#[allow(unused)]
pub fn small_config(port: u16) -> RunConfig {
    RunConfig {
        max_workers: 8,
        skiers: 64,
        lifts: 10,
        runs_per_day: 10,
        port,
        host: "127.0.0.1".to_string(),
        ..Default::default()
    }
}

#[allow(unused)]
pub async fn mock(config: MockConfig) -> MockService {
    mock_service::spawn(config).await.unwrap()
}

#[allow(unused)]
pub fn expected_requests(config: &RunConfig) -> u64 {
    Plan::from_config(config).total_requests()
}

/// A fresh CSV path per call.
#[allow(unused)]
pub fn output_path(name: &str) -> PathBuf {
    static COUNTER: AtomicU32 = AtomicU32::new(0);
    let n = COUNTER.fetch_add(1, Ordering::Relaxed);
    std::env::temp_dir().join(format!("skiload-{name}-{}-{n}.csv", std::process::id()))
}

/// Rows of the CSV at `path` as `(issued_at_ms, kind, latency_ms, status)`. Removes the file.
#[allow(unused)]
pub fn read_rows(path: &PathBuf) -> Vec<(i64, String, u64, i32)> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_path(path)
        .unwrap();
    let rows = reader
        .records()
        .map(|record| {
            let record = record.unwrap();
            assert_eq!(record.len(), 4);
            (
                record[0].parse().unwrap(),
                record[1].to_string(),
                record[2].parse().unwrap(),
                record[3].parse().unwrap(),
            )
        })
        .collect();
    std::fs::remove_file(path).unwrap();
    rows
}

#[allow(unused)]
pub fn assert_conserved(summary: &RunSummary, expected: u64) {
    assert_eq!(summary.total_success + summary.total_failure, expected);
}
