mod utils;
#[allow(unused)]
use utils::*;

use mock_service::MockConfig;
use skiload::{CsvSink, HttpTarget, RunConfig, REQUEST_KIND};
use std::time::Duration;

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
#[ntest::timeout(60_000)]
async fn every_request_is_created() {
    init();
    let service = mock(MockConfig::default()).await;
    let config = small_config(service.addr().port());
    let expected = expected_requests(&config);
    let path = output_path("created");

    let summary = skiload::run_to_file(&config, &path).await.unwrap();

    assert_eq!(summary.total_success, expected);
    assert_eq!(summary.total_failure, 0);
    assert_eq!(service.received(), expected);
    assert!(summary.latency.is_some());
    assert!(summary.throughput_per_second > 0.);

    let rows = read_rows(&path);
    assert_eq!(rows.len() as u64, expected);
    assert!(rows
        .iter()
        .all(|(issued_at, kind, _, status)| *issued_at > 0 && kind == REQUEST_KIND && *status == 201));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
#[ntest::timeout(60_000)]
async fn failures_are_recorded_with_their_status() {
    init();
    let service = mock(MockConfig {
        fail_every: Some(7),
        max_skier: Some(32),
        ..Default::default()
    })
    .await;
    let config = small_config(service.addr().port());
    let expected = expected_requests(&config);
    let path = output_path("mixed");

    let summary = skiload::run_to_file(&config, &path).await.unwrap();

    assert_conserved(&summary, expected);
    assert_eq!(service.received(), expected);
    assert!(summary.total_success > 0);
    assert!(summary.total_failure > 0);

    let rows = read_rows(&path);
    assert_eq!(rows.len() as u64, expected);
    let count = |code: i32| rows.iter().filter(|(_, _, _, status)| *status == code).count() as u64;
    assert_eq!(count(201), summary.total_success);
    assert!(count(404) > 0);
    assert!(count(500) > 0);
    assert_eq!(count(201) + count(404) + count(500), expected);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ntest::timeout(60_000)]
async fn unreachable_target_fails_every_request() {
    init();
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let config = RunConfig {
        max_workers: 4,
        skiers: 8,
        ..small_config(port)
    };
    let expected = expected_requests(&config);
    let path = output_path("unreachable");

    let summary = skiload::run_to_file(&config, &path).await.unwrap();

    assert_eq!(summary.total_success, 0);
    assert_eq!(summary.total_failure, expected);
    assert_eq!(summary.throughput_per_second, 0.);

    let rows = read_rows(&path);
    assert_eq!(rows.len() as u64, expected);
    assert!(rows.iter().all(|(_, _, _, status)| *status == 400));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ntest::timeout(60_000)]
async fn serves_under_a_base_path() {
    init();
    let service = mock(MockConfig {
        base_path: "/skiers-api".to_string(),
        delay: Duration::from_millis(1),
        ..Default::default()
    })
    .await;
    let config = RunConfig {
        base_path: "/skiers-api".to_string(),
        ..small_config(service.addr().port())
    };
    let expected = expected_requests(&config);

    let target = HttpTarget::new(config.base_url().unwrap()).unwrap();
    let mut sink = CsvSink::from_writer(vec![]);
    let summary = skiload::run(&config, target, &mut sink).await.unwrap();

    assert_eq!(summary.total_success, expected);
    let latency = summary.latency.unwrap();
    assert!(latency.max >= 1);
    assert!(latency.median <= latency.p99 && latency.p99 <= latency.max);

    let out = String::from_utf8(sink.into_inner().unwrap()).unwrap();
    assert_eq!(out.lines().count() as u64, expected);
}
