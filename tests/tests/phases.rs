mod utils;
#[allow(unused)]
use utils::*;

use mock_service::MockConfig;
use skiload::{CsvSink, HttpTarget, Stage, TestOrchestrator};

#[tracing_test::traced_test]
#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
#[ntest::timeout(60_000)]
async fn phases_run_in_order() {
    let service = mock_service::spawn(MockConfig::default()).await.unwrap();
    let config = small_config(service.addr().port());
    let plan = skiload::Plan::from_config(&config);
    let target = HttpTarget::new(config.base_url().unwrap()).unwrap();

    let outcome = TestOrchestrator::new(plan.clone(), target, config.lifts)
        .run()
        .await
        .unwrap();

    assert_eq!(
        outcome.transitions,
        vec![Stage::RampUp, Stage::Peak, Stage::CoolDown, Stage::Done]
    );
    assert_eq!(outcome.success, plan.total_requests());
    assert_eq!(outcome.results.len() as u64, plan.total_requests());

    assert!(logs_contain("Test phase ramp-up initiated."));
    assert!(logs_contain("Count down of phase peak reached zero."));
    assert!(logs_contain("Phase cool-down has ended"));

    let mut aggregator = skiload::ResultAggregator::new(CsvSink::from_writer(vec![]));
    let aggregate = aggregator.drain(outcome.results).await.unwrap();
    assert_eq!(aggregate.rows, plan.total_requests());
}
