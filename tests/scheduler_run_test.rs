mod common;

use common::{
    build_scheduler, build_scheduler_with_connector, test_accounts, test_settings, ChainState,
    MockConnector,
};
use std::sync::atomic::Ordering;
use std::time::Duration;
use tea_swarm::account::Action;
use tea_swarm::executor::Outcome;

#[tokio::test(start_paused = true)]
async fn test_every_account_produces_exactly_one_result() {
    let state = ChainState::funded();
    let settings = test_settings();
    let scheduler = build_scheduler(
        settings,
        state.clone(),
        test_accounts(10, Action::Stake),
        Vec::new(),
        Vec::new(),
    )
    .unwrap();

    let report = scheduler.run().await;
    assert_eq!(report.results.len(), 10);
    for (i, result) in report.results.iter().enumerate() {
        assert_eq!(result.account_index, i);
        assert_eq!(result.outcome, Outcome::Success);
    }
    assert_eq!(report.summary.total, 10);
    assert_eq!(report.summary.succeeded, 10);
}

#[tokio::test(start_paused = true)]
async fn test_batches_bound_concurrency_and_apply_cooldown() {
    let state = ChainState::funded();
    let mut settings = test_settings();
    settings.max_concurrency_no_proxy = 3;
    let scheduler = build_scheduler(
        settings,
        state.clone(),
        test_accounts(10, Action::Stake),
        Vec::new(),
        Vec::new(),
    )
    .unwrap();

    let started = tokio::time::Instant::now();
    let report = scheduler.run().await;

    // 10 accounts at max 3 concurrent => batches of [3, 3, 3, 1].
    assert_eq!(report.summary.succeeded, 10);
    assert!(state.high_water_mark() <= 3);
    assert_eq!(state.high_water_mark(), 3);
    // Three inter-batch cool-downs of 3s each, plus per-batch confirmation
    // latency.
    assert!(started.elapsed() >= Duration::from_secs(9));
}

#[tokio::test(start_paused = true)]
async fn test_proxy_shortfall_aborts_before_any_task() {
    let state = ChainState::funded();
    let mut settings = test_settings();
    settings.use_proxy = true;
    let result = build_scheduler(
        settings,
        state.clone(),
        test_accounts(5, Action::Claim),
        vec!["10.0.0.1:8080".to_string(), "10.0.0.2:8080".to_string()],
        Vec::new(),
    );

    let err = result.err().expect("2 proxies for 5 accounts must be fatal");
    let msg = err.to_string();
    assert!(msg.contains("5 accounts"));
    assert!(msg.contains("2 proxies"));
    assert_eq!(state.submit_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn test_empty_account_list_is_fatal() {
    let state = ChainState::funded();
    assert!(build_scheduler(test_settings(), state, Vec::new(), Vec::new(), Vec::new()).is_err());
}

#[tokio::test(start_paused = true)]
async fn test_timed_out_tasks_do_not_stall_the_run() {
    // Confirmations take far longer than the task budget.
    let state = ChainState::funded_slow(Duration::from_secs(600));
    let mut settings = test_settings();
    settings.max_concurrency_no_proxy = 2;
    settings.task_timeout = Duration::from_secs(5);
    let scheduler = build_scheduler(
        settings,
        state.clone(),
        test_accounts(4, Action::Stake),
        Vec::new(),
        Vec::new(),
    )
    .unwrap();

    let report = scheduler.run().await;
    assert_eq!(report.results.len(), 4);
    for result in &report.results {
        assert_eq!(result.outcome, Outcome::Timeout);
    }
    assert_eq!(report.summary.timed_out, 4);
}

#[tokio::test(start_paused = true)]
async fn test_panicking_task_is_contained() {
    let state = ChainState::funded();
    let mut connector = MockConnector::new(state.clone());
    connector.panic_on_index = Some(1);
    let scheduler = build_scheduler_with_connector(
        test_settings(),
        connector,
        test_accounts(3, Action::Claim),
        Vec::new(),
        Vec::new(),
    )
    .unwrap();

    let report = scheduler.run().await;
    assert_eq!(report.results.len(), 3);
    assert_eq!(report.results[0].outcome, Outcome::Success);
    assert_eq!(report.results[2].outcome, Outcome::Success);
    assert_eq!(report.results[1].outcome, Outcome::Failure);
    let detail = report.results[1].detail.as_deref().unwrap();
    assert!(detail.contains("panicked"), "got: {detail}");
}
