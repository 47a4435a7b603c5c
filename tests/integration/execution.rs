//! Wave execution tests.
//!
//! These tests run planned waves through the executor with a task runner
//! that gates every metered call on the economic governor.

use std::sync::Arc;
use tokio::sync::mpsc;

use waveplan::config::GovernorConfig;
use waveplan::core::Task;
use waveplan::governor::{EconomicGovernor, ManualClock};
use waveplan::orchestration::{ExecutorEvent, WaveExecutor};
use waveplan::{analyze, Error, TaskId};

use crate::fixtures::{delivery_request, diamond, strict_config, GovernorHarness};

/// A runner that asks the governor before "calling the model" and records
/// a fixed token usage afterwards.
fn metered_runner(
    governor: Arc<EconomicGovernor<ManualClock>>,
) -> impl Fn(Task) -> futures::future::BoxFuture<'static, Result<String, String>> {
    move |task: Task| {
        let governor = Arc::clone(&governor);
        Box::pin(async move {
            governor.admit().map_err(|e| e.to_string())?;
            governor.record("claude-sonnet-4-20250514", 2_000, 500);
            Ok::<_, String>(format!("done: {}", task.title))
        })
    }
}

#[tokio::test]
async fn test_plan_executes_every_wave_under_budget() {
    let harness = GovernorHarness::new(GovernorConfig::default());
    let analysis = analyze(delivery_request()).unwrap();

    let reports = WaveExecutor::new()
        .execute(&analysis.waves, metered_runner(Arc::clone(&harness.governor)))
        .await
        .unwrap();

    assert_eq!(reports.len(), 2);
    assert_eq!(reports[0].outputs.len(), 2);
    assert_eq!(reports[1].outputs[0].task_id, TaskId::from("3"));
    assert_eq!(reports[1].outputs[0].output, "done: Web UI");
    assert_eq!(harness.governor.current_usage().request_count, 3);
}

/// Test: Budget runs out mid-plan
/// Given a governor that allows two calls per hour
/// When a plan with three tasks over two waves runs
/// Then the first wave completes and the second fails on the governor
#[tokio::test]
async fn test_governor_stops_plan_mid_way() {
    let mut config = strict_config();
    config.max_requests_per_hour = 2;
    let harness = GovernorHarness::new(config);
    let analysis = analyze(delivery_request()).unwrap();

    let err = WaveExecutor::new()
        .execute(&analysis.waves, metered_runner(Arc::clone(&harness.governor)))
        .await
        .unwrap_err();

    match err {
        Error::WaveFailed { wave, failures } => {
            assert_eq!(wave, 2);
            assert_eq!(failures.len(), 1);
            assert_eq!(failures[0].0, TaskId::from("3"));
            assert!(failures[0].1.contains("Request limit exceeded"));
        }
        other => panic!("expected WaveFailed, got {:?}", other),
    }
    assert_eq!(harness.governor.current_usage().request_count, 2);
}

#[tokio::test]
async fn test_events_follow_wave_order() {
    let harness = GovernorHarness::new(GovernorConfig::default());
    let analysis = analyze(diamond()).unwrap();
    let (tx, mut rx) = mpsc::channel(64);

    WaveExecutor::with_events(tx)
        .execute(&analysis.waves, metered_runner(Arc::clone(&harness.governor)))
        .await
        .unwrap();

    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }

    let started: Vec<usize> = events
        .iter()
        .filter_map(|event| match event {
            ExecutorEvent::WaveStarted { wave, .. } => Some(*wave),
            _ => None,
        })
        .collect();
    assert_eq!(started, [1, 2, 3]);

    let completed = events
        .iter()
        .filter(|event| matches!(event, ExecutorEvent::TaskCompleted { .. }))
        .count();
    assert_eq!(completed, 4);
    assert_eq!(events.last(), Some(&ExecutorEvent::AllWavesComplete));
}
