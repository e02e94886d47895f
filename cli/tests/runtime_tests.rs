// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! A runtime built from YAML coordinates, learns and persists.

use hybrid_swarm::{CoordinationRuntime, ExecutionReport, SelectionSource};
use hybrid_swarm_core::{CoordinationConfig, TaskDescriptor};

fn config(data_dir: &std::path::Path) -> CoordinationConfig {
    let yaml = format!(
        r#"
apiVersion: 100monkeys.ai/v1
kind: CoordinationConfig
metadata:
  name: runtime-test
spec:
  matching:
    rng_seed: 11
  storage:
    backend: filesystem
    data_dir: {}
"#,
        data_dir.display()
    );
    CoordinationConfig::from_yaml_str(&yaml).unwrap()
}

fn research_task(id: &str) -> TaskDescriptor {
    TaskDescriptor::new(id, "report")
        .with_description("survey of consensus protocols")
        .with_domain("research", 0.9)
        .with_domain("analysis", 0.4)
        .with_complexity(0.8)
        .with_keywords(["consensus", "raft"])
        .with_estimated_duration(6.0)
}

#[tokio::test]
async fn test_coordinate_report_publishes_events() {
    let dir = tempfile::tempdir().unwrap();
    let runtime = CoordinationRuntime::start(&config(dir.path())).await.unwrap();
    let mut events = runtime.engine.event_bus().subscribe();

    let task = research_task("t1");
    let decision = runtime.engine.get_coordination(&task).await.unwrap();
    assert_eq!(decision.selection, SelectionSource::Exploration);

    let outcome = runtime
        .engine
        .record_result(
            ExecutionReport::new(&decision.specialist_id, &decision.approach_id, "t1", 0.75, true)
                .with_task(task),
        )
        .await
        .unwrap();
    assert!(outcome.specialist_updated);
    assert!(outcome.signal_deposited);
    assert!(outcome.ledger_appended);

    let mut seen = Vec::new();
    while let Ok(event) = events.try_recv() {
        seen.push(event.event_type());
    }
    for expected in [
        "SpecialistCreated",
        "ApproachSelected",
        "SignalDeposited",
        "ExecutionRecorded",
    ] {
        assert!(seen.contains(&expected), "missing {expected} in {seen:?}");
    }

    runtime.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_signal_is_followed_after_restart() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path());

    let first = {
        let runtime = CoordinationRuntime::start(&config).await.unwrap();
        let decision = runtime.engine.get_coordination(&research_task("t1")).await.unwrap();
        runtime
            .engine
            .record_result(ExecutionReport::new(
                &decision.specialist_id,
                &decision.approach_id,
                "t1",
                0.95,
                true,
            ))
            .await
            .unwrap();
        runtime.shutdown().await.unwrap();
        decision
    };

    let runtime = CoordinationRuntime::start(&config).await.unwrap();
    let again = runtime.engine.get_coordination(&research_task("t1")).await.unwrap();
    assert_eq!(again.specialist_id, first.specialist_id);
    assert_eq!(again.selection, SelectionSource::Signal);
    assert_eq!(again.approach_id, first.approach_id);
    assert!((again.quality_target - 0.95).abs() < 1e-3);
    runtime.shutdown().await.unwrap();
}
