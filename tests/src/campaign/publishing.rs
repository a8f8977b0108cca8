use std::sync::Arc;

use tracr_common::config::{CampaignConfig, PublishBudget};
use tracr_core::campaign::{CampaignScheduler, ProbeTask, TaskState};
use tracr_core::publisher::MemorySink;
use tracr_protocols::payload::{TraceroutePayload, UNKNOWN_SOURCE, UNREACHABLE};

use super::support::{
    FlakySink, RecordingObserver, ScriptedExecutor, Step, config, hosts, scheduler, task, within,
};

fn publish_config(publish_attempts: u32, publish_budget: PublishBudget) -> CampaignConfig {
    CampaignConfig {
        publish_attempts,
        publish_budget,
        ..config(2, 3)
    }
}

#[tokio::test]
async fn inline_retries_absorb_a_flaky_sink() {
    let executor = Arc::new(ScriptedExecutor::new(Step::Succeed));
    let sink = Arc::new(FlakySink::new(2));
    let scheduler: CampaignScheduler = scheduler(
        publish_config(3, PublishBudget::Shared),
        executor.clone(),
        sink.clone(),
        Arc::new(RecordingObserver::default()),
    );

    scheduler.start(hosts(1)).unwrap();
    within("completion", scheduler.wait_for_completion()).await;

    let tasks: Vec<ProbeTask> = scheduler.tasks();
    assert_eq!(task(&tasks, "192.0.2.1").state, TaskState::Completed);
    assert_eq!(task(&tasks, "192.0.2.1").attempts, 1);
    assert_eq!(executor.calls().len(), 1);
    assert_eq!(sink.calls(), 3);
}

#[tokio::test]
async fn shared_budget_probes_again_after_a_failed_publish() {
    let executor = Arc::new(ScriptedExecutor::new(Step::Succeed));
    let sink = Arc::new(FlakySink::new(2));
    let scheduler: CampaignScheduler = scheduler(
        publish_config(1, PublishBudget::Shared),
        executor.clone(),
        sink.clone(),
        Arc::new(RecordingObserver::default()),
    );

    scheduler.start(hosts(1)).unwrap();
    within("completion", scheduler.wait_for_completion()).await;

    let tasks: Vec<ProbeTask> = scheduler.tasks();
    assert_eq!(task(&tasks, "192.0.2.1").state, TaskState::Completed);
    assert_eq!(task(&tasks, "192.0.2.1").attempts, 3);
    assert_eq!(executor.calls().len(), 3);
    assert_eq!(sink.accepted().len(), 1);
}

#[tokio::test]
async fn shared_budget_fails_when_publishing_never_succeeds() {
    let executor = Arc::new(ScriptedExecutor::new(Step::Succeed));
    let observer = Arc::new(RecordingObserver::default());
    let scheduler: CampaignScheduler = scheduler(
        publish_config(2, PublishBudget::Shared),
        executor.clone(),
        Arc::new(FlakySink::always_failing()),
        observer.clone(),
    );

    scheduler.start(hosts(1)).unwrap();
    within("completion", scheduler.wait_for_completion()).await;

    let tasks: Vec<ProbeTask> = scheduler.tasks();
    let failed: &ProbeTask = task(&tasks, "192.0.2.1");
    assert_eq!(failed.state, TaskState::Failed);
    assert_eq!(failed.attempts, 3);
    assert!(failed.last_error.as_deref().is_some_and(|e| e.contains("collector busy")));
    assert_eq!(executor.calls().len(), 3);
    assert_eq!(observer.failed_hosts(), vec!["192.0.2.1"]);
}

#[tokio::test]
async fn independent_budget_fails_without_probing_again() {
    let executor = Arc::new(ScriptedExecutor::new(Step::Succeed));
    let sink = Arc::new(FlakySink::always_failing());
    let scheduler: CampaignScheduler = scheduler(
        publish_config(2, PublishBudget::Independent),
        executor.clone(),
        sink.clone(),
        Arc::new(RecordingObserver::default()),
    );

    scheduler.start(hosts(1)).unwrap();
    within("completion", scheduler.wait_for_completion()).await;

    let tasks: Vec<ProbeTask> = scheduler.tasks();
    assert_eq!(task(&tasks, "192.0.2.1").state, TaskState::Failed);
    assert_eq!(task(&tasks, "192.0.2.1").attempts, 1);
    assert_eq!(executor.calls().len(), 1);
    assert_eq!(sink.calls(), 2);
}

#[tokio::test]
async fn published_payload_describes_the_route() {
    let sink = Arc::new(MemorySink::new());
    let scheduler: CampaignScheduler = scheduler(
        config(1, 3),
        Arc::new(ScriptedExecutor::new(Step::Succeed)),
        sink.clone(),
        Arc::new(RecordingObserver::default()),
    );

    scheduler.start(vec!["collector.example"]).unwrap();
    within("completion", scheduler.wait_for_completion()).await;

    let payloads: Vec<TraceroutePayload> = sink.payloads();
    assert_eq!(payloads.len(), 1);

    let payload: &TraceroutePayload = &payloads[0];
    assert_eq!(payload.session_id, "session-1");
    assert_eq!(payload.src_name, "test-bench");
    assert_eq!(payload.src_ip, UNKNOWN_SOURCE);
    assert_eq!(payload.dst_name, "collector.example");
    assert_eq!(payload.dst_ip, "192.0.2.200");

    let ips: Vec<&str> = payload.hops.iter().map(|hop| hop.ip.as_str()).collect();
    assert_eq!(ips, vec!["10.0.0.1", UNREACHABLE, "192.0.2.200"]);
    assert_eq!(payload.hops[0].id, "1");
}
