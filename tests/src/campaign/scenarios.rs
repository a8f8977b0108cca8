use std::sync::Arc;
use std::time::Duration;

use tracr_core::campaign::{CampaignCounts, CampaignScheduler, CampaignSummary, ProbeTask, TaskState};
use tracr_core::error::CampaignError;
use tracr_core::publisher::MemorySink;

use super::support::{
    RecordingObserver, ScriptedExecutor, Step, config, eventually, hosts, scheduler, task, within,
};

fn total_attempts(tasks: &[ProbeTask]) -> u32 {
    tasks.iter().map(|task| task.attempts).sum()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn all_destinations_succeed_first_time() {
    let executor = Arc::new(ScriptedExecutor::new(Step::Succeed).with_delay(Duration::from_millis(5)));
    let sink = Arc::new(MemorySink::new());
    let observer = Arc::new(RecordingObserver::default());
    let scheduler: CampaignScheduler = scheduler(config(2, 3), executor.clone(), sink.clone(), observer.clone());

    scheduler.start(hosts(5)).unwrap();
    within("completion", scheduler.wait_for_completion()).await;

    let counts: CampaignCounts = scheduler.counts();
    assert_eq!(counts, CampaignCounts { pending: 0, running: 0, completed: 5, failed: 0 });
    assert_eq!(total_attempts(&scheduler.tasks()), 5);
    assert_eq!(executor.calls().len(), 5);
    assert!(executor.max_in_flight() <= 2);
    assert_eq!(sink.len(), 5);

    let completions: Vec<CampaignSummary> = observer.completions();
    assert_eq!(completions.len(), 1);
    assert_eq!((completions[0].completed, completions[0].failed, completions[0].attempts), (5, 0, 5));
    assert_eq!(observer.max_done(), 5);
}

#[tokio::test]
async fn destination_recovers_on_its_last_attempt() {
    let executor = Arc::new(
        ScriptedExecutor::new(Step::Succeed).script("192.0.2.1", &[Step::Fail, Step::Fail, Step::Succeed]),
    );
    let observer = Arc::new(RecordingObserver::default());
    let scheduler: CampaignScheduler =
        scheduler(config(4, 3), executor.clone(), Arc::new(MemorySink::new()), observer.clone());

    scheduler.start(hosts(1)).unwrap();
    within("completion", scheduler.wait_for_completion()).await;

    let tasks: Vec<ProbeTask> = scheduler.tasks();
    let recovered: &ProbeTask = task(&tasks, "192.0.2.1");
    assert_eq!(recovered.state, TaskState::Completed);
    assert_eq!(recovered.attempts, 3);
    assert!(recovered.destination.is_resolved());
    assert!(observer.failed_hosts().is_empty());
}

#[tokio::test]
async fn destination_fails_once_the_budget_is_spent() {
    let executor = Arc::new(ScriptedExecutor::new(Step::Fail));
    let observer = Arc::new(RecordingObserver::default());
    let scheduler: CampaignScheduler =
        scheduler(config(4, 3), executor.clone(), Arc::new(MemorySink::new()), observer.clone());

    scheduler.start(hosts(1)).unwrap();
    within("completion", scheduler.wait_for_completion()).await;

    let tasks: Vec<ProbeTask> = scheduler.tasks();
    let failed: &ProbeTask = task(&tasks, "192.0.2.1");
    assert_eq!(failed.state, TaskState::Failed);
    assert_eq!(failed.attempts, 3);
    assert_eq!(failed.last_error.as_deref(), Some("probe failed: no route to 192.0.2.1"));
    assert_eq!(executor.calls_for("192.0.2.1"), 3);
    assert_eq!(observer.failed_hosts(), vec!["192.0.2.1"]);
    assert_eq!(scheduler.counts(), CampaignCounts { failed: 1, ..Default::default() });
}

#[tokio::test]
async fn failed_destinations_retry_at_the_tail() {
    let executor = Arc::new(
        ScriptedExecutor::new(Step::Succeed).script("192.0.2.1", &[Step::Fail, Step::Succeed]),
    );
    let scheduler: CampaignScheduler = scheduler(
        config(1, 3),
        executor.clone(),
        Arc::new(MemorySink::new()),
        Arc::new(RecordingObserver::default()),
    );

    scheduler.start(hosts(3)).unwrap();
    within("completion", scheduler.wait_for_completion()).await;

    assert_eq!(executor.calls(), vec!["192.0.2.1", "192.0.2.2", "192.0.2.3", "192.0.2.1"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn lanes_never_exceed_the_concurrency_limit() {
    let executor = Arc::new(ScriptedExecutor::new(Step::Succeed).with_delay(Duration::from_millis(10)));
    let scheduler: CampaignScheduler = scheduler(
        config(4, 3),
        executor.clone(),
        Arc::new(MemorySink::new()),
        Arc::new(RecordingObserver::default()),
    );

    scheduler.start(hosts(20)).unwrap();
    within("completion", scheduler.wait_for_completion()).await;

    assert!(executor.max_in_flight() <= 4, "saw {} probes at once", executor.max_in_flight());
    assert_eq!(scheduler.counts().completed, 20);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn counts_always_cover_every_destination() {
    let executor = Arc::new(
        ScriptedExecutor::new(Step::Succeed)
            .with_delay(Duration::from_millis(3))
            .script("192.0.2.3", &[Step::Fail, Step::Fail])
            .script("192.0.2.7", &[Step::Fail, Step::Fail, Step::Fail]),
    );
    let scheduler: CampaignScheduler = scheduler(
        config(3, 3),
        executor.clone(),
        Arc::new(MemorySink::new()),
        Arc::new(RecordingObserver::default()),
    );

    scheduler.start(hosts(12)).unwrap();

    let sampler = {
        let scheduler: CampaignScheduler = scheduler.clone();
        tokio::spawn(async move {
            loop {
                let counts: CampaignCounts = scheduler.counts();
                assert_eq!(counts.total(), 12, "lost a task: {counts:?}");
                assert!(counts.running <= 3);
                if counts.is_terminal() {
                    return;
                }
                tokio::task::yield_now().await;
            }
        })
    };

    within("completion", scheduler.wait_for_completion()).await;
    within("sampler", sampler).await.unwrap();

    let tasks: Vec<ProbeTask> = scheduler.tasks();
    assert!(tasks.iter().all(|task| task.attempts <= 3));
    assert!(
        tasks
            .iter()
            .filter(|task| task.state == TaskState::Failed)
            .all(|task| task.attempts == 3)
    );
    assert_eq!(task(&tasks, "192.0.2.3").state, TaskState::Completed);
    assert_eq!(task(&tasks, "192.0.2.7").state, TaskState::Failed);
    assert_eq!(scheduler.counts(), CampaignCounts { completed: 11, failed: 1, ..Default::default() });
}

#[tokio::test]
async fn empty_campaign_completes_immediately() {
    let observer = Arc::new(RecordingObserver::default());
    let scheduler: CampaignScheduler = scheduler(
        config(3, 3),
        Arc::new(ScriptedExecutor::new(Step::Succeed)),
        Arc::new(MemorySink::new()),
        observer.clone(),
    );

    scheduler.start(Vec::<String>::new()).unwrap();
    within("completion", scheduler.wait_for_completion()).await;
    within("quiescence", scheduler.wait_for_quiescence()).await;

    assert_eq!(scheduler.counts(), CampaignCounts::default());
    assert_eq!(observer.completions().len(), 1);
    assert_eq!(scheduler.eta(), None);
}

#[tokio::test]
async fn start_is_rejected_while_a_campaign_is_in_flight() {
    let executor = Arc::new(ScriptedExecutor::new(Step::Succeed).script("192.0.2.1", &[Step::Hang]));
    let scheduler: CampaignScheduler = scheduler(
        config(2, 3),
        executor.clone(),
        Arc::new(MemorySink::new()),
        Arc::new(RecordingObserver::default()),
    );

    scheduler.start(hosts(1)).unwrap();
    eventually("probe to start", || scheduler.counts().running == 1).await;

    assert!(matches!(scheduler.start(hosts(2)), Err(CampaignError::AlreadyRunning)));

    scheduler.cancel();
    within("quiescence", scheduler.wait_for_quiescence()).await;

    scheduler.start(hosts(2)).unwrap();
    within("completion", scheduler.wait_for_completion()).await;
    assert_eq!(scheduler.counts(), CampaignCounts { completed: 2, ..Default::default() });
}

#[tokio::test]
async fn scheduler_runs_consecutive_campaigns() {
    let observer = Arc::new(RecordingObserver::default());
    let scheduler: CampaignScheduler = scheduler(
        config(2, 3),
        Arc::new(ScriptedExecutor::new(Step::Succeed)),
        Arc::new(MemorySink::new()),
        observer.clone(),
    );

    scheduler.start(hosts(3)).unwrap();
    within("first completion", scheduler.wait_for_completion()).await;

    scheduler.start(vec!["198.51.100.1", "198.51.100.2"]).unwrap();
    within("second completion", scheduler.wait_for_completion()).await;

    assert_eq!(scheduler.counts(), CampaignCounts { completed: 2, ..Default::default() });
    let completions: Vec<CampaignSummary> = observer.completions();
    assert_eq!(completions.iter().map(|s| s.total).collect::<Vec<_>>(), vec![3, 2]);
}
