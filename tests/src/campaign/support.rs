use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tracr_common::config::CampaignConfig;
use tracr_common::network::destination::Destination;
use tracr_common::network::hop::{Hop, HopList};
use tracr_core::campaign::{CampaignObserver, CampaignScheduler, CampaignSummary, ProbeTask};
use tracr_core::error::{ProbeError, PublishError};
use tracr_core::probe::ProbeExecutor;
use tracr_core::publisher::{MemorySink, ResultPublisher, ResultSink};
use tracr_core::signal::CancellationSignal;
use tracr_protocols::payload::{SourceIdentity, TraceroutePayload};

pub const WAIT: Duration = Duration::from_secs(5);

/// What one execution of a scripted probe does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Succeed,
    Fail,
    /// Blocks until the campaign is canceled.
    Hang,
}

/// A probe executor whose outcome per destination is scripted in advance.
///
/// Hosts without a script, or whose script is used up, fall back to the
/// default step.
pub struct ScriptedExecutor {
    scripts: Mutex<HashMap<String, VecDeque<Step>>>,
    default: Step,
    delay: Duration,
    calls: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedExecutor {
    pub fn new(default: Step) -> Self {
        Self {
            scripts: Mutex::new(HashMap::new()),
            default,
            delay: Duration::ZERO,
            calls: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn script(self, host: &str, steps: &[Step]) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .insert(host.to_string(), steps.iter().copied().collect());
        self
    }

    /// Hosts in the order their probes started.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_for(&self, host: &str) -> usize {
        self.calls().iter().filter(|h| h.as_str() == host).count()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn next_step(&self, host: &str) -> Step {
        self.scripts
            .lock()
            .unwrap()
            .get_mut(host)
            .and_then(VecDeque::pop_front)
            .unwrap_or(self.default)
    }
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl ProbeExecutor for ScriptedExecutor {
    async fn execute(
        &self,
        destination: &mut Destination,
        signal: &CancellationSignal,
    ) -> Result<HopList, ProbeError> {
        let host: String = destination.host().to_string();
        self.calls.lock().unwrap().push(host.clone());

        let now: usize = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let _guard = InFlight(&self.in_flight);

        let step: Step = self.next_step(&host);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        match step {
            Step::Succeed => {
                let address: IpAddr = IpAddr::V4(Ipv4Addr::new(192, 0, 2, 200));
                destination.set_address(address);
                Ok(vec![Hop::reply(1, IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1))), Hop::silent(2), Hop::reply(3, address)])
            }
            Step::Fail => Err(ProbeError::Execution(format!("no route to {host}"))),
            Step::Hang => {
                while !signal.is_canceled() {
                    tokio::time::sleep(Duration::from_millis(5)).await;
                }
                Err(ProbeError::Canceled)
            }
        }
    }
}

/// Records every observer callback.
#[derive(Default)]
pub struct RecordingObserver {
    progress: Mutex<Vec<(usize, usize)>>,
    failed: Mutex<Vec<(String, String)>>,
    completions: Mutex<Vec<CampaignSummary>>,
}

impl RecordingObserver {
    pub fn max_done(&self) -> usize {
        self.progress.lock().unwrap().iter().map(|(done, _)| *done).max().unwrap_or(0)
    }

    pub fn failed_hosts(&self) -> Vec<String> {
        self.failed.lock().unwrap().iter().map(|(host, _)| host.clone()).collect()
    }

    pub fn completions(&self) -> Vec<CampaignSummary> {
        self.completions.lock().unwrap().clone()
    }
}

impl CampaignObserver for RecordingObserver {
    fn on_progress(&self, done: usize, total: usize) {
        assert!(done <= total, "progress {done}/{total} overshoots");
        self.progress.lock().unwrap().push((done, total));
    }

    fn on_failed(&self, destination: &Destination, reason: &str) {
        self.failed
            .lock()
            .unwrap()
            .push((destination.host().to_string(), reason.to_string()));
    }

    fn on_complete(&self, summary: &CampaignSummary) {
        self.completions.lock().unwrap().push(summary.clone());
    }
}

/// Rejects the first `failures` submissions, then stores payloads.
pub struct FlakySink {
    failures: u32,
    calls: AtomicU32,
    accepted: MemorySink,
}

impl FlakySink {
    pub fn new(failures: u32) -> Self {
        Self {
            failures,
            calls: AtomicU32::new(0),
            accepted: MemorySink::new(),
        }
    }

    pub fn always_failing() -> Self {
        Self::new(u32::MAX)
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn accepted(&self) -> Vec<TraceroutePayload> {
        self.accepted.payloads()
    }
}

#[async_trait]
impl ResultSink for FlakySink {
    async fn submit(&self, payload: &TraceroutePayload) -> Result<(), PublishError> {
        let call: u32 = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.failures {
            return Err(PublishError::Rejected(format!("collector busy ({call})")));
        }
        self.accepted.submit(payload).await
    }
}

pub fn config(concurrency: usize, max_attempts: u32) -> CampaignConfig {
    CampaignConfig {
        concurrency,
        max_attempts,
        poll_interval: Duration::from_millis(5),
        ..CampaignConfig::default()
    }
}

pub fn scheduler(
    config: CampaignConfig,
    executor: Arc<ScriptedExecutor>,
    sink: Arc<dyn ResultSink>,
    observer: Arc<RecordingObserver>,
) -> CampaignScheduler {
    let source: SourceIdentity = SourceIdentity {
        name: "test-bench".to_string(),
        address: None,
    };
    let publisher: ResultPublisher =
        ResultPublisher::new(sink, "session-1", source, config.publish_attempts);
    CampaignScheduler::new(config, executor, publisher, observer).unwrap()
}

pub fn hosts(count: usize) -> Vec<String> {
    (1..=count).map(|i| format!("192.0.2.{i}")).collect()
}

pub fn task<'a>(tasks: &'a [ProbeTask], host: &str) -> &'a ProbeTask {
    tasks
        .iter()
        .find(|task| task.destination.host() == host)
        .unwrap_or_else(|| panic!("no task for {host}"))
}

pub async fn within<F: Future>(what: &str, future: F) -> F::Output {
    tokio::time::timeout(WAIT, future)
        .await
        .unwrap_or_else(|_| panic!("timed out waiting for {what}"))
}

/// Polls `condition` until it holds.
pub async fn eventually(what: &str, mut condition: impl FnMut() -> bool) {
    within(what, async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
    })
    .await;
}
