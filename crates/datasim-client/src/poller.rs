use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, warn};

use datasim_core::{Job, JobId};

use crate::client::StatusSource;
use crate::config::ClientConfig;
use crate::error::ClientError;

/// Tuning for a poll cycle.
#[derive(Debug, Clone)]
pub struct PollOptions {
    /// Delay between status fetches.
    pub interval: Duration,
    /// Consecutive fetch failures tolerated before the cycle is abandoned.
    pub max_failures: u32,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            max_failures: 3,
        }
    }
}

impl PollOptions {
    pub fn from_config(config: &ClientConfig) -> Self {
        Self {
            interval: Duration::from_millis(config.poll_interval_ms.max(1)),
            max_failures: config.max_poll_failures.max(1),
        }
    }
}

/// Event published by an active poll cycle.
#[derive(Debug)]
pub enum PollEvent {
    /// A fresh job snapshot, replacing any previous one entirely. The cycle
    /// ends after the first terminal snapshot.
    Update(Job),
    /// The cycle gave up after consecutive fetch failures. The job itself is
    /// not known to have failed; its last reported status still stands.
    Lost { attempts: u32, error: ClientError },
}

/// Handle to a live poll cycle. Dropping it cancels the cycle.
pub struct PollHandle {
    job_id: JobId,
    task: JoinHandle<()>,
}

impl PollHandle {
    pub fn job_id(&self) -> &JobId {
        &self.job_id
    }

    /// True once the cycle reached a terminal snapshot, was abandoned, or was
    /// stopped.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Cancel the cycle. Safe to call more than once.
    pub fn stop(&self) {
        self.task.abort();
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Repeatedly fetches the status of one job until it reaches a terminal
/// state, publishing each snapshot as a [`PollEvent`].
pub struct JobPoller;

impl JobPoller {
    /// Start a poll cycle for `job_id`.
    ///
    /// Ticks are interval-scheduled, not pipelined: a fetch completes and its
    /// event is published before the next tick can fire. The first fetch
    /// happens one interval after spawning.
    pub fn spawn<S>(
        source: Arc<S>,
        job_id: JobId,
        options: PollOptions,
    ) -> (PollHandle, UnboundedReceiver<PollEvent>)
    where
        S: StatusSource + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = job_id.clone();
        let task = tokio::spawn(poll_loop(source, id, options, tx));
        (PollHandle { job_id, task }, rx)
    }
}

async fn poll_loop<S: StatusSource>(
    source: Arc<S>,
    job_id: JobId,
    options: PollOptions,
    tx: UnboundedSender<PollEvent>,
) {
    let mut ticker = time::interval(options.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // an interval's first tick completes immediately; skip it so the first
    // fetch happens one interval after submission
    ticker.tick().await;

    let mut failures = 0u32;
    loop {
        ticker.tick().await;
        match source.job_status(&job_id).await {
            Ok(job) => {
                failures = 0;
                let terminal = job.status.is_terminal();
                if tx.send(PollEvent::Update(job)).is_err() {
                    // receiver dropped, nobody is watching
                    return;
                }
                if terminal {
                    debug!(job = %job_id, "job reached a terminal state, polling stopped");
                    return;
                }
            }
            Err(error) => {
                failures += 1;
                warn!(job = %job_id, attempt = failures, %error, "status fetch failed");
                if failures >= options.max_failures {
                    let _ = tx.send(PollEvent::Lost {
                        attempts: failures,
                        error,
                    });
                    return;
                }
                // linear backoff: sit out extra intervals before retrying
                for _ in 0..failures {
                    ticker.tick().await;
                }
            }
        }
    }
}

/// Owns at most one live poll cycle.
///
/// Starting a new cycle stops the previous one first, so two pollers never
/// observe jobs concurrently.
#[derive(Default)]
pub struct JobTracker {
    current: Option<PollHandle>,
}

impl JobTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stop any previous cycle and start polling `job_id`.
    pub fn start<S>(
        &mut self,
        source: Arc<S>,
        job_id: JobId,
        options: PollOptions,
    ) -> UnboundedReceiver<PollEvent>
    where
        S: StatusSource + 'static,
    {
        self.stop();
        let (handle, events) = JobPoller::spawn(source, job_id, options);
        self.current = Some(handle);
        events
    }

    /// Stop the live cycle, if any. Idempotent.
    pub fn stop(&mut self) {
        if let Some(handle) = self.current.take() {
            handle.stop();
        }
    }

    pub fn current(&self) -> Option<&PollHandle> {
        self.current.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use datasim_core::{GeneratedFiles, GenerationResult, JobStatus, Previews, Progress};

    use super::*;

    /// Replays a fixed sequence of fetch outcomes and panics if the poller
    /// fetches after the script ran out, i.e. after a terminal snapshot.
    struct ScriptedSource {
        responses: Mutex<VecDeque<Result<Job, ClientError>>>,
    }

    impl ScriptedSource {
        fn new(responses: Vec<Result<Job, ClientError>>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.into()),
            })
        }
    }

    #[async_trait]
    impl StatusSource for ScriptedSource {
        async fn job_status(&self, _job_id: &JobId) -> Result<Job, ClientError> {
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .expect("status fetched after the script ended")
        }
    }

    fn snapshot(status: JobStatus) -> Job {
        Job {
            id: JobId::new("abc"),
            status,
            progress: None,
            message: None,
            result: None,
            error: None,
        }
    }

    fn success_with_result() -> Job {
        let mut job = snapshot(JobStatus::Success);
        job.result = Some(GenerationResult {
            records_generated: 100,
            files: GeneratedFiles {
                csv: Some("generated_data/users.csv".to_string()),
                json: None,
            },
            sample_record: serde_json::json!({"id": 1}),
            previews: Previews {
                schema_json: "{}".to_string(),
                sample_csv: "id\n1".to_string(),
            },
            schema: None,
        });
        job
    }

    fn fetch_failed() -> ClientError {
        ClientError::Connection("connection refused".to_string())
    }

    #[tokio::test(start_paused = true)]
    async fn polls_to_success_and_stops() {
        let mut progressing = snapshot(JobStatus::Progress);
        progressing.progress = Some(Progress {
            current: 10,
            total: 100,
        });

        let source = ScriptedSource::new(vec![
            Ok(snapshot(JobStatus::Pending)),
            Ok(progressing),
            Ok(success_with_result()),
        ]);
        let (_handle, mut events) =
            JobPoller::spawn(source, JobId::new("abc"), PollOptions::default());

        let PollEvent::Update(job) = events.recv().await.expect("first event") else {
            panic!("expected an update");
        };
        assert_eq!(job.status, JobStatus::Pending);

        let PollEvent::Update(job) = events.recv().await.expect("second event") else {
            panic!("expected an update");
        };
        assert_eq!(job.status, JobStatus::Progress);
        let ratio = job.progress.expect("progress").ratio();
        assert!((ratio - 0.10).abs() < f64::EPSILON);

        let PollEvent::Update(job) = events.recv().await.expect("third event") else {
            panic!("expected an update");
        };
        assert_eq!(job.status, JobStatus::Success);
        assert!(job.result.is_some());

        // the cycle ended: the sender is gone and no further fetch happened
        assert!(events.recv().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn failure_surfaces_the_error_and_stops() {
        let mut failed = snapshot(JobStatus::Failure);
        failed.error = Some("disk full".to_string());

        let source = ScriptedSource::new(vec![Ok(snapshot(JobStatus::Pending)), Ok(failed)]);
        let (_handle, mut events) =
            JobPoller::spawn(source, JobId::new("abc"), PollOptions::default());

        let PollEvent::Update(_) = events.recv().await.expect("pending") else {
            panic!("expected an update");
        };
        let PollEvent::Update(job) = events.recv().await.expect("failure") else {
            panic!("expected an update");
        };
        assert_eq!(job.status, JobStatus::Failure);
        assert_eq!(job.error.as_deref(), Some("disk full"));
        assert!(job.result.is_none());
        assert!(events.recv().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn fetch_failures_are_retried_and_reset_on_success() {
        let source = ScriptedSource::new(vec![
            Err(fetch_failed()),
            Err(fetch_failed()),
            Ok(snapshot(JobStatus::Pending)),
            Err(fetch_failed()),
            Err(fetch_failed()),
            Ok(success_with_result()),
        ]);
        let options = PollOptions {
            interval: Duration::from_millis(10),
            max_failures: 3,
        };
        let (_handle, mut events) = JobPoller::spawn(source, JobId::new("abc"), options);

        let PollEvent::Update(job) = events.recv().await.expect("pending") else {
            panic!("expected an update");
        };
        assert_eq!(job.status, JobStatus::Pending);

        let PollEvent::Update(job) = events.recv().await.expect("success") else {
            panic!("expected an update");
        };
        assert_eq!(job.status, JobStatus::Success);
        assert!(events.recv().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_retries_report_the_job_as_lost_not_failed() {
        let source = ScriptedSource::new(vec![Err(fetch_failed()), Err(fetch_failed())]);
        let options = PollOptions {
            interval: Duration::from_millis(10),
            max_failures: 2,
        };
        let (_handle, mut events) = JobPoller::spawn(source, JobId::new("abc"), options);

        match events.recv().await.expect("lost event") {
            PollEvent::Lost { attempts, error } => {
                assert_eq!(attempts, 2);
                assert!(matches!(error, ClientError::Connection(_)));
            }
            PollEvent::Update(_) => panic!("no snapshot should be published"),
        }
        assert!(events.recv().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn tracker_replaces_a_live_cycle() {
        // long pending script for the first job
        let first = ScriptedSource::new((0..64).map(|_| Ok(snapshot(JobStatus::Pending))).collect());
        let second = ScriptedSource::new(vec![Ok(success_with_result())]);

        let mut tracker = JobTracker::new();
        let mut first_events = tracker.start(first, JobId::new("a"), PollOptions::default());
        assert!(matches!(
            first_events.recv().await,
            Some(PollEvent::Update(_))
        ));

        let mut second_events = tracker.start(second, JobId::new("b"), PollOptions::default());
        assert_eq!(tracker.current().expect("handle").job_id().as_str(), "b");

        // the first cycle was cancelled: its channel closes without a
        // terminal snapshot
        assert!(first_events.recv().await.is_none());

        let PollEvent::Update(job) = second_events.recv().await.expect("second job") else {
            panic!("expected an update");
        };
        assert_eq!(job.status, JobStatus::Success);

        tracker.stop();
        tracker.stop(); // idempotent
        assert!(tracker.current().is_none());
    }
}
