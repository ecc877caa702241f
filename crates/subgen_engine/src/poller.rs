//! Fixed-interval job status polling.
//!
//! [`StatusPoller`] owns at most one poll task. Starting a poll always
//! cancels the previous task first, and dropping the poller cancels whatever
//! is still running, so a torn-down host never receives late snapshots.

use std::sync::Arc;
use std::time::Duration;

use subgen_logging::{short_job_id, subgen_debug, subgen_info, subgen_warn};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::{EngineEvent, EventSink, JobId, ServiceClient};

const MIN_INTERVAL: Duration = Duration::from_millis(1);

#[derive(Debug, Clone)]
pub struct PollSettings {
    pub interval: Duration,
    /// `None` polls until the service reports a terminal status.
    pub max_duration: Option<Duration>,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(2),
            max_duration: None,
        }
    }
}

struct ActivePoll {
    job_id: JobId,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

pub struct StatusPoller {
    client: Arc<dyn ServiceClient>,
    sink: Arc<dyn EventSink>,
    runtime: Handle,
    settings: PollSettings,
    active: Option<ActivePoll>,
}

impl StatusPoller {
    pub fn new(
        client: Arc<dyn ServiceClient>,
        sink: Arc<dyn EventSink>,
        runtime: Handle,
        settings: PollSettings,
    ) -> Self {
        let settings = PollSettings {
            interval: settings.interval.max(MIN_INTERVAL),
            ..settings
        };
        Self {
            client,
            sink,
            runtime,
            settings,
            active: None,
        }
    }

    /// Begins polling `job_id`, cancelling any poll already running.
    pub fn start(&mut self, job_id: impl Into<JobId>) {
        self.stop();

        let job_id = job_id.into();
        let cancel = CancellationToken::new();
        subgen_info!(
            "Polling job_id={} every {:?}",
            short_job_id(&job_id),
            self.settings.interval
        );
        let task = self.runtime.spawn(poll_loop(
            self.client.clone(),
            self.sink.clone(),
            job_id.clone(),
            self.settings.clone(),
            cancel.clone(),
        ));
        self.active = Some(ActivePoll {
            job_id,
            cancel,
            task,
        });
    }

    /// Cancels the running poll, if any. Returns whether one was still live.
    pub fn stop(&mut self) -> bool {
        let Some(active) = self.active.take() else {
            return false;
        };
        let was_live = !active.task.is_finished();
        active.cancel.cancel();
        active.task.abort();
        if was_live {
            subgen_debug!("Cancelled poll for job_id={}", short_job_id(&active.job_id));
        }
        was_live
    }

    /// True while a poll task exists and has not ended on its own.
    pub fn is_active(&self) -> bool {
        self.active
            .as_ref()
            .is_some_and(|active| !active.task.is_finished())
    }

    pub fn active_job(&self) -> Option<&str> {
        self.active
            .as_ref()
            .filter(|active| !active.task.is_finished())
            .map(|active| active.job_id.as_str())
    }
}

impl Drop for StatusPoller {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn poll_loop(
    client: Arc<dyn ServiceClient>,
    sink: Arc<dyn EventSink>,
    job_id: JobId,
    settings: PollSettings,
    cancel: CancellationToken,
) {
    let started = Instant::now();
    let mut ticker = time::interval_at(started + settings.interval, settings.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = ticker.tick() => {}
        }

        if let Some(max_duration) = settings.max_duration {
            if started.elapsed() >= max_duration {
                subgen_warn!(
                    "Giving up on job_id={} after {:?} without a final status",
                    short_job_id(&job_id),
                    max_duration
                );
                sink.emit(EngineEvent::PollingTimedOut { job_id });
                return;
            }
        }

        let result = tokio::select! {
            _ = cancel.cancelled() => return,
            result = client.status(&job_id) => result,
        };

        match result {
            Ok(snapshot) => {
                let terminal = snapshot.status.is_terminal();
                let status = snapshot.status;
                sink.emit(EngineEvent::StatusReceived {
                    job_id: job_id.clone(),
                    snapshot,
                });
                if terminal {
                    subgen_info!(
                        "Job job_id={} finished with status {:?}",
                        short_job_id(&job_id),
                        status
                    );
                    return;
                }
            }
            // A failed attempt is retried on the next tick; only job-level failure reaches the user.
            Err(err) => {
                subgen_warn!("Status check failed for job_id={}: {}", short_job_id(&job_id), err);
            }
        }
    }
}
