use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, warn};

use crate::error::ApiError;
use crate::models::VerificationStatus;
use crate::services::api_client::ApiClient;

/// Anything that can report the live status of a verification.
#[async_trait]
pub trait StatusSource: Send + Sync {
    async fn check_status(&self, verification_id: i64) -> Result<VerificationStatus, ApiError>;
}

#[async_trait]
impl StatusSource for ApiClient {
    async fn check_status(&self, verification_id: i64) -> Result<VerificationStatus, ApiError> {
        self.verification_status(verification_id).await
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PollSchedule {
    pub tick: Duration,
    /// Ticks between two checks.
    pub period: u32,
    pub stop_on_terminal: bool,
}

impl Default for PollSchedule {
    fn default() -> Self {
        Self {
            tick: Duration::from_secs(1),
            period: 30,
            stop_on_terminal: false,
        }
    }
}

impl PollSchedule {
    pub fn every_secs(period: u32) -> Self {
        Self {
            period: period.max(1),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum PollEvent {
    /// Ticks left until the next check.
    Countdown(u32),
    Status(VerificationStatus),
}

/// Periodic status checks for one opened verification.
///
/// One check fires immediately, then one every `period` ticks. Checks run
/// concurrently and their results are delivered in arrival order. Dropping
/// the poller (or the event receiver) stops the countdown and aborts any
/// check still in flight.
pub struct StatusPoller {
    verification_id: i64,
    task: JoinHandle<()>,
}

impl StatusPoller {
    pub fn start(
        source: Arc<dyn StatusSource>,
        verification_id: i64,
        schedule: PollSchedule,
    ) -> (Self, mpsc::UnboundedReceiver<PollEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(run(source, verification_id, schedule, tx));
        (
            Self {
                verification_id,
                task,
            },
            rx,
        )
    }

    pub fn verification_id(&self) -> i64 {
        self.verification_id
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    pub fn stop(self) {}
}

impl Drop for StatusPoller {
    fn drop(&mut self) {
        self.task.abort();
    }
}

fn spawn_check(
    checks: &mut JoinSet<Result<VerificationStatus, ApiError>>,
    source: &Arc<dyn StatusSource>,
    verification_id: i64,
) {
    let source = Arc::clone(source);
    checks.spawn(async move { source.check_status(verification_id).await });
}

async fn run(
    source: Arc<dyn StatusSource>,
    verification_id: i64,
    schedule: PollSchedule,
    tx: mpsc::UnboundedSender<PollEvent>,
) {
    let period = schedule.period.max(1);
    let mut checks = JoinSet::new();

    spawn_check(&mut checks, &source, verification_id);
    let mut remaining = period;
    if tx.send(PollEvent::Countdown(remaining)).is_err() {
        return;
    }

    let mut ticker = interval_at(Instant::now() + schedule.tick, schedule.tick);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                remaining -= 1;
                if remaining == 0 {
                    debug!(verification_id, "checking verification status");
                    spawn_check(&mut checks, &source, verification_id);
                    remaining = period;
                }
                if tx.send(PollEvent::Countdown(remaining)).is_err() {
                    break;
                }
            }
            Some(joined) = checks.join_next(), if !checks.is_empty() => {
                match joined {
                    Ok(Ok(status)) => {
                        let terminal = status.is_terminal();
                        if tx.send(PollEvent::Status(status)).is_err() {
                            break;
                        }
                        if terminal && schedule.stop_on_terminal {
                            debug!(verification_id, "terminal status reached, polling stopped");
                            break;
                        }
                    }
                    Ok(Err(e)) => warn!(verification_id, "Status check failed: {}", e),
                    Err(e) if e.is_cancelled() => {}
                    Err(e) => warn!(verification_id, "Status check task failed: {}", e),
                }
            }
            _ = tx.closed() => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::time::sleep;

    #[derive(Default)]
    struct CountingSource {
        calls: AtomicUsize,
        status: Option<&'static str>,
    }

    #[async_trait]
    impl StatusSource for CountingSource {
        async fn check_status(&self, verification_id: i64) -> Result<VerificationStatus, ApiError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            match self.status {
                Some(status) => Ok(VerificationStatus {
                    success: true,
                    status: Some(status.to_string()),
                    verification_id: Some(verification_id),
                    credits: Some(n as i64),
                    ..Default::default()
                }),
                None => Err(ApiError::Application {
                    status: 500,
                    message: None,
                }),
            }
        }
    }

    /// First call is slow, later calls answer at once.
    struct StaggeredSource {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl StatusSource for StaggeredSource {
        async fn check_status(&self, _: i64) -> Result<VerificationStatus, ApiError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n == 0 {
                sleep(Duration::from_secs(45)).await;
            }
            Ok(VerificationStatus {
                credits: Some(n as i64),
                ..Default::default()
            })
        }
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<PollEvent>) -> Vec<PollEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[tokio::test(start_paused = true)]
    async fn checks_immediately_then_every_period_until_closed() {
        let source = Arc::new(CountingSource {
            status: Some("pending"),
            ..Default::default()
        });
        let (poller, mut rx) = StatusPoller::start(source.clone(), 7, PollSchedule::default());

        sleep(Duration::from_millis(500)).await;
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);

        sleep(Duration::from_secs(30)).await;
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);

        sleep(Duration::from_secs(30)).await;
        assert_eq!(source.calls.load(Ordering::SeqCst), 3);

        let events = drain(&mut rx);
        assert_eq!(events.first(), Some(&PollEvent::Countdown(30)));
        assert!(events.contains(&PollEvent::Countdown(1)));
        let statuses = events
            .iter()
            .filter(|e| matches!(e, PollEvent::Status(_)))
            .count();
        assert_eq!(statuses, 3);

        poller.stop();
        sleep(Duration::from_secs(120)).await;
        assert_eq!(source.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn keeps_polling_after_terminal_status_by_default() {
        let source = Arc::new(CountingSource {
            status: Some("success"),
            ..Default::default()
        });
        let (_poller, _rx) = StatusPoller::start(source.clone(), 1, PollSchedule::every_secs(5));

        sleep(Duration::from_millis(15_500)).await;
        assert_eq!(source.calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_on_terminal_ends_the_task() {
        let source = Arc::new(CountingSource {
            status: Some("failed"),
            ..Default::default()
        });
        let schedule = PollSchedule {
            stop_on_terminal: true,
            ..PollSchedule::every_secs(5)
        };
        let (poller, _rx) = StatusPoller::start(source.clone(), 1, schedule);

        sleep(Duration::from_secs(20)).await;
        assert!(poller.is_finished());
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_checks_emit_no_status() {
        let source = Arc::new(CountingSource::default());
        let (_poller, mut rx) = StatusPoller::start(source.clone(), 1, PollSchedule::every_secs(2));

        sleep(Duration::from_millis(4_500)).await;
        assert_eq!(source.calls.load(Ordering::SeqCst), 3);
        assert!(drain(&mut rx)
            .iter()
            .all(|e| matches!(e, PollEvent::Countdown(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn results_arrive_in_completion_order() {
        let source = Arc::new(StaggeredSource {
            calls: AtomicUsize::new(0),
        });
        let (_poller, mut rx) = StatusPoller::start(source, 1, PollSchedule::default());

        sleep(Duration::from_millis(50_500)).await;
        let credits: Vec<i64> = drain(&mut rx)
            .into_iter()
            .filter_map(|e| match e {
                PollEvent::Status(s) => s.credits,
                PollEvent::Countdown(_) => None,
            })
            .collect();
        assert_eq!(credits, vec![1, 0]);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_receiver_stops_polling() {
        let source = Arc::new(CountingSource {
            status: Some("pending"),
            ..Default::default()
        });
        let (poller, rx) = StatusPoller::start(source.clone(), 1, PollSchedule::every_secs(2));
        sleep(Duration::from_millis(500)).await;
        drop(rx);

        sleep(Duration::from_secs(10)).await;
        assert!(poller.is_finished());
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }
}
