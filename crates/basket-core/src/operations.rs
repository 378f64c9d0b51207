//! Operations controller: job triggers and service health polling.
//!
//! Each job kind runs its own status machine
//! (`Idle -> Running -> Succeeded | Failed -> Idle`). Every trigger starts a
//! new cycle; responses and revert timers from an older cycle are ignored.
//! Health is polled on a fixed interval and never touches job status.

use crate::{PriceService, ServiceError};
use basket_types::{HealthSnapshot, JobKind, JobStatus};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

const MIN_HEALTH_INTERVAL: Duration = Duration::from_millis(100);

/// Configuration for the operations controller.
#[derive(Debug, Clone)]
pub struct OperationsConfig {
    /// How long Succeeded/Failed stays visible before reverting to Idle.
    pub revert_delay: Duration,
    pub health_interval: Duration,
    /// Reject a trigger while the same job kind is still running.
    pub guard_running_jobs: bool,
}

impl Default for OperationsConfig {
    fn default() -> Self {
        Self {
            revert_delay: Duration::from_secs(3),
            health_interval: Duration::from_secs(10),
            guard_running_jobs: false,
        }
    }
}

/// The message area shared by both job kinds. Last write wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobMessage {
    pub kind: JobKind,
    pub text: String,
}

/// State changes pushed to subscribers.
#[derive(Debug, Clone, PartialEq)]
pub enum OperationsEvent {
    JobChanged { kind: JobKind, status: JobStatus },
    HealthChanged(HealthSnapshot),
}

/// Result of [`OperationsController::trigger`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// The job was already running and the running-job guard is on.
    Rejected,
    Succeeded { message: String },
    Failed { message: String },
    /// A newer trigger of the same kind started before this one completed.
    Superseded,
}

/// Point-in-time copy of everything the operations view shows.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationsSnapshot {
    pub scrape: JobStatus,
    pub import: JobStatus,
    pub message: Option<JobMessage>,
    pub health: HealthSnapshot,
}

#[derive(Default)]
struct JobSlot {
    status: JobStatus,
    cycle: u64,
    revert: Option<JoinHandle<()>>,
}

#[derive(Default)]
struct OperationsState {
    scrape: JobSlot,
    import: JobSlot,
    message: Option<JobMessage>,
    health: HealthSnapshot,
    /// Sequence number handed to the most recently started health poll.
    health_issued: u64,
    /// Sequence number of the poll that produced `health`.
    health_applied: u64,
}

impl OperationsState {
    fn slot_mut(&mut self, kind: JobKind) -> &mut JobSlot {
        match kind {
            JobKind::Scrape => &mut self.scrape,
            JobKind::Import => &mut self.import,
        }
    }

    fn slot(&self, kind: JobKind) -> &JobSlot {
        match kind {
            JobKind::Scrape => &self.scrape,
            JobKind::Import => &self.import,
        }
    }

    fn clear_message_of(&mut self, kind: JobKind) {
        if self.message.as_ref().is_some_and(|m| m.kind == kind) {
            self.message = None;
        }
    }
}

struct Shared {
    service: Arc<dyn PriceService>,
    config: OperationsConfig,
    state: Mutex<OperationsState>,
    events: broadcast::Sender<OperationsEvent>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, OperationsState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, event: OperationsEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}

/// Triggers backend jobs and polls service health.
///
/// Cheap to clone; clones share state, so a trigger can be spawned onto its
/// own task while the caller keeps rendering.
#[derive(Clone)]
pub struct OperationsController {
    shared: Arc<Shared>,
    poller: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl OperationsController {
    pub fn new(service: Arc<dyn PriceService>, config: OperationsConfig) -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            shared: Arc::new(Shared {
                service,
                config,
                state: Mutex::new(OperationsState::default()),
                events,
            }),
            poller: Arc::new(Mutex::new(None)),
        }
    }

    /// Subscribe to job and health changes.
    pub fn subscribe(&self) -> broadcast::Receiver<OperationsEvent> {
        self.shared.events.subscribe()
    }

    /// Ask the service to start `kind` and record the outcome.
    ///
    /// Sets the job to Running right away. Once the service answers the job
    /// shows Succeeded or Failed, and a timer reverts it to Idle after the
    /// configured delay. Retriggering cancels the previous timer.
    pub async fn trigger(&self, kind: JobKind) -> TriggerOutcome {
        let cycle = {
            let mut state = self.shared.lock();
            let slot = state.slot_mut(kind);
            if self.shared.config.guard_running_jobs && slot.status.is_running() {
                debug!(target: "basket::jobs", "Ignoring {} trigger: already running", kind);
                return TriggerOutcome::Rejected;
            }
            slot.cycle += 1;
            if let Some(timer) = slot.revert.take() {
                timer.abort();
            }
            slot.status = JobStatus::running();
            let cycle = slot.cycle;
            state.message = None;
            self.shared.emit(OperationsEvent::JobChanged {
                kind,
                status: JobStatus::running(),
            });
            cycle
        };

        info!(target: "basket::jobs", "Triggering {} job (cycle {})", kind, cycle);
        let result = self.shared.service.start_job(kind).await;

        let (status, outcome) = match result {
            Ok(accepted) => {
                info!(target: "basket::jobs", "{} job accepted: {}", kind, accepted.message);
                (
                    JobStatus::succeeded(accepted.message.clone()),
                    TriggerOutcome::Succeeded {
                        message: accepted.message,
                    },
                )
            }
            Err(err) => {
                warn!(target: "basket::jobs", "{} job trigger failed: {}", kind, err);
                let message = trigger_failure_message(kind, &err);
                (
                    JobStatus::failed(message.clone()),
                    TriggerOutcome::Failed { message },
                )
            }
        };

        let mut state = self.shared.lock();
        if state.slot(kind).cycle != cycle {
            debug!(
                target: "basket::jobs",
                "Ignoring {} response from superseded cycle {}",
                kind, cycle
            );
            return TriggerOutcome::Superseded;
        }
        if let Some(text) = status.message.clone() {
            state.message = Some(JobMessage { kind, text });
        }
        let revert = self.spawn_revert_timer(kind, cycle);
        let slot = state.slot_mut(kind);
        slot.status = status.clone();
        slot.revert = Some(revert);
        self.shared.emit(OperationsEvent::JobChanged { kind, status });

        outcome
    }

    /// Revert `kind` to Idle after the display delay, unless a newer cycle
    /// has started by then.
    fn spawn_revert_timer(&self, kind: JobKind, cycle: u64) -> JoinHandle<()> {
        let shared = self.shared.clone();
        let delay = shared.config.revert_delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;

            let mut state = shared.lock();
            let slot = state.slot_mut(kind);
            if slot.cycle != cycle || !slot.status.state.is_terminal() {
                return;
            }
            slot.status = JobStatus::idle();
            slot.revert = None;
            state.clear_message_of(kind);
            debug!(target: "basket::jobs", "{} status reverted to idle", kind);
            shared.emit(OperationsEvent::JobChanged {
                kind,
                status: JobStatus::idle(),
            });
        })
    }

    /// Poll `/health` once and record the snapshot.
    ///
    /// Returns the recorded snapshot, which is newer than this poll's own
    /// result when a later-started poll finished first.
    pub async fn poll_health(&self) -> HealthSnapshot {
        poll_once(&self.shared).await
    }

    /// Poll now, then on every interval until [`stop_health_polling`].
    /// Restarting replaces the previous poller.
    ///
    /// [`stop_health_polling`]: OperationsController::stop_health_polling
    pub fn start_health_polling(&self) {
        let mut poller = self.poller.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = poller.take() {
            previous.abort();
        }

        let shared = self.shared.clone();
        let period = shared.config.health_interval.max(MIN_HEALTH_INTERVAL);
        info!(target: "basket::health", "Polling service health every {:?}", period);
        *poller = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                poll_once(&shared).await;
            }
        }));
    }

    pub fn stop_health_polling(&self) {
        let handle = self
            .poller
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            handle.abort();
            info!(target: "basket::health", "Stopped health polling");
        }
    }

    pub fn is_polling(&self) -> bool {
        self.poller
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    pub fn job_status(&self, kind: JobKind) -> JobStatus {
        self.shared.lock().slot(kind).status.clone()
    }

    pub fn health(&self) -> HealthSnapshot {
        self.shared.lock().health.clone()
    }

    pub fn message(&self) -> Option<JobMessage> {
        self.shared.lock().message.clone()
    }

    pub fn snapshot(&self) -> OperationsSnapshot {
        let state = self.shared.lock();
        OperationsSnapshot {
            scrape: state.scrape.status.clone(),
            import: state.import.status.clone(),
            message: state.message.clone(),
            health: state.health.clone(),
        }
    }
}

async fn poll_once(shared: &Shared) -> HealthSnapshot {
    let seq = {
        let mut state = shared.lock();
        state.health_issued += 1;
        state.health_issued
    };

    let snapshot = match shared.service.health().await {
        Ok(response) => {
            debug!(target: "basket::health", "Service healthy: {}", response.status);
            HealthSnapshot::ok(Some(response.status))
        }
        Err(err) => {
            warn!(target: "basket::health", "Health check failed: {}", err);
            HealthSnapshot::error(health_failure_detail(&err))
        }
    };

    let mut state = shared.lock();
    if seq < state.health_applied {
        debug!(
            target: "basket::health",
            "Ignoring health poll {}: poll {} already recorded",
            seq, state.health_applied
        );
        return state.health.clone();
    }
    state.health_applied = seq;
    state.health = snapshot.clone();
    shared.emit(OperationsEvent::HealthChanged(snapshot.clone()));
    snapshot
}

/// Server detail, else a generic per-job message.
fn trigger_failure_message(kind: JobKind, err: &ServiceError) -> String {
    err.server_detail()
        .map(str::to_string)
        .unwrap_or_else(|| format!("Failed to start {} job", kind))
}

fn health_failure_detail(err: &ServiceError) -> String {
    let text = err.to_string();
    if text.trim().is_empty() {
        "Service unreachable".to_string()
    } else {
        text
    }
}
