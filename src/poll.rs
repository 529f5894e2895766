//! Periodic node status polling with stale-while-revalidate state.
//!
//! The poller task is the only writer of [`PollState`]; it publishes a copy
//! after every change on a watch channel that the dashboard reads from.
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{Notify, watch};
use tokio::task::{Id, JoinHandle, JoinSet};
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::data::{FetchError, NodeStatus, StatusSource};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PollStatus {
    #[default]
    Idle,
    Loading,
    Success,
    Error,
}

#[derive(Debug, Clone, Default)]
pub struct PollState {
    pub status: PollStatus,
    /// Last good status. Survives refreshes and failed cycles.
    pub data: Option<NodeStatus>,
    /// Only set while `status` is `Error`.
    pub error: Option<FetchError>,
    pub last_success: Option<Instant>,
    pub last_updated: Option<Instant>,
    started_seq: u64,
    applied_seq: u64,
}

impl PollState {
    /// Starts a fetch cycle and returns its sequence number.
    pub fn begin_cycle(&mut self) -> u64 {
        self.started_seq += 1;
        if self.data.is_none() {
            self.status = PollStatus::Loading;
            self.error = None;
        }
        self.started_seq
    }

    pub fn apply(&mut self, seq: u64, result: Result<NodeStatus, FetchError>) -> bool {
        self.apply_at(seq, result, Instant::now())
    }

    /// Records the outcome of cycle `seq`. Results older than the last one
    /// applied are dropped and `false` is returned.
    pub fn apply_at(
        &mut self,
        seq: u64,
        result: Result<NodeStatus, FetchError>,
        now: Instant,
    ) -> bool {
        if seq <= self.applied_seq || seq > self.started_seq {
            return false;
        }
        self.applied_seq = seq;
        self.last_updated = Some(now);

        match result {
            Ok(status) => {
                self.status = PollStatus::Success;
                self.data = Some(status);
                self.error = None;
                self.last_success = Some(now);
            }
            Err(e) => {
                self.status = PollStatus::Error;
                self.error = Some(e);
            }
        }
        true
    }

    /// A newer cycle than the last applied one is still outstanding.
    pub fn is_refreshing(&self) -> bool {
        self.started_seq > self.applied_seq
    }

    pub fn is_stale(&self, now: Instant, stale_after: Duration) -> bool {
        self.last_success
            .is_some_and(|ok| now.saturating_duration_since(ok) > stale_after)
    }
}

pub struct PollerHandle {
    state: watch::Receiver<PollState>,
    refresh: Arc<Notify>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl PollerHandle {
    /// Latest published state.
    pub fn state(&self) -> PollState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<PollState> {
        self.state.clone()
    }

    /// Starts a cycle now. The regular cadence is unchanged.
    pub fn refresh(&self) {
        self.refresh.notify_one();
    }

    /// Cancels polling and waits for the poller task to exit. Fetches still
    /// in flight are aborted and their results never reach the state.
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!(error = %e, "poller task did not exit cleanly");
            }
        }
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

pub struct Poller;

impl Poller {
    /// Spawns the polling loop on the current tokio runtime. The first cycle
    /// starts immediately, then one every `period`.
    pub fn spawn<S: StatusSource>(
        source: S,
        period: Duration,
        cancel: CancellationToken,
    ) -> PollerHandle {
        let (state_tx, state_rx) = watch::channel(PollState::default());
        let refresh = Arc::new(Notify::new());
        let task = tokio::spawn(run(
            Arc::new(source),
            period,
            cancel.clone(),
            state_tx,
            Arc::clone(&refresh),
        ));

        PollerHandle {
            state: state_rx,
            refresh,
            cancel,
            task: Some(task),
        }
    }
}

type CycleResult = (u64, Result<NodeStatus, FetchError>);

async fn run<S: StatusSource>(
    source: Arc<S>,
    period: Duration,
    cancel: CancellationToken,
    state_tx: watch::Sender<PollState>,
    refresh: Arc<Notify>,
) {
    let mut ticker = time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut state = PollState::default();
    let mut fetches: JoinSet<CycleResult> = JoinSet::new();
    let mut cycles: HashMap<Id, u64> = HashMap::new();
    info!(period_ms = period.as_millis() as u64, "poller started");

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            Some(joined) = fetches.join_next_with_id() => {
                let (seq, result) = match joined {
                    Ok((id, done)) => {
                        cycles.remove(&id);
                        done
                    }
                    Err(e) => {
                        warn!(error = %e, "fetch task failed");
                        let Some(seq) = cycles.remove(&e.id()) else {
                            continue;
                        };
                        (seq, Err(FetchError::Network("fetch task failed".to_string())))
                    }
                };
                if let Err(e) = &result {
                    warn!(seq, error = %e, "status fetch failed");
                }
                if state.apply(seq, result) {
                    debug!(seq, status = ?state.status, "cycle applied");
                    state_tx.send_replace(state.clone());
                } else {
                    debug!(seq, "discarding out-of-order result");
                }
            }
            _ = refresh.notified() => {
                debug!("manual refresh");
                start_cycle(&source, &mut state, &mut fetches, &mut cycles, &state_tx);
            }
            _ = ticker.tick() => start_cycle(&source, &mut state, &mut fetches, &mut cycles, &state_tx),
        }
    }

    let pending = fetches.len();
    fetches.abort_all();
    info!(pending, "poller stopped");
}

fn start_cycle<S: StatusSource>(
    source: &Arc<S>,
    state: &mut PollState,
    fetches: &mut JoinSet<CycleResult>,
    cycles: &mut HashMap<Id, u64>,
    state_tx: &watch::Sender<PollState>,
) {
    let seq = state.begin_cycle();
    state_tx.send_replace(state.clone());
    debug!(seq, "cycle started");

    let source = Arc::clone(source);
    let task = fetches.spawn(async move { (seq, source.fetch().await) });
    cycles.insert(task.id(), seq);
}
