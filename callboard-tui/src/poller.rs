//! Polling reconciler: after a dispatch, periodically fetch call details for
//! the active project until every call settles or the ceiling elapses.
//!
//! The state machine is synchronous and clock-injected; the event loop owns
//! it and feeds it ticks. Fetches run on spawned tasks and report back
//! through the event channel.

use std::sync::Arc;
use std::time::{Duration, Instant};

use callboard_core::{BackendResult, CallCenterApi, ContactWithLastCall, ProjectId};
use tokio::sync::mpsc;

use crate::events::TuiEvent;

/// Identifies the armed session a fetch was issued for. Every `arm` starts a
/// new generation.
pub type PollGeneration = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollPhase {
    Idle,
    Polling {
        started_at: Instant,
        generation: PollGeneration,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Time since arming exceeded the ceiling.
    CeilingReached,
    /// Every cached call detail is absent or terminal.
    AllSettled,
}

/// What the loop should do on a poll tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickDecision {
    /// Issue a fetch tagged with this generation.
    Fetch(PollGeneration),
    /// Previous fetch has not reported back yet.
    SkipInFlight,
    Stopped(StopReason),
    Idle,
}

#[derive(Debug, Clone)]
pub struct PollingReconciler {
    interval: Duration,
    ceiling: Duration,
    phase: PollPhase,
    next_generation: PollGeneration,
    /// Generation of the fetch still awaiting its result. Outlives the
    /// session that issued it, so stop and re-arm cannot overlap fetches.
    outstanding: Option<PollGeneration>,
    /// Set by `arm`, taken by the loop to realign its tick timer.
    rearmed: bool,
}

impl PollingReconciler {
    pub fn new(interval: Duration, ceiling: Duration) -> Self {
        Self {
            interval,
            ceiling,
            phase: PollPhase::Idle,
            next_generation: 0,
            outstanding: None,
            rearmed: false,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn ceiling(&self) -> Duration {
        self.ceiling
    }

    pub fn phase(&self) -> PollPhase {
        self.phase
    }

    pub fn is_polling(&self) -> bool {
        matches!(self.phase, PollPhase::Polling { .. })
    }

    pub fn fetch_outstanding(&self) -> bool {
        self.outstanding.is_some()
    }

    pub fn started_at(&self) -> Option<Instant> {
        match self.phase {
            PollPhase::Polling { started_at, .. } => Some(started_at),
            PollPhase::Idle => None,
        }
    }

    /// Enter polling with `now` as the start under a fresh generation. A
    /// fetch still outstanding from before keeps later ticks skipping until
    /// it reports back.
    pub fn arm(&mut self, now: Instant) -> PollGeneration {
        self.next_generation += 1;
        self.rearmed = true;
        let generation = self.next_generation;
        self.phase = PollPhase::Polling {
            started_at: now,
            generation,
        };
        generation
    }

    /// True once after each `arm`.
    pub fn take_rearmed(&mut self) -> bool {
        std::mem::take(&mut self.rearmed)
    }

    pub fn on_tick(&mut self, now: Instant) -> TickDecision {
        match self.phase {
            PollPhase::Idle => TickDecision::Idle,
            PollPhase::Polling {
                started_at,
                generation,
            } => {
                if now.saturating_duration_since(started_at) > self.ceiling {
                    self.phase = PollPhase::Idle;
                    return TickDecision::Stopped(StopReason::CeilingReached);
                }
                if self.outstanding.is_some() {
                    return TickDecision::SkipInFlight;
                }
                self.outstanding = Some(generation);
                TickDecision::Fetch(generation)
            }
        }
    }

    /// A fetch came back without anything to merge.
    pub fn on_fetch_failed(&mut self, generation: PollGeneration) {
        self.settle_fetch(generation);
    }

    /// Record a merged fetch. Stops when everything has settled.
    ///
    /// Only a fetch issued by the current session can stop it; a result from
    /// an earlier generation frees the fetch slot and nothing else.
    pub fn on_merged(&mut self, generation: PollGeneration, settled: bool) -> Option<StopReason> {
        self.settle_fetch(generation);
        let current = matches!(
            self.phase,
            PollPhase::Polling { generation: g, .. } if g == generation
        );
        if settled && current {
            self.phase = PollPhase::Idle;
            return Some(StopReason::AllSettled);
        }
        None
    }

    pub fn stop(&mut self) {
        self.phase = PollPhase::Idle;
    }

    fn settle_fetch(&mut self, generation: PollGeneration) {
        if self.outstanding == Some(generation) {
            self.outstanding = None;
        }
    }
}

/// Fetch the project's contacts with their last call and post the result
/// back to the event loop.
pub fn spawn_poll_fetch(
    api: Arc<dyn CallCenterApi>,
    project_id: ProjectId,
    generation: PollGeneration,
    sender: mpsc::Sender<TuiEvent>,
) {
    tokio::spawn(async move {
        let result: BackendResult<Vec<ContactWithLastCall>> =
            api.list_contacts_with_last_call(&project_id).await;
        if sender
            .send(TuiEvent::PollResult {
                project_id,
                generation,
                result,
            })
            .await
            .is_err()
        {
            tracing::debug!("Event loop closed before poll result was delivered");
        }
    });
}
