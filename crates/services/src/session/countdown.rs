use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::mpsc::{UnboundedSender, WeakUnboundedSender};
use tokio::task::AbortHandle;

use super::runner::SessionEvent;

/// Identifies one scheduled tick. A tick whose ticket is no longer armed is
/// stale and must be ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TickTicket(u64);

/// One-shot delayed delivery of countdown ticks.
pub trait TickScheduler: Send {
    /// Deliver `ticket` once, after `delay`.
    fn schedule(&mut self, ticket: TickTicket, delay: Duration);
    /// Drop a pending delivery. Unknown tickets are ignored.
    fn cancel(&mut self, ticket: TickTicket);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Not the armed ticket (cancelled or superseded).
    Stale,
    Running { remaining: u32 },
    /// Reached zero. No further tick is scheduled.
    Expired,
}

/// Whole-second countdown that re-arms a single delayed tick after each one
/// fires, so at most one tick is outstanding.
#[derive(Debug)]
pub struct Countdown {
    remaining: u32,
    period: Duration,
    armed: Option<TickTicket>,
    issued: u64,
}

impl Countdown {
    #[must_use]
    pub fn new(period: Duration) -> Self {
        Self {
            remaining: 0,
            period,
            armed: None,
            issued: 0,
        }
    }

    /// Begin a fresh countdown, replacing any armed tick.
    pub fn start(&mut self, limit_secs: u32, ticks: &mut dyn TickScheduler) {
        self.cancel(ticks);
        self.remaining = limit_secs;
        self.arm(ticks);
    }

    pub fn on_tick(&mut self, ticket: TickTicket, ticks: &mut dyn TickScheduler) -> TickOutcome {
        if self.armed != Some(ticket) {
            return TickOutcome::Stale;
        }
        self.armed = None;
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            return TickOutcome::Expired;
        }
        self.arm(ticks);
        TickOutcome::Running {
            remaining: self.remaining,
        }
    }

    /// Cancel the outstanding tick, if any. Idempotent.
    pub fn cancel(&mut self, ticks: &mut dyn TickScheduler) {
        if let Some(ticket) = self.armed.take() {
            ticks.cancel(ticket);
        }
    }

    #[must_use]
    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.armed.is_some()
    }

    fn arm(&mut self, ticks: &mut dyn TickScheduler) {
        self.issued += 1;
        let ticket = TickTicket(self.issued);
        self.armed = Some(ticket);
        ticks.schedule(ticket, self.period);
    }
}

/// `m:ss`, as shown in the session header.
#[must_use]
pub fn format_clock(seconds: u32) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

//
// ─── SCHEDULERS ────────────────────────────────────────────────────────────────
//

/// Delivers ticks as `SessionEvent::Tick` through the runner's queue using
/// tokio sleeps. Holds the queue weakly so it never keeps the runner alive.
pub struct TokioTickScheduler {
    events: WeakUnboundedSender<SessionEvent>,
    pending: HashMap<TickTicket, AbortHandle>,
}

impl TokioTickScheduler {
    #[must_use]
    pub fn new(events: &UnboundedSender<SessionEvent>) -> Self {
        Self {
            events: events.downgrade(),
            pending: HashMap::new(),
        }
    }
}

impl TickScheduler for TokioTickScheduler {
    fn schedule(&mut self, ticket: TickTicket, delay: Duration) {
        self.pending.retain(|_, handle| !handle.is_finished());
        let events = self.events.clone();
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(events) = events.upgrade() {
                let _ = events.send(SessionEvent::Tick(ticket));
            }
        });
        self.pending.insert(ticket, task.abort_handle());
    }

    fn cancel(&mut self, ticket: TickTicket) {
        if let Some(handle) = self.pending.remove(&ticket) {
            handle.abort();
        }
    }
}

impl Drop for TokioTickScheduler {
    fn drop(&mut self) {
        for (_, handle) in self.pending.drain() {
            handle.abort();
        }
    }
}

/// Test scheduler: records armed tickets so the caller decides when they fire.
///
/// Clones share state.
#[derive(Debug, Clone, Default)]
pub struct ManualTicks {
    inner: Arc<Mutex<ManualTicksState>>,
}

#[derive(Debug, Default)]
struct ManualTicksState {
    pending: Vec<TickTicket>,
    scheduled: usize,
    cancelled: usize,
}

impl ManualTicks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove and return the oldest outstanding ticket.
    #[must_use]
    pub fn take_next(&self) -> Option<TickTicket> {
        let mut state = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        if state.pending.is_empty() {
            None
        } else {
            Some(state.pending.remove(0))
        }
    }

    #[must_use]
    pub fn outstanding(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pending
            .len()
    }

    #[must_use]
    pub fn scheduled(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .scheduled
    }

    #[must_use]
    pub fn cancelled(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .cancelled
    }
}

impl TickScheduler for ManualTicks {
    fn schedule(&mut self, ticket: TickTicket, _delay: Duration) {
        let mut state = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        state.pending.push(ticket);
        state.scheduled += 1;
    }

    fn cancel(&mut self, ticket: TickTicket) {
        let mut state = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let before = state.pending.len();
        state.pending.retain(|t| *t != ticket);
        if state.pending.len() != before {
            state.cancelled += 1;
        }
    }
}
