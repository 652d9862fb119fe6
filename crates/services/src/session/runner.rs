//! Single-queue driver for a [`SessionController`].
//!
//! Every trigger (clicks, countdown ticks, focus signals) arrives as a
//! [`SessionEvent`] on one channel and runs to completion before the next is
//! taken, so triggers never race each other.

use tokio::sync::{mpsc, watch};

use proctor_core::model::TestType;

use super::controller::{SessionController, SessionDeps, Step};
use super::countdown::{TickTicket, TokioTickScheduler};
use super::monitor::FocusLoss;
use super::state::{SessionSnapshot, SubmitTrigger};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Open,
    Select(TestType),
    Answer { question: usize, option: usize },
    Navigate(usize),
    Next,
    Previous,
    Submit,
    Tick(TickTicket),
    VisibilityHidden,
    WindowBlur,
    FocusRegained,
    Retry,
    Reset,
    /// Navigation away or unmount. Ends the runner.
    Leave,
}

/// Cheap, cloneable handle to a running session.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    events: mpsc::UnboundedSender<SessionEvent>,
    snapshots: watch::Receiver<SessionSnapshot>,
}

impl SessionHandle {
    /// Queue an event. `false` once the runner has stopped.
    pub fn send(&self, event: SessionEvent) -> bool {
        self.events.send(event).is_ok()
    }

    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshots.borrow().clone()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshots.clone()
    }
}

pub struct SessionRunner {
    controller: SessionController,
    events: mpsc::UnboundedReceiver<SessionEvent>,
    snapshots: watch::Sender<SessionSnapshot>,
}

impl SessionRunner {
    /// Build a runner whose countdown ticks come back through its own queue.
    ///
    /// Must be called inside a tokio runtime.
    #[must_use]
    pub fn new(deps: SessionDeps) -> (Self, SessionHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        let ticks = TokioTickScheduler::new(&tx);
        let controller = SessionController::new(deps, Box::new(ticks));
        let (snapshots, snapshot_rx) = watch::channel(controller.snapshot());
        let runner = Self {
            controller,
            events: rx,
            snapshots,
        };
        let handle = SessionHandle {
            events: tx,
            snapshots: snapshot_rx,
        };
        (runner, handle)
    }

    /// Process events until `Leave` or until every handle is dropped. The
    /// controller is torn down on the way out.
    pub async fn run(mut self) {
        while let Some(event) = self.events.recv().await {
            let leaving = event == SessionEvent::Leave;
            self.handle(event).await;
            self.publish();
            if leaving {
                break;
            }
        }
        self.controller.leave();
        self.publish();
        tracing::debug!("session runner stopped");
    }

    async fn handle(&mut self, event: SessionEvent) {
        tracing::trace!(?event, "session event");
        let step = match event {
            SessionEvent::Open => {
                if let Err(err) = self.controller.open().await {
                    tracing::warn!(error = %err, "could not open session");
                }
                Step::Idle
            }
            SessionEvent::Select(test_type) => {
                if let Err(err) = self.controller.select_type(test_type).await {
                    tracing::warn!(error = %err, %test_type, "could not start session");
                }
                Step::Idle
            }
            SessionEvent::Answer { question, option } => {
                if let Err(err) = self.controller.answer(question, option) {
                    tracing::debug!(error = %err, "answer rejected");
                }
                Step::Idle
            }
            SessionEvent::Navigate(target) => {
                let _ = self.controller.navigate(target);
                Step::Idle
            }
            SessionEvent::Next => {
                let _ = self.controller.next();
                Step::Idle
            }
            SessionEvent::Previous => {
                let _ = self.controller.previous();
                Step::Idle
            }
            SessionEvent::Submit => self.controller.begin_submission(SubmitTrigger::Manual),
            SessionEvent::Tick(ticket) => self.controller.tick(ticket).1,
            SessionEvent::VisibilityHidden => self.controller.focus_lost(FocusLoss::Hidden).1,
            SessionEvent::WindowBlur => self.controller.focus_lost(FocusLoss::Blur).1,
            SessionEvent::FocusRegained => {
                self.controller.focus_regained();
                Step::Idle
            }
            SessionEvent::Retry => match self.controller.begin_retry() {
                Ok(submission) => Step::Deliver(submission),
                Err(err) => {
                    tracing::debug!(error = %err, "retry ignored");
                    Step::Idle
                }
            },
            SessionEvent::Reset => {
                if let Err(err) = self.controller.reset() {
                    tracing::debug!(error = %err, "reset ignored");
                }
                Step::Idle
            }
            SessionEvent::Leave => {
                self.controller.leave();
                Step::Idle
            }
        };

        if let Step::Deliver(submission) = step {
            // show `Submitting` while the request is in flight
            self.publish();
            if let Err(err) = self.controller.deliver(submission).await {
                tracing::warn!(error = %err, "submission not delivered");
            }
        }
    }

    fn publish(&self) {
        self.snapshots.send_replace(self.controller.snapshot());
    }
}
