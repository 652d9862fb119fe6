//! The proctored test-session engine.

pub mod controller;
pub mod countdown;
pub mod legacy;
pub mod lockdown;
pub mod monitor;
pub mod platform;
pub mod runner;
pub mod state;
pub mod watermark;

pub use controller::{
    FocusLossOutcome, SessionController, SessionDeps, Step, SubmitOutcome, TickEffect,
};
pub use countdown::{
    Countdown, ManualTicks, TickOutcome, TickScheduler, TickTicket, TokioTickScheduler,
    format_clock,
};
pub use legacy::{LegacyContent, SANDBOX, legacy_content_for};
pub use lockdown::{
    AttachmentId, BlockReason, ClipboardAction, EventHost, EventKind, InMemoryEventHost,
    InputEvent, KeyChord, LockdownGuard, LockdownPolicy, Modifiers, TargetKind, Verdict,
};
pub use monitor::{FocusLoss, MonitorVerdict, ViolationMonitor, ViolationWarning};
pub use platform::Platform;
pub use runner::{SessionEvent, SessionHandle, SessionRunner};
pub use state::{AbortReason, SessionPhase, SessionSnapshot, SubmitTrigger};
pub use watermark::{WatermarkLayout, WatermarkTile};
