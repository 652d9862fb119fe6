//! Best-effort interception of copy, context-menu, devtools and zoom
//! interactions while a session is in progress.
//!
//! The decision logic lives in [`LockdownPolicy`]; an [`EventHost`] attaches
//! it to the document-level event target (capture phase) and detaches it
//! again. [`LockdownGuard`] pairs those two calls and remembers the
//! text-selection style it replaced.

use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;

/// Keyboard modifier state carried by key and wheel events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub ctrl: bool,
    pub meta: bool,
    pub shift: bool,
    pub alt: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        ctrl: false,
        meta: false,
        shift: false,
        alt: false,
    };

    #[must_use]
    pub fn ctrl() -> Self {
        Self {
            ctrl: true,
            ..Self::NONE
        }
    }

    #[must_use]
    pub fn meta() -> Self {
        Self {
            meta: true,
            ..Self::NONE
        }
    }

    #[must_use]
    pub fn ctrl_shift() -> Self {
        Self {
            ctrl: true,
            shift: true,
            ..Self::NONE
        }
    }

    /// Ctrl on most platforms, Cmd on macOS.
    #[must_use]
    pub fn primary(self) -> bool {
        self.ctrl || self.meta
    }
}

/// What the event was dispatched at, as far as text editing is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    Input,
    TextArea,
    ContentEditable,
    Other,
}

impl TargetKind {
    #[must_use]
    pub fn is_editable(self) -> bool {
        !matches!(self, TargetKind::Other)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipboardAction {
    Copy,
    Cut,
    Paste,
}

/// A document-level interaction, reduced to what the policy needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    Key {
        /// `KeyboardEvent.key`; compared case-insensitively.
        key: String,
        modifiers: Modifiers,
        target: TargetKind,
    },
    Wheel {
        modifiers: Modifiers,
    },
    ContextMenu,
    Clipboard(ClipboardAction),
    DragStart,
    SelectStart {
        target: TargetKind,
    },
}

impl InputEvent {
    #[must_use]
    pub fn key(key: &str, modifiers: Modifiers) -> Self {
        Self::Key {
            key: key.to_string(),
            modifiers,
            target: TargetKind::Other,
        }
    }

    #[must_use]
    pub fn kind(&self) -> EventKind {
        match self {
            InputEvent::Key { .. } => EventKind::KeyDown,
            InputEvent::Wheel { .. } => EventKind::Wheel,
            InputEvent::ContextMenu => EventKind::ContextMenu,
            InputEvent::Clipboard(ClipboardAction::Copy) => EventKind::Copy,
            InputEvent::Clipboard(ClipboardAction::Cut) => EventKind::Cut,
            InputEvent::Clipboard(ClipboardAction::Paste) => EventKind::Paste,
            InputEvent::DragStart => EventKind::DragStart,
            InputEvent::SelectStart { .. } => EventKind::SelectStart,
        }
    }
}

/// DOM event types the guard listens to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    ContextMenu,
    Copy,
    Cut,
    Paste,
    DragStart,
    KeyDown,
    Wheel,
    SelectStart,
}

impl EventKind {
    pub const GUARDED: [EventKind; 8] = [
        EventKind::ContextMenu,
        EventKind::Copy,
        EventKind::Cut,
        EventKind::Paste,
        EventKind::DragStart,
        EventKind::KeyDown,
        EventKind::Wheel,
        EventKind::SelectStart,
    ];

    #[must_use]
    pub fn dom_name(self) -> &'static str {
        match self {
            EventKind::ContextMenu => "contextmenu",
            EventKind::Copy => "copy",
            EventKind::Cut => "cut",
            EventKind::Paste => "paste",
            EventKind::DragStart => "dragstart",
            EventKind::KeyDown => "keydown",
            EventKind::Wheel => "wheel",
            EventKind::SelectStart => "selectstart",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockReason {
    ContextMenu,
    Clipboard,
    Drag,
    DevTools,
    ViewSource,
    SavePage,
    Print,
    SelectAll,
    ClipboardShortcut,
    Zoom,
    Selection,
    ScreenCapture,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Allow,
    Block(BlockReason),
}

impl Verdict {
    #[must_use]
    pub fn is_blocked(self) -> bool {
        matches!(self, Verdict::Block(_))
    }
}

/// A blocked key combination. `key` is lowercase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct KeyChord {
    pub key: &'static str,
    /// Requires Ctrl or Cmd.
    pub primary: bool,
    pub shift: bool,
    pub reason: BlockReason,
}

const fn chord(key: &'static str, primary: bool, shift: bool, reason: BlockReason) -> KeyChord {
    KeyChord {
        key,
        primary,
        shift,
        reason,
    }
}

/// Shift chords come first so Ctrl+Shift+C reports devtools, not copy.
const BLOCKED_CHORDS: &[KeyChord] = &[
    chord("f12", false, false, BlockReason::DevTools),
    chord("printscreen", false, false, BlockReason::ScreenCapture),
    chord("i", true, true, BlockReason::DevTools),
    chord("j", true, true, BlockReason::DevTools),
    chord("c", true, true, BlockReason::DevTools),
    chord("u", true, false, BlockReason::ViewSource),
    chord("s", true, false, BlockReason::SavePage),
    chord("p", true, false, BlockReason::Print),
    chord("a", true, false, BlockReason::SelectAll),
    chord("c", true, false, BlockReason::ClipboardShortcut),
    chord("x", true, false, BlockReason::ClipboardShortcut),
    chord("v", true, false, BlockReason::ClipboardShortcut),
    chord("+", true, false, BlockReason::Zoom),
    chord("=", true, false, BlockReason::Zoom),
    chord("-", true, false, BlockReason::Zoom),
    chord("0", true, false, BlockReason::Zoom),
];

/// Pure decision function over [`InputEvent`]s.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LockdownPolicy;

impl LockdownPolicy {
    #[must_use]
    pub fn chords(&self) -> &'static [KeyChord] {
        BLOCKED_CHORDS
    }

    /// Only text selection looks at the target; every other category is
    /// blocked wherever it happens.
    #[must_use]
    pub fn evaluate(&self, event: &InputEvent) -> Verdict {
        match event {
            InputEvent::ContextMenu => Verdict::Block(BlockReason::ContextMenu),
            InputEvent::Clipboard(_) => Verdict::Block(BlockReason::Clipboard),
            InputEvent::DragStart => Verdict::Block(BlockReason::Drag),
            InputEvent::Wheel { modifiers } if modifiers.primary() => {
                Verdict::Block(BlockReason::Zoom)
            }
            InputEvent::Wheel { .. } => Verdict::Allow,
            InputEvent::SelectStart { target } if target.is_editable() => Verdict::Allow,
            InputEvent::SelectStart { .. } => Verdict::Block(BlockReason::Selection),
            InputEvent::Key { key, modifiers, .. } => Self::evaluate_key(key, *modifiers),
        }
    }

    fn evaluate_key(key: &str, modifiers: Modifiers) -> Verdict {
        let key = key.to_lowercase();
        BLOCKED_CHORDS
            .iter()
            .find(|c| {
                c.key == key
                    && (!c.primary || modifiers.primary())
                    && (!c.shift || modifiers.shift)
            })
            .map_or(Verdict::Allow, |c| Verdict::Block(c.reason))
    }
}

/// Handle for one attached set of capture-phase listeners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AttachmentId(pub u64);

/// The shared document-level event target.
pub trait EventHost {
    /// Attach capture-phase listeners for `kinds` that apply `policy`.
    fn attach(&mut self, kinds: &[EventKind], policy: LockdownPolicy) -> AttachmentId;
    /// Remove a previously attached set of listeners.
    fn detach(&mut self, id: AttachmentId);
    /// Current text-selection style of the document body.
    fn user_select(&self) -> String;
    fn set_user_select(&mut self, value: &str);
}

/// Install/dispose pairing for the lockdown listeners.
///
/// Both operations are idempotent. The owner must call `dispose` on every
/// exit path; the session controller does so on teardown and on drop.
#[derive(Debug, Default)]
pub struct LockdownGuard {
    policy: LockdownPolicy,
    attachment: Option<AttachmentId>,
    prior_user_select: Option<String>,
}

impl LockdownGuard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn policy(&self) -> LockdownPolicy {
        self.policy
    }

    #[must_use]
    pub fn is_installed(&self) -> bool {
        self.attachment.is_some()
    }

    pub fn install<H: EventHost + ?Sized>(&mut self, host: &mut H) {
        if self.attachment.is_some() {
            return;
        }
        self.prior_user_select = Some(host.user_select());
        host.set_user_select("none");
        self.attachment = Some(host.attach(&EventKind::GUARDED, self.policy));
        tracing::debug!("lockdown guard installed");
    }

    pub fn dispose<H: EventHost + ?Sized>(&mut self, host: &mut H) {
        let Some(id) = self.attachment.take() else {
            return;
        };
        host.detach(id);
        if let Some(prior) = self.prior_user_select.take() {
            host.set_user_select(&prior);
        }
        tracing::debug!("lockdown guard disposed");
    }
}

//
// ─── IN-MEMORY HOST ────────────────────────────────────────────────────────────
//

/// Document stand-in for tests and headless use. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct InMemoryEventHost {
    inner: Arc<Mutex<InMemoryHostState>>,
}

#[derive(Debug, Default)]
struct InMemoryHostState {
    next_id: u64,
    attached: Vec<(AttachmentId, Vec<EventKind>, LockdownPolicy)>,
    user_select: String,
    fullscreen_requests: u32,
    deny_fullscreen: bool,
}

impl InMemoryEventHost {
    #[must_use]
    pub fn new() -> Self {
        Self::with_user_select("auto")
    }

    #[must_use]
    pub fn with_user_select(value: &str) -> Self {
        let host = Self::default();
        host.lock().user_select = value.to_string();
        host
    }

    /// Make subsequent fullscreen requests fail.
    #[must_use]
    pub fn denying_fullscreen(self) -> Self {
        self.lock().deny_fullscreen = true;
        self
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, InMemoryHostState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `event` through every attached listener, as a capture-phase
    /// dispatch would. `Allow` when nothing intercepts it.
    #[must_use]
    pub fn dispatch(&self, event: &InputEvent) -> Verdict {
        let state = self.lock();
        let kind = event.kind();
        state
            .attached
            .iter()
            .filter(|(_, kinds, _)| kinds.contains(&kind))
            .map(|(_, _, policy)| policy.evaluate(event))
            .find(|verdict| verdict.is_blocked())
            .unwrap_or(Verdict::Allow)
    }

    #[must_use]
    pub fn attached_count(&self) -> usize {
        self.lock().attached.len()
    }

    #[must_use]
    pub fn current_user_select(&self) -> String {
        self.lock().user_select.clone()
    }

    #[must_use]
    pub fn fullscreen_requests(&self) -> u32 {
        self.lock().fullscreen_requests
    }
}

impl EventHost for InMemoryEventHost {
    fn attach(&mut self, kinds: &[EventKind], policy: LockdownPolicy) -> AttachmentId {
        let mut state = self.lock();
        state.next_id += 1;
        let id = AttachmentId(state.next_id);
        state.attached.push((id, kinds.to_vec(), policy));
        id
    }

    fn detach(&mut self, id: AttachmentId) {
        self.lock().attached.retain(|(attached, _, _)| *attached != id);
    }

    fn user_select(&self) -> String {
        self.lock().user_select.clone()
    }

    fn set_user_select(&mut self, value: &str) {
        self.lock().user_select = value.to_string();
    }
}

impl super::platform::Platform for InMemoryEventHost {
    fn request_fullscreen(&mut self) -> Result<(), crate::error::FullscreenDenied> {
        let mut state = self.lock();
        state.fullscreen_requests += 1;
        if state.deny_fullscreen {
            return Err(crate::error::FullscreenDenied::new("not permitted"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blocked(event: InputEvent) -> bool {
        LockdownPolicy.evaluate(&event).is_blocked()
    }

    #[test]
    fn blocks_clipboard_and_devtools_shortcuts() {
        assert!(blocked(InputEvent::key("c", Modifiers::ctrl())));
        assert!(blocked(InputEvent::key("V", Modifiers::ctrl())));
        assert!(blocked(InputEvent::key("x", Modifiers::meta())));
        assert!(blocked(InputEvent::key("F12", Modifiers::NONE)));
        assert!(blocked(InputEvent::key("I", Modifiers::ctrl_shift())));
        assert!(blocked(InputEvent::key("u", Modifiers::ctrl())));
        assert!(blocked(InputEvent::key("p", Modifiers::ctrl())));
        assert!(blocked(InputEvent::key("a", Modifiers::ctrl())));
        assert!(blocked(InputEvent::key("s", Modifiers::meta())));
    }

    #[test]
    fn devtools_reason_wins_for_shifted_c() {
        assert_eq!(
            LockdownPolicy.evaluate(&InputEvent::key("C", Modifiers::ctrl_shift())),
            Verdict::Block(BlockReason::DevTools)
        );
    }

    #[test]
    fn blocks_zoom_by_keyboard_and_wheel() {
        for key in ["+", "-", "=", "0"] {
            assert!(blocked(InputEvent::key(key, Modifiers::ctrl())), "{key}");
        }
        assert!(blocked(InputEvent::Wheel {
            modifiers: Modifiers::meta()
        }));
        assert!(!blocked(InputEvent::Wheel {
            modifiers: Modifiers::NONE
        }));
    }

    #[test]
    fn plain_typing_is_allowed() {
        assert!(!blocked(InputEvent::key("c", Modifiers::NONE)));
        assert!(!blocked(InputEvent::key("i", Modifiers::ctrl())));
        assert!(!blocked(InputEvent::key("Enter", Modifiers::NONE)));
    }

    #[test]
    fn selection_depends_on_target_but_shortcuts_do_not() {
        assert!(!blocked(InputEvent::SelectStart {
            target: TargetKind::Input
        }));
        assert!(!blocked(InputEvent::SelectStart {
            target: TargetKind::ContentEditable
        }));
        assert!(blocked(InputEvent::SelectStart {
            target: TargetKind::Other
        }));
        assert!(blocked(InputEvent::Key {
            key: "c".into(),
            modifiers: Modifiers::ctrl(),
            target: TargetKind::TextArea,
        }));
    }

    #[test]
    fn guard_restores_selection_style_and_detaches() {
        let mut host = InMemoryEventHost::with_user_select("text");
        let probe = host.clone();
        let mut guard = LockdownGuard::new();

        guard.install(&mut host);
        guard.install(&mut host);
        assert_eq!(probe.attached_count(), 1);
        assert_eq!(probe.current_user_select(), "none");
        assert!(probe.dispatch(&InputEvent::ContextMenu).is_blocked());

        guard.dispose(&mut host);
        guard.dispose(&mut host);
        assert_eq!(probe.attached_count(), 0);
        assert_eq!(probe.current_user_select(), "text");
        assert_eq!(probe.dispatch(&InputEvent::ContextMenu), Verdict::Allow);
        assert_eq!(
            probe.dispatch(&InputEvent::key("c", Modifiers::ctrl())),
            Verdict::Allow
        );
    }
}
