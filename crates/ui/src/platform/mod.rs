//! Webview bindings for the session engine's platform seam.
//!
//! The engine runs on its own task, so the host does not touch the document
//! directly; it queues [`WebviewCommand`]s that a UI future evaluates.

use services::FullscreenDenied;
use services::session::{AttachmentId, EventHost, EventKind, LockdownPolicy, Platform};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};

mod scripts;

pub(crate) use scripts::FOCUS_BRIDGE_SCRIPT;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebviewCommand {
    Eval(String),
    Fullscreen,
}

pub struct WebviewHost {
    commands: UnboundedSender<WebviewCommand>,
    next_id: u64,
    /// Inline style last written by the host; empty means the stylesheet
    /// default.
    user_select: String,
}

impl WebviewHost {
    #[must_use]
    pub fn new() -> (Self, UnboundedReceiver<WebviewCommand>) {
        let (commands, rx) = unbounded_channel();
        let host = Self {
            commands,
            next_id: 0,
            user_select: String::new(),
        };
        (host, rx)
    }

    fn eval(&self, script: String) {
        if self.commands.send(WebviewCommand::Eval(script)).is_err() {
            tracing::debug!("webview gone; script dropped");
        }
    }
}

impl EventHost for WebviewHost {
    fn attach(&mut self, kinds: &[EventKind], policy: LockdownPolicy) -> AttachmentId {
        self.next_id += 1;
        self.eval(scripts::lockdown_install_script(self.next_id, kinds, policy));
        AttachmentId(self.next_id)
    }

    fn detach(&mut self, id: AttachmentId) {
        self.eval(scripts::lockdown_remove_script(id.0));
    }

    fn user_select(&self) -> String {
        self.user_select.clone()
    }

    fn set_user_select(&mut self, value: &str) {
        self.user_select = value.to_string();
        self.eval(scripts::user_select_script(value));
    }
}

impl Platform for WebviewHost {
    fn request_fullscreen(&mut self) -> Result<(), FullscreenDenied> {
        self.commands
            .send(WebviewCommand::Fullscreen)
            .map_err(|_| FullscreenDenied::new("window closed"))
    }
}

/// Runs the document-wide release script when dropped. Owned by the view
/// scope, so unmounting cleans the document synchronously.
pub struct DocumentRelease<F: FnMut(&str)> {
    eval: F,
}

impl<F: FnMut(&str)> DocumentRelease<F> {
    pub fn new(eval: F) -> Self {
        Self { eval }
    }
}

impl<F: FnMut(&str)> Drop for DocumentRelease<F> {
    fn drop(&mut self) {
        tracing::debug!("releasing document lockdown");
        (self.eval)(scripts::release_all_script());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use services::session::LockdownGuard;

    fn drain(rx: &mut UnboundedReceiver<WebviewCommand>) -> Vec<WebviewCommand> {
        let mut out = Vec::new();
        while let Ok(command) = rx.try_recv() {
            out.push(command);
        }
        out
    }

    #[test]
    fn guard_round_trip_emits_paired_scripts() {
        let (mut host, mut rx) = WebviewHost::new();
        let mut guard = LockdownGuard::new();

        guard.install(&mut host);
        let installed = drain(&mut rx);
        assert_eq!(installed.len(), 2);
        assert!(matches!(&installed[1], WebviewCommand::Eval(js) if js.contains("addEventListener")));

        guard.dispose(&mut host);
        let removed = drain(&mut rx);
        assert_eq!(removed.len(), 2);
        assert!(matches!(&removed[0], WebviewCommand::Eval(js) if js.contains("removeEventListener")));
        assert!(matches!(&removed[1], WebviewCommand::Eval(js) if js.contains(r#"userSelect = """#)));
        assert_eq!(host.user_select(), "");
    }

    #[test]
    fn release_runs_after_the_command_channel_closed() {
        let (mut host, rx) = WebviewHost::new();
        let mut guard = LockdownGuard::new();
        guard.install(&mut host);
        drop(rx);
        guard.dispose(&mut host);

        let mut evaluated = Vec::new();
        drop(DocumentRelease::new(|js: &str| evaluated.push(js.to_string())));
        assert_eq!(evaluated.len(), 1);
        assert!(evaluated[0].contains("__proctorLockdown"));
        assert!(evaluated[0].contains(r#"userSelect = """#));
    }

    #[test]
    fn fullscreen_fails_once_the_window_is_gone() {
        let (mut host, rx) = WebviewHost::new();
        assert!(host.request_fullscreen().is_ok());
        drop(rx);
        assert!(host.request_fullscreen().is_err());
    }
}
