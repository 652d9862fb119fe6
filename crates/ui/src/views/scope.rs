use std::rc::Rc;

use dioxus::prelude::*;
use dioxus_router::Outlet;
use tokio::sync::mpsc::UnboundedReceiver;

use services::{SessionEvent, SessionHandle, SessionRunner, SessionSnapshot};

use crate::context::AppContext;
use crate::platform::{DocumentRelease, FOCUS_BRIDGE_SCRIPT, WebviewCommand, WebviewHost};
use crate::routes::Route;

/// Owns the session for every page below it.
///
/// Provides the [`SessionHandle`] and a `Signal<SessionSnapshot>` mirror of
/// the runner's watch channel.
#[component]
pub fn SessionScope() -> Element {
    let ctx = use_context::<AppContext>();
    let handle = use_hook(|| {
        let (host, commands) = WebviewHost::new();
        spawn(pump_webview(commands));
        let deps = ctx.services().session_deps(ctx.level(), Box::new(host));
        let (runner, handle) = SessionRunner::new(deps);
        tokio::spawn(runner.run());
        handle.send(SessionEvent::Open);
        handle
    });
    use_context_provider(|| handle.clone());

    let mut snapshot = use_signal(|| handle.snapshot());
    use_context_provider(|| snapshot);

    let watched = handle.clone();
    use_future(move || {
        let mut rx = watched.subscribe();
        async move {
            while rx.changed().await.is_ok() {
                let next = rx.borrow_and_update().clone();
                snapshot.set(next);
            }
        }
    });

    let bridged = handle.clone();
    use_future(move || {
        let handle = bridged.clone();
        async move { bridge_focus(handle).await }
    });

    use_document_release(|script| {
        let _ = document::eval(script);
    });

    use_drop({
        let handle = handle.clone();
        move || {
            handle.send(SessionEvent::Leave);
        }
    });

    rsx! {
        div { class: "app",
            Outlet::<Route> {}
        }
    }
}

/// Strips any lockdown from the document when the calling scope unmounts.
pub(crate) fn use_document_release(eval: impl FnMut(&str) + 'static) {
    use_hook(|| Rc::new(DocumentRelease::new(eval)));
}

async fn pump_webview(mut commands: UnboundedReceiver<WebviewCommand>) {
    while let Some(command) = commands.recv().await {
        match command {
            WebviewCommand::Eval(script) => {
                let _ = document::eval(&script);
            }
            WebviewCommand::Fullscreen => dioxus::desktop::window().set_fullscreen(true),
        }
    }
}

async fn bridge_focus(handle: SessionHandle) {
    let mut bridge = document::eval(FOCUS_BRIDGE_SCRIPT);
    while let Ok(signal) = bridge.recv::<String>().await {
        let event = match signal.as_str() {
            "hidden" => SessionEvent::VisibilityHidden,
            "blur" => SessionEvent::WindowBlur,
            "focus" => SessionEvent::FocusRegained,
            other => {
                tracing::debug!(signal = other, "unknown focus signal");
                continue;
            }
        };
        if !handle.send(event) {
            break;
        }
    }
}

/// Current session snapshot, provided by [`SessionScope`].
pub fn use_snapshot() -> Signal<SessionSnapshot> {
    use_context::<Signal<SessionSnapshot>>()
}
