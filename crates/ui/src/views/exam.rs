use dioxus::prelude::*;
use url::Url;

use services::{SessionEvent, SessionHandle, SessionPhase, SessionSnapshot};

use super::components::{
    AbortedPanel, LegacyFrame, QuestionCard, ResultPanel, SessionHeader, TypeSelection,
    WarningBanner, WatermarkOverlay,
};
use super::scope::use_snapshot;
use crate::context::AppContext;
use crate::vm::{map_current_question, map_progress, map_test_type_cards};

#[component]
pub fn ExamView() -> Element {
    let ctx = use_context::<AppContext>();
    let handle = use_context::<SessionHandle>();
    let snapshot = use_snapshot();
    let on_event = use_callback(move |event: SessionEvent| {
        if !handle.send(event) {
            tracing::warn!("session runner stopped; event dropped");
        }
    });

    rsx! {
        ExamScreen {
            snapshot: snapshot.read().clone(),
            content_origin: ctx.content_origin().clone(),
            on_event,
        }
    }
}

/// Renders one snapshot. Pure: every interaction goes out through `on_event`.
#[component]
pub fn ExamScreen(
    snapshot: SessionSnapshot,
    content_origin: Url,
    on_event: EventHandler<SessionEvent>,
) -> Element {
    match snapshot.phase {
        SessionPhase::NotStarted => rsx! {
            div { class: "page", p { "Checking your access..." } }
        },
        SessionPhase::Selecting => rsx! {
            TypeSelection {
                level_label: format!("Level {}", snapshot.level),
                cards: map_test_type_cards(snapshot.level),
                error: snapshot.error.clone(),
                on_select: move |test_type| on_event.call(SessionEvent::Select(test_type)),
            }
        },
        SessionPhase::InProgress | SessionPhase::Submitting => rsx! {
            ActiveSession { snapshot, content_origin, on_event }
        },
        SessionPhase::Completed => match snapshot.result.clone() {
            Some(result) => rsx! {
                ResultPanel { result, on_back: move |_| on_event.call(SessionEvent::Reset) }
            },
            None => rsx! {},
        },
        SessionPhase::Aborted => rsx! {
            AbortedPanel {
                reason: snapshot.abort_reason,
                error: snapshot.error.clone(),
                can_retry: snapshot.can_retry,
                on_retry: move |_| on_event.call(SessionEvent::Retry),
                on_back: move |_| on_event.call(SessionEvent::Reset),
            }
        },
    }
}

#[component]
fn ActiveSession(
    snapshot: SessionSnapshot,
    content_origin: Url,
    on_event: EventHandler<SessionEvent>,
) -> Element {
    let progress = map_progress(&snapshot);
    let submitting = snapshot.phase == SessionPhase::Submitting;
    let title = match snapshot.test_type {
        Some(test_type) => format!("Level {} · {}", snapshot.level, test_type.label()),
        None => format!("Level {}", snapshot.level),
    };
    let submit_label = if snapshot.is_legacy() { "Finish" } else { "Submit" };

    let watermark = snapshot
        .watermark
        .clone()
        .map(|layout| rsx! { WatermarkOverlay { layout } });
    let body = match (snapshot.legacy, map_current_question(&snapshot)) {
        (Some(content), _) => rsx! { LegacyFrame { content, origin: content_origin } },
        (None, Some(question)) => rsx! {
            QuestionCard {
                question,
                progress: progress.clone(),
                answered: snapshot.answers.iter().map(Option::is_some).collect::<Vec<_>>(),
                on_event,
            }
        },
        (None, None) => rsx! {},
    };

    rsx! {
        div { class: "exam", id: "exam-root",
            {watermark}
            SessionHeader {
                title,
                progress,
                submitting,
                submit_label: submit_label.to_string(),
                on_submit: move |_| on_event.call(SessionEvent::Submit),
            }
            WarningBanner { warning: snapshot.warning }
            {body}
        }
    }
}
