use dioxus::prelude::*;
use url::Url;

use proctor_core::model::{TestResult, TestType};
use services::session::{AbortReason, LegacyContent, SANDBOX, ViolationWarning, WatermarkLayout};
use services::SessionEvent;

use crate::vm::{ProgressVm, QuestionVm, ResultVm, TestTypeCardVm};

/// Identity tiles over the whole window. Never intercepts input.
#[component]
pub fn WatermarkOverlay(layout: WatermarkLayout) -> Element {
    let tiles = layout.tiles.iter().enumerate().map(|(i, tile)| {
        let style = format!(
            "top: {}%; left: {}%; transform: translate(-50%, -50%) rotate({}deg); opacity: {};",
            tile.top_pct, tile.left_pct, layout.rotation_deg, layout.opacity
        );
        rsx! {
            span { key: "{i}", class: "watermark__tile", style: "{style}", "{layout.text}" }
        }
    });
    rsx! {
        div {
            class: "watermark",
            aria_hidden: "true",
            style: "position: fixed; inset: 0; pointer-events: none; user-select: none; z-index: 9999; overflow: hidden;",
            {tiles}
        }
    }
}

#[component]
pub fn WarningBanner(warning: Option<ViolationWarning>) -> Element {
    let Some(warning) = warning else {
        return rsx! {};
    };
    rsx! {
        div { class: "warning-banner", role: "alert", "{warning.message()}" }
    }
}

#[component]
pub fn TypeSelection(
    level_label: String,
    cards: Vec<TestTypeCardVm>,
    error: Option<String>,
    on_select: EventHandler<TestType>,
) -> Element {
    let buttons = cards.into_iter().map(|card| {
        let test_type = card.test_type;
        rsx! {
            button {
                key: "{test_type.as_str()}",
                class: "type-card",
                r#type: "button",
                onclick: move |_| on_select.call(test_type),
                h3 { "{card.label}" }
                p { "{card.description}" }
                p { class: "type-card__meta", "{card.duration_label}" }
            }
        }
    });
    let error = error.map(|error| rsx! { p { class: "error", role: "alert", "{error}" } });
    rsx! {
        div { class: "page selection",
            h2 { "{level_label}" }
            p { "Choose a test. It opens in fullscreen and is monitored until you submit." }
            {error}
            div { class: "selection__grid", {buttons} }
        }
    }
}

#[component]
pub fn SessionHeader(
    title: String,
    progress: ProgressVm,
    submitting: bool,
    submit_label: String,
    on_submit: EventHandler<()>,
) -> Element {
    let timer_class = if progress.low_time {
        "exam__timer exam__timer--low"
    } else {
        "exam__timer"
    };
    rsx! {
        header { class: "exam__header",
            h2 { "{title}" }
            span { class: "{timer_class}", id: "exam-timer", "{progress.remaining_label}" }
            button {
                class: "exam__submit",
                r#type: "button",
                disabled: submitting,
                onclick: move |_| on_submit.call(()),
                if submitting { "Submitting..." } else { "{submit_label}" }
            }
        }
    }
}

#[component]
pub fn QuestionCard(
    question: QuestionVm,
    progress: ProgressVm,
    answered: Vec<bool>,
    on_event: EventHandler<SessionEvent>,
) -> Element {
    let index = question.index;
    let options = question.options.iter().map(|option| {
        let option_index = option.index;
        let class = if option.selected {
            "option option--selected"
        } else {
            "option"
        };
        rsx! {
            button {
                key: "{option_index}",
                class: "{class}",
                r#type: "button",
                onclick: move |_| on_event.call(SessionEvent::Answer { question: index, option: option_index }),
                span { class: "option__letter", "{option.letter}" }
                span { "{option.text}" }
            }
        }
    });
    let jumps = answered.iter().enumerate().map(|(i, done)| {
        let class = match (i == index, *done) {
            (true, _) => "jump jump--current",
            (false, true) => "jump jump--answered",
            (false, false) => "jump",
        };
        let label = i + 1;
        rsx! {
            button {
                key: "{i}",
                class: "{class}",
                r#type: "button",
                onclick: move |_| on_event.call(SessionEvent::Navigate(i)),
                "{label}"
            }
        }
    });
    rsx! {
        section { class: "question",
            div { class: "question__meta",
                span { "{question.position_label}" }
                span { "{progress.answered_label}" }
            }
            div { class: "progress", div { class: "progress__bar", style: "width: {progress.percent}%;" } }
            h3 { class: "question__text", "{question.number}. {question.text}" }
            div { class: "question__options", {options} }
            nav { class: "question__nav",
                button {
                    r#type: "button",
                    disabled: question.is_first,
                    onclick: move |_| on_event.call(SessionEvent::Previous),
                    "Previous"
                }
                button {
                    r#type: "button",
                    disabled: question.is_last,
                    onclick: move |_| on_event.call(SessionEvent::Next),
                    "Next"
                }
            }
            div { class: "question__jumps", {jumps} }
        }
    }
}

/// External content in a restricted frame.
#[component]
pub fn LegacyFrame(content: LegacyContent, origin: Url) -> Element {
    match content.resolve(&origin) {
        Ok(src) => rsx! {
            div { class: "legacy",
                p { class: "legacy__label", "{content.label}" }
                iframe {
                    class: "legacy__frame",
                    src: "{src}",
                    title: "{content.title}",
                    "sandbox": SANDBOX,
                }
            }
        },
        Err(err) => rsx! {
            p { class: "error", "Cannot open {content.title}: {err}" }
        },
    }
}

#[component]
pub fn ResultPanel(result: TestResult, on_back: EventHandler<()>) -> Element {
    let vm = ResultVm::from(&result);
    rsx! {
        div { class: "page results",
            h2 { "Test Completed" }
            if vm.participation_only {
                p { "Your participation has been recorded." }
            } else {
                p { class: "results__score {vm.tier_class}", "{vm.score_label}" }
                p { class: "results__message", "{vm.message}" }
                ul { class: "results__counts",
                    li { "Correct: {vm.correct}" }
                    li { "Wrong: {vm.wrong}" }
                    li { "Total: {vm.total}" }
                }
            }
            p { "Time spent: {vm.time_label}" }
            button { r#type: "button", onclick: move |_| on_back.call(()), "Back to tests" }
        }
    }
}

#[component]
pub fn AbortedPanel(
    reason: Option<AbortReason>,
    error: Option<String>,
    can_retry: bool,
    on_retry: EventHandler<()>,
    on_back: EventHandler<()>,
) -> Element {
    let heading = match reason {
        Some(AbortReason::AuthFailed) => "Please sign in again",
        Some(AbortReason::SubmissionFailed) => "Your answers were not delivered",
        Some(AbortReason::Abandoned) | None => "The test was closed",
    };
    let error = error.map(|error| rsx! { p { class: "error", "{error}" } });
    rsx! {
        div { class: "page aborted",
            h2 { "{heading}" }
            {error}
            if can_retry {
                p { "Your answers are saved on this device. Nothing has been lost." }
                button { r#type: "button", onclick: move |_| on_retry.call(()), "Retry submission" }
            }
            button { r#type: "button", onclick: move |_| on_back.call(()), "Back to tests" }
        }
    }
}
