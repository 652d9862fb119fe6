use std::sync::{Arc, Mutex};

use dioxus::core::NoOpMutations;
use dioxus::prelude::*;
use proctor_core::model::{Level, Question, QuestionId, TestResult};
use services::SessionSnapshot;
use url::Url;

use super::scope::use_document_release;
use super::{ExamScreen, ResultPanel};

pub const ORIGIN: &str = "https://exam.example/";

#[derive(Props, Clone, PartialEq)]
struct ScreenHarnessProps {
    snapshot: SessionSnapshot,
}

#[component]
fn ScreenHarness(props: ScreenHarnessProps) -> Element {
    let origin = Url::parse(ORIGIN).expect("origin");
    rsx! {
        ExamScreen { snapshot: props.snapshot, content_origin: origin, on_event: move |_| {} }
    }
}

#[derive(Props, Clone, PartialEq)]
struct ResultHarnessProps {
    result: TestResult,
}

#[component]
fn ResultHarness(props: ResultHarnessProps) -> Element {
    rsx! {
        ResultPanel { result: props.result, on_back: move |_| {} }
    }
}

#[derive(Props, Clone)]
struct ReleaseHarnessProps {
    evaluated: Arc<Mutex<Vec<String>>>,
}

impl PartialEq for ReleaseHarnessProps {
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}

#[component]
fn ReleaseHarness(props: ReleaseHarnessProps) -> Element {
    let evaluated = Arc::clone(&props.evaluated);
    use_document_release(move |script| {
        evaluated.lock().expect("evaluated").push(script.to_string());
    });
    rsx! { div { "scoped" } }
}

/// Mounts a scope holding the document release and returns the scripts it
/// evaluated before and after the scope was dropped.
pub fn mount_and_drop_release_scope() -> (Vec<String>, Vec<String>) {
    let evaluated = Arc::new(Mutex::new(Vec::new()));
    let mut dom = VirtualDom::new_with_props(
        ReleaseHarness,
        ReleaseHarnessProps {
            evaluated: Arc::clone(&evaluated),
        },
    );
    dom.rebuild_in_place();
    drive_dom(&mut dom);
    let mounted = evaluated.lock().expect("evaluated").clone();
    drop(dom);
    let dropped = evaluated.lock().expect("evaluated").clone();
    (mounted, dropped)
}

pub fn drive_dom(dom: &mut VirtualDom) {
    dom.process_events();
    dom.render_immediate(&mut NoOpMutations);
    dom.process_events();
}

pub fn render_screen(snapshot: SessionSnapshot) -> String {
    let mut dom = VirtualDom::new_with_props(ScreenHarness, ScreenHarnessProps { snapshot });
    dom.rebuild_in_place();
    drive_dom(&mut dom);
    dioxus_ssr::render(&dom)
}

pub fn render_result(result: TestResult) -> String {
    let mut dom = VirtualDom::new_with_props(ResultHarness, ResultHarnessProps { result });
    dom.rebuild_in_place();
    drive_dom(&mut dom);
    dioxus_ssr::render(&dom)
}

pub fn level(value: u8) -> Level {
    Level::new(value).expect("level")
}

/// A snapshot in the given level with `count` two-option questions loaded.
pub fn graded_snapshot(level: Level, count: u32) -> SessionSnapshot {
    let mut snapshot = SessionSnapshot::idle(level, 3);
    let questions: Vec<Question> = (1..=count)
        .map(|n| {
            Question::new(
                QuestionId::new(format!("q{n}")),
                level,
                n,
                format!("Prompt number {n}"),
                vec!["Alpha".into(), "Beta".into()],
            )
        })
        .collect();
    snapshot.answers = vec![None; questions.len()];
    snapshot.questions = Arc::from(questions);
    snapshot
}
