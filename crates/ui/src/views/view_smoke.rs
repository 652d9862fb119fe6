use proctor_core::model::{TestResult, TestType};
use services::session::{AbortReason, ViolationWarning, WatermarkLayout, legacy_content_for};
use services::SessionPhase;

use super::test_harness::{
    graded_snapshot, level, mount_and_drop_release_scope, render_result, render_screen,
};

#[test]
fn selection_lists_every_test_type() {
    let mut snapshot = graded_snapshot(level(2), 0);
    snapshot.phase = SessionPhase::Selecting;
    snapshot.error = Some("Failed to load questions".into());

    let html = render_screen(snapshot);
    for test_type in TestType::ALL {
        assert!(html.contains(test_type.label()), "missing {} in {html}", test_type.label());
    }
    assert!(html.contains("Level 2"));
    assert!(html.contains("Failed to load questions"));
}

#[test]
fn in_progress_shows_question_timer_and_watermark() {
    let mut snapshot = graded_snapshot(level(2), 3);
    snapshot.phase = SessionPhase::InProgress;
    snapshot.test_type = Some(TestType::Full);
    snapshot.cursor = 1;
    snapshot.answers[0] = Some(1);
    snapshot.remaining_secs = 5400;
    snapshot.time_limit_secs = 5400;
    snapshot.watermark = Some(WatermarkLayout::with_text("Jane Doe AB123"));

    let html = render_screen(snapshot);
    assert!(html.contains("Prompt number 2"), "{html}");
    assert!(html.contains("Question 2 of 3"));
    assert!(html.contains("90:00"));
    assert!(html.contains("1/3 answered"));
    assert!(html.contains("pointer-events: none"));
    assert_eq!(html.matches("Jane Doe AB123").count(), 25);
}

#[test]
fn warning_banner_follows_snapshot() {
    let mut snapshot = graded_snapshot(level(2), 2);
    snapshot.phase = SessionPhase::InProgress;
    snapshot.remaining_secs = 100;
    let quiet = render_screen(snapshot.clone());
    assert!(!quiet.contains("warning-banner"));

    snapshot.warning = Some(ViolationWarning { count: 1, limit: 3 });
    let html = render_screen(snapshot);
    assert!(html.contains("Warning 1/3"), "{html}");
    assert!(html.contains("exam__timer--low"));
}

#[test]
fn legacy_session_renders_sandboxed_frame() {
    let level = level(1);
    let mut snapshot = graded_snapshot(level, 0);
    snapshot.phase = SessionPhase::InProgress;
    snapshot.test_type = Some(TestType::FirstHalf);
    snapshot.legacy = legacy_content_for(level, TestType::FirstHalf);

    let html = render_screen(snapshot);
    assert!(html.contains("<iframe"), "{html}");
    assert!(html.contains("https://exam.example/lvl-1-1/index.html"));
    assert!(html.contains("allow-scripts"));
    assert!(html.contains("Finish"));
}

#[test]
fn submitting_disables_submit() {
    let mut snapshot = graded_snapshot(level(3), 1);
    snapshot.phase = SessionPhase::Submitting;
    let html = render_screen(snapshot);
    assert!(html.contains("Submitting..."), "{html}");
    assert!(html.contains("disabled"));
}

#[test]
fn aborted_submission_offers_retry() {
    let mut snapshot = graded_snapshot(level(3), 1);
    snapshot.phase = SessionPhase::Aborted;
    snapshot.abort_reason = Some(AbortReason::SubmissionFailed);
    snapshot.can_retry = true;
    snapshot.error = Some("network down".into());

    let html = render_screen(snapshot);
    assert!(html.contains("Your answers were not delivered"), "{html}");
    assert!(html.contains("Retry submission"));
    assert!(html.contains("network down"));
}

#[test]
fn results_show_score_and_band() {
    let html = render_result(TestResult {
        total: 90,
        correct: 81,
        wrong: 9,
        score: 90.0,
        time_spent: 3723,
    });
    assert!(html.contains("90.0%"), "{html}");
    assert!(html.contains("Excellent! Outstanding performance!"));
    assert!(html.contains("score--high"));
    assert!(html.contains("Correct: 81"));
}

#[test]
fn participation_only_result_hides_score() {
    let html = render_result(TestResult {
        time_spent: 600,
        ..TestResult::default()
    });
    assert!(html.contains("participation has been recorded"), "{html}");
    assert!(!html.contains("Correct:"));
}

#[test]
fn unmounting_the_scope_releases_the_document() {
    let (mounted, dropped) = mount_and_drop_release_scope();
    assert!(mounted.is_empty());
    assert_eq!(dropped.len(), 1);
    assert!(dropped[0].contains("__proctorLockdown"));
    assert!(dropped[0].contains("removeEventListener"));
}
