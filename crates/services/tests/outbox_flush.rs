mod common;

use std::sync::Arc;

use common::{FakeBackend, level};
use proctor_core::model::{LegacyCompletion, Submission, TestType};
use proctor_core::time::fixed_now;
use services::SubmissionOutbox;
use storage::repository::{InMemoryRepository, PendingSubmissionRepository};

fn legacy(time_spent: u64) -> Submission {
    Submission::Legacy(LegacyCompletion {
        level: level(1),
        test_type: TestType::SecondHalf,
        time_spent,
    })
}

#[tokio::test]
async fn flush_delivers_and_keeps_failures() {
    let repo = InMemoryRepository::new();
    repo.enqueue(&legacy(100), fixed_now(), "offline").await.unwrap();
    repo.enqueue(&legacy(200), fixed_now(), "offline").await.unwrap();

    let backend = Arc::new(FakeBackend::new(0).failing_submissions(1));
    let outbox = SubmissionOutbox::new(backend.clone(), Arc::new(repo.clone()));

    let report = outbox.flush(10).await.unwrap();
    assert_eq!(report.delivered, 1);
    assert_eq!(report.failed, 1);

    let pending = outbox.pending(10).await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].submission, legacy(100));
    assert_eq!(pending[0].attempts, 2);

    let report = outbox.flush(10).await.unwrap();
    assert_eq!(report.delivered, 1);
    assert!(repo.list_pending(10).await.unwrap().is_empty());
    let times: Vec<u64> = backend.legacy().iter().map(|c| c.time_spent).collect();
    assert_eq!(times, vec![100, 200, 100]);
}
