use super::*;

fn query_target() -> RunTarget {
    RunTarget::Query {
        query: "rust".to_string(),
        filters: SearchFilters::default(),
    }
}

#[test]
fn registered_run_starts_running() {
    let tracker = JobTracker::new();
    let handle = tracker.register(query_target(), 10);

    let run = tracker.get(handle.run_id()).unwrap();
    assert_eq!(run.status, RunStatus::Running);
    assert_eq!(run.discovered, 0);
    assert_eq!(run.limit, 10);
    assert!(run.finished_at.is_none());
}

#[test]
fn unknown_run_is_absent() {
    let tracker = JobTracker::new();
    assert!(tracker.get(Uuid::new_v4()).is_none());
}

#[test]
fn progress_never_decreases() {
    let tracker = JobTracker::new();
    let handle = tracker.register(query_target(), 10);

    handle.report_progress(4);
    handle.report_progress(2);
    assert_eq!(tracker.get(handle.run_id()).unwrap().discovered, 4);
}

#[test]
fn terminal_status_is_set_once() {
    let tracker = JobTracker::new();
    let handle = tracker.register(query_target(), 10);

    assert!(handle.complete(7));
    assert!(!handle.fail("late failure"));
    assert!(!handle.complete(9));

    let run = tracker.get(handle.run_id()).unwrap();
    assert_eq!(run.status, RunStatus::Completed);
    assert_eq!(run.discovered, 7);
    assert!(run.error.is_none());
    assert!(run.finished_at.is_some());
}

#[test]
fn progress_after_completion_is_ignored() {
    let tracker = JobTracker::new();
    let handle = tracker.register(query_target(), 10);

    handle.complete(3);
    handle.report_progress(8);
    assert_eq!(tracker.get(handle.run_id()).unwrap().discovered, 3);
}

#[test]
fn completion_count_replaces_abandoned_progress() {
    let tracker = JobTracker::new();
    let handle = tracker.register(query_target(), 10);

    handle.report_progress(6);
    assert!(handle.complete(2));
    assert_eq!(tracker.get(handle.run_id()).unwrap().discovered, 2);
}

#[test]
fn failure_records_error_string() {
    let tracker = JobTracker::new();
    let handle = tracker.register(
        RunTarget::Profile {
            url: "https://www.linkedin.com/in/jane".to_string(),
        },
        5,
    );

    assert!(handle.fail("login failed"));
    let run = tracker.get(handle.run_id()).unwrap();
    assert_eq!(run.status, RunStatus::Failed);
    assert_eq!(run.error.as_deref(), Some("login failed"));
}

#[test]
fn list_all_is_ordered_by_start() {
    let tracker = JobTracker::new();
    let first = tracker.register(query_target(), 1);
    std::thread::sleep(std::time::Duration::from_millis(2));
    let second = tracker.register(query_target(), 2);

    let ids: Vec<Uuid> = tracker.list_all().iter().map(|r| r.run_id).collect();
    assert_eq!(ids, vec![first.run_id(), second.run_id()]);
}

#[tokio::test]
async fn launch_returns_before_worker_finishes() {
    let tracker = JobTracker::new();
    let (tx, rx) = tokio::sync::oneshot::channel::<()>();

    let run_id = tracker.launch(query_target(), 10, |handle| async move {
        let _ = rx.await;
        handle.report_progress(2);
        handle.complete(2);
    });

    assert_eq!(tracker.get(run_id).unwrap().status, RunStatus::Running);
    tx.send(()).unwrap();
    tracker.join_all().await;

    let run = tracker.get(run_id).unwrap();
    assert_eq!(run.status, RunStatus::Completed);
    assert_eq!(run.discovered, 2);
}

#[tokio::test]
async fn panicking_worker_marks_run_failed() {
    let tracker = JobTracker::new();
    let run_id = tracker.launch(query_target(), 10, |_handle| async move {
        panic!("boom");
    });

    tracker.join_all().await;
    let run = tracker.get(run_id).unwrap();
    assert_eq!(run.status, RunStatus::Failed);
    assert!(run.error.unwrap().contains("worker aborted"));
}

#[tokio::test]
async fn finished_supervisors_are_reaped() {
    let tracker = JobTracker::new();
    for _ in 0..5 {
        tracker.launch(query_target(), 1, |handle| async move {
            handle.complete(1);
        });
    }

    let mut remaining = tracker.active_tasks();
    for _ in 0..200 {
        if remaining == 0 {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        remaining = tracker.active_tasks();
    }
    assert_eq!(remaining, 0);

    let (tx, rx) = tokio::sync::oneshot::channel::<()>();
    let run_id = tracker.launch(query_target(), 1, |handle| async move {
        let _ = rx.await;
        handle.complete(0);
    });
    assert_eq!(tracker.active_tasks(), 1);

    tx.send(()).unwrap();
    tracker.join_all().await;
    assert_eq!(tracker.active_tasks(), 0);
    assert_eq!(tracker.get(run_id).unwrap().status, RunStatus::Completed);
    assert_eq!(tracker.list_all().len(), 6);
}

#[test]
fn only_running_is_non_terminal() {
    assert!(!RunStatus::Running.is_terminal());
    assert!(RunStatus::Completed.is_terminal());
    assert!(RunStatus::Failed.is_terminal());
    assert_eq!(RunStatus::Failed.as_str(), "failed");
}
