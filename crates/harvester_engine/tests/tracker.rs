use harvester_core::{SaveVerdict, Tally};
use harvester_engine::Tracker;
use pretty_assertions::assert_eq;

mod common;

#[tokio::test]
async fn concurrent_reports_are_not_lost() {
    let (tracker, task) = Tracker::spawn(Tally::new(&common::categories(&["jpg"]), 1000, 1000));

    let mut handles = Vec::new();
    for i in 0..64 {
        let tracker = tracker.clone();
        handles.push(tokio::spawn(async move {
            tracker.record_saved("jpg", &format!("digest-{i}")).await.unwrap();
            tracker.record_failure("flaky.example").await.unwrap();
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(tracker.snapshot().counts["jpg"], 64);
    drop(tracker);
    let tally = task.await.unwrap();
    assert_eq!(tally.count("jpg"), 64);
    assert_eq!(tally.failures("flaky.example"), 64);
}

#[tokio::test]
async fn duplicate_content_is_not_counted_twice() {
    let (tracker, _task) = Tracker::spawn(Tally::new(&common::categories(&["jpg"]), 5, 10));

    assert_eq!(tracker.record_saved("jpg", "abc").await.unwrap(), SaveVerdict::Counted);
    assert_eq!(tracker.record_saved("jpg", "abc").await.unwrap(), SaveVerdict::Duplicate);
    assert_eq!(tracker.snapshot().counts["jpg"], 1);
}

#[tokio::test]
async fn quota_signal_fires_when_every_category_is_full() {
    let (tracker, _task) = Tracker::spawn(Tally::new(&common::categories(&["jpg", "pdf"]), 1, 10));

    tracker.record_saved("jpg", "a").await.unwrap();
    assert!(!tracker.is_complete());
    assert!(!tracker.is_open("jpg"));
    assert!(tracker.is_open("pdf"));

    tracker.record_saved("pdf", "b").await.unwrap();
    assert!(tracker.is_complete());
    tracker.quota_met().cancelled().await;
}

#[tokio::test]
async fn host_is_penalized_once_failures_exceed_tolerance() {
    let (tracker, _task) = Tracker::spawn(Tally::new(&common::categories(&["jpg"]), 1, 2));

    assert_eq!(tracker.record_failure("bad.example").await.unwrap(), 1);
    assert_eq!(tracker.record_failure("bad.example").await.unwrap(), 2);
    assert!(!tracker.is_penalized("bad.example"));

    assert_eq!(tracker.record_failure("bad.example").await.unwrap(), 3);
    assert!(tracker.is_penalized("bad.example"));
    assert!(!tracker.is_penalized("good.example"));
}
