use harvester_core::{SaveVerdict, Tally};
use pretty_assertions::assert_eq;

fn categories(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}

#[test]
fn identical_content_counts_once_per_category() {
    let mut tally = Tally::new(&categories(&["jpg", "image"]), 5, 10);

    assert_eq!(tally.record_saved("jpg", "abc"), SaveVerdict::Counted);
    assert_eq!(tally.record_saved("jpg", "abc"), SaveVerdict::Duplicate);
    assert_eq!(tally.record_saved("image", "abc"), SaveVerdict::Counted);
    assert_eq!(tally.record_saved("jpg", "def"), SaveVerdict::Counted);

    assert_eq!(tally.count("jpg"), 2);
    assert_eq!(tally.count("image"), 1);
}

#[test]
fn completes_only_when_every_category_reaches_limit() {
    let mut tally = Tally::new(&categories(&["jpg", "pdf"]), 2, 10);
    tally.record_saved("jpg", "1");
    tally.record_saved("jpg", "2");
    assert!(!tally.is_complete());
    assert!(!tally.snapshot().is_open("jpg"));
    assert!(tally.snapshot().is_open("pdf"));

    tally.record_saved("pdf", "1");
    tally.record_saved("pdf", "2");
    assert!(tally.is_complete());
    assert!(tally.snapshot().is_complete());
}

#[test]
fn host_is_penalized_after_exceeding_tolerance() {
    let mut tally = Tally::new(&categories(&["jpg"]), 1, 2);

    assert_eq!(tally.record_failure("slow.example"), 1);
    assert_eq!(tally.record_failure("slow.example"), 2);
    assert!(!tally.is_penalized("slow.example"));
    assert!(!tally.snapshot().is_penalized("slow.example"));

    assert_eq!(tally.record_failure("slow.example"), 3);
    assert!(tally.is_penalized("slow.example"));
    assert!(tally.snapshot().is_penalized("slow.example"));
    assert!(!tally.snapshot().is_penalized("fine.example"));
    assert_eq!(tally.failures("fine.example"), 0);
}

#[test]
fn unrequested_categories_are_never_open() {
    let tally = Tally::new(&categories(&["jpg"]), 1, 1);
    assert!(!tally.snapshot().is_open("png"));
}

#[test]
fn saves_past_the_limit_are_surplus() {
    let mut tally = Tally::new(&categories(&["jpg"]), 2, 10);

    assert_eq!(tally.record_saved("jpg", "1"), SaveVerdict::Counted);
    assert_eq!(tally.record_saved("jpg", "2"), SaveVerdict::Counted);
    assert_eq!(tally.record_saved("jpg", "3"), SaveVerdict::Surplus);
    assert_eq!(tally.record_saved("jpg", "1"), SaveVerdict::Duplicate);

    assert_eq!(tally.count("jpg"), 2);
    assert_eq!(tally.snapshot().counts["jpg"], 2);
}
