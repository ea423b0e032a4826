use harvester_core::{ArchiveRecord, RecordError, RecordFilter, Rejection, TypeRules};
use pretty_assertions::assert_eq;

const JPEG_LINE: &str = r#"com,example)/cat.jpg 20240722120756 {"url": "https://example.com/cat.jpg", "mime": "image/jpeg", "mime-detected": "image/jpeg", "status": "200", "digest": "ABC", "length": "689"}"#;

fn filter(categories: &[&str], rules: &str) -> RecordFilter {
    let categories: Vec<String> = categories.iter().map(|c| c.to_string()).collect();
    RecordFilter::new(&categories, &TypeRules::from_json_str(rules).unwrap())
}

#[test]
fn parses_fields_after_prefix() {
    let record = ArchiveRecord::parse_line(JPEG_LINE).unwrap();
    assert_eq!(
        record,
        ArchiveRecord {
            mime_detected: "image/jpeg".to_string(),
            url: "https://example.com/cat.jpg".to_string(),
            status: "200".to_string(),
            host: "example.com".to_string(),
            extension: Some(".jpg".to_string()),
        }
    );
}

#[test]
fn lines_without_payload_or_fields_are_errors() {
    assert_eq!(
        ArchiveRecord::parse_line("com,example)/ 20240101 no json here"),
        Err(RecordError::NoPayload)
    );
    assert!(matches!(
        ArchiveRecord::parse_line(
            r#"x 1 {"url": "https://a.example/", "mime-detected": "text/html"}"#
        ),
        Err(RecordError::Malformed(_))
    ));
    assert!(matches!(
        ArchiveRecord::parse_line(r#"x 1 {"url": "https://a.example/", "#),
        Err(RecordError::Malformed(_))
    ));
    assert!(matches!(
        ArchiveRecord::parse_line(
            r#"x 1 {"url": "not a url", "mime-detected": "text/html", "status": "200"}"#
        ),
        Err(RecordError::BadUrl(_))
    ));
}

#[test]
fn non_200_records_are_rejected_first() {
    let line = JPEG_LINE.replace(r#""status": "200""#, r#""status": "404""#);
    let record = ArchiveRecord::parse_line(&line).unwrap();
    let filter = filter(&["jpg"], r#"{"jpg": {"mime-detected": "image/jpeg", "ext": []}}"#);

    assert_eq!(
        filter.select(&record, |_| panic!("host checked"), |_| true),
        Err(Rejection::Status)
    );
}

#[test]
fn penalized_host_is_skipped_before_matching() {
    let record = ArchiveRecord::parse_line(JPEG_LINE).unwrap();
    let filter = filter(&["jpg"], r#"{"jpg": {"mime-detected": "image/jpeg", "ext": []}}"#);

    let result = filter.select(
        &record,
        |host| host == "example.com",
        |_| panic!("categories consulted for penalized host"),
    );
    assert_eq!(result, Err(Rejection::PenalizedHost));
}

#[test]
fn only_open_categories_are_selected() {
    let record = ArchiveRecord::parse_line(JPEG_LINE).unwrap();
    let filter = filter(
        &["jpg", "image", "png"],
        r#"{
            "jpg": {"ext": [".jpg"]},
            "image": {"mime-detected": "image/jpeg"},
            "png": {"mime-detected": "image/png"}
        }"#,
    );

    assert_eq!(filter.select(&record, |_| false, |_| true), Ok(vec!["jpg", "image"]));
    assert_eq!(
        filter.select(&record, |_| false, |c| c != "jpg"),
        Ok(vec!["image"])
    );
    assert_eq!(filter.select(&record, |_| false, |_| false), Ok(vec![]));
}
