#![allow(dead_code)]

use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use flate2::write::GzEncoder;
use flate2::Compression;
use harvester_core::{RecordFilter, Tally, TypeRules};
use harvester_engine::{ContentStore, FetchSettings, ReqwestFetcher, ShardContext, Tracker};

pub fn gzip(data: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

/// One shard line in the `<surt> <timestamp> {json}` layout.
pub fn cdx_line(url: &str, mime: &str, status: &str) -> String {
    format!(
        r#"com,example)/ 20240722120756 {{"url": "{url}", "mime": "{mime}", "mime-detected": "{mime}", "status": "{status}", "length": "689"}}"#
    )
}

pub fn test_settings() -> FetchSettings {
    FetchSettings {
        request_timeout: Duration::from_secs(5),
        archive_timeout: Duration::from_secs(5),
        slow_down_backoff: Duration::from_millis(20),
        ..FetchSettings::default()
    }
}

pub fn categories(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}

pub fn jpg_rules() -> TypeRules {
    TypeRules::from_json_str(r#"{"jpg": {"mime-detected": "image/jpeg", "ext": [".jpg"]}}"#)
        .unwrap()
}

/// Worker context backed by a real HTTP fetcher and a fresh tracker.
pub fn shard_context(
    out_dir: &Path,
    names: &[&str],
    rules: &TypeRules,
    limit: u64,
    tolerance: u32,
) -> ShardContext {
    let names = categories(names);
    let (tracker, _task) = Tracker::spawn(Tally::new(&names, limit, tolerance));
    ShardContext {
        fetcher: Arc::new(ReqwestFetcher::new(test_settings()).unwrap()),
        store: ContentStore::new(out_dir.to_path_buf()),
        filter: Arc::new(RecordFilter::new(&names, rules)),
        tracker,
    }
}

pub fn files_in(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = match std::fs::read_dir(dir) {
        Ok(entries) => entries
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect(),
        Err(_) => Vec::new(),
    };
    names.sort();
    names
}
