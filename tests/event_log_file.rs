//! The JSON-lines event log is written and parseable

use forkwatch::{SimEvent, Simulation};
use std::fs;

mod common;
use common::{EVENT_TIMEOUT, collect_until, start_sim};

#[test]
fn test_log_file_holds_one_json_object_per_event() {
    let dir = tempfile::tempdir().unwrap();
    let log_path = dir.path().join("forkwatch.log");

    let harness = start_sim(
        Simulation::new()
            .agents(2)
            .thinking_max(5)
            .eating_max(5)
            .seed(1)
            .with_log(&log_path),
    );

    collect_until(&harness, EVENT_TIMEOUT, |seen| {
        seen.iter()
            .any(|e| matches!(e, SimEvent::Releasing { .. }))
    });
    harness.handle.request_stop();
    harness.handle.join().unwrap();

    let contents = fs::read_to_string(&log_path).unwrap();
    let lines: Vec<&str> = contents.lines().collect();
    assert!(!lines.is_empty(), "log file is empty");

    let mut last_timestamp = 0.0_f64;
    let mut kinds = std::collections::HashSet::new();
    for line in lines {
        let value: serde_json::Value = serde_json::from_str(line).expect("unparseable log line");
        let timestamp = value["timestamp"].as_f64().expect("missing timestamp");
        assert!(timestamp >= last_timestamp, "timestamps went backwards");
        last_timestamp = timestamp;
        kinds.insert(value["event"].as_str().expect("missing event tag").to_owned());
    }

    // A run that reached a release has seen the whole happy path
    for kind in ["thinking", "table_snapshot", "eating", "releasing"] {
        assert!(kinds.contains(kind), "no {kind} event was logged");
    }
}
