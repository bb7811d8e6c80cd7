use std::cmp::Reverse;
use std::collections::HashMap;

use serde::Deserialize;
use thiserror::Error;

use crate::model::Event;

#[derive(Debug, Error)]
pub enum ChromeParseError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("trace object has no `traceEvents` array")]
    MissingTraceEvents,
    #[error("end event `{name}` at {ts} has no matching begin")]
    UnbalancedBeginEnd { name: String, ts: f64 },
}

/// Raw Chrome trace event as found in DevTools JSON exports.
#[derive(Debug, Clone, Deserialize)]
struct TraceEvent {
    #[serde(default)]
    name: String,
    #[serde(default)]
    cat: String,
    ph: String,
    ts: f64,
    #[serde(default)]
    dur: Option<f64>,
    #[serde(default)]
    pid: u64,
    #[serde(default)]
    tid: u64,
    #[serde(default)]
    args: Option<serde_json::Value>,
}

/// Top-level Chrome trace JSON — supports both array format and object format.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TraceFile {
    Object {
        #[serde(rename = "traceEvents")]
        trace_events: Option<Vec<TraceEvent>>,
    },
    Array(Vec<TraceEvent>),
}

fn data_str<'a>(args: &'a Option<serde_json::Value>, key: &str) -> Option<&'a str> {
    args.as_ref()?.get("data")?.get(key)?.as_str()
}

fn to_event(raw: &TraceEvent, start: f64, end: f64) -> Event {
    let mut event = Event::new(raw.name.clone(), start, end);
    if !raw.cat.is_empty() {
        event.category = Some(raw.cat.clone());
    }
    event.url = data_str(&raw.args, "url")
        .or_else(|| data_str(&raw.args, "fileName"))
        .map(String::from);
    event.frame_id = data_str(&raw.args, "frame").map(String::from);
    event
}

/// Parse a DevTools trace export into the ordered event sequence of its
/// busiest thread (the usual stand-in for the main thread when no explicit
/// thread metadata survives).
///
/// Complete events (`ph: "X"`), begin/end pairs (`"B"`/`"E"`), and instants
/// (`"I"`/`"i"`/`"n"`) are converted; metadata and counter records are
/// skipped. Begin events left open by a truncated trace are dropped. Output
/// is sorted by start time, enclosing events first on ties, which is the
/// ordering contract the tree builders expect.
pub fn parse_chrome_trace(data: &[u8]) -> Result<Vec<Event>, ChromeParseError> {
    let raw_events = match serde_json::from_slice::<TraceFile>(data)? {
        TraceFile::Object {
            trace_events: Some(events),
        } => events,
        TraceFile::Object { trace_events: None } => {
            return Err(ChromeParseError::MissingTraceEvents);
        }
        TraceFile::Array(events) => events,
    };

    let mut threads: HashMap<(u64, u64), Vec<Event>> = HashMap::new();
    let mut open: HashMap<(u64, u64), Vec<TraceEvent>> = HashMap::new();

    for raw in &raw_events {
        let thread = (raw.pid, raw.tid);
        match raw.ph.as_str() {
            "X" => {
                let end = raw.ts + raw.dur.unwrap_or(0.0);
                threads.entry(thread).or_default().push(to_event(raw, raw.ts, end));
            }
            "B" => {
                open.entry(thread).or_default().push(raw.clone());
            }
            "E" => {
                let begin = open.get_mut(&thread).and_then(Vec::pop);
                let Some(begin) = begin else {
                    return Err(ChromeParseError::UnbalancedBeginEnd {
                        name: raw.name.clone(),
                        ts: raw.ts,
                    });
                };
                threads
                    .entry(thread)
                    .or_default()
                    .push(to_event(&begin, begin.ts, raw.ts));
            }
            "I" | "i" | "n" => {
                threads.entry(thread).or_default().push(to_event(raw, raw.ts, raw.ts));
            }
            _ => {}
        }
    }

    // Lowest (pid, tid) wins a tie so the choice is stable across runs.
    let mut events = threads
        .into_iter()
        .max_by_key(|(thread, events)| (events.len(), Reverse(*thread)))
        .map(|(_, events)| events)
        .unwrap_or_default();
    events.sort_by(|a, b| {
        a.start_time
            .total_cmp(&b.start_time)
            .then(b.end_time.total_cmp(&a.end_time))
    });
    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_complete_events_from_object_format() {
        let json = br#"{"traceEvents": [
            {"name": "RunTask", "cat": "toplevel", "ph": "X", "ts": 100.0, "dur": 50.0, "pid": 1, "tid": 1},
            {"name": "Layout", "cat": "rendering", "ph": "X", "ts": 110.0, "dur": 20.0, "pid": 1, "tid": 1,
             "args": {"data": {"url": "https://example.com/", "frame": "F1"}}}
        ]}"#;
        let events = parse_chrome_trace(json).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].name, "RunTask");
        assert!((events[0].duration() - 50.0).abs() < 1e-9);
        assert_eq!(events[1].category.as_deref(), Some("rendering"));
        assert_eq!(events[1].url.as_deref(), Some("https://example.com/"));
        assert_eq!(events[1].frame_id.as_deref(), Some("F1"));
    }

    #[test]
    fn parses_bare_array_format() {
        let json = br#"[{"name": "Task", "ph": "X", "ts": 0.0, "dur": 5.0}]"#;
        let events = parse_chrome_trace(json).unwrap();
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn matches_begin_end_pairs() {
        let json = br#"[
            {"name": "Outer", "ph": "B", "ts": 0.0, "pid": 1, "tid": 1},
            {"name": "Inner", "ph": "B", "ts": 10.0, "pid": 1, "tid": 1},
            {"name": "Inner", "ph": "E", "ts": 20.0, "pid": 1, "tid": 1},
            {"name": "Outer", "ph": "E", "ts": 30.0, "pid": 1, "tid": 1}
        ]"#;
        let events = parse_chrome_trace(json).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].name, "Outer");
        assert!((events[0].duration() - 30.0).abs() < 1e-9);
        assert_eq!(events[1].name, "Inner");
        assert!((events[1].duration() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn unmatched_end_is_an_error() {
        let json = br#"[{"name": "Orphan", "ph": "E", "ts": 5.0}]"#;
        assert!(matches!(
            parse_chrome_trace(json),
            Err(ChromeParseError::UnbalancedBeginEnd { .. })
        ));
    }

    #[test]
    fn object_without_trace_events_is_an_error() {
        let json = br#"{"metadata": {"clock-domain": "LINUX_CLOCK_MONOTONIC"}}"#;
        assert!(matches!(
            parse_chrome_trace(json),
            Err(ChromeParseError::MissingTraceEvents)
        ));
    }

    #[test]
    fn thread_ties_break_toward_lowest_thread_id() {
        // Two threads with the same event count: the pick must not depend
        // on map iteration order.
        let json = br#"[
            {"name": "High", "ph": "X", "ts": 0.0, "dur": 1.0, "pid": 1, "tid": 9},
            {"name": "Low", "ph": "X", "ts": 0.0, "dur": 1.0, "pid": 1, "tid": 2}
        ]"#;
        for _ in 0..8 {
            let events = parse_chrome_trace(json).unwrap();
            assert_eq!(events.len(), 1);
            assert_eq!(events[0].name, "Low");
        }
    }

    #[test]
    fn selects_busiest_thread() {
        let json = br#"[
            {"name": "Idle", "ph": "X", "ts": 0.0, "dur": 1.0, "pid": 1, "tid": 7},
            {"name": "Main1", "ph": "X", "ts": 0.0, "dur": 10.0, "pid": 1, "tid": 1},
            {"name": "Main2", "ph": "X", "ts": 2.0, "dur": 3.0, "pid": 1, "tid": 1}
        ]"#;
        let events = parse_chrome_trace(json).unwrap();
        assert_eq!(events.len(), 2);
        assert!(events.iter().all(|e| e.name.starts_with("Main")));
    }

    #[test]
    fn ties_sort_enclosing_events_first() {
        let json = br#"[
            {"name": "Child", "ph": "X", "ts": 0.0, "dur": 2.0},
            {"name": "Parent", "ph": "X", "ts": 0.0, "dur": 8.0}
        ]"#;
        let events = parse_chrome_trace(json).unwrap();
        assert_eq!(events[0].name, "Parent");
        assert_eq!(events[1].name, "Child");
    }

    #[test]
    fn instants_and_metadata() {
        let json = br#"[
            {"name": "process_name", "ph": "M", "ts": 0.0},
            {"name": "MarkFCP", "ph": "I", "ts": 4.0}
        ]"#;
        let events = parse_chrome_trace(json).unwrap();
        assert_eq!(events.len(), 1);
        assert!(events[0].is_instant());
    }

    #[test]
    fn invalid_json_is_an_error() {
        assert!(matches!(
            parse_chrome_trace(b"not json"),
            Err(ChromeParseError::Json(_))
        ));
    }
}
