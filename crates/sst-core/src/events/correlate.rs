use std::collections::HashMap;

use tracing::debug;

use crate::proto::{Event, FunctionEvent, FunctionInvocation, InvocationError};

/// Invocations keyed by request id, in order of each request's first
/// appearance.
#[derive(Debug, Clone, Default)]
pub struct Invocations {
    records: Vec<FunctionInvocation>,
    index: HashMap<String, usize>,
}

impl Invocations {
    pub fn get(&self, request_id: &str) -> Option<&FunctionInvocation> {
        self.index.get(request_id).map(|&slot| &self.records[slot])
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FunctionInvocation> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// A repeated "invoked" replaces the earlier record, logs included, but
    /// keeps its slot in the ordering.
    fn start(&mut self, invocation: FunctionInvocation) {
        match self.index.get(&invocation.request_id) {
            Some(&slot) => self.records[slot] = invocation,
            None => {
                self.index
                    .insert(invocation.request_id.clone(), self.records.len());
                self.records.push(invocation);
            }
        }
    }

    /// Record an event attaches to, if its request was seen invoked.
    fn open(&mut self, request_id: &str) -> Option<&mut FunctionInvocation> {
        let slot = self.index.get(request_id).copied();
        if slot.is_none() {
            debug!(request_id, "dropping event for unseen request");
        }
        slot.map(|slot| &mut self.records[slot])
    }

    fn apply(&mut self, event: FunctionEvent) {
        match event {
            FunctionEvent::Invoked(evt) => self.start(evt.into()),
            FunctionEvent::Log(evt) => {
                if let Some(record) = self.open(&evt.request_id) {
                    record.logs.push(evt.line);
                }
            }
            FunctionEvent::Response(evt) => {
                if let Some(record) = self.open(&evt.request_id) {
                    record.output = evt.output;
                }
            }
            FunctionEvent::Error(evt) => {
                if let Some(record) = self.open(&evt.request_id) {
                    record.error = Some(InvocationError::from(evt));
                }
            }
        }
    }
}

/// Fold an ordered event sequence into per-request invocation records.
///
/// Log, response and error events only attach to a request whose "invoked"
/// event came earlier in the sequence. Events of any other type are ignored.
pub fn correlate(events: &[Event]) -> Invocations {
    let mut invocations = Invocations::default();
    for event in events {
        match FunctionEvent::from_event(event) {
            None => {}
            Some(Ok(function_event)) => invocations.apply(function_event),
            Some(Err(err)) => debug!(%err, "skipping undecodable function event"),
        }
    }
    invocations
}

#[cfg(test)]
mod tests {
    use super::correlate;
    use crate::proto::{
        Event, FUNCTION_ERROR, FUNCTION_INVOKED, FUNCTION_LOG, FUNCTION_RESPONSE,
        FunctionInvocation,
    };
    use serde_json::json;

    fn invoked(function_id: &str, worker_id: &str, request_id: &str, input: &str) -> Event {
        Event::new(
            FUNCTION_INVOKED,
            json!({
                "FunctionID": function_id,
                "WorkerID": worker_id,
                "RequestID": request_id,
                "Input": input,
            }),
        )
    }

    fn log(request_id: &str, line: &str) -> Event {
        Event::new(
            FUNCTION_LOG,
            json!({"FunctionID": "f", "WorkerID": "w", "RequestID": request_id, "Line": line}),
        )
    }

    fn response(request_id: &str, output: &str) -> Event {
        Event::new(
            FUNCTION_RESPONSE,
            json!({"FunctionID": "f", "WorkerID": "w", "RequestID": request_id, "Output": output}),
        )
    }

    fn error(request_id: &str, message: &str) -> Event {
        Event::new(
            FUNCTION_ERROR,
            json!({
                "FunctionID": "f",
                "WorkerID": "w",
                "RequestID": request_id,
                "ErrorType": "Error",
                "ErrorMessage": message,
                "Trace": ["at handler (index.ts:1)"],
            }),
        )
    }

    #[test]
    fn happy_path_builds_full_record() {
        let events = vec![
            invoked("f", "w", "r1", "in"),
            log("r1", "a"),
            log("r1", "b"),
            response("r1", "out"),
        ];
        let invocations: Vec<_> = correlate(&events).iter().cloned().collect();

        assert_eq!(
            invocations,
            vec![FunctionInvocation {
                function_id: "f".into(),
                request_id: "r1".into(),
                worker_id: "w".into(),
                input: Some("in".into()),
                output: Some("out".into()),
                error: None,
                logs: vec!["a".into(), "b".into()],
            }]
        );
    }

    #[test]
    fn log_before_invocation_is_dropped() {
        let events = vec![log("r2", "x"), invoked("f", "w", "r2", "in"), log("r2", "y")];
        let invocations = correlate(&events);

        assert_eq!(invocations.len(), 1);
        assert_eq!(invocations.get("r2").unwrap().logs, vec!["y".to_string()]);
    }

    #[test]
    fn orphan_only_sequence_produces_nothing() {
        let events = vec![log("r9", "x"), response("r9", "out"), error("r9", "boom")];
        assert!(correlate(&events).is_empty());
    }

    #[test]
    fn interleaved_requests_are_kept_apart_in_first_seen_order() {
        let events = vec![
            invoked("f1", "w1", "r1", "i1"),
            invoked("f2", "w2", "r2", "i2"),
            log("r2", "r2-a"),
            log("r1", "r1-a"),
            response("r2", "o2"),
            log("r1", "r1-b"),
            error("r1", "boom"),
        ];
        let invocations = correlate(&events);
        let ids: Vec<&str> = invocations.iter().map(|inv| inv.request_id.as_str()).collect();
        assert_eq!(ids, vec!["r1", "r2"]);

        let r1 = invocations.get("r1").unwrap();
        assert_eq!(r1.logs, vec!["r1-a".to_string(), "r1-b".to_string()]);
        assert!(r1.output.is_none());
        let err = r1.error.as_ref().unwrap();
        assert_eq!(err.message, "boom");
        assert_eq!(err.trace, vec!["at handler (index.ts:1)".to_string()]);

        let r2 = invocations.get("r2").unwrap();
        assert_eq!(r2.function_id, "f2");
        assert_eq!(r2.logs, vec!["r2-a".to_string()]);
        assert_eq!(r2.output.as_deref(), Some("o2"));
    }

    #[test]
    fn record_stays_open_after_response_and_error() {
        let events = vec![
            invoked("f", "w", "r1", "in"),
            response("r1", "first"),
            log("r1", "late"),
            error("r1", "boom"),
            response("r1", "second"),
            log("r1", "later"),
        ];
        let invocations = correlate(&events);
        let r1 = invocations.get("r1").unwrap();
        assert_eq!(r1.output.as_deref(), Some("second"));
        assert!(r1.error.is_some());
        assert_eq!(r1.logs, vec!["late".to_string(), "later".to_string()]);
    }

    // Last "invoked" wins: a second invoked for the same request id resets
    // the record and silently discards the logs collected so far.
    #[test]
    fn duplicate_invoked_overwrites_record_and_drops_logs() {
        let events = vec![
            invoked("f", "w1", "r1", "first"),
            invoked("g", "w2", "r2", "other"),
            log("r1", "lost"),
            response("r1", "lost-output"),
            invoked("f", "w3", "r1", "second"),
            log("r1", "kept"),
        ];
        let invocations = correlate(&events);

        assert_eq!(invocations.len(), 2);
        let ids: Vec<&str> = invocations.iter().map(|inv| inv.request_id.as_str()).collect();
        assert_eq!(ids, vec!["r1", "r2"]);

        let r1 = invocations.get("r1").unwrap();
        assert_eq!(r1.worker_id, "w3");
        assert_eq!(r1.input.as_deref(), Some("second"));
        assert!(r1.output.is_none());
        assert_eq!(r1.logs, vec!["kept".to_string()]);
    }

    #[test]
    fn unrelated_and_undecodable_events_are_ignored() {
        let events = vec![
            Event::new("project.CompleteEvent", json!({"App": "demo"})),
            Event::new(FUNCTION_INVOKED, json!({"FunctionID": "missing-request-id"})),
            invoked("f", "w", "r1", "in"),
            Event::new(FUNCTION_LOG, json!("not an object")),
            log("r1", "a"),
        ];
        let invocations = correlate(&events);
        assert_eq!(invocations.len(), 1);
        assert_eq!(invocations.get("r1").unwrap().logs, vec!["a".to_string()]);
    }
}
