//! Verify the codec and the record operations against JSON test vectors
//! stored in `test-vectors/`.
//!
//! Record operation vectors script the gateway's responses, then check the
//! fields of every request the client sent and the final outcome. Request
//! checks go through the decoded value tree rather than raw strings so that
//! only the listed fields are pinned.

use std::cell::RefCell;
use std::collections::VecDeque;

use schlund_core::xml::unmarshal;
use schlund_core::{
    Credentials, GatewayClient, GatewayError, HttpRequest, HttpResponse, Transport, Value,
};

struct Scripted {
    responses: RefCell<VecDeque<String>>,
    requests: RefCell<Vec<HttpRequest>>,
}

impl Scripted {
    fn new(responses: &serde_json::Value) -> Self {
        let responses = responses
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r.as_str().unwrap().to_string())
            .collect();
        Self {
            responses: RefCell::new(responses),
            requests: RefCell::new(Vec::new()),
        }
    }
}

impl Transport for Scripted {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, GatewayError> {
        self.requests.borrow_mut().push(request);
        let body = self
            .responses
            .borrow_mut()
            .pop_front()
            .expect("client sent more requests than the vector scripts");
        Ok(HttpResponse::new(200, body))
    }
}

/// Compare a decoded value with its JSON description, ignoring map order.
fn assert_value(actual: Option<&Value>, expected: &serde_json::Value, ctx: &str) {
    match (actual, expected) {
        (None, serde_json::Value::Null) => {}
        (Some(Value::Scalar(s)), serde_json::Value::String(e)) => assert_eq!(s, e, "{ctx}"),
        (Some(Value::List(items)), serde_json::Value::Array(expected)) => {
            assert_eq!(items.len(), expected.len(), "{ctx}: list length");
            for (i, (item, e)) in items.iter().zip(expected).enumerate() {
                assert_value(Some(item), e, &format!("{ctx}[{i}]"));
            }
        }
        (Some(Value::Map(map)), serde_json::Value::Object(expected)) => {
            assert_eq!(map.len(), expected.len(), "{ctx}: field count");
            for (name, e) in expected {
                assert_value(map.get(name), e, &format!("{ctx}.{name}"));
            }
        }
        (actual, expected) => panic!("{ctx}: expected {expected}, got {actual:?}"),
    }
}

#[derive(Clone, Copy)]
enum Operation {
    Add,
    Delete,
}

fn run_operation_vectors(raw: &str, operation: Operation) {
    let vectors: serde_json::Value = serde_json::from_str(raw).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let transport = Scripted::new(&case["responses"]);
        let client = GatewayClient::new(Credentials::new("54321", "PASSWORD", "10"), 60)
            .with_transport(&transport);

        let domain = case["domain"].as_str().unwrap();
        let record_name = case["record_name"].as_str().unwrap();
        let value = case["value"].as_str().unwrap();
        let outcome = match operation {
            Operation::Add => client.add_txt_record(domain, record_name, value),
            Operation::Delete => client.del_txt_record(domain, record_name, value),
        };

        // Verify requests
        let sent = transport.requests.borrow();
        let expected_requests = case["expected_requests"].as_array().unwrap();
        assert_eq!(sent.len(), expected_requests.len(), "{name}: request count");
        for (i, (request, expected)) in sent.iter().zip(expected_requests).enumerate() {
            let decoded = unmarshal(request.body.as_bytes()).unwrap().unwrap();
            assert_eq!(
                decoded.path(&["auth", "user"]).and_then(Value::as_scalar),
                Some("54321"),
                "{name}: request {i} auth"
            );
            for (path, want) in expected.as_object().unwrap() {
                let segments: Vec<&str> = path.split('/').collect();
                assert_eq!(
                    decoded.path(&segments).and_then(Value::as_scalar),
                    want.as_str(),
                    "{name}: request {i} {path}"
                );
            }
        }

        // Verify outcome
        let expected_error = &case["expected_error"];
        match (outcome, expected_error.is_null()) {
            (Ok(()), true) => {}
            (Ok(()), false) => panic!("{name}: expected error {expected_error}"),
            (Err(err), true) => panic!("{name}: unexpected error {err}"),
            (Err(err), false) => {
                let kind = expected_error["kind"].as_str().unwrap();
                let matches_kind = match kind {
                    "conflict" => matches!(err, GatewayError::Conflict { .. }),
                    "record_update" => matches!(err, GatewayError::RecordUpdate { .. }),
                    "zone_not_found" => matches!(err, GatewayError::ZoneNotFound { .. }),
                    "protocol" => matches!(err, GatewayError::Protocol { .. }),
                    other => panic!("{name}: unknown error kind {other}"),
                };
                assert!(matches_kind, "{name}: expected {kind}, got {err:?}");
                let needle = expected_error["message_contains"].as_str().unwrap();
                assert!(err.to_string().contains(needle), "{name}: message {err}");
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Codec
// ---------------------------------------------------------------------------

#[test]
fn codec_test_vectors() {
    let raw = include_str!("../../test-vectors/codec.json");
    let vectors: serde_json::Value = serde_json::from_str(raw).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let xml = case["xml"].as_str().unwrap();
        let decoded = unmarshal(xml.as_bytes()).unwrap();
        assert_value(decoded.as_ref(), &case["expected"], name);
    }
}

// ---------------------------------------------------------------------------
// Add
// ---------------------------------------------------------------------------

#[test]
fn add_test_vectors() {
    run_operation_vectors(include_str!("../../test-vectors/add.json"), Operation::Add);
}

// ---------------------------------------------------------------------------
// Delete
// ---------------------------------------------------------------------------

#[test]
fn del_test_vectors() {
    run_operation_vectors(include_str!("../../test-vectors/del.json"), Operation::Delete);
}
