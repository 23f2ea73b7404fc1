//! Verify request encoding and response classification against the JSON
//! test vectors stored in `test-vectors/`.
//!
//! Each vector describes inputs, the expected outgoing request or a simulated
//! response, and the expected outcome. Bodies are compared as parsed JSON so
//! key order does not matter.

use std::sync::{Arc, Mutex};

use graphql_core::{Client, Context, Error, HttpMethod, HttpRequest, HttpResponse, Request, TransportError};

const ENDPOINT: &str = "http://localhost:3000/graphql";

/// A client whose transport records the request and answers with `status`
/// and `body`.
fn client(status: u16, body: String, seen: Arc<Mutex<Option<HttpRequest>>>) -> Client {
    Client::builder(ENDPOINT)
        .transport(move |_: &Context, req: HttpRequest| -> Result<HttpResponse, TransportError> {
            *seen.lock().unwrap() = Some(req);
            Ok(HttpResponse::new(status, body.clone()))
        })
        .build()
}

fn parse_method(s: &str) -> HttpMethod {
    match s {
        "POST" => HttpMethod::Post,
        other => panic!("unknown method: {other}"),
    }
}

fn string_pairs(value: &serde_json::Value) -> Vec<(String, String)> {
    value
        .as_array()
        .unwrap()
        .iter()
        .map(|h| {
            let arr = h.as_array().unwrap();
            (arr[0].as_str().unwrap().to_string(), arr[1].as_str().unwrap().to_string())
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

#[test]
fn request_test_vectors() {
    let raw = include_str!("../../test-vectors/requests.json");
    let vectors: serde_json::Value = serde_json::from_str(raw).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let input = &case["input"];
        let expected_req = &case["expected_request"];

        let mut req = Request::new(input["query"].as_str().unwrap());
        for (key, value) in input["variables"].as_object().unwrap() {
            req.var(key.as_str(), value).unwrap();
        }
        for (key, value) in string_pairs(&input["headers"]) {
            req.header(key, value);
        }

        let seen = Arc::new(Mutex::new(None));
        client(200, r#"{"data":{}}"#.to_string(), Arc::clone(&seen))
            .run_discard(&Context::background(), req)
            .unwrap();
        let sent = seen.lock().unwrap().take().unwrap();

        assert_eq!(sent.method, parse_method(expected_req["method"].as_str().unwrap()), "{name}: method");
        assert_eq!(sent.url, ENDPOINT, "{name}: url");
        assert_eq!(sent.headers, string_pairs(&expected_req["headers"]), "{name}: headers");

        let body: serde_json::Value = serde_json::from_slice(&sent.body).unwrap();
        assert_eq!(body, expected_req["body"], "{name}: body");
    }
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

#[test]
fn response_test_vectors() {
    let raw = include_str!("../../test-vectors/responses.json");
    let vectors: serde_json::Value = serde_json::from_str(raw).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let sim = &case["simulated_response"];
        let status = sim["status"].as_u64().unwrap() as u16;
        let body = sim["body"].as_str().unwrap().to_string();

        let seen = Arc::new(Mutex::new(None));
        let result = client(status, body, seen)
            .run::<serde_json::Value>(&Context::background(), Request::new("{ x }"));

        match case["expected"].as_str().unwrap() {
            "data" => {
                let data = result.unwrap_or_else(|e| panic!("{name}: unexpected error {e}"));
                let expected = &case["expected_data"];
                if expected.is_null() {
                    assert!(data.is_none(), "{name}: data should be None");
                } else {
                    assert_eq!(data.as_ref(), Some(expected), "{name}: data");
                }
            }
            "graphql_errors" => {
                let err = result.unwrap_err();
                let messages: Vec<&str> = err
                    .graphql_errors()
                    .unwrap_or_else(|| panic!("{name}: expected graphql errors, got {err:?}"))
                    .iter()
                    .map(|e| e.message.as_str())
                    .collect();
                let expected: Vec<&str> = case["expected_messages"]
                    .as_array()
                    .unwrap()
                    .iter()
                    .map(|m| m.as_str().unwrap())
                    .collect();
                assert_eq!(messages, expected, "{name}: messages");
            }
            "server_error" => {
                let err = result.unwrap_err();
                assert!(matches!(err, Error::Server { .. }), "{name}: got {err:?}");
                assert_eq!(err.status(), case["expected_status"].as_u64().map(|s| s as u16), "{name}: status");
            }
            "decode_error" => {
                let err = result.unwrap_err();
                assert!(matches!(err, Error::Decode(_)), "{name}: got {err:?}");
            }
            other => panic!("{name}: unknown expectation {other}"),
        }
    }
}
