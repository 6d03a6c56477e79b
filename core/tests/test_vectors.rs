//! Verify the requests each public operation produces against the JSON test
//! vectors stored in `test-vectors/`.
//!
//! A recording transport captures what the pusher and puller actually send,
//! so the vectors pin the wire contract end to end rather than a URL helper.

use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use smq_core::{Client, ClientConfig, HttpMethod, HttpRequest, HttpResponse, SmqError};

/// Parse the method string from test vectors into `HttpMethod`.
fn parse_method(s: &str) -> HttpMethod {
    match s {
        "GET" => HttpMethod::Get,
        "PUT" => HttpMethod::Put,
        "DELETE" => HttpMethod::Delete,
        other => panic!("unknown method: {other}"),
    }
}

fn recording_client(vectors: &serde_json::Value) -> (Client, Arc<Mutex<Vec<HttpRequest>>>) {
    let settings = &vectors["client"];
    let config = ClientConfig {
        timeout_ms: 50,
        ..ClientConfig::new(
            settings["name"].as_str().unwrap(),
            settings["host"].as_str().unwrap(),
            settings["port"].as_u64().unwrap() as u16,
        )
    };

    let log = Arc::new(Mutex::new(Vec::new()));
    let recorder = Arc::clone(&log);
    let transport = move |req: HttpRequest, _timeout: Duration| -> Result<HttpResponse, SmqError> {
        recorder.lock().unwrap().push(req);
        thread::sleep(Duration::from_millis(2));
        Ok(HttpResponse {
            status: 200,
            headers: Vec::new(),
            body: String::new(),
        })
    };
    (Client::with_config(config, transport).unwrap(), log)
}

fn first_matching(log: &Mutex<Vec<HttpRequest>>, method: HttpMethod) -> HttpRequest {
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        if let Some(req) = log.lock().unwrap().iter().find(|r| r.method == method) {
            return req.clone();
        }
        assert!(Instant::now() < deadline, "no {method} request recorded");
        thread::sleep(Duration::from_millis(5));
    }
}

#[test]
fn route_test_vectors() {
    let raw = include_str!("../../test-vectors/routes.json");
    let vectors: serde_json::Value = serde_json::from_str(raw).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let expected = &case["expected_request"];
        let method = parse_method(expected["method"].as_str().unwrap());

        let (client, log) = recording_client(&vectors);
        let topic = case["topic"].as_str().unwrap_or_default();
        match case["operation"].as_str().unwrap() {
            "publish" => client.publish(topic, case["body"].as_str().unwrap()),
            "subscribe" => client.subscribe(topic),
            "unsubscribe" => client.unsubscribe(topic),
            "poll" => {}
            other => panic!("{name}: unknown operation {other}"),
        }

        let req = first_matching(&log, method);
        client.shutdown();

        assert_eq!(
            req.url,
            format!("{}{}", client.base_url(), expected["path"].as_str().unwrap()),
            "{name}: url"
        );
        assert_eq!(req.body.as_deref(), expected["body"].as_str(), "{name}: body");
    }
}
