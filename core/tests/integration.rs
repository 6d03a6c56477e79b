//! Clients talking to the live mock broker over real HTTP.
//!
//! # Design
//! Starts the mock broker on a random port in a background thread with its
//! own tokio runtime, then drives `smq_core::Client` with the bundled
//! `UreqTransport`. The broker handle is kept so the test can wait until a
//! fire-and-forget subscribe has actually landed before publishing.

use std::net::SocketAddr;
use std::thread;
use std::time::{Duration, Instant};

use mock_broker::Broker;
use smq_core::{Client, ClientConfig, Method, Request, SmqError, UreqTransport};

const TOPIC: &str = "testing";
const NMESSAGES: usize = 16;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn start_broker() -> (SocketAddr, Broker) {
    // Shorter than the client timeout so idle polls end with a clean 404.
    start_broker_with(Broker::new(Duration::from_millis(200)))
}

fn start_broker_with(broker: Broker) -> (SocketAddr, Broker) {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    let served = broker.clone();
    thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_broker::run_with(listener, served).await
        })
        .unwrap();
    });
    (addr, broker)
}

fn client(name: &str, addr: SocketAddr) -> Client {
    let config = ClientConfig {
        timeout_ms: 1000,
        ..ClientConfig::new(name, &addr.ip().to_string(), addr.port())
    };
    Client::with_config(config, UreqTransport::new()).unwrap()
}

/// Block on a broker query from this synchronous test thread.
fn query<F: std::future::Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap()
        .block_on(future)
}

fn wait_until(what: &str, cond: impl Fn() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(10);
    while !cond() {
        assert!(Instant::now() < deadline, "timed out waiting for {what}");
        thread::sleep(Duration::from_millis(10));
    }
}

fn retrieve_within(client: &Client, limit: Duration) -> Option<String> {
    let deadline = Instant::now() + limit;
    while Instant::now() < deadline {
        if let Some(message) = client.retrieve() {
            return Some(message);
        }
    }
    None
}

#[test]
fn publish_and_retrieve_own_messages() {
    init_tracing();
    let (addr, _broker) = start_broker();
    let smq = client("solo", addr);

    // Same outgoing queue: the subscribe lands before any publish.
    smq.subscribe(TOPIC);
    smq.unsubscribe(TOPIC);
    smq.subscribe(TOPIC);
    for i in 0..NMESSAGES {
        smq.publish(TOPIC, &format!("{i}. Hello from solo\n"));
    }

    for i in 0..NMESSAGES {
        let message = retrieve_within(&smq, Duration::from_secs(10)).expect("message");
        assert!(message.contains("Hello from"));
        assert!(message.starts_with(&format!("{i}. ")), "out of order: {message}");
    }

    smq.shutdown();
    assert!(!smq.running());
    assert_eq!(smq.retrieve(), None);
}

#[test]
fn fan_out_and_unsubscribe() {
    init_tracing();
    let (addr, broker) = start_broker();
    let alice = client("alice", addr);
    let bob = client("bob", addr);

    alice.subscribe("chat");
    bob.subscribe("chat");
    wait_until("both subscriptions", || {
        query(broker.is_subscribed("alice", "chat")) && query(broker.is_subscribed("bob", "chat"))
    });

    alice.publish("chat", "hi bob");
    assert_eq!(
        retrieve_within(&bob, Duration::from_secs(10)).as_deref(),
        Some("hi bob")
    );
    assert_eq!(
        retrieve_within(&alice, Duration::from_secs(10)).as_deref(),
        Some("hi bob")
    );

    bob.unsubscribe("chat");
    wait_until("bob to leave", || !query(broker.is_subscribed("bob", "chat")));

    alice.publish("chat", "bye");
    assert_eq!(
        retrieve_within(&alice, Duration::from_secs(10)).as_deref(),
        Some("bye")
    );
    assert_eq!(retrieve_within(&bob, Duration::from_millis(1500)), None);
}

#[test]
fn unreachable_broker_is_silent_and_shuts_down() {
    init_tracing();
    let addr = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap()
    };
    let config = ClientConfig {
        timeout_ms: 200,
        poll_interval_ms: 20,
        ..ClientConfig::new("orphan", &addr.ip().to_string(), addr.port())
    };
    let smq = Client::with_config(config, UreqTransport::new()).unwrap();

    smq.subscribe(TOPIC);
    smq.publish(TOPIC, "into the void");
    assert_eq!(smq.retrieve(), None);
    assert!(smq.running());

    let started = Instant::now();
    smq.shutdown();
    assert!(started.elapsed() < Duration::from_secs(3));
}

#[test]
fn idle_poll_on_default_broker_ends_in_not_found() {
    init_tracing();
    let timeout = ClientConfig::default().timeout();
    assert!(mock_broker::DEFAULT_HOLD < timeout);

    let (addr, broker) = start_broker_with(Broker::new(mock_broker::DEFAULT_HOLD));
    let base = format!("http://{addr}");
    let transport = UreqTransport::new();

    Request::new(Method::Put, format!("{base}/subscription/idle/{TOPIC}"), None)
        .perform(&transport, timeout)
        .unwrap();
    assert_eq!(query(broker.pending("idle")), Some(0));

    let started = Instant::now();
    let result = Request::new(Method::Get, format!("{base}/queue/idle"), None)
        .perform(&transport, timeout);
    assert!(matches!(result, Err(SmqError::NotFound)), "got {result:?}");
    assert!(started.elapsed() >= mock_broker::DEFAULT_HOLD);
}
