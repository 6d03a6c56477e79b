//! In-memory stand-in for the SMQ broker.
//!
//! Serves the four routes the client speaks:
//!
//! - `PUT /topic/{topic}`: copy the body into every queue subscribed to topic
//! - `GET /queue/{queue}`: long-poll for the oldest message in queue
//! - `PUT /subscription/{queue}/{topic}`: subscribe queue to topic
//! - `DELETE /subscription/{queue}/{topic}`: unsubscribe queue from topic

use std::{
    collections::{HashMap, HashSet, VecDeque},
    sync::Arc,
    time::Duration,
};

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
    Router,
};
use tokio::{
    net::TcpListener,
    sync::{Notify, RwLock},
    time::Instant,
};
use tracing::{debug, info};

/// How long `GET /queue/{queue}` waits for a message before answering 404.
/// Kept below the client's default timeout so idle polls end in a 404.
pub const DEFAULT_HOLD: Duration = Duration::from_millis(500);

#[derive(Debug, Default)]
struct Inner {
    queues: HashMap<String, VecDeque<String>>,
    subscriptions: HashMap<String, HashSet<String>>,
}

#[derive(Clone)]
pub struct Broker {
    inner: Arc<RwLock<Inner>>,
    arrivals: Arc<Notify>,
    hold: Duration,
}

impl Broker {
    pub fn new(hold: Duration) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner::default())),
            arrivals: Arc::new(Notify::new()),
            hold,
        }
    }

    /// Number of messages waiting in `queue`, if it exists.
    pub async fn pending(&self, queue: &str) -> Option<usize> {
        self.inner.read().await.queues.get(queue).map(VecDeque::len)
    }

    pub async fn is_subscribed(&self, queue: &str, topic: &str) -> bool {
        self.inner
            .read()
            .await
            .subscriptions
            .get(queue)
            .is_some_and(|topics| topics.contains(topic))
    }
}

type Reply = Result<String, (StatusCode, String)>;

fn not_found(message: String) -> (StatusCode, String) {
    debug!("{message}");
    (StatusCode::NOT_FOUND, format!("{message}\n"))
}

pub fn app() -> Router {
    app_with(Broker::new(DEFAULT_HOLD))
}

/// Router over an existing broker, so tests can inspect its state.
pub fn app_with(broker: Broker) -> Router {
    Router::new()
        .route("/topic/{topic}", put(publish))
        .route("/queue/{queue}", get(next_message))
        .route(
            "/subscription/{queue}/{topic}",
            put(subscribe).delete(unsubscribe),
        )
        .with_state(broker)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

pub async fn run_with(listener: TcpListener, broker: Broker) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with(broker)).await
}

async fn publish(State(broker): State<Broker>, Path(topic): Path<String>, body: String) -> Reply {
    let mut subscribers = 0;
    {
        let mut inner = broker.inner.write().await;
        let Inner {
            queues,
            subscriptions,
        } = &mut *inner;
        for (queue, topics) in subscriptions.iter() {
            if topics.contains(&topic) {
                queues.entry(queue.clone()).or_default().push_back(body.clone());
                subscribers += 1;
            }
        }
    }

    if subscribers == 0 {
        return Err(not_found(format!("There are no subscribers for topic: {topic}")));
    }
    broker.arrivals.notify_waiters();
    info!("Published message ({} bytes) to {subscribers} subscribers of {topic}", body.len());
    Ok(format!(
        "Published message ({} bytes) to {subscribers} subscribers of {topic}\n",
        body.len()
    ))
}

async fn next_message(State(broker): State<Broker>, Path(queue): Path<String>) -> Reply {
    let deadline = Instant::now() + broker.hold;
    loop {
        // Register before checking so a publish in between is not missed.
        let arrival = broker.arrivals.notified();
        {
            let mut inner = broker.inner.write().await;
            let Some(messages) = inner.queues.get_mut(&queue) else {
                return Err(not_found(format!("There is no queue named: {queue}")));
            };
            if let Some(message) = messages.pop_front() {
                info!(queue = %queue, bytes = message.len(), "delivered message");
                return Ok(message);
            }
        }
        if tokio::time::timeout_at(deadline, arrival).await.is_err() {
            return Err(not_found(format!("There are no messages for queue: {queue}")));
        }
    }
}

async fn subscribe(
    State(broker): State<Broker>,
    Path((queue, topic)): Path<(String, String)>,
) -> Reply {
    let mut inner = broker.inner.write().await;
    inner
        .subscriptions
        .entry(queue.clone())
        .or_default()
        .insert(topic.clone());
    inner.queues.entry(queue.clone()).or_default();
    info!("Subscribed queue ({queue}) to topic ({topic})");
    Ok(format!("Subscribed queue ({queue}) to topic ({topic})\n"))
}

async fn unsubscribe(
    State(broker): State<Broker>,
    Path((queue, topic)): Path<(String, String)>,
) -> Reply {
    let mut inner = broker.inner.write().await;
    let removed = inner
        .subscriptions
        .get_mut(&queue)
        .is_some_and(|topics| topics.remove(&topic));
    if !removed {
        return Err(not_found(format!("There is no queue named: {queue}")));
    }
    info!("Unsubscribed queue ({queue}) from topic ({topic})");
    Ok(format!("Unsubscribed queue ({queue}) from topic ({topic})\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn new_broker_has_no_queues() {
        let broker = Broker::new(DEFAULT_HOLD);
        assert_eq!(broker.pending("anyone").await, None);
    }

    #[tokio::test]
    async fn subscribe_creates_empty_queue() {
        let broker = Broker::new(DEFAULT_HOLD);
        subscribe(
            State(broker.clone()),
            Path(("alice".to_string(), "news".to_string())),
        )
        .await
        .unwrap();
        assert_eq!(broker.pending("alice").await, Some(0));
        assert!(broker.is_subscribed("alice", "news").await);
        assert!(!broker.is_subscribed("alice", "sports").await);
    }

    #[tokio::test]
    async fn publish_fans_out_to_each_subscriber() {
        let broker = Broker::new(DEFAULT_HOLD);
        for queue in ["alice", "bob"] {
            subscribe(
                State(broker.clone()),
                Path((queue.to_string(), "news".to_string())),
            )
            .await
            .unwrap();
        }
        let reply = publish(State(broker.clone()), Path("news".to_string()), "hi".to_string())
            .await
            .unwrap();
        assert_eq!(reply, "Published message (2 bytes) to 2 subscribers of news\n");
        assert_eq!(broker.pending("alice").await, Some(1));
        assert_eq!(broker.pending("bob").await, Some(1));
    }
}
