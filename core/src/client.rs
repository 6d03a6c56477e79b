//! The SMQ client: a local queue facade over a remote broker.
//!
//! # Design
//! `Client` owns two bounded queues and two worker threads:
//!
//! - the **pusher** drains `outgoing` and performs each request, discarding
//!   the response;
//! - the **puller** polls this client's inbox and pushes every non-empty
//!   reply into `incoming`.
//!
//! Public calls never touch the network. `publish`, `subscribe` and
//! `unsubscribe` are fire-and-forget: a failed attempt is logged by the
//! pusher and dropped. `retrieve` cannot tell "nothing yet" from "broker
//! unreachable".
//!
//! Shutdown is cooperative. Closing the queues wakes any worker blocked on
//! them; a transport call already in flight runs to its own timeout before
//! its worker notices.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, info, trace, warn};

use crate::config::ClientConfig;
use crate::error::SmqError;
use crate::http::Transport;
use crate::queue::{BoundedQueue, Pop};
use crate::request::{Method, Request};
use crate::transport::UreqTransport;

/// State shared between the public handle and both workers.
struct Shared {
    name: String,
    base_url: String,
    timeout: Duration,
    poll_interval: Duration,
    running: AtomicBool,
    outgoing: BoundedQueue<Request>,
    incoming: BoundedQueue<Request>,
    transport: Box<dyn Transport>,
}

impl Shared {
    fn running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    fn inbox_url(&self) -> String {
        format!("{}/queue/{}", self.base_url, self.name)
    }
}

/// Handle to a running SMQ client: two bounded queues bridged to the broker
/// by a pusher thread and a puller thread.
pub struct Client {
    shared: Arc<Shared>,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl Client {
    /// Connect `name` to the broker at `host:port` over HTTP.
    pub fn new(name: &str, host: &str, port: u16) -> Result<Self, SmqError> {
        Self::with_config(ClientConfig::new(name, host, port), UreqTransport::new())
    }

    /// Start a client with explicit settings and transport.
    pub fn with_config<T>(config: ClientConfig, transport: T) -> Result<Self, SmqError>
    where
        T: Transport + 'static,
    {
        let shared = Arc::new(Shared {
            base_url: config.base_url(),
            timeout: config.timeout(),
            poll_interval: config.poll_interval(),
            running: AtomicBool::new(true),
            outgoing: BoundedQueue::new(config.outgoing_capacity)?,
            incoming: BoundedQueue::new(config.incoming_capacity)?,
            transport: Box::new(transport),
            name: config.name,
        });

        let client = Client {
            shared,
            workers: Mutex::new(Vec::with_capacity(2)),
        };
        // On error `client` is dropped here, which shuts down whatever did start.
        client.spawn_worker("pusher", pusher)?;
        client.spawn_worker("puller", puller)?;

        info!(name = %client.shared.name, url = %client.shared.base_url, "client started");
        Ok(client)
    }

    fn spawn_worker(&self, role: &str, work: fn(&Shared)) -> Result<(), SmqError> {
        let shared = Arc::clone(&self.shared);
        let handle = thread::Builder::new()
            .name(format!("smq-{role}-{}", self.shared.name))
            .spawn(move || work(&shared))
            .map_err(|e| SmqError::Spawn(e.to_string()))?;
        self.lock_workers().push(handle);
        Ok(())
    }

    fn lock_workers(&self) -> std::sync::MutexGuard<'_, Vec<JoinHandle<()>>> {
        self.workers.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn send(&self, request: Request) {
        if !self.running() {
            return;
        }
        if self.shared.outgoing.push(request).is_err() {
            debug!(name = %self.shared.name, "outgoing queue closed, request dropped");
        }
    }

    /// Queue `body` for publication on `topic`. An empty topic is ignored.
    ///
    /// `topic` is placed in the URL path as-is, so it must not contain
    /// characters that need percent-encoding (spaces, `?`, `#`, `/`).
    /// Such requests fail in the transport and are dropped.
    pub fn publish(&self, topic: &str, body: &str) {
        if topic.is_empty() {
            return;
        }
        let url = format!("{}/topic/{topic}", self.shared.base_url);
        self.send(Request::new(Method::Put, url, Some(body.to_string())));
    }

    /// Subscribe this client's inbox to `topic`.
    ///
    /// Like `publish`, `topic` and the client name are not percent-encoded.
    pub fn subscribe(&self, topic: &str) {
        self.send(Request::new(Method::Put, self.subscription_url(topic), None));
    }

    /// Unsubscribe this client's inbox from `topic`.
    pub fn unsubscribe(&self, topic: &str) {
        self.send(Request::new(Method::Delete, self.subscription_url(topic), None));
    }

    fn subscription_url(&self, topic: &str) -> String {
        format!("{}/subscription/{}/{topic}", self.shared.base_url, self.shared.name)
    }

    /// Next delivered message, waiting at most the client timeout.
    ///
    /// Returns `None` once the client is shut down.
    pub fn retrieve(&self) -> Option<String> {
        if !self.running() {
            return None;
        }
        self.shared
            .incoming
            .pop(self.shared.timeout)
            .into_item()
            .map(Request::into_body)
    }

    /// Stop both workers and wait for them to exit. Idempotent.
    pub fn shutdown(&self) {
        if self.shared.running.swap(false, Ordering::AcqRel) {
            debug!(name = %self.shared.name, "shutting down");
        }
        self.shared.outgoing.shutdown();
        self.shared.incoming.shutdown();

        // Held across the joins so a concurrent caller returns only after
        // both loops have exited.
        let mut workers = self.lock_workers();
        for worker in workers.drain(..) {
            if worker.join().is_err() {
                warn!(name = %self.shared.name, "worker thread panicked");
            }
        }
    }

    pub fn running(&self) -> bool {
        self.shared.running()
    }

    pub fn name(&self) -> &str {
        &self.shared.name
    }

    pub fn base_url(&self) -> &str {
        &self.shared.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.shared.timeout
    }
}

impl Drop for Client {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("name", &self.shared.name)
            .field("base_url", &self.shared.base_url)
            .field("running", &self.running())
            .finish_non_exhaustive()
    }
}

fn pusher(shared: &Shared) {
    while shared.running() {
        let request = match shared.outgoing.pop(shared.timeout) {
            Pop::Item(request) => request,
            Pop::TimedOut => continue,
            Pop::Closed => break,
        };
        match request.perform(shared.transport.as_ref(), shared.timeout) {
            Ok(_) => trace!(method = %request.method(), url = request.url(), "sent"),
            Err(SmqError::NotFound) => {
                debug!(method = %request.method(), url = request.url(), "broker answered 404")
            }
            Err(e) => warn!(method = %request.method(), url = request.url(), error = %e, "send failed"),
        }
    }
    debug!(name = %shared.name, "pusher exiting");
}

fn puller(shared: &Shared) {
    let poll = Request::new(Method::Get, shared.inbox_url(), None);
    while shared.running() {
        match poll.perform(shared.transport.as_ref(), shared.timeout) {
            Ok(body) if !body.is_empty() => {
                if shared.incoming.push(Request::deliver(poll.url(), body)).is_err() {
                    break;
                }
                continue;
            }
            Ok(_) | Err(SmqError::NotFound) => {}
            Err(e) => trace!(error = %e, "poll failed"),
        }
        if !shared.poll_interval.is_zero() && shared.running() {
            thread::sleep(shared.poll_interval);
        }
    }
    debug!(name = %shared.name, "puller exiting");
}
