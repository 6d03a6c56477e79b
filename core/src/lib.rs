//! Client library for the Simple Message Queue broker.
//!
//! # Overview
//! Presents a remote HTTP publish/subscribe broker as a local, bidirectional
//! message queue. Callers `publish` strings to topics and `retrieve`
//! delivered strings; two background threads move requests between local
//! bounded queues and the broker.
//!
//! # Design
//! - `BoundedQueue` is the buffering primitive: blocking, capacity-bounded,
//!   closeable, FIFO.
//! - `Client` owns an outgoing and an incoming queue plus the pusher and
//!   puller threads that bridge them to the broker.
//! - All network I/O sits behind the `Transport` trait. `UreqTransport` is
//!   the bundled HTTP implementation; tests swap in in-memory fakes.

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod queue;
pub mod request;
pub mod transport;

pub use client::Client;
pub use crate::config::ClientConfig;
pub use error::SmqError;
pub use http::{HttpMethod, HttpRequest, HttpResponse, Transport};
pub use queue::{BoundedQueue, Closed, Pop};
pub use request::{Method, Request};
pub use transport::UreqTransport;
