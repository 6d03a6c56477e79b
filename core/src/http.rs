//! HTTP transport types and the `Transport` seam.
//!
//! # Design
//! These types describe HTTP requests and responses as plain data. The core
//! builds `HttpRequest` values and interprets `HttpResponse` values, while a
//! `Transport` implementation does the actual I/O. Everything wire-level
//! (connection handling, encoding, timeouts) lives behind that trait, which
//! keeps the queue and worker logic testable with an in-memory fake.
//!
//! All fields use owned types so values can move freely between threads.

use std::fmt;
use std::time::Duration;

use crate::error::SmqError;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Put,
    Delete,
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HttpMethod::Get => "GET",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        };
        f.write_str(name)
    }
}

/// An HTTP request described as plain data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

/// An HTTP response described as plain data.
///
/// Non-2xx statuses are returned as data, not as `Err`; interpreting them is
/// the caller's job (see `Request::perform`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

/// Performs one request/response exchange with the broker.
///
/// Implementations must return within roughly `timeout` and report any
/// failure to obtain a response as `Err`. They are shared between the
/// pusher and puller threads, hence `Send + Sync`.
pub trait Transport: Send + Sync {
    fn execute(&self, request: HttpRequest, timeout: Duration) -> Result<HttpResponse, SmqError>;
}

impl<F> Transport for F
where
    F: Fn(HttpRequest, Duration) -> Result<HttpResponse, SmqError> + Send + Sync,
{
    fn execute(&self, request: HttpRequest, timeout: Duration) -> Result<HttpResponse, SmqError> {
        self(request, timeout)
    }
}
