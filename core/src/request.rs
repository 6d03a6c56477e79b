//! The unit of work moving through the client's queues.
//!
//! # Design
//! A `Request` is immutable once built. Outgoing requests (publish,
//! subscribe, unsubscribe) and poll requests carry a wire method; messages
//! received from the broker are wrapped with the internal `Deliver` tag so
//! both directions share one queue item type.

use std::fmt;
use std::time::Duration;

use crate::error::SmqError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse, Transport};

/// What a `Request` asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Put,
    Delete,
    /// A message handed from the puller to `retrieve`. Never sent.
    Deliver,
}

impl Method {
    /// The wire method, or `None` for local-only tags.
    pub fn as_http(self) -> Option<HttpMethod> {
        match self {
            Method::Get => Some(HttpMethod::Get),
            Method::Put => Some(HttpMethod::Put),
            Method::Delete => Some(HttpMethod::Delete),
            Method::Deliver => None,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_http() {
            Some(method) => method.fmt(f),
            None => f.write_str("DELIVER"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    method: Method,
    url: String,
    body: Option<String>,
}

impl Request {
    pub fn new(method: Method, url: impl Into<String>, body: Option<String>) -> Self {
        Self {
            method,
            url: url.into(),
            body,
        }
    }

    /// Wrap a message body received from the broker.
    pub fn deliver(url: impl Into<String>, body: String) -> Self {
        Self::new(Method::Deliver, url, Some(body))
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }

    /// Consume the request, yielding its body (empty if there was none).
    pub fn into_body(self) -> String {
        self.body.unwrap_or_default()
    }

    /// Describe this request as plain HTTP data.
    pub fn to_http(&self) -> Result<HttpRequest, SmqError> {
        let method = self
            .method
            .as_http()
            .ok_or(SmqError::UnsupportedMethod(self.method))?;
        let headers = match self.body {
            Some(_) => vec![("content-type".to_string(), "text/plain".to_string())],
            None => Vec::new(),
        };
        Ok(HttpRequest {
            method,
            url: self.url.clone(),
            headers,
            body: self.body.clone(),
        })
    }

    /// Run this request through `transport` and return the response body.
    ///
    /// Any non-2xx status is an error, so `Ok` always means the broker
    /// accepted the request.
    pub fn perform(&self, transport: &dyn Transport, timeout: Duration) -> Result<String, SmqError> {
        let request = self.to_http()?;
        let response = transport.execute(request, timeout)?;
        check_status(&response)?;
        Ok(response.body)
    }
}

/// Map non-success status codes to the appropriate `SmqError` variant.
fn check_status(response: &HttpResponse) -> Result<(), SmqError> {
    if (200..300).contains(&response.status) {
        return Ok(());
    }
    if response.status == 404 {
        return Err(SmqError::NotFound);
    }
    Err(SmqError::HttpError {
        status: response.status,
        body: response.body.clone(),
    })
}
