//! Blocking HTTP transport backed by `ureq`.
//!
//! One `Agent` is shared by every call so the pusher and puller reuse pooled
//! connections. Status codes are returned as data (`http_status_as_error` is
//! off); `Request::perform` decides what counts as success.

use std::fmt;
use std::time::Duration;

use tracing::trace;
use ureq::Agent;

use crate::error::SmqError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse, Transport};

#[derive(Clone)]
pub struct UreqTransport {
    agent: Agent,
}

impl fmt::Debug for UreqTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UreqTransport").finish_non_exhaustive()
    }
}

impl UreqTransport {
    pub fn new() -> Self {
        let agent = Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self { agent }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for UreqTransport {
    fn execute(&self, req: HttpRequest, timeout: Duration) -> Result<HttpResponse, SmqError> {
        trace!(method = %req.method, url = %req.url, "executing request");
        let timeout = Some(timeout);

        let result = match req.method {
            HttpMethod::Get | HttpMethod::Delete => {
                let mut builder = match req.method {
                    HttpMethod::Get => self.agent.get(&req.url),
                    _ => self.agent.delete(&req.url),
                };
                for (key, value) in &req.headers {
                    builder = builder.header(key, value);
                }
                builder.config().timeout_global(timeout).build().call()
            }
            HttpMethod::Put => {
                let mut builder = self.agent.put(&req.url);
                for (key, value) in &req.headers {
                    builder = builder.header(key, value);
                }
                let builder = builder.config().timeout_global(timeout).build();
                match req.body {
                    Some(body) => builder.send(body.as_bytes()),
                    None => builder.send_empty(),
                }
            }
        };

        let mut response = result.map_err(|e| SmqError::Transport(e.to_string()))?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_string(), value.to_string()))
            })
            .collect();
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| SmqError::Transport(e.to_string()))?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}
