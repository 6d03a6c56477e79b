//! Error types for the SMQ client.
//!
//! # Design
//! `NotFound` gets a dedicated variant because the broker answers 404 for
//! ordinary situations (empty inbox after a long poll, a topic nobody
//! subscribes to). Every other non-2xx response lands in `HttpError` with the
//! raw status and body. Network-level failures (refused connection, timeout)
//! are flattened into `Transport` with the underlying message.
//!
//! None of these reach the caller of `publish` / `retrieve`: the background
//! loops log them and move on. They are surfaced by construction and by
//! `Request::perform` for callers driving a transport directly.

use std::fmt;

use crate::request::Method;

/// Errors produced by the client, its queues and its transports.
#[derive(Debug)]
pub enum SmqError {
    /// The broker returned 404.
    NotFound,

    /// The broker returned a non-2xx status other than 404.
    HttpError { status: u16, body: String },

    /// The request never produced a response (connect failure, timeout, I/O).
    Transport(String),

    /// The request's method cannot be sent over the wire.
    UnsupportedMethod(Method),

    /// Invalid configuration (zero capacity, unloadable environment).
    Config(String),

    /// A background thread could not be started.
    Spawn(String),
}

impl fmt::Display for SmqError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SmqError::NotFound => write!(f, "resource not found"),
            SmqError::HttpError { status, body } => {
                write!(f, "HTTP {status}: {body}")
            }
            SmqError::Transport(msg) => write!(f, "transport failed: {msg}"),
            SmqError::UnsupportedMethod(method) => {
                write!(f, "method {method} cannot be performed")
            }
            SmqError::Config(msg) => write!(f, "invalid configuration: {msg}"),
            SmqError::Spawn(msg) => write!(f, "failed to spawn worker: {msg}"),
        }
    }
}

impl std::error::Error for SmqError {}

impl From<config::ConfigError> for SmqError {
    fn from(e: config::ConfigError) -> Self {
        SmqError::Config(e.to_string())
    }
}
