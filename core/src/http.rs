//! HTTP values and the transport capability the client sends them through.
//!
//! # Design
//! `HttpRequest` and `HttpResponse` describe a round-trip as plain data. The
//! client builds the request, a `Transport` executes it, and the client
//! decodes the response. Anything that can turn one into the other satisfies
//! `Transport`: the bundled `UreqTransport`, a caller's own stack, or a
//! closure in a test.

use std::fmt;
use std::io::{Cursor, Read};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use crate::context::Context;

/// Errors surfaced by a transport. Boxed so any networking stack fits.
pub type TransportError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// HTTP method for a request. GraphQL over HTTP only needs POST.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Post,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Post => "POST",
        }
    }
}

/// An outgoing HTTP request described as plain data.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    /// Multi-valued: a name may appear more than once.
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
    /// Ask the transport not to keep the connection alive after this request.
    pub close: bool,
}

impl HttpRequest {
    /// All values of a header, compared case-insensitively.
    pub fn header_values<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.headers
            .iter()
            .filter(move |(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// An HTTP response handed back by a transport. The body is read once, to the
/// end, by the client.
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Box<dyn Read + Send>,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: Box::new(Cursor::new(body.into())),
        }
    }

    pub fn from_reader(status: u16, body: impl Read + Send + 'static) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: Box::new(body),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

impl fmt::Debug for HttpResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

/// Sends one HTTP request and returns the response.
///
/// Implementations must give up once `ctx` is cancelled or its deadline
/// passes rather than block past it. Non-2xx statuses are responses, not
/// errors: the client decides what they mean.
pub trait Transport: Send + Sync {
    fn send(&self, ctx: &Context, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

impl<F> Transport for F
where
    F: Fn(&Context, HttpRequest) -> Result<HttpResponse, TransportError> + Send + Sync,
{
    fn send(&self, ctx: &Context, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self(ctx, request)
    }
}

/// Default transport backed by a `ureq::Agent`.
///
/// The agent is configured so 4xx/5xx responses come back as data. The
/// context's remaining time becomes the request's global timeout, and a
/// cancelled context returns from `send` without waiting for the server.
#[derive(Debug, Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new() -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self { agent }
    }

    /// Use a caller-configured agent. `http_status_as_error` must be off or
    /// GraphQL errors sent with a non-2xx status will surface as transport
    /// failures.
    pub fn with_agent(agent: ureq::Agent) -> Self {
        Self { agent }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

/// How often a waiting `send` looks at the context.
const CANCEL_POLL: Duration = Duration::from_millis(10);

impl Transport for UreqTransport {
    /// The blocking ureq call runs on its own thread while this one watches
    /// `ctx`. Once the context dies the call is abandoned and the worker is
    /// left to finish on its own; with a deadline, ureq's timeout bounds it.
    fn send(&self, ctx: &Context, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        if let Some(err) = ctx.err() {
            return Err(Box::new(err));
        }

        let agent = self.agent.clone();
        let remaining = ctx.remaining();
        let (tx, rx) = mpsc::sync_channel(1);
        thread::Builder::new()
            .name("graphql-ureq".to_string())
            .spawn(move || {
                // The receiver is gone when the caller gave up.
                let _ = tx.send(call(&agent, request, remaining));
            })?;

        loop {
            match rx.recv_timeout(CANCEL_POLL) {
                Ok(result) => return result,
                Err(RecvTimeoutError::Timeout) => {
                    if let Some(err) = ctx.err() {
                        return Err(Box::new(err));
                    }
                }
                Err(RecvTimeoutError::Disconnected) => {
                    return Err("ureq worker exited without a response".into());
                }
            }
        }
    }
}

fn call(agent: &ureq::Agent, request: HttpRequest, timeout: Option<Duration>) -> Result<HttpResponse, TransportError> {
    let mut builder = agent.post(&request.url);
    for (name, value) in &request.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    if request.close {
        builder = builder.header("Connection", "close");
    }
    if let Some(timeout) = timeout {
        builder = builder.config().timeout_global(Some(timeout)).build();
    }

    let mut response = builder.send(&request.body[..])?;

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
    let body = response.body_mut().with_config().limit(u64::MAX).read_to_vec()?;

    Ok(HttpResponse {
        status,
        headers,
        body: Box::new(Cursor::new(body)),
    })
}
