//! GraphQL client: encodes a `Request`, sends it through a `Transport` and
//! decodes the `{data, errors}` envelope.
//!
//! # Design
//! `Client` holds the endpoint, a shared transport, a shared logger and two
//! toggles. Everything a call touches (body buffers, merged headers) is local
//! to that call, so one `Client` can serve many threads at once. The toggles
//! and the logger can only change through `&mut self`, which rules out
//! mutating them while other calls are in flight.
//!
//! Outcome of a call, first match wins:
//! cancelled context, files without multipart, body encoding failure,
//! transport failure, non-200 with an undecodable body, undecodable body,
//! GraphQL errors, success.

use std::collections::BTreeMap;
use std::fmt;
use std::io::Read;
use std::sync::Arc;

use serde::de::{DeserializeOwned, IgnoredAny};

use crate::codec::{self, EncodedBody, JSON_CONTENT_TYPE};
use crate::context::Context;
use crate::error::{Error, Result};
use crate::http::{HttpMethod, HttpRequest, HttpResponse, Transport, UreqTransport};
use crate::logger::{Logger, NoopLogger};
use crate::request::Request;
use crate::types::{GraphQLErrors, Response};

const ACCEPT: &str = "application/json; charset=utf-8";

/// Client for one GraphQL endpoint. Cheap to clone; clones share the
/// transport and logger.
#[derive(Clone)]
pub struct Client {
    endpoint: String,
    transport: Arc<dyn Transport>,
    logger: Arc<dyn Logger>,
    debug_log: bool,
    multipart: bool,
    close_request: bool,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("endpoint", &self.endpoint)
            .field("debug_log", &self.debug_log)
            .field("multipart", &self.multipart)
            .field("close_request", &self.close_request)
            .finish_non_exhaustive()
    }
}

/// Builds a `Client`. Options left unset keep their defaults: `ureq`
/// transport, JSON encoding, no-op logger, debug logging off.
pub struct ClientBuilder {
    endpoint: String,
    transport: Option<Arc<dyn Transport>>,
    logger: Option<Arc<dyn Logger>>,
    debug_log: bool,
    multipart: bool,
    close_request: bool,
}

impl ClientBuilder {
    /// Replace the default HTTP transport.
    pub fn transport(mut self, transport: impl Transport + 'static) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    /// Like `transport`, for a transport already shared with other clients.
    pub fn shared_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Send requests as multipart/form-data, which enables file uploads.
    pub fn multipart_form(mut self) -> Self {
        self.multipart = true;
        self
    }

    /// Ask the transport to close the connection after each request.
    pub fn immediately_close_request_body(mut self) -> Self {
        self.close_request = true;
        self
    }

    pub fn logger(mut self, logger: impl Logger + 'static) -> Self {
        self.logger = Some(Arc::new(logger));
        self
    }

    pub fn debug_log(mut self, enabled: bool) -> Self {
        self.debug_log = enabled;
        self
    }

    pub fn build(self) -> Client {
        Client {
            endpoint: self.endpoint,
            transport: self.transport.unwrap_or_else(|| Arc::new(UreqTransport::new())),
            logger: self.logger.unwrap_or_else(|| Arc::new(NoopLogger)),
            debug_log: self.debug_log,
            multipart: self.multipart,
            close_request: self.close_request,
        }
    }
}

impl Client {
    /// A client with every option at its default.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self::builder(endpoint).build()
    }

    pub fn builder(endpoint: impl Into<String>) -> ClientBuilder {
        ClientBuilder {
            endpoint: endpoint.into(),
            transport: None,
            logger: None,
            debug_log: false,
            multipart: false,
            close_request: false,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn is_multipart(&self) -> bool {
        self.multipart
    }

    pub fn debug_log_enabled(&self) -> bool {
        self.debug_log
    }

    pub fn enable_debug_log(&mut self) -> &mut Self {
        self.debug_log = true;
        self
    }

    pub fn disable_debug_log(&mut self) -> &mut Self {
        self.debug_log = false;
        self
    }

    pub fn logger(&self) -> Arc<dyn Logger> {
        Arc::clone(&self.logger)
    }

    /// Install `logger`, or the no-op logger for `None`. Does not touch the
    /// debug toggle.
    pub fn set_logger<L: Logger + 'static>(&mut self, logger: Option<L>) -> &mut Self {
        self.logger = match logger {
            Some(logger) => Arc::new(logger),
            None => Arc::new(NoopLogger),
        };
        self
    }

    /// Execute `request` and decode the `data` field into `T`.
    ///
    /// Returns `Ok(None)` when the server sent `data: null` or no `data` at
    /// all without errors. GraphQL errors are returned as `Error::GraphQL`
    /// even when the HTTP status is 200.
    pub fn run<T: DeserializeOwned>(&self, ctx: &Context, request: Request) -> Result<Option<T>> {
        let response = self.execute::<T>(ctx, request)?;
        if !response.errors.is_empty() {
            return Err(Error::GraphQL(GraphQLErrors(response.errors)));
        }
        Ok(response.data)
    }

    /// Execute `request`, skipping `data` but still checking for errors.
    pub fn run_discard(&self, ctx: &Context, request: Request) -> Result<()> {
        self.run::<IgnoredAny>(ctx, request).map(|_| ())
    }

    /// Execute `request` and return the decoded envelope as is, errors
    /// included. Only failures before a GraphQL envelope is decoded are
    /// returned as `Err`.
    pub fn execute<T: DeserializeOwned>(&self, ctx: &Context, request: Request) -> Result<Response<T>> {
        if let Some(err) = ctx.err() {
            return Err(Error::Canceled(err));
        }
        if request.has_files() && !self.multipart {
            return Err(Error::FilesRequireMultipart);
        }

        let http_request = if self.multipart {
            self.build_multipart(request)?
        } else {
            self.build_json(request)?
        };
        self.do_http(ctx, http_request)
    }

    fn build_json(&self, request: Request) -> Result<HttpRequest> {
        let parts = request.into_parts();
        let encoded = codec::encode_json(&parts.query, &parts.vars)?;
        if self.debug_log {
            self.debug(format_args!("variables: {}", render_vars(&parts.vars)));
            self.debug(format_args!("query: {}", parts.query));
        }
        Ok(self.http_request(encoded, parts.headers))
    }

    fn build_multipart(&self, request: Request) -> Result<HttpRequest> {
        let parts = request.into_parts();
        let file_count = parts.files.len();
        let encoded = codec::encode_multipart(&parts.query, &parts.vars, parts.files)?;
        if self.debug_log {
            // Mirrors the body: no variables field, nothing to show.
            let variables = if parts.vars.is_empty() {
                String::new()
            } else {
                render_vars(&parts.vars)
            };
            self.debug(format_args!("variables: {variables}"));
            self.debug(format_args!("num of files: {file_count}"));
            self.debug(format_args!("query: {}", parts.query));
        }
        Ok(self.http_request(encoded, parts.headers))
    }

    /// Default headers first, then the request's own, so a caller setting
    /// the same name adds a value instead of replacing ours.
    fn http_request(&self, encoded: EncodedBody, extra: Vec<(String, String)>) -> HttpRequest {
        let mut headers = Vec::with_capacity(extra.len() + 2);
        headers.push(("Content-Type".to_string(), encoded.content_type));
        headers.push(("Accept".to_string(), ACCEPT.to_string()));
        headers.extend(extra);
        HttpRequest {
            method: HttpMethod::Post,
            url: self.endpoint.clone(),
            headers,
            body: encoded.body,
            close: self.close_request,
        }
    }

    fn do_http<T: DeserializeOwned>(&self, ctx: &Context, request: HttpRequest) -> Result<Response<T>> {
        if self.debug_log {
            self.debug(format_args!("headers: {:?}", request.headers));
        }

        let HttpResponse { status, mut body, .. } = self
            .transport
            .send(ctx, request)
            .map_err(|err| match ctx.err() {
                Some(ctx_err) => Error::Canceled(ctx_err),
                None => Error::Transport(err),
            })?;

        let mut buf = Vec::new();
        body.read_to_end(&mut buf).map_err(Error::ReadBody)?;
        if let Some(err) = ctx.err() {
            return Err(Error::Canceled(err));
        }
        if self.debug_log {
            self.debug(format_args!("response body: {}", String::from_utf8_lossy(&buf)));
        }

        // First JSON value wins; bytes after it are ignored.
        let decoded = serde_json::Deserializer::from_slice(&buf)
            .into_iter::<Response<T>>()
            .next()
            .unwrap_or_else(|| serde_json::from_slice::<Response<T>>(&buf));
        decoded.map_err(|err| {
            if status != 200 {
                Error::Server {
                    status,
                    body: String::from_utf8_lossy(&buf).into_owned(),
                }
            } else {
                Error::Decode(err)
            }
        })
    }

    fn debug(&self, args: fmt::Arguments<'_>) {
        self.logger.debug(args);
    }
}

fn render_vars(vars: &BTreeMap<String, serde_json::Value>) -> String {
    serde_json::to_string(vars).unwrap_or_else(|err| format!("<unprintable: {err}>"))
}
