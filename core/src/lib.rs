//! Low-level GraphQL client over HTTP.
//!
//! # Overview
//! Builds GraphQL request bodies (JSON, or multipart/form-data when files are
//! attached), sends them through a pluggable `Transport` and decodes the
//! `{data, errors}` envelope into the caller's type.
//!
//! ```no_run
//! use graphql_core::{Client, Context, Request};
//!
//! #[derive(serde::Deserialize)]
//! struct Items {
//!     items: Vec<String>,
//! }
//!
//! let client = Client::new("https://example.com/graphql");
//! let mut req = Request::new("query ($key: String!) { items(id: $key) }");
//! req.var("key", "value")?;
//! let data: Option<Items> = client.run(&Context::background(), req)?;
//! # Ok::<(), graphql_core::Error>(())
//! ```
//!
//! # Design
//! - `Client` is configured once through `ClientBuilder` and then shared;
//!   each call keeps its buffers and headers to itself.
//! - The network sits behind `Transport`. `UreqTransport` is the default;
//!   tests swap in a closure.
//! - Every failure kind is its own `Error` variant. GraphQL errors are never
//!   folded into transport or decode failures, even on HTTP 200.
//! - Debug tracing goes through a `Logger` and only when enabled on the
//!   client.

pub mod client;
pub mod codec;
pub mod context;
pub mod error;
pub mod http;
pub mod logger;
pub mod request;
pub mod types;

pub use client::{Client, ClientBuilder};
pub use context::{Context, ContextError};
pub use error::{EncodeError, Error, Result};
pub use http::{HttpMethod, HttpRequest, HttpResponse, Transport, TransportError, UreqTransport};
pub use logger::{Logger, NoopLogger, TracingLogger, WriterLogger};
pub use request::{FileUpload, Request};
pub use types::{GraphQLError, GraphQLErrors, Location, PathSegment, Response};
