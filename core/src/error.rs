//! Error types for the GraphQL client.
//!
//! # Design
//! Each failure kind a call can end in gets its own variant so callers can
//! tell a dead network apart from a server that answered with GraphQL
//! errors. `Server` and `Decode` are split on the HTTP status: an unreadable
//! body on a non-200 answer is the server's fault, on a 200 it is ours.

use crate::context::ContextError;
use crate::http::TransportError;
use crate::types::GraphQLErrors;

/// Errors returned by `Client::run` and friends.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The context was cancelled or its deadline passed.
    #[error(transparent)]
    Canceled(#[from] ContextError),

    /// Files were attached but the client does not use multipart encoding.
    #[error("cannot send files without multipart form encoding")]
    FilesRequireMultipart,

    /// The request body could not be built.
    #[error("encoding request body: {0}")]
    Encode(#[from] EncodeError),

    /// The transport failed to deliver the request.
    #[error("transport: {0}")]
    Transport(#[source] TransportError),

    /// The server answered with a non-200 status and a body that is not a
    /// GraphQL envelope.
    #[error("graphql server returned a non-200 status code; statuscode: {status}")]
    Server { status: u16, body: String },

    /// The response body could not be read.
    #[error("reading response body: {0}")]
    ReadBody(#[source] std::io::Error),

    /// The server answered 200 but the body is not a GraphQL envelope.
    #[error("decoding response: {0}")]
    Decode(#[source] serde_json::Error),

    /// The envelope decoded and carries a non-empty `errors` list.
    #[error(transparent)]
    GraphQL(#[from] GraphQLErrors),
}

/// Failures while building a request body.
#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    #[error("encode json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("write body: {0}")]
    Io(#[from] std::io::Error),

    /// An attached file could not be read.
    #[error("preparing file {file_name:?} for field {field:?}: {source}")]
    File {
        field: String,
        file_name: String,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// The GraphQL errors carried by the response, if that is what failed.
    pub fn graphql_errors(&self) -> Option<&GraphQLErrors> {
        match self {
            Error::GraphQL(errors) => Some(errors),
            _ => None,
        }
    }

    /// HTTP status of a server error.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Server { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_canceled(&self) -> bool {
        matches!(self, Error::Canceled(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
