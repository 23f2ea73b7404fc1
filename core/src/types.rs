//! GraphQL response envelope and error DTOs.
//!
//! # Design
//! Every GraphQL response follows the `{data, errors}` envelope. `data` is
//! decoded straight into the caller's type; `errors` keeps the structured
//! fields a server may send (locations, path, extensions) so callers can act
//! on them instead of matching on message strings.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// The decoded `{data, errors}` envelope.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Response<T> {
    #[serde(default = "Option::default")]
    pub data: Option<T>,
    #[serde(default, deserialize_with = "null_as_empty", skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<GraphQLError>,
}

/// A single entry of the `errors` list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GraphQLError {
    pub message: String,

    /// Points in the query document the error relates to, if any.
    #[serde(default, deserialize_with = "null_as_empty", skip_serializing_if = "Vec::is_empty")]
    pub locations: Vec<Location>,

    /// Response path of the field that failed, so a `null` can be told apart
    /// from a field that legitimately resolved to `null`.
    #[serde(default, deserialize_with = "null_as_empty", skip_serializing_if = "Vec::is_empty")]
    pub path: Vec<PathSegment>,

    /// Server-specific metadata such as an error code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<serde_json::Map<String, serde_json::Value>>,
}

impl fmt::Display for GraphQLError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "graphql: {}", self.message)
    }
}

impl std::error::Error for GraphQLError {}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Location {
    pub line: u32,
    pub column: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum PathSegment {
    Key(String),
    Index(u64),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Key(key) => f.write_str(key),
            PathSegment::Index(index) => write!(f, "{index}"),
        }
    }
}

/// The non-empty `errors` list of a response, surfaced as one error value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GraphQLErrors(pub Vec<GraphQLError>);

impl GraphQLErrors {
    pub fn first(&self) -> Option<&GraphQLError> {
        self.0.first()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, GraphQLError> {
        self.0.iter()
    }
}

impl fmt::Display for GraphQLErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("graphql: no errors");
        }
        let messages: Vec<&str> = self.0.iter().map(|e| e.message.as_str()).collect();
        write!(f, "graphql: {}", messages.join("; "))
    }
}

impl std::error::Error for GraphQLErrors {}

impl From<Vec<GraphQLError>> for GraphQLErrors {
    fn from(errors: Vec<GraphQLError>) -> Self {
        Self(errors)
    }
}

impl IntoIterator for GraphQLErrors {
    type Item = GraphQLError;
    type IntoIter = std::vec::IntoIter<GraphQLError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a GraphQLErrors {
    type Item = &'a GraphQLError;
    type IntoIter = std::slice::Iter<'a, GraphQLError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}
