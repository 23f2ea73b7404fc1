//! A single GraphQL request: query, variables, headers and file attachments.
//!
//! `Request` only accumulates what the caller sets. Encoding it into an HTTP
//! body is the client's job.

use std::collections::BTreeMap;
use std::fmt;
use std::io::Read;

use serde::Serialize;

use crate::error::EncodeError;

/// A file to upload with a multipart request. Its reader is drained exactly
/// once while the request body is built.
pub struct FileUpload {
    pub field: String,
    pub name: String,
    pub reader: Box<dyn Read + Send>,
}

impl fmt::Debug for FileUpload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileUpload")
            .field("field", &self.field)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Default)]
pub struct Request {
    query: String,
    vars: BTreeMap<String, serde_json::Value>,
    headers: Vec<(String, String)>,
    files: Vec<FileUpload>,
}

impl Request {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Self::default()
        }
    }

    /// Set a variable, replacing any earlier value under the same name.
    pub fn var(&mut self, name: impl Into<String>, value: impl Serialize) -> Result<&mut Self, EncodeError> {
        let value = serde_json::to_value(value)?;
        self.vars.insert(name.into(), value);
        Ok(self)
    }

    /// Add a header value. Repeated names keep every value, in order.
    pub fn header(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Attach a file under form field `field`. Requires a multipart client.
    pub fn file(
        &mut self,
        field: impl Into<String>,
        name: impl Into<String>,
        reader: impl Read + Send + 'static,
    ) -> &mut Self {
        self.files.push(FileUpload {
            field: field.into(),
            name: name.into(),
            reader: Box::new(reader),
        });
        self
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn vars(&self) -> &BTreeMap<String, serde_json::Value> {
        &self.vars
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn files(&self) -> &[FileUpload] {
        &self.files
    }

    pub fn has_files(&self) -> bool {
        !self.files.is_empty()
    }

    pub(crate) fn into_parts(self) -> RequestParts {
        RequestParts {
            query: self.query,
            vars: self.vars,
            headers: self.headers,
            files: self.files,
        }
    }
}

/// A request taken apart by value so file readers can be drained.
pub(crate) struct RequestParts {
    pub query: String,
    pub vars: BTreeMap<String, serde_json::Value>,
    pub headers: Vec<(String, String)>,
    pub files: Vec<FileUpload>,
}
