//! Request body encoders: plain JSON and multipart/form-data.
//!
//! # Design
//! Both encoders produce the whole body in memory before anything is sent,
//! so a file that fails mid-read never leaves a half-written request on the
//! wire. The multipart writer only knows text fields and file parts.

use std::collections::BTreeMap;
use std::io::{self, Read, Write};

use serde::Serialize;

use crate::error::EncodeError;
use crate::request::FileUpload;

pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// An encoded request body plus what the client needs to describe it.
#[derive(Debug, Clone)]
pub struct EncodedBody {
    pub content_type: String,
    pub body: Vec<u8>,
}

#[derive(Serialize)]
struct JsonEnvelope<'a> {
    query: &'a str,
    variables: &'a BTreeMap<String, serde_json::Value>,
}

/// Encode `{"query": ..., "variables": {...}}`. `variables` is always
/// present, `{}` when empty.
pub fn encode_json(query: &str, vars: &BTreeMap<String, serde_json::Value>) -> Result<EncodedBody, EncodeError> {
    let mut body = serde_json::to_vec(&JsonEnvelope { query, variables: vars })?;
    body.push(b'\n');
    Ok(EncodedBody {
        content_type: JSON_CONTENT_TYPE.to_string(),
        body,
    })
}

/// Encode a multipart body: a `query` field, a `variables` field when there
/// are any, then one part per file in attachment order.
pub fn encode_multipart(
    query: &str,
    vars: &BTreeMap<String, serde_json::Value>,
    files: Vec<FileUpload>,
) -> Result<EncodedBody, EncodeError> {
    let mut writer = MultipartWriter::new(Vec::new());
    writer.write_field("query", query.as_bytes())?;
    if !vars.is_empty() {
        let mut encoded = serde_json::to_vec(vars)?;
        encoded.push(b'\n');
        writer.write_field("variables", &encoded)?;
    }
    for file in files {
        let FileUpload { field, name, reader } = file;
        writer
            .write_file(&field, &name, reader)
            .map_err(|source| EncodeError::File {
                field,
                file_name: name,
                source,
            })?;
    }
    let content_type = writer.content_type();
    let body = writer.finish()?;
    Ok(EncodedBody { content_type, body })
}

/// Minimal multipart/form-data writer.
pub struct MultipartWriter<W> {
    out: W,
    boundary: String,
}

impl<W: Write> MultipartWriter<W> {
    pub fn new(out: W) -> Self {
        Self::with_boundary(out, uuid::Uuid::new_v4().simple().to_string())
    }

    pub fn with_boundary(out: W, boundary: impl Into<String>) -> Self {
        Self {
            out,
            boundary: boundary.into(),
        }
    }

    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    pub fn write_field(&mut self, name: &str, value: &[u8]) -> io::Result<()> {
        write!(
            self.out,
            "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n",
            self.boundary,
            escape_quotes(name)
        )?;
        self.out.write_all(value)?;
        self.out.write_all(b"\r\n")
    }

    pub fn write_file(&mut self, field: &str, file_name: &str, mut reader: impl Read) -> io::Result<()> {
        write!(
            self.out,
            "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
            self.boundary,
            escape_quotes(field),
            escape_quotes(file_name)
        )?;
        io::copy(&mut reader, &mut self.out)?;
        self.out.write_all(b"\r\n")
    }

    /// Write the closing boundary and hand back the writer.
    pub fn finish(mut self) -> io::Result<W> {
        write!(self.out, "--{}--\r\n", self.boundary)?;
        Ok(self.out)
    }
}

fn escape_quotes(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}
