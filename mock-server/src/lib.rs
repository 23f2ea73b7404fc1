use std::{collections::BTreeMap, time::Duration};

use axum::{
    extract::{FromRequest, Multipart, Request},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::net::TcpListener;

/// How long `/slow` waits before answering.
pub const SLOW_DELAY: Duration = Duration::from_secs(2);

/// A GraphQL operation as received, whatever the encoding.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Operation {
    pub query: String,
    #[serde(default)]
    pub variables: Option<Value>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct UploadedFile {
    pub field: String,
    pub name: String,
    pub size: usize,
    pub content: String,
}

/// What `/graphql` sends back under `data.echo`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Echo {
    pub query: String,
    pub variables: Value,
    pub files: Vec<UploadedFile>,
    pub headers: BTreeMap<String, Vec<String>>,
}

pub fn app() -> Router {
    Router::new()
        .route("/graphql", post(graphql))
        .route("/slow", post(slow))
        .route("/broken", post(broken))
        .route("/garbage", post(garbage))
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn graphql(req: Request) -> Response {
    let headers = collect_headers(req.headers());
    let is_multipart = req
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("multipart/form-data"));

    let parsed = if is_multipart {
        read_multipart(req).await
    } else {
        read_json(req).await
    };
    match parsed {
        Ok((operation, files)) => answer(operation, files, headers),
        Err(rejection) => rejection,
    }
}

async fn slow(req: Request) -> Response {
    tokio::time::sleep(SLOW_DELAY).await;
    graphql(req).await
}

async fn broken() -> (StatusCode, &'static str) {
    (StatusCode::INTERNAL_SERVER_ERROR, "internal server error")
}

async fn garbage() -> (StatusCode, &'static str) {
    (StatusCode::OK, "<html>not a graphql response</html>")
}

fn answer(operation: Operation, files: Vec<UploadedFile>, headers: BTreeMap<String, Vec<String>>) -> Response {
    if operation.query.contains("fail") {
        let body = json!({
            "data": null,
            "errors": [{
                "message": "requested failure",
                "locations": [{"line": 1, "column": 3}],
                "path": ["fail", 0],
                "extensions": {"code": "REQUESTED"}
            }]
        });
        return Json(body).into_response();
    }
    let echo = Echo {
        query: operation.query,
        variables: operation.variables.unwrap_or_else(|| json!({})),
        files,
        headers,
    };
    Json(json!({ "data": { "echo": echo } })).into_response()
}

async fn read_json(req: Request) -> Result<(Operation, Vec<UploadedFile>), Response> {
    let Json(operation) = Json::<Operation>::from_request(req, &())
        .await
        .map_err(IntoResponse::into_response)?;
    Ok((operation, Vec::new()))
}

async fn read_multipart(req: Request) -> Result<(Operation, Vec<UploadedFile>), Response> {
    let mut multipart = Multipart::from_request(req, &())
        .await
        .map_err(IntoResponse::into_response)?;

    let mut operation = Operation::default();
    let mut files = Vec::new();
    while let Some(field) = multipart.next_field().await.map_err(IntoResponse::into_response)? {
        let name = field.name().unwrap_or_default().to_string();
        match field.file_name().map(str::to_string) {
            Some(file_name) => {
                let bytes = field.bytes().await.map_err(IntoResponse::into_response)?;
                files.push(UploadedFile {
                    field: name,
                    name: file_name,
                    size: bytes.len(),
                    content: String::from_utf8_lossy(&bytes).into_owned(),
                });
            }
            None => {
                let text = field.text().await.map_err(IntoResponse::into_response)?;
                match name.as_str() {
                    "query" => operation.query = text,
                    "variables" => {
                        let variables = serde_json::from_str(&text)
                            .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()).into_response())?;
                        operation.variables = Some(variables);
                    }
                    _ => {}
                }
            }
        }
    }
    Ok((operation, files))
}

fn collect_headers(headers: &HeaderMap) -> BTreeMap<String, Vec<String>> {
    let mut out: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (name, value) in headers {
        if let Ok(value) = value.to_str() {
            out.entry(name.as_str().to_string()).or_default().push(value.to_string());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operation_variables_are_optional() {
        let op: Operation = serde_json::from_str(r#"{"query":"{ a }"}"#).unwrap();
        assert_eq!(op.query, "{ a }");
        assert!(op.variables.is_none());
    }

    #[test]
    fn operation_rejects_missing_query() {
        let result: Result<Operation, _> = serde_json::from_str(r#"{"variables":{}}"#);
        assert!(result.is_err());
    }

    #[test]
    fn failing_query_answers_with_errors() {
        let resp = answer(
            Operation {
                query: "{ fail }".to_string(),
                variables: None,
            },
            Vec::new(),
            BTreeMap::new(),
        );
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[test]
    fn headers_keep_repeated_values() {
        let mut map = HeaderMap::new();
        map.append("x-tag", "a".parse().unwrap());
        map.append("x-tag", "b".parse().unwrap());
        let collected = collect_headers(&map);
        assert_eq!(collected["x-tag"], vec!["a".to_string(), "b".to_string()]);
    }
}
